//! Wire-level vocabulary for the core/host mailbox (§4.4).
//!
//! The original protocol tags each request with a single `core_command`
//! integer and crams the payload into a 15-word scratch buffer; here the
//! command code and payload travel together in one enum, and
//! `command_code` recovers the original numbering for anything that still
//! wants to log or assert on it (tests, the host monitor's tracing spans).

use meshrt_core::{RuntimeError, Value};
use serde::{Deserialize, Serialize};

/// Reduction operator for mailbox command 9 (§4.6). `Max`'s original C
/// implementation compared the wrong operand for the `REAL` branch (it
/// tested `recv_int` instead of `recv_real`); this enum carries no such
/// bug — `meshrt-host`'s reducer always compares the typed `Value`.
///
/// Numbering follows §4.6's op table (`0:sum, 1:min, 2:max, 3:product`)
/// so a loaded `.mbc` program's raw op byte maps directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
    Product,
}

/// A request a core posts to its mailbox, serviced by the host monitor
/// (Component E) or the comms proxy (Component F).
#[derive(Debug, Clone, PartialEq)]
pub enum MailboxRequest {
    /// `PRINT`/display output (command 1). The host does the
    /// value-to-text formatting (`%d`/`%f`/`true`/`false`/`NONE`/`0x%x`,
    /// same rules as `Concat`) since a `STRING`/`ARRAY` payload's bytes
    /// live in host-managed heap the core cannot read directly.
    Display(Value),
    /// Read one line of numeric input (command 2).
    Input,
    /// Read one line of string input (command 2, string variant).
    InputString,
    /// Report a fatal-to-the-core runtime error (command 3). The core
    /// keeps running its own loop dead after posting this; the host
    /// decides whether the whole execution is torn down.
    Error(RuntimeError),
    /// String concatenation/formatting — heap string ops are host-side
    /// because the heap backing a core's `STRING` values is shared
    /// (command 4).
    Concat(Value, Value),
    /// Point-to-point send to a global core id (command 5).
    Send { target: u32, value: Value },
    /// Point-to-point receive from a global core id (command 6).
    Recv { source: u32 },
    /// Combined send+receive with a partner (command 7).
    SendRecv { target: u32, value: Value },
    /// Collective reduction across all active cores (command 9).
    Reduce { op: ReduceOp, value: Value },
    /// Barrier: block until every active core has reached this point
    /// (command 10).
    Sync,
    /// Broadcast from `source`; the source supplies `Some(value)`, every
    /// other caller supplies `None` and receives the broadcast value back
    /// (command 11).
    Bcast { source: u32, value: Option<Value> },
    /// A `MATHS` sub-opcode the core cannot compute locally (command
    /// `1000 + sub_op`).
    Math { op: MathOp, operand: f64 },
}

/// `MATHS` sub-operations (§4.3's opcode table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOp {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Floor,
    Ceil,
    Log,
    Log10,
    Random,
}

/// What the host writes back once it has serviced a `MailboxRequest`.
#[derive(Debug, Clone, PartialEq)]
pub enum MailboxResponse {
    /// Display/error/sync acknowledged, no payload to return.
    Ack,
    /// A value-shaped result (concat, recv, sendrecv, reduce, bcast,
    /// math).
    Value(Value),
    /// A line of text read from stdin (input/input_string).
    Line(String),
}

/// Recover the original numeric command code for a request (§4.4). Used
/// by `tracing` spans and by tests asserting protocol fidelity; the
/// request/response pair itself never needs to round-trip through this
/// number.
pub fn command_code(req: &MailboxRequest) -> u32 {
    match req {
        MailboxRequest::Display(_) => 1,
        MailboxRequest::Input | MailboxRequest::InputString => 2,
        MailboxRequest::Error(_) => 3,
        MailboxRequest::Concat(_, _) => 4,
        MailboxRequest::Send { .. } => 5,
        MailboxRequest::Recv { .. } => 6,
        MailboxRequest::SendRecv { .. } => 7,
        MailboxRequest::Reduce { .. } => 9,
        MailboxRequest::Sync => 10,
        MailboxRequest::Bcast { .. } => 11,
        MailboxRequest::Math { op, .. } => 1000 + *op as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_match_spec_table() {
        assert_eq!(command_code(&MailboxRequest::Display(Value::Int(1))), 1);
        assert_eq!(command_code(&MailboxRequest::Input), 2);
        assert_eq!(
            command_code(&MailboxRequest::Error(RuntimeError::NegArrIndex)),
            3
        );
        assert_eq!(
            command_code(&MailboxRequest::Concat(Value::Int(1), Value::Int(2))),
            4
        );
        assert_eq!(
            command_code(&MailboxRequest::Send {
                target: 0,
                value: Value::Int(1)
            }),
            5
        );
        assert_eq!(command_code(&MailboxRequest::Recv { source: 0 }), 6);
        assert_eq!(
            command_code(&MailboxRequest::Reduce {
                op: ReduceOp::Sum,
                value: Value::Int(1)
            }),
            9
        );
        assert_eq!(command_code(&MailboxRequest::Sync), 10);
        assert_eq!(
            command_code(&MailboxRequest::Bcast {
                source: 0,
                value: None
            }),
            11
        );
        assert_eq!(
            command_code(&MailboxRequest::Math {
                op: MathOp::Sqrt,
                operand: 4.0
            }),
            1000
        );
    }
}
