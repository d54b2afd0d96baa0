//! Program representation: a flat vector of statements, addressed by
//! index exactly as the original bytecode stream is addressed by byte
//! offset (§4.3). `GOTO`, `IF`/`IFELSE`'s branch targets and `FNCALL`'s
//! callee address are all statement indices into the same vector the
//! running core's `ip` walks.

use crate::expr::{ArgBinding, Expr};
use meshrt_mailbox::ReduceOp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Let {
        id: u16,
        no_alias: bool,
        value: Expr,
    },
    ArraySet {
        id: u16,
        indices: Vec<Expr>,
        value: Expr,
    },
    DimArray {
        id: u16,
        dims: Vec<Expr>,
        shared: bool,
        extendable: bool,
    },
    If {
        cond: Expr,
        else_target: usize,
    },
    IfElse {
        cond: Expr,
        else_target: usize,
        end_target: usize,
    },
    /// `for var in array` (§4.3): `index_var` is a hidden counter, invisible
    /// to the program, that `eval` auto-allocates starting at `INT 0`;
    /// `var` is rebound to `array[index_var]` each pass. Exhausting the
    /// array skips `end_target + 1` (the statement after the loop's
    /// trailing `Label`), matching `blockLen+3` byte-skip in the original
    /// bytecode form.
    For {
        index_var: u16,
        var: u16,
        array: Expr,
        end_target: usize,
    },
    /// Marks the statement after a `FOR`'s body — `eval` increments
    /// `index_var` and jumps back to the matching `For` to rebind the next
    /// element (or fall through past the loop once exhausted).
    NextFor {
        for_stmt: usize,
    },
    Goto(usize),
    FnCall {
        addr: usize,
        args: Vec<ArgBinding>,
    },
    Return,
    ReturnExp(Expr),
    Stop,
    Input {
        id: u16,
    },
    InputString {
        id: u16,
    },
    Send {
        target: Expr,
        value: Expr,
    },
    Recv {
        source: Expr,
        dest: u16,
    },
    SendRecv {
        target: Expr,
        value: Expr,
        dest: u16,
    },
    /// Broadcast from core `source`; the source core supplies `value`,
    /// every other core leaves it `None` and receives the broadcast value
    /// into `dest`.
    Bcast {
        source: Expr,
        value: Option<Expr>,
        dest: u16,
    },
    Reduction {
        op: ReduceOp,
        value: Expr,
        dest: u16,
    },
    Sync,
    Native {
        id: u32,
        args: Vec<Expr>,
        dest: Option<u16>,
    },
    Free {
        id: u16,
    },
    Gc,
    Print(Expr),
    /// Marker instruction with no effect, used as a jump target at the
    /// end of an `If`/`IfElse`/`For` block.
    Label,
}

/// A fully loaded program: the statement vector plus the byte image of
/// interned string/array constants, if any (unused for now — string
/// literals resolve through `Expr::Str(HeapPtr)` pointers the loader
/// has already written into the host's shared string heap).
#[derive(Clone, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

impl Program {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn get(&self, ip: usize) -> Option<&Stmt> {
        self.stmts.get(ip)
    }
}
