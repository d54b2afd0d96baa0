//! Component E: the host monitor. One poll loop per node, visiting
//! every local core's mailbox, servicing what it can locally (display,
//! input, error reporting, string concat, maths) and delegating
//! cross-core traffic to `comms` (§4.4, §4.6).

use std::collections::HashMap;
use std::io::Write as _;
use std::sync::Mutex;

use meshrt_core::{RuntimeError, Value};
use meshrt_mailbox::Mesh;

use crate::comms::CommsProxy;
use crate::strings::StringHeap;
use crate::transport::Transport;
use meshrt_mailbox::{MailboxRequest, MailboxResponse, MathOp};

/// Format a value for `PRINT`/`Concat` the way the original's output
/// routine does: integers and booleans print bare, reals keep full
/// precision, `NONE` prints literally, and strings/arrays resolve
/// through the shared heaps the host owns.
fn format_value(v: &Value, strings: &StringHeap) -> String {
    match v {
        Value::Int(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Str(ptr) => strings.get(*ptr),
        Value::None => "NONE".to_string(),
        Value::FnAddr(a) => format!("0x{a:x}"),
        Value::Array(ptr) => format!("0x{:x}", ptr.0),
    }
}

fn apply_math(op: MathOp, x: f64) -> f64 {
    match op {
        MathOp::Sqrt => x.sqrt(),
        MathOp::Sin => x.sin(),
        MathOp::Cos => x.cos(),
        MathOp::Tan => x.tan(),
        MathOp::Asin => x.asin(),
        MathOp::Acos => x.acos(),
        MathOp::Atan => x.atan(),
        MathOp::Sinh => x.sinh(),
        MathOp::Cosh => x.cosh(),
        MathOp::Tanh => x.tanh(),
        MathOp::Floor => x.floor(),
        MathOp::Ceil => x.ceil(),
        MathOp::Log => x.ln(),
        MathOp::Log10 => x.log10(),
        // §4.3 only asks MATHS RANDOM for "some real number back"; the
        // operand isn't a seed, it's just the argument every MATHS call
        // carries.
        MathOp::Random => rand::random::<f64>(),
    }
}

pub struct Monitor<'a> {
    mesh: &'a Mesh,
    comms: &'a CommsProxy,
    transport: &'a dyn Transport,
    strings: &'a StringHeap,
    my_rank: u32,
    cores_per_node: u32,
    /// Requests a collective operation (`SYNC`/`REDUCTION`/cross-node
    /// `RECV`/`BCAST`) left unresolved. `CoreCtrl::poll` only ever hands a
    /// request out once, so the monitor — not the core — is responsible
    /// for remembering it and retrying `service` until it resolves.
    pending: Mutex<HashMap<u32, MailboxRequest>>,
    /// Core ids with a `SendRecv`'s send half already posted, so a retry
    /// of the still-pending receive half doesn't resend.
    sendrecv_posted: Mutex<std::collections::HashSet<u32>>,
}

impl<'a> Monitor<'a> {
    pub fn new(
        mesh: &'a Mesh,
        comms: &'a CommsProxy,
        transport: &'a dyn Transport,
        strings: &'a StringHeap,
        cores_per_node: u32,
    ) -> Self {
        Self {
            mesh,
            comms,
            transport,
            strings,
            my_rank: transport.rank(),
            cores_per_node,
            pending: Mutex::new(HashMap::new()),
            sendrecv_posted: Mutex::new(std::collections::HashSet::new()),
        }
    }

    /// One sweep over every local core's mailbox. Returns the number of
    /// cores still `core_run` after this sweep (§4.6's `totalActive`
    /// convergence property: this reaches 0 once every core has stopped).
    pub fn poll_once(&self) -> u32 {
        let mut still_running = 0;
        for core in self.mesh.cores() {
            if core.core_run() {
                still_running += 1;
            }

            let req = {
                let mut pending = self.pending.lock().unwrap();
                match pending.remove(&core.core_id) {
                    Some(req) => req,
                    None => {
                        let Some(req) = core.poll() else { continue };
                        tracing::trace!(
                            core = core.core_id,
                            command = meshrt_mailbox::command_code(&req),
                            "servicing"
                        );
                        req
                    }
                }
            };

            match self.service(core.core_id, req.clone()) {
                Some(resp) => core.respond(resp),
                None => {
                    self.pending.lock().unwrap().insert(core.core_id, req);
                }
            }
        }
        still_running
    }

    /// Run the monitor loop until every core on this node has stopped.
    pub fn run_until_done(&self) {
        loop {
            if self.poll_once() == 0 {
                break;
            }
            std::thread::yield_now();
        }
    }

    fn service(&self, core_id: u32, req: MailboxRequest) -> Option<MailboxResponse> {
        match req {
            MailboxRequest::Display(v) => {
                let text = format_value(&v, self.strings);
                println!("[device {core_id}] {text}");
                Some(MailboxResponse::Ack)
            }

            MailboxRequest::Input => {
                let line = read_line();
                Some(MailboxResponse::Line(line))
            }

            MailboxRequest::InputString => {
                let line = read_line();
                let ptr = self.strings.intern(line);
                Some(MailboxResponse::Value(Value::Str(ptr)))
            }

            MailboxRequest::Error(err) => {
                report_error(core_id, &err);
                Some(MailboxResponse::Ack)
            }

            MailboxRequest::Concat(a, b) => {
                let joined = format!(
                    "{}{}",
                    format_value(&a, self.strings),
                    format_value(&b, self.strings)
                );
                let ptr = self.strings.intern(joined);
                Some(MailboxResponse::Value(Value::Str(ptr)))
            }

            MailboxRequest::Send { target, value } => {
                self.comms.send(self.transport, self.my_rank, core_id, target, value);
                Some(MailboxResponse::Ack)
            }

            MailboxRequest::Recv { source } => self
                .comms
                .try_recv(self.transport, self.my_rank, core_id, source)
                .map(MailboxResponse::Value),

            MailboxRequest::SendRecv { target, value } => {
                // Only post the send once: this arm is retried on every
                // poll tick until `try_recv` succeeds, and `send` is not
                // itself idempotent.
                if self.sendrecv_posted.lock().unwrap().insert(core_id) {
                    self.comms.send(self.transport, self.my_rank, core_id, target, value);
                }
                let result = self
                    .comms
                    .try_recv(self.transport, self.my_rank, core_id, target)
                    .map(MailboxResponse::Value);
                if result.is_some() {
                    self.sendrecv_posted.lock().unwrap().remove(&core_id);
                }
                result
            }

            MailboxRequest::Reduce { op, value } => self
                .comms
                .reduce(self.transport, self.my_rank, core_id, op, value, self.mesh.active_count())
                .map(MailboxResponse::Value),

            MailboxRequest::Sync => {
                if self.comms.sync(self.transport, core_id, self.mesh.active_count()) {
                    Some(MailboxResponse::Ack)
                } else {
                    None
                }
            }

            MailboxRequest::Bcast { source, value } => self
                .comms
                .bcast(self.transport, self.my_rank, source, value)
                .map(MailboxResponse::Value),

            MailboxRequest::Math { op, operand } => {
                let result = apply_math(op, operand);
                Some(MailboxResponse::Value(Value::Real(result)))
            }
        }
    }
}

fn read_line() -> String {
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .unwrap_or_default();
    line
}

/// §7: "Error from core <id>: <message>", printed to stderr and logged;
/// the core that raised it has already set its own `stop_flag` — the
/// host neither propagates the error to other cores nor aborts them.
fn report_error(core_id: u32, err: &RuntimeError) {
    eprintln!("Error from core {core_id}: {err}");
    tracing::error!(core = core_id, %err, "core reported a fatal runtime error");
    let _ = std::io::stderr().flush();
}
