//! Mesh Mailbox: the synchronous core/host request channel (§4.4).
//!
//! A core never touches a string, never prints, never talks to another
//! core's memory directly — every one of those is a *host service*, reached
//! by posting a request into this core's mailbox slot and spinning
//! (cooperatively — see `CoreCtrl::call`) until the host monitor has
//! serviced it and written back a response. The wire shape here is a
//! structured `MailboxRequest`/`MailboxResponse` pair rather than the
//! original's `data[15]` byte scratchpad: same protocol, same numeric
//! command codes (`protocol::command_code`), no manual byte packing.
//!
//! This crate owns the protocol and the per-core control block
//! (`CoreCtrl`). It does not decide *how* a request is serviced — that is
//! `meshrt-host`'s job (Components E and F); this crate only gets the
//! request from the core to the host and the response back.

pub mod core_ctrl;
pub mod protocol;

pub use core_ctrl::{CoreCtrl, CoreHandle, Mesh};
pub use protocol::{MailboxRequest, MailboxResponse, MathOp, ReduceOp, command_code};
