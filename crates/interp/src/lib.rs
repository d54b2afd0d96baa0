//! Mesh Interpreter: the bytecode interpreter that runs inside each core
//! (§4.3, §5). One `eval::Interpreter` instance exists per core; it owns
//! that core's symbol table and local heap/stack (from `meshrt-core`) and
//! reaches every host service — display, input, string concatenation,
//! cross-core communication, collectives, transcendental math — through
//! exactly one door: its `meshrt_mailbox::CoreCtrl` handle.
//!
//! # Modules
//!
//! - `opcode`: the statement-level opcode table
//! - `expr`: the expression grammar (`Expr` tree, operator precedence)
//! - `program`: the loaded program representation (`Stmt` vector)
//! - `arithmetic`: binary/unary operator semantics
//! - `array`: local array allocation/access
//! - `eval`: the interpreter loop itself

pub mod arithmetic;
pub mod array;
#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod eval;
pub mod expr;
pub mod opcode;
pub mod program;

pub use eval::{Interpreter, RunOutcome, MAX_CALL_STACK_DEPTH};
pub use expr::{ArgBinding, BinOp, Expr, UnOp};
pub use opcode::Opcode;
pub use program::{Program, Stmt};
