//! Mesh Core: Value model, symbol table and allocator-interface primitives
//!
//! This crate is the language-agnostic foundation shared by the bytecode
//! interpreter, the core/host mailbox and the host monitor: it owns the
//! `Value` type every other crate in this workspace talks about, the
//! per-execution `SymbolTable`, and the allocator traits the interpreter
//! consumes for heap/stack requests. The concrete allocator backing the
//! accelerator's own private store is an external collaborator (see
//! `DESIGN.md`); this crate only defines the contract and ships one
//! in-process implementation of it, usable for host-side execution and
//! for simulating a core's shared heap.
//!
//! # Modules
//!
//! - `error`: runtime error taxonomy plus a thread-local "last error" slot
//! - `value`: `Value` enum and heap-block (string/array) layout helpers
//! - `symbol`: `SymbolNode` / `SymbolTable` with level/alias resolution
//! - `alloc`: `HeapAllocator` / `StackAllocator` traits and a first-fit
//!   in-process implementation

pub mod alloc;
pub mod error;
pub mod symbol;
pub mod value;

pub use alloc::{FirstFitHeap, StackRegion, gc};
pub use error::{
    RuntimeError, clear_runtime_error, has_runtime_error, set_runtime_error, take_runtime_error,
};
pub use symbol::{MAX_CALL_STACK_DEPTH, SymbolNode, SymbolState, SymbolTable};
pub use value::{HeapPtr, Value, ValueTag};
