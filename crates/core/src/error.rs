//! Runtime error taxonomy and thread-local "last error" slot.
//!
//! A core raising an error never panics across the mailbox boundary: it
//! records one pending error and keeps going until the host notices
//! (§7 — propagation is via mailbox command 3, never a cross-core
//! abort). Because each core is realised as its own green thread (§5),
//! thread-local storage is exactly the right scope: at most one error
//! is ever pending per core at a time.

use std::cell::RefCell;
use std::fmt;

/// The error taxonomy from §7, plus the two fatal-within-an-execution
/// conditions from §4.1/§4.3 (symbol table and call-stack exhaustion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// `STRING` only supports `EQ`/`NEQ`.
    StrOnlyTestEq,
    /// `NONE` only supports `EQ`/`NEQ`/`IS`.
    NoneOnlyTestEq,
    /// A non-`ADD` arithmetic op was attempted with a string operand.
    OnlyAdditionStr,
    /// A negative array index was supplied.
    NegArrIndex,
    /// An index was out of bounds and the array is not extendable.
    ArrIndexExceedSize,
    /// More indices were supplied than the array has dimensions.
    TooManyArrIndex,
    /// The symbol table has no free slot and none to reuse.
    SymbolTableFull,
    /// `fnLevel` would exceed `MAX_CALL_STACK_DEPTH`.
    CallStackDepthExceeded,
    /// Real `POW` with a real exponent; unspecified behaviour per §4.3,
    /// resolved here as a hard error rather than a guess.
    RealPowRealExponentUnspecified,
    /// The heap allocator (§4.2) has no free chunk large enough.
    HeapExhausted,
}

impl RuntimeError {
    /// One-byte error code written to `data[1]` of mailbox command 3
    /// (§4.4, §7). Stable numbering — do not renumber existing variants.
    pub fn code(self) -> u8 {
        match self {
            RuntimeError::StrOnlyTestEq => 1,
            RuntimeError::NoneOnlyTestEq => 2,
            RuntimeError::OnlyAdditionStr => 3,
            RuntimeError::NegArrIndex => 4,
            RuntimeError::ArrIndexExceedSize => 5,
            RuntimeError::TooManyArrIndex => 6,
            RuntimeError::SymbolTableFull => 7,
            RuntimeError::CallStackDepthExceeded => 8,
            RuntimeError::RealPowRealExponentUnspecified => 9,
            RuntimeError::HeapExhausted => 10,
        }
    }

    /// Translate a one-byte error code back into a `RuntimeError`. Host
    /// side uses this when a core reports an error over the mailbox.
    pub fn from_code(code: u8) -> Option<RuntimeError> {
        Some(match code {
            1 => RuntimeError::StrOnlyTestEq,
            2 => RuntimeError::NoneOnlyTestEq,
            3 => RuntimeError::OnlyAdditionStr,
            4 => RuntimeError::NegArrIndex,
            5 => RuntimeError::ArrIndexExceedSize,
            6 => RuntimeError::TooManyArrIndex,
            7 => RuntimeError::SymbolTableFull,
            8 => RuntimeError::CallStackDepthExceeded,
            9 => RuntimeError::RealPowRealExponentUnspecified,
            10 => RuntimeError::HeapExhausted,
            _ => return None,
        })
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RuntimeError::StrOnlyTestEq => "ERR_STR_ONLYTEST_EQ: strings only support = and <>",
            RuntimeError::NoneOnlyTestEq => "ERR_NONE_ONLYTEST_EQ: none only supports = and <>",
            RuntimeError::OnlyAdditionStr => {
                "ERR_ONLY_ADDITION_STR: only + is defined for string operands"
            }
            RuntimeError::NegArrIndex => "ERR_NEG_ARR_INDEX: negative array index",
            RuntimeError::ArrIndexExceedSize => {
                "ERR_ARR_INDEX_EXCEED_SIZE: array index out of bounds"
            }
            RuntimeError::TooManyArrIndex => {
                "ERR_TOO_MANY_ARR_INDEX: more indices supplied than array dimensions"
            }
            RuntimeError::SymbolTableFull => "symbol table capacity exceeded",
            RuntimeError::CallStackDepthExceeded => "call stack depth exceeded",
            RuntimeError::RealPowRealExponentUnspecified => {
                "real base raised to a real exponent is unsupported"
            }
            RuntimeError::HeapExhausted => "heap allocator has no chunk large enough",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for RuntimeError {}

thread_local! {
    static LAST_ERROR: RefCell<Option<RuntimeError>> = const { RefCell::new(None) };
}

/// Record the last runtime error for this core's thread.
pub fn set_runtime_error(err: RuntimeError) {
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(err));
}

/// Take (and clear) the pending runtime error for this core's thread.
pub fn take_runtime_error() -> Option<RuntimeError> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Check whether this core's thread has a pending runtime error.
pub fn has_runtime_error() -> bool {
    LAST_ERROR.with(|e| e.borrow().is_some())
}

/// Clear any pending runtime error for this core's thread.
pub fn clear_runtime_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_take_round_trips() {
        clear_runtime_error();
        assert!(!has_runtime_error());
        set_runtime_error(RuntimeError::NegArrIndex);
        assert!(has_runtime_error());
        assert_eq!(take_runtime_error(), Some(RuntimeError::NegArrIndex));
        assert!(!has_runtime_error());
    }

    #[test]
    fn code_round_trips_for_every_variant() {
        let all = [
            RuntimeError::StrOnlyTestEq,
            RuntimeError::NoneOnlyTestEq,
            RuntimeError::OnlyAdditionStr,
            RuntimeError::NegArrIndex,
            RuntimeError::ArrIndexExceedSize,
            RuntimeError::TooManyArrIndex,
            RuntimeError::SymbolTableFull,
            RuntimeError::CallStackDepthExceeded,
            RuntimeError::RealPowRealExponentUnspecified,
            RuntimeError::HeapExhausted,
        ];
        for err in all {
            assert_eq!(RuntimeError::from_code(err.code()), Some(err));
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(RuntimeError::from_code(200), None);
    }
}
