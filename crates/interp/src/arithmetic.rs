//! Binary/unary operator semantics (§4.3), independent of the mailbox:
//! everything here is pure `Value -> Value` logic. The one operation this
//! module cannot finish on its own is string concatenation — building a
//! new string touches the host-managed string heap, so `apply_binop`
//! reports `ArithOutcome::NeedsConcat` and leaves dispatching the mailbox
//! request to `eval::Interpreter`.

use meshrt_core::{RuntimeError, Value};

use crate::expr::{BinOp, UnOp};

#[derive(Debug, Clone, PartialEq)]
pub enum ArithOutcome {
    Value(Value),
    /// Caller must issue `MailboxRequest::Concat(lhs, rhs)` and use the
    /// response in place of this outcome.
    NeedsConcat,
}

/// INT⊕INT stays INT; mixing in a REAL promotes the whole expression to
/// REAL (§4.3's numeric promotion rule).
fn promote(lhs: Value, rhs: Value) -> Option<(f64, f64, bool)> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some((a as f64, b as f64, false)),
        (Value::Int(a), Value::Real(b)) => Some((a as f64, b, true)),
        (Value::Real(a), Value::Int(b)) => Some((a, b as f64, true)),
        (Value::Real(a), Value::Real(b)) => Some((a, b, true)),
        _ => None,
    }
}

/// Repeated multiplication, not `f64::powf`: 0 raised to the 0th power is
/// 1 by convention, and a negative exponent is the reciprocal of the
/// positive power.
fn repeated_pow(base: f64, exp: i64) -> f64 {
    if exp < 0 {
        return 1.0 / repeated_pow(base, -exp);
    }
    let mut result = 1.0;
    for _ in 0..exp {
        result *= base;
    }
    result
}

fn numeric_result(op: BinOp, a: f64, b: f64, is_real: bool) -> Result<Value, RuntimeError> {
    let r = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => {
            if is_real {
                a % b
            } else {
                ((a as i64).wrapping_rem(b as i64)) as f64
            }
        }
        BinOp::Pow => {
            // A real base raised to a non-integer exponent is unspecified
            // by the distilled grammar; INT^INT and a REAL base with an
            // integer-valued exponent are both computed by repeated
            // multiplication (§4.3), not `powf`.
            if b.fract() != 0.0 {
                return Err(RuntimeError::RealPowRealExponentUnspecified);
            }
            repeated_pow(a, b as i64)
        }
        BinOp::Lt => return Ok(Value::Bool(a < b)),
        BinOp::Gt => return Ok(Value::Bool(a > b)),
        BinOp::Le => return Ok(Value::Bool(a <= b)),
        BinOp::Ge => return Ok(Value::Bool(a >= b)),
        BinOp::Eq | BinOp::Is => return Ok(Value::Bool(a == b)),
        BinOp::Neq => return Ok(Value::Bool(a != b)),
        BinOp::And | BinOp::Or => unreachable!("boolean ops handled before numeric promotion"),
    };
    if is_real {
        Ok(Value::Real(r))
    } else {
        Ok(Value::Int(r as i64))
    }
}

pub fn apply_binop(op: BinOp, lhs: Value, rhs: Value) -> Result<ArithOutcome, RuntimeError> {
    // STRING operands: only ADD (concatenation, host service) and
    // EQ/NEQ are defined.
    if matches!(lhs, Value::Str(_)) || matches!(rhs, Value::Str(_)) {
        return match op {
            BinOp::Add => Ok(ArithOutcome::NeedsConcat),
            BinOp::Eq => Ok(ArithOutcome::Value(Value::Bool(values_identical(lhs, rhs)))),
            BinOp::Neq => Ok(ArithOutcome::Value(Value::Bool(!values_identical(lhs, rhs)))),
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Is => {
                Err(RuntimeError::StrOnlyTestEq)
            }
            _ => Err(RuntimeError::OnlyAdditionStr),
        };
    }

    // NONE operands: only EQ/NEQ/IS are defined.
    if matches!(lhs, Value::None) || matches!(rhs, Value::None) {
        return match op {
            BinOp::Eq | BinOp::Is => Ok(ArithOutcome::Value(Value::Bool(
                matches!(lhs, Value::None) && matches!(rhs, Value::None),
            ))),
            BinOp::Neq => Ok(ArithOutcome::Value(Value::Bool(
                !(matches!(lhs, Value::None) && matches!(rhs, Value::None)),
            ))),
            _ => Err(RuntimeError::NoneOnlyTestEq),
        };
    }

    if matches!(op, BinOp::And | BinOp::Or) {
        let (Value::Bool(a), Value::Bool(b)) = (lhs, rhs) else {
            // non-boolean operands to a boolean connective: truthiness by
            // INT/REAL non-zero, matching the original's loose boolean
            // coercion.
            let a = is_truthy(lhs);
            let b = is_truthy(rhs);
            let r = if op == BinOp::And { a && b } else { a || b };
            return Ok(ArithOutcome::Value(Value::Bool(r)));
        };
        let r = if op == BinOp::And { a && b } else { a || b };
        return Ok(ArithOutcome::Value(Value::Bool(r)));
    }

    // IS on two non-pointer, non-string, non-none values degrades to EQ.
    if op == BinOp::Is {
        if let (Some(p), Some(q)) = (lhs.pointer_identity(), rhs.pointer_identity()) {
            return Ok(ArithOutcome::Value(Value::Bool(p == q)));
        }
    }

    if let Some((a, b, is_real)) = promote(lhs, rhs) {
        return numeric_result(op, a, b, is_real).map(ArithOutcome::Value);
    }

    // Mixed BOOLEAN/other comparisons: only EQ/NEQ are well defined.
    match op {
        BinOp::Eq => Ok(ArithOutcome::Value(Value::Bool(values_identical(lhs, rhs)))),
        BinOp::Neq => Ok(ArithOutcome::Value(Value::Bool(!values_identical(lhs, rhs)))),
        _ => Err(RuntimeError::StrOnlyTestEq),
    }
}

pub fn apply_unop(op: UnOp, v: Value) -> Result<Value, RuntimeError> {
    match (op, v) {
        (UnOp::Neg, Value::Int(i)) => Ok(Value::Int(-i)),
        (UnOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOp::Not, other) => Ok(Value::Bool(!is_truthy(other))),
        (UnOp::Neg, _) => Err(RuntimeError::OnlyAdditionStr),
    }
}

fn is_truthy(v: Value) -> bool {
    match v {
        Value::Bool(b) => b,
        Value::Int(i) => i != 0,
        Value::Real(r) => r != 0.0,
        Value::None => false,
        _ => true,
    }
}

fn values_identical(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Real(x), Value::Real(y)) => x == y,
        (Value::None, Value::None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_plus_int_stays_int() {
        let out = apply_binop(BinOp::Add, Value::Int(2), Value::Int(3)).unwrap();
        assert_eq!(out, ArithOutcome::Value(Value::Int(5)));
    }

    #[test]
    fn int_plus_real_promotes_to_real() {
        let out = apply_binop(BinOp::Add, Value::Int(2), Value::Real(0.5)).unwrap();
        assert_eq!(out, ArithOutcome::Value(Value::Real(2.5)));
    }

    #[test]
    fn string_add_defers_to_host() {
        let out = apply_binop(
            BinOp::Add,
            Value::Str(meshrt_core::HeapPtr(1)),
            Value::Int(3),
        )
        .unwrap();
        assert_eq!(out, ArithOutcome::NeedsConcat);
    }

    #[test]
    fn string_sub_is_an_error() {
        let err = apply_binop(
            BinOp::Sub,
            Value::Str(meshrt_core::HeapPtr(1)),
            Value::Int(3),
        )
        .unwrap_err();
        assert_eq!(err, RuntimeError::OnlyAdditionStr);
    }

    #[test]
    fn string_lt_is_str_only_test_eq_not_only_addition_str() {
        let err = apply_binop(
            BinOp::Lt,
            Value::Str(meshrt_core::HeapPtr(1)),
            Value::Str(meshrt_core::HeapPtr(2)),
        )
        .unwrap_err();
        assert_eq!(err, RuntimeError::StrOnlyTestEq);
    }

    #[test]
    fn none_only_supports_eq_neq_is() {
        assert!(apply_binop(BinOp::Add, Value::None, Value::Int(1)).is_err());
        let out = apply_binop(BinOp::Eq, Value::None, Value::None).unwrap();
        assert_eq!(out, ArithOutcome::Value(Value::Bool(true)));
    }

    #[test]
    fn real_pow_real_is_unspecified() {
        let err = apply_binop(BinOp::Pow, Value::Real(2.0), Value::Real(0.5)).unwrap_err();
        assert_eq!(err, RuntimeError::RealPowRealExponentUnspecified);
    }

    #[test]
    fn int_pow_int_is_defined() {
        let out = apply_binop(BinOp::Pow, Value::Int(2), Value::Int(10)).unwrap();
        assert_eq!(out, ArithOutcome::Value(Value::Int(1024)));
    }

    #[test]
    fn real_base_with_negative_integer_exponent_is_repeated_multiplication() {
        // repeated multiplication, not `powf`: 2.0^-2 = 1 / (2.0*2.0) = 0.25
        let out = apply_binop(BinOp::Pow, Value::Real(2.0), Value::Int(-2)).unwrap();
        assert_eq!(out, ArithOutcome::Value(Value::Real(0.25)));
    }

    #[test]
    fn is_compares_pointer_identity_for_heap_values() {
        let p = meshrt_core::HeapPtr(7);
        let out = apply_binop(BinOp::Is, Value::Array(p), Value::Array(p)).unwrap();
        assert_eq!(out, ArithOutcome::Value(Value::Bool(true)));
        let out = apply_binop(
            BinOp::Is,
            Value::Array(p),
            Value::Array(meshrt_core::HeapPtr(8)),
        )
        .unwrap();
        assert_eq!(out, ArithOutcome::Value(Value::Bool(false)));
    }
}
