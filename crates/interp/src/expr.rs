//! Expression grammar (§4.3).
//!
//! The distilled grammar describes expressions as an in-order token run
//! that the interpreter re-parses every time it is reached; here the
//! loader parses each run once into an `Expr` tree when the program is
//! loaded; `eval::Interpreter::get_expression_value` just walks it.
//! Same recursive-descent, operator-precedence semantics the original
//! token stream implies — paid for once per load instead of once per
//! visit.

use meshrt_core::{HeapPtr, Value};
use meshrt_mailbox::MathOp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    /// Pointer-identity comparison (§4.3): only meaningful for heap-backed
    /// values, otherwise behaves like `Eq`.
    Is,
    And,
    Or,
}

impl BinOp {
    /// Binding power; higher binds tighter. Kept even though the parser
    /// that would consume it lives outside this crate's scope (programs
    /// arrive pre-parsed) — documents the precedence the tree below was
    /// built to respect, and a future front end targets it directly.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Neq | BinOp::Is => 3,
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
            BinOp::Pow => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
}

/// A by-reference argument binding for a function call: the callee's
/// parameter id is bound as an ALIAS of the caller's symbol id (§4.1,
/// §4.3) — every argument must name a caller symbol, since there is
/// nothing else to alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgBinding {
    pub callee_id: u16,
    pub caller_id: u16,
}

/// A parsed expression. `Symbol`/`ArrayAccess` carry a symbol id that
/// `eval::Interpreter` resolves against the active call level; `Call` is
/// a function invocation used for its return value (`RETURN_EXP`'s
/// right-hand side, or any nested call).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Int(i64),
    Real(f64),
    Bool(bool),
    Str(HeapPtr),
    None,
    Symbol(u16),
    ArrayAccess(u16, Vec<Expr>),
    Call(usize, Vec<ArgBinding>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Un(UnOp, Box<Expr>),
    /// This core's id (§4.3's `COREID` token).
    CoreId,
    /// Count of cores currently active in this execution (`NUMCORES`).
    NumCores,
    /// `LEN(arr)`: product of the array's current declared dimensions.
    Len(Box<Expr>),
    /// A transcendental/math function used as an expression (`MATHS`),
    /// routed to the host via the mailbox — the one door this crate has
    /// out to anything it cannot compute locally.
    Maths(MathOp, Box<Expr>),
    /// An array literal, optionally repeated `n` times (`[v] * n`), per
    /// §4.3's `ARRAY literal (with optional repetition multiplier)`.
    ArrayLit(Vec<Expr>, Option<Box<Expr>>),
    /// `LET` used as an expression (§4.3): assigns the symbol then yields
    /// the assigned value, e.g. as the operand of a larger expression.
    Let(u16, Box<Expr>),
    /// `NATIVE` used as an expression (§4.3): invokes the host-provided
    /// routine for its return value rather than binding it to a symbol.
    Native(u32, Vec<Expr>),
}

impl Expr {
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            Expr::Int(i) => Some(Value::Int(*i)),
            Expr::Real(r) => Some(Value::Real(*r)),
            Expr::Bool(b) => Some(Value::Bool(*b)),
            Expr::Str(p) => Some(Value::Str(*p)),
            Expr::None => Some(Value::None),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_orders_pow_above_mul_above_add() {
        assert!(BinOp::Pow.precedence() > BinOp::Mul.precedence());
        assert!(BinOp::Mul.precedence() > BinOp::Add.precedence());
        assert!(BinOp::Add.precedence() > BinOp::Eq.precedence());
        assert!(BinOp::Eq.precedence() > BinOp::And.precedence());
        assert!(BinOp::And.precedence() > BinOp::Or.precedence());
    }

    #[test]
    fn literal_value_extracts_constants_only() {
        assert_eq!(Expr::Int(3).literal_value(), Some(Value::Int(3)));
        assert_eq!(Expr::Symbol(1).literal_value(), None);
    }
}
