//! Arithmetic, comparison and unary operators.
//!
//! Int/int and float/float take a direct path. Every other pair is first
//! resolved into an [`Operand`] (int, float, string or bool) and dispatched
//! on that; anything the resolver does not cover can only be compared for
//! identity with `==`/`!=`.

use std::cmp::Ordering;

use vine_ir::ast::{BinaryOp, UnaryOp};

use crate::errors::{
    division_by_zero, integer_overflow, invalid_operand, invalid_operands, EvalResult,
};
use crate::value::Value;

/// A value normalized for arithmetic and comparison.
#[derive(Copy, Clone, Debug)]
enum Operand<'a> {
    Int(i64),
    Float(f64),
    Str(&'a str),
    Bool(bool),
}

fn resolve(value: &Value) -> Option<Operand<'_>> {
    match value {
        Value::Int(n) => Some(Operand::Int(*n)),
        Value::Float(x) => Some(Operand::Float(*x)),
        Value::Str(s) => Some(Operand::Str(s)),
        Value::Bool(b) => Some(Operand::Bool(*b)),
        _ => None,
    }
}

#[expect(clippy::cast_precision_loss, reason = "int/float promotion is lossy by definition")]
#[inline]
fn promote(n: i64) -> f64 {
    n as f64
}

/// Evaluate `left op right`.
pub fn evaluate_binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_binary(op, *a, *b),
        _ => match (resolve(left), resolve(right)) {
            (Some(a), Some(b)) => resolved_binary(op, a, b, left, right),
            _ => identity_binary(op, left, right),
        },
    }
}

/// `==` semantics, shared with `switch` case matching.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    matches!(
        evaluate_binary(BinaryOp::Eq, left, right),
        Ok(Value::Bool(true))
    )
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> EvalResult {
    let checked = |result: Option<i64>| result.map(Value::Int).ok_or_else(|| integer_overflow(op));
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mul => checked(a.checked_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(division_by_zero());
            }
            // Exact quotients stay integers; anything else becomes a float.
            match a.checked_rem(b) {
                Some(0) => checked(a.checked_div(b)),
                Some(_) => Ok(Value::Float(promote(a) / promote(b))),
                None => Err(integer_overflow(op)),
            }
        }
        BinaryOp::Rem => {
            if b == 0 {
                return Err(division_by_zero());
            }
            checked(a.checked_rem(b))
        }
        _ => Ok(Value::Bool(compare(op, a.cmp(&b)))),
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => Err(division_by_zero()),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Rem => Ok(Value::Float(a % b)),
        // NaN is unordered: only `!=` holds.
        _ => Ok(Value::Bool(match a.partial_cmp(&b) {
            Some(ordering) => compare(op, ordering),
            None => op == BinaryOp::NotEq,
        })),
    }
}

fn resolved_binary(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    left: &Value,
    right: &Value,
) -> EvalResult {
    match (a, b) {
        (Operand::Int(a), Operand::Int(b)) => int_binary(op, a, b),
        (Operand::Float(a), Operand::Float(b)) => float_binary(op, a, b),
        (Operand::Int(a), Operand::Float(b)) => float_binary(op, promote(a), b),
        (Operand::Float(a), Operand::Int(b)) => float_binary(op, a, promote(b)),
        (Operand::Str(a), Operand::Str(b)) => match op {
            BinaryOp::Add => Ok(Value::string(format!("{a}{b}"))),
            _ if op.is_comparison() => Ok(Value::Bool(compare(op, a.cmp(b)))),
            _ => Err(mismatch(op, left, right)),
        },
        (Operand::Str(_), Operand::Int(_) | Operand::Float(_))
        | (Operand::Int(_) | Operand::Float(_), Operand::Str(_))
            if op == BinaryOp::Add =>
        {
            Ok(Value::string(format!("{left}{right}")))
        }
        (Operand::Bool(a), Operand::Bool(b)) => match op {
            BinaryOp::Eq => Ok(Value::Bool(a == b)),
            BinaryOp::NotEq => Ok(Value::Bool(a != b)),
            _ => Err(mismatch(op, left, right)),
        },
        _ => identity_binary(op, left, right),
    }
}

/// Operands outside the resolver, or of different kinds: only `==`/`!=`.
fn identity_binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn compare(op: BinaryOp, ordering: Ordering) -> bool {
    match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::NotEq => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => false,
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> crate::errors::EvalError {
    invalid_operands(op.as_symbol(), left.type_name(), right.type_name())
}

/// Evaluate a prefix `-` or `!`.
pub fn evaluate_unary(op: UnaryOp, operand: &Value) -> EvalResult {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow(BinaryOp::Sub)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(invalid_operand(op.as_symbol(), operand.type_name())),
    }
}
