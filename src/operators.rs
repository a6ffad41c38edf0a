//! Operator semantics over evaluated values.
//!
//! Direct `match` dispatch on the operand pair; the value set is closed, so
//! every combination that is not listed falls through to `Error`.

use crate::ast::{BinaryOp, UnaryOp};
use crate::value::Value;
use std::cmp::Ordering;

/// Absolute tolerance for integer/real equality.
pub const NUMERIC_TOLERANCE: f64 = 1e-9;

/// Apply a binary operator to two already-evaluated operands.
pub fn evaluate_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::And => logical_and(left, right),
        BinaryOp::Or => logical_or(left, right),
        BinaryOp::Eq => equal(left, right),
        BinaryOp::Ne => negate(equal(left, right)),
        BinaryOp::Is => Value::Boolean(identical(left, right)),
        BinaryOp::Isnt => Value::Boolean(!identical(left, right)),
        _ => {
            if left.is_error() || right.is_error() {
                return Value::Error;
            }
            if left.is_undefined() || right.is_undefined() {
                return Value::Undefined;
            }
            match op {
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                    arithmetic(op, left, right)
                }
                BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                    relational(op, left, right)
                }
                _ => bitwise(op, left, right),
            }
        }
    }
}

pub fn evaluate_unary(op: UnaryOp, operand: &Value) -> Value {
    match (op, operand) {
        (_, Value::Error) => Value::Error,
        (_, Value::Undefined) => Value::Undefined,
        (UnaryOp::Neg, Value::Integer(i)) => Value::Integer(i.wrapping_neg()),
        (UnaryOp::Neg, Value::Real(r)) => Value::Real(-r),
        (UnaryOp::Plus, Value::Integer(_) | Value::Real(_)) => operand.clone(),
        (UnaryOp::Not, Value::Boolean(b)) => Value::Boolean(!b),
        (UnaryOp::BitNot, Value::Integer(i)) => Value::Integer(!i),
        _ => Value::Error,
    }
}

// ── Logical ─────────────────────────────────────────────────────────

/// `&&` over two fully evaluated operands.
///
/// Error on either side wins, even when the other side is a decisive
/// `false`. Otherwise a `false` decides without the other side needing to
/// be Boolean, then Undefined propagates, then both must be Boolean.
pub fn logical_and(left: &Value, right: &Value) -> Value {
    logical(left, right, false)
}

/// `||` over two fully evaluated operands; see `logical_and`.
pub fn logical_or(left: &Value, right: &Value) -> Value {
    logical(left, right, true)
}

fn logical(left: &Value, right: &Value, decisive: bool) -> Value {
    if left.is_error() || right.is_error() {
        return Value::Error;
    }
    if left.as_bool() == Some(decisive) || right.as_bool() == Some(decisive) {
        return Value::Boolean(decisive);
    }
    if left.is_undefined() || right.is_undefined() {
        return Value::Undefined;
    }
    match (left, right) {
        (Value::Boolean(_), Value::Boolean(_)) => Value::Boolean(!decisive),
        _ => Value::Error,
    }
}

// ── Equality ────────────────────────────────────────────────────────

/// `==`.
pub fn equal(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Error, Value::Error) | (Value::Undefined, Value::Undefined) => {
            Value::Boolean(true)
        }
        (Value::Error, _) | (_, Value::Error) => Value::Error,
        (Value::Undefined, _) | (_, Value::Undefined) => Value::Undefined,
        (Value::Integer(a), Value::Integer(b)) => Value::Boolean(a == b),
        (Value::Real(a), Value::Real(b)) => Value::Boolean(a == b),
        (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
            Value::Boolean((*a as f64 - b).abs() < NUMERIC_TOLERANCE)
        }
        (Value::Boolean(a), Value::Boolean(b)) => Value::Boolean(a == b),
        (Value::String(a), Value::String(b)) => Value::Boolean(a.eq_ignore_ascii_case(b)),
        (Value::List(_), Value::List(_)) | (Value::Record(_), Value::Record(_)) => Value::Error,
        _ => Value::Boolean(false),
    }
}

/// `is`: same type and same value. Strings compare case-sensitively,
/// records by identity.
pub fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Error, Value::Error) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Real(a), Value::Real(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| identical(x, y))
        }
        (Value::Record(a), Value::Record(b)) => a.ptr_eq(b),
        _ => false,
    }
}

fn negate(value: Value) -> Value {
    match value {
        Value::Boolean(b) => Value::Boolean(!b),
        other => other,
    }
}

// ── Arithmetic ──────────────────────────────────────────────────────

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => real_arithmetic(op, a, b),
            _ => Value::Error,
        },
    }
}

fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> Value {
    match op {
        BinaryOp::Add => Value::Integer(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Integer(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Integer(a.wrapping_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                Value::Error
            } else if a.wrapping_rem(b) == 0 {
                Value::Integer(a.wrapping_div(b))
            } else {
                Value::Real(a as f64 / b as f64)
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Value::Error
            } else {
                Value::Integer(a.wrapping_rem(b))
            }
        }
        _ => Value::Error,
    }
}

fn real_arithmetic(op: BinaryOp, a: f64, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Real(a + b),
        BinaryOp::Sub => Value::Real(a - b),
        BinaryOp::Mul => Value::Real(a * b),
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => Value::Error,
        BinaryOp::Div => Value::Real(a / b),
        BinaryOp::Mod => Value::Real(a % b),
        _ => Value::Error,
    }
}

// ── Comparison ──────────────────────────────────────────────────────

/// Ordering used by `<`, `<=`, `>`, `>=`: numbers (promoted to real when
/// mixed) and strings (case-insensitive). `None` for anything else.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => {
            Some(a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

fn relational(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let Some(ordering) = compare(left, right) else {
        return Value::Error;
    };
    Value::Boolean(match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    })
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let (Value::Integer(a), Value::Integer(b)) = (left, right) else {
        return Value::Error;
    };
    let (a, b) = (*a, *b);
    match op {
        BinaryOp::BitAnd => Value::Integer(a & b),
        BinaryOp::BitOr => Value::Integer(a | b),
        BinaryOp::BitXor => Value::Integer(a ^ b),
        BinaryOp::Shl => Value::Integer(a.wrapping_shl(b as u32)),
        BinaryOp::Shr => Value::Integer(a.wrapping_shr(b as u32)),
        BinaryOp::Ushr => Value::Integer((a as u64).wrapping_shr(b as u32) as i64),
        _ => Value::Error,
    }
}
