//! Type predicates, conversions, arithmetic helpers and `ifThenElse`.

use super::{arity, defined, list_arg, number_arg, strict, text_of, Outcome};
use crate::context::EvalContext;
use crate::value::Value;

// ── Predicates ──────────────────────────────────────────────────────
// These inspect their argument as-is, so `Undefined` and `Error` are
// answers here rather than propagated.

fn predicate(args: &[Value], test: fn(&Value) -> bool) -> Outcome {
    arity(args, 1, 1)?;
    Ok(Value::Boolean(test(&args[0])))
}

pub fn is_undefined(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, Value::is_undefined)
}

pub fn is_error(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, Value::is_error)
}

pub fn is_string(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, |v| matches!(v, Value::String(_)))
}

pub fn is_integer(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, |v| matches!(v, Value::Integer(_)))
}

pub fn is_real(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, |v| matches!(v, Value::Real(_)))
}

pub fn is_boolean(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, |v| matches!(v, Value::Boolean(_)))
}

pub fn is_list(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, |v| matches!(v, Value::List(_)))
}

pub fn is_classad(args: &[Value], _: &EvalContext) -> Outcome {
    predicate(args, |v| matches!(v, Value::Record(_)))
}

// ── Conversions ─────────────────────────────────────────────────────

/// Parse numeric text as an integer when it is one, else as a real.
/// Accepts `nan`, `inf` and `-inf` in any case.
pub(crate) fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    match text.to_ascii_lowercase().as_str() {
        "nan" => Some(Value::Real(f64::NAN)),
        "inf" | "+inf" | "infinity" => Some(Value::Real(f64::INFINITY)),
        "-inf" | "-infinity" => Some(Value::Real(f64::NEG_INFINITY)),
        lower if lower.chars().any(|c| c.is_ascii_digit()) => {
            text.parse::<f64>().ok().map(Value::Real)
        }
        _ => None,
    }
}

/// Convert a real to an integer when it is finite and in range.
fn real_to_int(r: f64) -> Value {
    if r.is_finite() && r >= i64::MIN as f64 && r <= i64::MAX as f64 {
        Value::Integer(r as i64)
    } else {
        Value::Real(r)
    }
}

/// Numeric view of a number, boolean or numeric string.
fn coerce_number(value: &Value) -> Result<Value, Value> {
    match value {
        Value::Integer(_) | Value::Real(_) => Ok(value.clone()),
        Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        Value::String(s) => parse_number(s).ok_or(Value::Error),
        _ => Err(Value::Error),
    }
}

pub fn int(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    match coerce_number(&args[0])? {
        Value::Real(r) if r.is_finite() => Ok(Value::Integer(r.trunc() as i64)),
        Value::Real(_) => Err(Value::Error),
        other => Ok(other),
    }
}

pub fn real(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    let n = coerce_number(&args[0])?;
    number_arg(&n).map(Value::Real)
}

pub fn string(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    match &args[0] {
        Value::String(_) => Ok(args[0].clone()),
        Value::List(_) | Value::Record(_) => Ok(Value::String(args[0].to_string())),
        other => text_of(other).map(Value::String),
    }
}

pub fn bool(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    match &args[0] {
        Value::Boolean(b) => Ok(Value::Boolean(*b)),
        Value::Integer(i) => Ok(Value::Boolean(*i != 0)),
        Value::Real(r) => Ok(Value::Boolean(*r != 0.0)),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
        _ => Err(Value::Error),
    }
}

fn rounding(args: &[Value], round: fn(f64) -> f64) -> Outcome {
    strict(args, 1, 1)?;
    match coerce_number(&args[0])? {
        Value::Real(r) => Ok(real_to_int(round(r))),
        other => Ok(other),
    }
}

pub fn floor(args: &[Value], _: &EvalContext) -> Outcome {
    rounding(args, f64::floor)
}

pub fn ceiling(args: &[Value], _: &EvalContext) -> Outcome {
    rounding(args, f64::ceil)
}

pub fn round(args: &[Value], _: &EvalContext) -> Outcome {
    rounding(args, f64::round)
}

pub fn abs(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_abs())),
        Value::Real(r) => Ok(Value::Real(r.abs())),
        _ => Err(Value::Error),
    }
}

/// `pow(base, exponent)`: integer when both are integers and the exponent
/// is non-negative, real otherwise.
pub fn pow(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 2)?;
    match (&args[0], &args[1]) {
        (Value::Integer(base), Value::Integer(exp)) if *exp >= 0 => {
            let exp = u32::try_from(*exp).map_err(|_| Value::Error)?;
            Ok(Value::Integer(base.wrapping_pow(exp)))
        }
        (base, exp) => Ok(Value::Real(number_arg(base)?.powf(number_arg(exp)?))),
    }
}

/// `quantize(a, b)` rounds `a` up to a multiple of `b`;
/// `quantize(a, list)` picks the first list entry `>= a`, or rounds up to a
/// multiple of the last entry when none is large enough.
pub fn quantize(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 2)?;
    let a = &args[0];
    number_arg(a)?;
    match &args[1] {
        Value::List(items) => {
            let mut last = None;
            for item in items.iter() {
                match item {
                    Value::Undefined => continue,
                    Value::Integer(_) | Value::Real(_) => {
                        if number_arg(item)? >= number_arg(a)? {
                            return Ok(numeric_result(a, item, number_arg(item)?));
                        }
                        last = Some(item);
                    }
                    _ => return Err(Value::Error),
                }
            }
            match last {
                Some(step) => round_up(a, step),
                None => Err(Value::Error),
            }
        }
        step @ (Value::Integer(_) | Value::Real(_)) => round_up(a, step),
        _ => Err(Value::Error),
    }
}

fn round_up(a: &Value, step: &Value) -> Outcome {
    let b = number_arg(step)?;
    if b == 0.0 {
        return Err(Value::Error);
    }
    let result = (number_arg(a)? / b).ceil() * b;
    Ok(numeric_result(a, step, result))
}

/// Integer only when both inputs were integers.
fn numeric_result(a: &Value, b: &Value, result: f64) -> Value {
    match (a, b) {
        (Value::Integer(_), Value::Integer(_)) => Value::Integer(result as i64),
        _ => Value::Real(result),
    }
}

/// `random()` is a real in `[0, 1)`; `random(n)` is in `[0, n)` and keeps
/// the type of `n`.
pub fn random(args: &[Value], context: &EvalContext) -> Outcome {
    strict(args, 0, 1)?;
    match args.first() {
        None => Ok(Value::Real(context.random.next_f64())),
        Some(Value::Integer(n)) if *n > 0 => Ok(Value::Integer(context.random.next_below(*n))),
        Some(Value::Real(r)) if *r > 0.0 && r.is_finite() => {
            Ok(Value::Real(context.random.next_f64() * r))
        }
        _ => Err(Value::Error),
    }
}

/// Function form of `?:`. Only the condition propagates `Error` and
/// `Undefined`; the branches are returned as they are.
pub fn if_then_else(args: &[Value], _: &EvalContext) -> Outcome {
    arity(args, 3, 3)?;
    defined(&args[..1])?;
    match &args[0] {
        Value::Boolean(true) => Ok(args[1].clone()),
        Value::Boolean(false) => Ok(args[2].clone()),
        _ => Err(Value::Error),
    }
}

/// Numeric elements of a list for aggregation: `Undefined` entries are
/// skipped, anything else non-numeric is an error.
pub(crate) fn numeric_items(list: &Value) -> Result<Vec<Value>, Value> {
    let mut out = Vec::new();
    for item in list_arg(list)? {
        match item {
            Value::Undefined => {}
            Value::Integer(_) | Value::Real(_) => out.push(item.clone()),
            _ => return Err(Value::Error),
        }
    }
    Ok(out)
}
