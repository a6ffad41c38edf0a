//! String builtins.

use super::{defined, int_arg, list_arg, strict, string_arg, text_of, Outcome};
use crate::context::EvalContext;
use crate::value::Value;
use std::cmp::Ordering;

pub fn strcat(args: &[Value], _: &EvalContext) -> Outcome {
    defined(args)?;
    let mut out = String::new();
    for arg in args {
        out.push_str(&text_of(arg)?);
    }
    Ok(Value::String(out))
}

/// `join(list)`, `join(sep, list)` or `join(sep, v1, v2, ...)`.
/// `Undefined` list elements are skipped.
pub fn join(args: &[Value], _: &EvalContext) -> Outcome {
    defined(args)?;
    let (separator, items): (&str, &[Value]) = match args {
        [] => return Err(Value::Error),
        [list] => ("", list_arg(list)?),
        [sep, Value::List(list)] => (string_arg(sep)?, list.as_slice()),
        [sep, rest @ ..] => (string_arg(sep)?, rest),
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Undefined => {}
            other => parts.push(text_of(other)?),
        }
    }
    Ok(Value::String(parts.join(separator)))
}

/// `substr(s, offset [, length])`, counted in characters. A negative offset
/// counts from the end; a negative length stops that many characters before
/// the end.
pub fn substr(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 3)?;
    let chars: Vec<char> = string_arg(&args[0])?.chars().collect();
    let len = chars.len() as i64;
    let mut start = int_arg(&args[1])?;
    if start < 0 {
        start = (len + start).max(0);
    }
    let start = start.min(len);
    let end = match args.get(2) {
        None => len,
        Some(length) => {
            let length = int_arg(length)?;
            if length < 0 {
                (len + length).max(start)
            } else {
                start.saturating_add(length).min(len)
            }
        }
    };
    Ok(Value::String(
        chars[start as usize..end as usize].iter().collect(),
    ))
}

fn ordering_value(ordering: Ordering) -> Value {
    Value::Integer(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

pub fn strcmp(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 2)?;
    Ok(ordering_value(text_of(&args[0])?.cmp(&text_of(&args[1])?)))
}

pub fn stricmp(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 2)?;
    let a = text_of(&args[0])?.to_ascii_lowercase();
    let b = text_of(&args[1])?.to_ascii_lowercase();
    Ok(ordering_value(a.cmp(&b)))
}

pub fn to_upper(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    Ok(Value::String(text_of(&args[0])?.to_uppercase()))
}

pub fn to_lower(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    Ok(Value::String(text_of(&args[0])?.to_lowercase()))
}

/// Length of a string (in characters), list, or record.
pub fn size(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Record(ad) => ad.len(),
        _ => return Err(Value::Error),
    };
    Ok(Value::Integer(n as i64))
}

/// Default separators for `split` and the `stringList*` family.
pub(crate) const DEFAULT_DELIMITERS: &str = " ,";

/// Split on any of `delimiters`, dropping empty pieces.
pub(crate) fn split_tokens<'a>(text: &'a str, delimiters: &str) -> Vec<&'a str> {
    text.split(|c| delimiters.contains(c))
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn split(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 2)?;
    let text = string_arg(&args[0])?;
    let delimiters = match args.get(1) {
        Some(d) => string_arg(d)?,
        None => DEFAULT_DELIMITERS,
    };
    let tokens = split_tokens(text, delimiters)
        .into_iter()
        .map(Value::from)
        .collect();
    Ok(Value::list(tokens))
}

fn split_at_sign(args: &[Value], missing_is_user: bool) -> Outcome {
    strict(args, 1, 1)?;
    let text = string_arg(&args[0])?;
    let (first, second) = match text.split_once('@') {
        Some((a, b)) => (a, b),
        None if missing_is_user => (text, ""),
        None => ("", text),
    };
    Ok(Value::list(vec![Value::from(first), Value::from(second)]))
}

/// `"user@domain"` → `{"user", "domain"}`; without `@` the domain is empty.
pub fn split_user_name(args: &[Value], _: &EvalContext) -> Outcome {
    split_at_sign(args, true)
}

/// `"slot1@host"` → `{"slot1", "host"}`; without `@` the slot is empty.
pub fn split_slot_name(args: &[Value], _: &EvalContext) -> Outcome {
    split_at_sign(args, false)
}

// ── Version comparison ──────────────────────────────────────────────

/// Compare strings character by character, except that maximal runs of
/// digits compare by numeric value. When two runs have the same value, the
/// one with more leading zeros sorts first.
pub(crate) fn version_compare(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let run_a = digit_run(a, i);
            let run_b = digit_run(b, j);
            let ordering = compare_digit_runs(&a[i..run_a], &b[j..run_b]);
            if ordering != Ordering::Equal {
                return ordering;
            }
            i = run_a;
            j = run_b;
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                other => return other,
            }
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run(s: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < s.len() && s[end].is_ascii_digit() {
        end += 1;
    }
    end
}

fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let strip = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let (zeros_a, zeros_b) = (strip(a), strip(b));
    let (value_a, value_b) = (&a[zeros_a..], &b[zeros_b..]);
    value_a
        .len()
        .cmp(&value_b.len())
        .then_with(|| value_a.cmp(value_b))
        // more leading zeros is smaller
        .then_with(|| zeros_b.cmp(&zeros_a))
}

fn version_args(args: &[Value]) -> Result<Ordering, Value> {
    strict(args, 2, 2)?;
    Ok(version_compare(string_arg(&args[0])?, string_arg(&args[1])?))
}

pub fn versioncmp(args: &[Value], _: &EvalContext) -> Outcome {
    version_args(args).map(ordering_value)
}

pub fn version_gt(args: &[Value], _: &EvalContext) -> Outcome {
    version_args(args).map(|o| Value::Boolean(o == Ordering::Greater))
}

pub fn version_lt(args: &[Value], _: &EvalContext) -> Outcome {
    version_args(args).map(|o| Value::Boolean(o == Ordering::Less))
}

pub fn version_ge(args: &[Value], _: &EvalContext) -> Outcome {
    version_args(args).map(|o| Value::Boolean(o != Ordering::Less))
}

pub fn version_le(args: &[Value], _: &EvalContext) -> Outcome {
    version_args(args).map(|o| Value::Boolean(o != Ordering::Greater))
}

pub fn version_eq(args: &[Value], _: &EvalContext) -> Outcome {
    version_args(args).map(|o| Value::Boolean(o == Ordering::Equal))
}

/// `version_in_range(v, min, max)`: `min <= v <= max`.
pub fn version_in_range(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 3, 3)?;
    let version = string_arg(&args[0])?;
    let low = string_arg(&args[1])?;
    let high = string_arg(&args[2])?;
    Ok(Value::Boolean(
        version_compare(version, low) != Ordering::Less
            && version_compare(version, high) != Ordering::Greater,
    ))
}
