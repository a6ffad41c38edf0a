//! List aggregates, membership, comparisons, and the `stringList*` family
//! that treats a delimited string as a list.

use super::numeric::{numeric_items, parse_number};
use super::strings::{split_tokens, DEFAULT_DELIMITERS};
use super::{list_arg, strict, string_arg, Outcome};
use crate::ast::BinaryOp;
use crate::context::EvalContext;
use crate::operators::{compare, equal, evaluate_binary, identical};
use crate::value::Value;
use std::cmp::Ordering;

// ── Aggregates ──────────────────────────────────────────────────────

/// Sum of numeric items; integer unless a real was seen.
fn total(items: &[Value]) -> Value {
    let mut int_sum: i64 = 0;
    let mut real_sum = 0.0;
    let mut saw_real = false;
    for item in items {
        match item {
            Value::Integer(i) => {
                int_sum = int_sum.wrapping_add(*i);
                real_sum += *i as f64;
            }
            Value::Real(r) => {
                saw_real = true;
                real_sum += r;
            }
            _ => {}
        }
    }
    if saw_real {
        Value::Real(real_sum)
    } else {
        Value::Integer(int_sum)
    }
}

fn mean(items: &[Value]) -> Value {
    if items.is_empty() {
        return Value::Undefined;
    }
    let sum: f64 = items.iter().filter_map(Value::as_f64).sum();
    Value::Real(sum / items.len() as f64)
}

/// Smallest (`want == Less`) or largest item; real if any real was seen.
fn extreme(items: &[Value], want: Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for item in items {
        best = match best {
            Some(current) if compare(item, current) != Some(want) => Some(current),
            _ => Some(item),
        };
    }
    let saw_real = items.iter().any(|v| matches!(v, Value::Real(_)));
    match best {
        None => Value::Undefined,
        Some(v) if saw_real => v.as_f64().map_or(Value::Error, Value::Real),
        Some(v) => v.clone(),
    }
}

pub fn sum(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    Ok(total(&numeric_items(&args[0])?))
}

pub fn avg(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    Ok(mean(&numeric_items(&args[0])?))
}

pub fn min(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    Ok(extreme(&numeric_items(&args[0])?, Ordering::Less))
}

pub fn max(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    Ok(extreme(&numeric_items(&args[0])?, Ordering::Greater))
}

// ── Membership ──────────────────────────────────────────────────────

fn scalar(value: &Value) -> Result<&Value, Value> {
    match value {
        Value::List(_) | Value::Record(_) => Err(Value::Error),
        other => Ok(other),
    }
}

/// `member(x, list)`: some element `== x`. `Undefined` elements are skipped.
pub fn member(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 2)?;
    let needle = scalar(&args[0])?;
    let mut found = false;
    for item in list_arg(&args[1])? {
        match equal(needle, item) {
            Value::Boolean(b) => found |= b,
            Value::Undefined => {}
            _ => return Err(Value::Error),
        }
    }
    Ok(Value::Boolean(found))
}

/// `identicalMember(x, list)`: some element `is x`.
pub fn identical_member(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 2)?;
    let needle = scalar(&args[0])?;
    let items = list_arg(&args[1])?;
    Ok(Value::Boolean(items.iter().any(|item| identical(needle, item))))
}

// ── anyCompare / allCompare ─────────────────────────────────────────

fn comparison_op(symbol: &str) -> Result<BinaryOp, Value> {
    match symbol {
        "<" => Ok(BinaryOp::Lt),
        "<=" => Ok(BinaryOp::Le),
        "==" => Ok(BinaryOp::Eq),
        "!=" => Ok(BinaryOp::Ne),
        ">=" => Ok(BinaryOp::Ge),
        ">" => Ok(BinaryOp::Gt),
        _ => Err(Value::Error),
    }
}

/// Outcomes of `element <op> target` for every defined element.
fn compare_each(args: &[Value]) -> Result<Vec<bool>, Value> {
    strict(args, 3, 3)?;
    let op = comparison_op(string_arg(&args[0])?)?;
    let target = &args[2];
    let mut results = Vec::new();
    for item in list_arg(&args[1])? {
        if item.is_undefined() {
            continue;
        }
        match evaluate_binary(op, item, target) {
            Value::Boolean(b) => results.push(b),
            _ => return Err(Value::Error),
        }
    }
    Ok(results)
}

/// `anyCompare(op, list, target)`
pub fn any_compare(args: &[Value], _: &EvalContext) -> Outcome {
    Ok(Value::Boolean(compare_each(args)?.into_iter().any(|b| b)))
}

/// `allCompare(op, list, target)`; vacuously true for an empty list.
pub fn all_compare(args: &[Value], _: &EvalContext) -> Outcome {
    Ok(Value::Boolean(compare_each(args)?.into_iter().all(|b| b)))
}

// ── Delimited string lists ──────────────────────────────────────────

/// The tokens of `args[index]` split on `args[index + 1]` (or the default
/// delimiters when that argument is absent).
fn tokens(args: &[Value], index: usize) -> Result<Vec<String>, Value> {
    let list = string_arg(&args[index])?;
    let delimiters = match args.get(index + 1) {
        Some(d) => string_arg(d)?,
        None => DEFAULT_DELIMITERS,
    };
    Ok(split_tokens(list, delimiters)
        .into_iter()
        .map(str::to_string)
        .collect())
}

fn numeric_tokens(args: &[Value]) -> Result<Vec<Value>, Value> {
    strict(args, 1, 2)?;
    tokens(args, 0)?
        .iter()
        .map(|t| parse_number(t).ok_or(Value::Error))
        .collect()
}

pub fn string_list_size(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 2)?;
    Ok(Value::Integer(tokens(args, 0)?.len() as i64))
}

pub fn string_list_sum(args: &[Value], _: &EvalContext) -> Outcome {
    Ok(total(&numeric_tokens(args)?))
}

pub fn string_list_avg(args: &[Value], _: &EvalContext) -> Outcome {
    Ok(mean(&numeric_tokens(args)?))
}

pub fn string_list_min(args: &[Value], _: &EvalContext) -> Outcome {
    Ok(extreme(&numeric_tokens(args)?, Ordering::Less))
}

pub fn string_list_max(args: &[Value], _: &EvalContext) -> Outcome {
    Ok(extreme(&numeric_tokens(args)?, Ordering::Greater))
}

fn list_member(args: &[Value], fold_case: bool) -> Outcome {
    strict(args, 2, 3)?;
    let needle = string_arg(&args[0])?;
    let found = tokens(args, 1)?.iter().any(|t| {
        if fold_case {
            t.eq_ignore_ascii_case(needle)
        } else {
            t == needle
        }
    });
    Ok(Value::Boolean(found))
}

/// `stringListMember(x, list [, delimiters])`, case-sensitive.
pub fn string_list_member(args: &[Value], _: &EvalContext) -> Outcome {
    list_member(args, false)
}

/// `stringListIMember(x, list [, delimiters])`, case-insensitive.
pub fn string_list_imember(args: &[Value], _: &EvalContext) -> Outcome {
    list_member(args, true)
}

/// Tokens of `args[0]` and `args[1]`, both split on the optional `args[2]`.
fn token_pair(args: &[Value]) -> Result<(Vec<String>, Vec<String>), Value> {
    strict(args, 2, 3)?;
    let delimiters = args.get(2).cloned();
    let with_delims = |list: &Value| -> Vec<Value> {
        let mut v = vec![list.clone()];
        v.extend(delimiters.clone());
        v
    };
    Ok((
        tokens(&with_delims(&args[0]), 0)?,
        tokens(&with_delims(&args[1]), 0)?,
    ))
}

fn contains(haystack: &[String], needle: &str, fold_case: bool) -> bool {
    haystack.iter().any(|t| {
        if fold_case {
            t.eq_ignore_ascii_case(needle)
        } else {
            t == needle
        }
    })
}

/// `stringListsIntersect(a, b [, delimiters])`: the lists share a token.
pub fn string_lists_intersect(args: &[Value], _: &EvalContext) -> Outcome {
    let (a, b) = token_pair(args)?;
    Ok(Value::Boolean(a.iter().any(|t| contains(&b, t, false))))
}

/// `stringListSubsetMatch(a, b [, delimiters])`: every token of `a` is in `b`.
pub fn string_list_subset_match(args: &[Value], _: &EvalContext) -> Outcome {
    let (a, b) = token_pair(args)?;
    Ok(Value::Boolean(a.iter().all(|t| contains(&b, t, false))))
}

/// Case-insensitive `stringListSubsetMatch`.
pub fn string_list_isubset_match(args: &[Value], _: &EvalContext) -> Outcome {
    let (a, b) = token_pair(args)?;
    Ok(Value::Boolean(a.iter().all(|t| contains(&b, t, true))))
}
