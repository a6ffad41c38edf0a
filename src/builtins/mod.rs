//! Builtin function catalog.
//!
//! Every builtin receives its arguments fully evaluated. Unless a function
//! says otherwise: a wrong argument count or type is `Error`, an `Error`
//! argument yields `Error`, and an `Undefined` argument yields `Undefined`.
//! Function names are matched case-insensitively.
//!
//! Builtins return `Outcome`; the `Err` side carries an early result
//! (`Error` or `Undefined`) so argument checks can use `?`.

mod lists;
mod numeric;
mod patterns;
mod strings;
mod time;

use crate::context::EvalContext;
use crate::value::Value;

pub(crate) type Outcome = Result<Value, Value>;

pub type BuiltinFn = fn(&[Value], &EvalContext) -> Outcome;

pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
    /// False for functions that read the clock or the random source; their
    /// calls are never folded into literals.
    pub deterministic: bool,
}

impl Builtin {
    pub fn call(&self, args: &[Value], context: &EvalContext) -> Value {
        (self.func)(args, context).unwrap_or_else(|early| early)
    }
}

const fn pure(name: &'static str, func: BuiltinFn) -> Builtin {
    Builtin {
        name,
        func,
        deterministic: true,
    }
}

const fn impure(name: &'static str, func: BuiltinFn) -> Builtin {
    Builtin {
        name,
        func,
        deterministic: false,
    }
}

static BUILTINS: &[Builtin] = &[
    // type predicates
    pure("isUndefined", numeric::is_undefined),
    pure("isError", numeric::is_error),
    pure("isString", numeric::is_string),
    pure("isInteger", numeric::is_integer),
    pure("isReal", numeric::is_real),
    pure("isBoolean", numeric::is_boolean),
    pure("isList", numeric::is_list),
    pure("isClassAd", numeric::is_classad),
    // conversion and math
    pure("int", numeric::int),
    pure("real", numeric::real),
    pure("string", numeric::string),
    pure("bool", numeric::bool),
    pure("floor", numeric::floor),
    pure("ceiling", numeric::ceiling),
    pure("round", numeric::round),
    pure("pow", numeric::pow),
    pure("abs", numeric::abs),
    pure("quantize", numeric::quantize),
    impure("random", numeric::random),
    pure("ifThenElse", numeric::if_then_else),
    // strings
    pure("strcat", strings::strcat),
    pure("join", strings::join),
    pure("substr", strings::substr),
    pure("strcmp", strings::strcmp),
    pure("stricmp", strings::stricmp),
    pure("toUpper", strings::to_upper),
    pure("toLower", strings::to_lower),
    pure("size", strings::size),
    pure("split", strings::split),
    pure("splitUserName", strings::split_user_name),
    pure("splitSlotName", strings::split_slot_name),
    pure("versioncmp", strings::versioncmp),
    pure("versionGT", strings::version_gt),
    pure("versionLT", strings::version_lt),
    pure("versionGE", strings::version_ge),
    pure("versionLE", strings::version_le),
    pure("versionEQ", strings::version_eq),
    pure("version_in_range", strings::version_in_range),
    // regular expressions
    pure("regexp", patterns::regexp),
    pure("regexpMember", patterns::regexp_member),
    pure("regexps", patterns::regexps),
    pure("replace", patterns::replace),
    pure("replaceAll", patterns::replace_all),
    pure("stringListRegexpMember", patterns::string_list_regexp_member),
    // delimited string lists
    pure("stringListSize", lists::string_list_size),
    pure("stringListSum", lists::string_list_sum),
    pure("stringListAvg", lists::string_list_avg),
    pure("stringListMin", lists::string_list_min),
    pure("stringListMax", lists::string_list_max),
    pure("stringListMember", lists::string_list_member),
    pure("stringListIMember", lists::string_list_imember),
    pure("stringListsIntersect", lists::string_lists_intersect),
    pure("stringListSubsetMatch", lists::string_list_subset_match),
    pure("stringListISubsetMatch", lists::string_list_isubset_match),
    // lists
    pure("member", lists::member),
    pure("identicalMember", lists::identical_member),
    pure("sum", lists::sum),
    pure("avg", lists::avg),
    pure("min", lists::min),
    pure("max", lists::max),
    pure("anyCompare", lists::any_compare),
    pure("allCompare", lists::all_compare),
    // time
    impure("time", time::time),
    impure("formatTime", time::format_time),
    pure("interval", time::interval),
];

/// Find a builtin by name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

// ── Argument helpers ────────────────────────────────────────────────

/// `Err(Error)` unless `min <= args.len() <= max`.
pub(crate) fn arity(args: &[Value], min: usize, max: usize) -> Result<(), Value> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(Value::Error)
    }
}

/// Uniform propagation: any `Error` argument wins, then any `Undefined`.
pub(crate) fn defined(args: &[Value]) -> Result<(), Value> {
    if args.iter().any(Value::is_error) {
        return Err(Value::Error);
    }
    if args.iter().any(Value::is_undefined) {
        return Err(Value::Undefined);
    }
    Ok(())
}

/// `arity` followed by `defined`.
pub(crate) fn strict(args: &[Value], min: usize, max: usize) -> Result<(), Value> {
    arity(args, min, max)?;
    defined(args)
}

pub(crate) fn string_arg(value: &Value) -> Result<&str, Value> {
    value.as_str().ok_or(Value::Error)
}

pub(crate) fn int_arg(value: &Value) -> Result<i64, Value> {
    value.as_int().ok_or(Value::Error)
}

pub(crate) fn number_arg(value: &Value) -> Result<f64, Value> {
    value.as_f64().ok_or(Value::Error)
}

pub(crate) fn list_arg(value: &Value) -> Result<&[Value], Value> {
    value.as_list().ok_or(Value::Error)
}

/// Text form of a scalar, as used by `strcat` and friends: strings as-is,
/// numbers and booleans in their literal spelling. Lists, records,
/// `Undefined` and `Error` have no text form.
pub(crate) fn text_of(value: &Value) -> Result<String, Value> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(_) | Value::Real(_) | Value::Boolean(_) => Ok(value.to_string()),
        _ => Err(Value::Error),
    }
}

#[cfg(test)]
pub(crate) fn call(name: &str, args: &[Value]) -> Value {
    let context = EvalContext::new(
        crate::context::FixedClock::utc(1_700_000_000),
        crate::context::SeededRandom::new(7),
    );
    match lookup(name) {
        Some(builtin) => builtin.call(args, &context),
        None => Value::Error,
    }
}
