//! Regular-expression builtins.
//!
//! Option letters: `i` case-insensitive, `m` multi-line anchors, `s` dot
//! matches newline, `x` ignore pattern whitespace, `f` the pattern must
//! match the whole target, `g` substitute every match. Unknown letters are
//! ignored. An invalid pattern evaluates to `Error`.

use super::strings::{split_tokens, DEFAULT_DELIMITERS};
use super::{list_arg, strict, string_arg, Outcome};
use crate::context::EvalContext;
use crate::value::Value;
use regex::{Captures, Regex, RegexBuilder};

fn option_letters(options: Option<&Value>) -> Result<&str, Value> {
    match options {
        Some(o) => string_arg(o),
        None => Ok(""),
    }
}

fn compile(pattern: &str, options: Option<&Value>) -> Result<Regex, Value> {
    let options = option_letters(options)?;
    let anchored;
    let pattern = if options.contains(['f', 'F']) {
        anchored = format!("^(?:{pattern})$");
        anchored.as_str()
    } else {
        pattern
    };
    let mut builder = RegexBuilder::new(pattern);
    for flag in options.chars() {
        match flag.to_ascii_lowercase() {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            _ => &mut builder,
        };
    }
    builder.build().map_err(|err| {
        tracing::debug!(%pattern, %err, "invalid regular expression");
        Value::Error
    })
}

/// Expand `\0`..`\9` in `substitute` with the corresponding capture group;
/// `\\` is a literal backslash.
fn expand(captures: &Captures<'_>, substitute: &str) -> String {
    let mut out = String::new();
    let mut chars = substitute.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some(d) if d.is_ascii_digit() => {
                chars.next();
                let group = d.to_digit(10).unwrap_or(0) as usize;
                if let Some(m) = captures.get(group) {
                    out.push_str(m.as_str());
                }
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// `regexp(pattern, target [, options])`
pub fn regexp(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 3)?;
    let re = compile(string_arg(&args[0])?, args.get(2))?;
    Ok(Value::Boolean(re.is_match(string_arg(&args[1])?)))
}

/// `regexpMember(pattern, list [, options])`: any string element matches.
/// `Undefined` elements are skipped.
pub fn regexp_member(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 3)?;
    let re = compile(string_arg(&args[0])?, args.get(2))?;
    let mut found = false;
    for item in list_arg(&args[1])? {
        match item {
            Value::Undefined => {}
            Value::String(s) => found |= re.is_match(s),
            _ => return Err(Value::Error),
        }
    }
    Ok(Value::Boolean(found))
}

/// `regexps(pattern, target, substitute [, options])`: the substitute with
/// the first match's groups expanded, or `""` when nothing matches.
pub fn regexps(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 3, 4)?;
    let re = compile(string_arg(&args[0])?, args.get(3))?;
    let target = string_arg(&args[1])?;
    let substitute = string_arg(&args[2])?;
    Ok(Value::String(match re.captures(target) {
        Some(captures) => expand(&captures, substitute),
        None => String::new(),
    }))
}

fn substitute_matches(args: &[Value], all: bool) -> Outcome {
    strict(args, 3, 4)?;
    let re = compile(string_arg(&args[0])?, args.get(3))?;
    let target = string_arg(&args[1])?;
    let substitute = string_arg(&args[2])?;
    let all = all || option_letters(args.get(3))?.contains(['g', 'G']);
    let mut out = String::new();
    let mut last = 0;
    for captures in re.captures_iter(target) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        out.push_str(&target[last..whole.start()]);
        out.push_str(&expand(&captures, substitute));
        last = whole.end();
        if !all {
            break;
        }
    }
    out.push_str(&target[last..]);
    Ok(Value::String(out))
}

/// `replace(pattern, target, substitute [, options])`: replace the first match.
pub fn replace(args: &[Value], _: &EvalContext) -> Outcome {
    substitute_matches(args, false)
}

/// `replaceAll(pattern, target, substitute [, options])`: replace every match.
pub fn replace_all(args: &[Value], _: &EvalContext) -> Outcome {
    substitute_matches(args, true)
}

/// `stringListRegexpMember(pattern, list [, delimiters [, options]])`
pub fn string_list_regexp_member(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 2, 4)?;
    let delimiters = match args.get(2) {
        Some(d) => string_arg(d)?,
        None => DEFAULT_DELIMITERS,
    };
    let re = compile(string_arg(&args[0])?, args.get(3))?;
    let list = string_arg(&args[1])?;
    Ok(Value::Boolean(
        split_tokens(list, delimiters).iter().any(|t| re.is_match(t)),
    ))
}
