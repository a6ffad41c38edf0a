use super::{int_arg, strict, string_arg, Outcome};
use crate::context::EvalContext;
use crate::value::Value;
use chrono::format::{Item, StrftimeItems};
use chrono::DateTime;
use std::fmt::Write;

/// Current time in seconds since the epoch.
pub fn time(args: &[Value], context: &EvalContext) -> Outcome {
    strict(args, 0, 0)?;
    Ok(Value::Integer(context.clock.now()))
}

/// `formatTime([t [, format]])`: strftime-style rendering of `t` (default:
/// now) in the clock's local offset. The default format is `%c`.
pub fn format_time(args: &[Value], context: &EvalContext) -> Outcome {
    strict(args, 0, 2)?;
    let seconds = match args.first() {
        Some(t) => int_arg(t)?,
        None => context.clock.now(),
    };
    let format = match args.get(1) {
        Some(f) => string_arg(f)?,
        None => "%c",
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(Value::Error);
    }
    let instant = DateTime::from_timestamp(seconds, 0)
        .ok_or(Value::Error)?
        .with_timezone(&context.clock.local_offset());
    let mut out = String::new();
    write!(out, "{}", instant.format_with_items(items.iter())).map_err(|_| Value::Error)?;
    Ok(Value::String(out))
}

/// `interval(seconds)`: `D+HH:MM:SS`, `H:MM:SS`, `M:SS` or `0:SS`,
/// whichever is shortest.
pub fn interval(args: &[Value], _: &EvalContext) -> Outcome {
    strict(args, 1, 1)?;
    Ok(Value::String(format_interval(int_arg(&args[0])?)))
}

fn format_interval(total: i64) -> String {
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, minutes, seconds) = (rest / 3600, rest % 3600 / 60, rest % 60);
    if days > 0 {
        format!("{sign}{days}+{hours:02}:{minutes:02}:{seconds:02}")
    } else if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{seconds:02}")
    } else if minutes > 0 {
        format!("{sign}{minutes}:{seconds:02}")
    } else {
        format!("{sign}0:{seconds:02}")
    }
}
