pub mod ast;
pub mod builtins;
pub mod classad;
pub mod context;
pub mod equality;
pub mod error;
pub mod eval;
pub mod flatten;
pub mod from_json;
pub mod json;
pub mod matchmaking;
pub mod operators;
pub mod parser;
pub mod reader;
pub mod refs;
mod stack;
pub mod value;

pub use ast::{BinaryOp, Expr, Scope, UnaryOp};
pub use classad::ClassAd;
pub use context::{
    Clock, EvalContext, FixedClock, RandomSource, SeededRandom, SystemClock, ThreadRandom,
};
pub use equality::exprs_equal;
pub use error::{ClassAdError, ParseError, Position};
pub use eval::{evaluate, EvalOptions, Evaluator};
pub use flatten::{flatten, flatten_attr};
pub use from_json::{classads_from_json, from_json};
pub use json::{classads_to_json, to_json, to_json_pretty, JsonStyle};
pub use matchmaking::MatchClassAd;
pub use parser::{
    parse_classad, parse_classads, parse_expr, parse_old_classad, parse_old_classads, quote,
    unquote,
};
pub use reader::{ClassAdReader, OldClassAdReader};
pub use refs::{external_refs, internal_refs};
pub use value::Value;

// ── Convenience ─────────────────────────────────────────────────────

/// Parse `expr` and evaluate it with `ad` as the current record.
pub fn evaluate_in(ad: &ClassAd, expr: &str) -> Result<Value, ParseError> {
    Ok(ad.evaluate_expr(&parse_expr(expr)?))
}

#[cfg(test)]
mod tests;
