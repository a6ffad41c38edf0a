//! JSON encoding of records.
//!
//! Literals map to native JSON: integers and finite reals to numbers,
//! strings, booleans, `undefined` to `null`, list literals to arrays and
//! nested records to objects. Every other expression, `error` and the
//! non-finite reals included, is written as the string
//! `"/Expr(<rendered expression>)/"` and parsed back on decode.

use crate::ast::Expr;
use crate::classad::ClassAd;
use crate::error::ClassAdError;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub(crate) const EXPR_PREFIX: &str = "/Expr(";
pub(crate) const EXPR_SUFFIX: &str = ")/";

/// JSON formatting style.
#[derive(Debug, Clone, Copy, Default)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    #[default]
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

/// Serialize a record to a compact JSON object.
pub fn to_json(ad: &ClassAd) -> Result<String, ClassAdError> {
    write_json(ad, JsonStyle::Compact)
}

/// Serialize a record to a pretty-printed JSON object (2-space indent).
pub fn to_json_pretty(ad: &ClassAd) -> Result<String, ClassAdError> {
    write_json(ad, JsonStyle::Pretty)
}

/// Serialize records to a JSON array.
pub fn classads_to_json(ads: &[ClassAd], style: JsonStyle) -> Result<String, ClassAdError> {
    write_json(ads, style)
}

fn write_json<T: Serialize + ?Sized>(value: &T, style: JsonStyle) -> Result<String, ClassAdError> {
    let text = match style {
        JsonStyle::Compact => serde_json::to_string(value)?,
        JsonStyle::Pretty => serde_json::to_string_pretty(value)?,
    };
    Ok(text)
}

/// The `"/Expr(..)/"` string for an expression with no literal JSON form.
pub(crate) fn expr_string(expr: &Expr) -> String {
    format!("{}{}{}", EXPR_PREFIX, expr, EXPR_SUFFIX)
}

impl ClassAd {
    pub fn to_json(&self) -> Result<String, ClassAdError> {
        to_json(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, ClassAdError> {
        to_json_pretty(self)
    }
}

impl Serialize for ClassAd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let attributes = self.attributes();
        let mut map = serializer.serialize_map(Some(attributes.len()))?;
        for (name, expr) in &attributes {
            map.serialize_entry(name, &JsonExpr(expr))?;
        }
        map.end()
    }
}

struct JsonExpr<'a>(&'a Expr);

impl Serialize for JsonExpr<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Expr::Integer(i) => serializer.serialize_i64(*i),
            Expr::Real(r) if r.is_finite() => serializer.serialize_f64(*r),
            Expr::String(s) => serializer.serialize_str(s),
            Expr::Boolean(b) => serializer.serialize_bool(*b),
            Expr::Undefined => serializer.serialize_unit(),
            Expr::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&JsonExpr(item))?;
                }
                seq.end()
            }
            Expr::Record(ad) => ad.serialize(serializer),
            other => serializer.serialize_str(&expr_string(other)),
        }
    }
}
