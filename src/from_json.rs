use crate::ast::Expr;
use crate::classad::ClassAd;
use crate::error::ClassAdError;
use crate::json::{EXPR_PREFIX, EXPR_SUFFIX};
use crate::parser::parse_expr;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as Json};

/// Deserialize a JSON object into a record.
/// This is the inverse of `json::to_json`.
pub fn from_json(input: &str) -> Result<ClassAd, ClassAdError> {
    let json: Json = serde_json::from_str(input)?;
    classad_from_value(&json)
}

/// Deserialize either one JSON object or an array of them.
pub fn classads_from_json(input: &str) -> Result<Vec<ClassAd>, ClassAdError> {
    let json: Json = serde_json::from_str(input)?;
    match &json {
        Json::Array(items) => items.iter().map(classad_from_value).collect(),
        _ => Ok(vec![classad_from_value(&json)?]),
    }
}

/// Convert an already-parsed JSON value into a record.
pub fn classad_from_value(json: &Json) -> Result<ClassAd, ClassAdError> {
    match json {
        Json::Object(map) => record(map),
        other => Err(ClassAdError::Shape(format!(
            "Expected a JSON object for a record, found {}",
            kind(other)
        ))),
    }
}

fn record(map: &Map<String, Json>) -> Result<ClassAd, ClassAdError> {
    let ad = ClassAd::new();
    for (name, value) in map {
        ad.insert(name.clone(), expr_from_value(value)?);
    }
    Ok(ad)
}

fn expr_from_value(json: &Json) -> Result<Expr, ClassAdError> {
    Ok(match json {
        Json::Null => Expr::Undefined,
        Json::Bool(b) => Expr::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Expr::Integer(i),
            None => Expr::Real(n.as_f64().ok_or_else(|| {
                ClassAdError::Shape(format!("Number {} is not representable", n))
            })?),
        },
        Json::String(s) => match s
            .strip_prefix(EXPR_PREFIX)
            .and_then(|rest| rest.strip_suffix(EXPR_SUFFIX))
        {
            Some(source) => parse_expr(source)?,
            None => Expr::String(s.clone()),
        },
        Json::Array(items) => Expr::List(
            items
                .iter()
                .map(expr_from_value)
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(map) => Expr::Record(record(map)?),
    })
}

fn kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

impl ClassAd {
    pub fn from_json(input: &str) -> Result<ClassAd, ClassAdError> {
        from_json(input)
    }
}

impl<'de> Deserialize<'de> for ClassAd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        classad_from_value(&json).map_err(serde::de::Error::custom)
    }
}
