//! Runtime values produced by evaluation.
//!
//! | ClassAd type | Rust type |
//! |--------------|-----------|
//! | undefined    | `Value::Undefined` |
//! | error        | `Value::Error` |
//! | boolean      | `Value::Boolean(bool)` |
//! | integer      | `Value::Integer(i64)` |
//! | real         | `Value::Real(f64)` |
//! | string       | `Value::String(String)` |
//! | list         | `Value::List(Rc<Vec<Value>>)` |
//! | classad      | `Value::Record(ClassAd)` |
//!
//! Lists and records are shared, not copied: a `Value::Record` aliases the
//! record it was produced from, so later mutation of that record is visible
//! through it.

use crate::ast::{format_real, Expr};
use crate::classad::ClassAd;
use crate::parser::quote;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Error,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    List(Rc<Vec<Value>>),
    Record(ClassAd),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Error => "error",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Record(_) => "classad",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of an integer or real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&ClassAd> {
        match self {
            Value::Record(ad) => Some(ad),
            _ => None,
        }
    }

    /// True when neither this value nor anything inside a list is
    /// `Undefined` or `Error`.
    pub fn is_fully_defined(&self) -> bool {
        match self {
            Value::Undefined | Value::Error => false,
            Value::List(items) => items.iter().all(Value::is_fully_defined),
            _ => true,
        }
    }

    /// The literal expression that evaluates back to this value.
    ///
    /// Records are shared into the literal rather than copied.
    pub fn to_expr(&self) -> Expr {
        match self {
            Value::Undefined => Expr::Undefined,
            Value::Error => Expr::Error,
            Value::Boolean(b) => Expr::Boolean(*b),
            Value::Integer(i) => Expr::Integer(*i),
            Value::Real(r) => Expr::Real(*r),
            Value::String(s) => Expr::String(s.clone()),
            Value::List(items) => Expr::List(items.iter().map(Value::to_expr).collect()),
            Value::Record(ad) => Expr::Record(ad.clone()),
        }
    }

    /// The value of a literal expression, or `None` if `expr` is not a literal.
    pub fn from_literal(expr: &Expr) -> Option<Value> {
        match expr {
            Expr::Undefined => Some(Value::Undefined),
            Expr::Error => Some(Value::Error),
            Expr::Boolean(b) => Some(Value::Boolean(*b)),
            Expr::Integer(i) => Some(Value::Integer(*i)),
            Expr::Real(r) => Some(Value::Real(*r)),
            Expr::String(s) => Some(Value::String(s.clone())),
            Expr::List(items) => items
                .iter()
                .map(Value::from_literal)
                .collect::<Option<Vec<_>>>()
                .map(Value::list),
            Expr::Record(ad) => Some(Value::Record(ad.clone())),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Error, Value::Error) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Error => f.write_str("error"),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => f.write_str(&format_real(*r)),
            Value::String(s) => f.write_str(&quote(s)),
            Value::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("}")
            }
            Value::Record(ad) => write!(f, "{}", ad),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
