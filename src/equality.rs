//! Structural equality of expressions and records.
//!
//! This is not the language's `==` or `is`: it compares trees. Reals match
//! within `NUMERIC_TOLERANCE` (NaN matches NaN, infinities match by sign),
//! names match case-insensitively, list literals are order-sensitive and
//! record literals are compared as attribute sets. Target and parent links
//! are never followed.

use crate::ast::Expr;
use crate::classad::ClassAd;
use crate::operators::NUMERIC_TOLERANCE;
use crate::stack::ensure_sufficient_stack;

/// Equality over optional expressions: `None` equals only `None`.
pub fn exprs_equal(a: Option<&Expr>, b: Option<&Expr>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn reals_equal(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() < NUMERIC_TOLERANCE
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        ensure_sufficient_stack(|| match (self, other) {
            (Expr::Integer(a), Expr::Integer(b)) => a == b,
            (Expr::Real(a), Expr::Real(b)) => reals_equal(*a, *b),
            (Expr::String(a), Expr::String(b)) => a == b,
            (Expr::Boolean(a), Expr::Boolean(b)) => a == b,
            (Expr::Undefined, Expr::Undefined) | (Expr::Error, Expr::Error) => true,
            (
                Expr::Attribute { name: a, scope: sa },
                Expr::Attribute { name: b, scope: sb },
            ) => sa == sb && a.eq_ignore_ascii_case(b),
            (
                Expr::Binary {
                    op: oa,
                    left: la,
                    right: ra,
                },
                Expr::Binary {
                    op: ob,
                    left: lb,
                    right: rb,
                },
            ) => oa == ob && la == lb && ra == rb,
            (
                Expr::Unary {
                    op: oa,
                    operand: a,
                },
                Expr::Unary {
                    op: ob,
                    operand: b,
                },
            ) => oa == ob && a == b,
            (
                Expr::Conditional {
                    cond: ca,
                    then: ta,
                    otherwise: ea,
                },
                Expr::Conditional {
                    cond: cb,
                    then: tb,
                    otherwise: eb,
                },
            ) => ca == cb && ta == tb && ea == eb,
            (
                Expr::Elvis {
                    left: la,
                    right: ra,
                },
                Expr::Elvis {
                    left: lb,
                    right: rb,
                },
            ) => la == lb && ra == rb,
            (Expr::List(a), Expr::List(b)) => a == b,
            (Expr::Record(a), Expr::Record(b)) => a == b,
            (
                Expr::Select {
                    record: ra,
                    attr: aa,
                },
                Expr::Select {
                    record: rb,
                    attr: ab,
                },
            ) => aa.eq_ignore_ascii_case(ab) && ra == rb,
            (
                Expr::Subscript {
                    container: ca,
                    index: ia,
                },
                Expr::Subscript {
                    container: cb,
                    index: ib,
                },
            ) => ca == cb && ia == ib,
            (Expr::Call { name: na, args: aa }, Expr::Call { name: nb, args: ab }) => {
                na.eq_ignore_ascii_case(nb) && aa == ab
            }
            _ => false,
        })
    }
}

impl PartialEq for ClassAd {
    /// Same attribute names (ignoring case and order) bound to structurally
    /// equal expressions.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let mine = self.attributes();
        mine.len() == other.len()
            && mine.iter().all(|(name, expr)| {
                other
                    .lookup(name)
                    .is_some_and(|theirs| expr.as_ref() == theirs.as_ref())
            })
    }
}
