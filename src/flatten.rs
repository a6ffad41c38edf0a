//! Partial evaluation.
//!
//! `flatten` replaces every maximal subexpression that evaluates to a fully
//! defined value with that value's literal, and keeps the rest of the tree.
//! Unlike the evaluator, `&&`, `||`, `c ? t : e`, `ifThenElse` and Elvis `?:`
//! short-circuit here: once one side is a decisive literal the other side
//! is dropped without being evaluated, so `false && (1/0)` flattens to
//! `false` while it evaluates to `error`.
//!
//! Calls to `random`, `time` and `formatTime` are never folded, and neither
//! is anything that reaches them through an attribute reference.

use crate::ast::{BinaryOp, Expr};
use crate::builtins;
use crate::classad::ClassAd;
use crate::eval::{resolve_scope, Evaluator};
use crate::operators::evaluate_binary;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;
use std::collections::HashSet;

/// Flatten `expr` against `ad`.
pub fn flatten(ad: &ClassAd, expr: &Expr) -> Expr {
    Flattener::new(Evaluator::default()).flatten(expr, ad)
}

/// Flatten an attribute of `ad`; `None` when it is not defined.
pub fn flatten_attr(ad: &ClassAd, name: &str) -> Option<Expr> {
    ad.lookup(name).map(|expr| flatten(ad, &expr))
}

pub struct Flattener {
    evaluator: Evaluator,
}

impl Flattener {
    pub fn new(evaluator: Evaluator) -> Self {
        Flattener { evaluator }
    }

    pub fn flatten(&mut self, expr: &Expr, scope: &ClassAd) -> Expr {
        ensure_sufficient_stack(|| match expr {
            Expr::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                left,
                right,
            } => self.logical(*op, left, right, scope),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => self.conditional(cond, then, otherwise, scope, Expr::conditional),
            Expr::Call { name, args }
                if args.len() == 3 && name.eq_ignore_ascii_case("ifThenElse") =>
            {
                let name = name.clone();
                self.conditional(&args[0], &args[1], &args[2], scope, move |c, t, e| {
                    Expr::call(name, vec![c, t, e])
                })
            }
            Expr::Elvis { left, right } => {
                let left = self.flatten(left, scope);
                match Value::from_literal(&left) {
                    Some(Value::Undefined) => self.flatten(right, scope),
                    Some(_) => left,
                    None => Expr::elvis(left, self.flatten(right, scope)),
                }
            }
            _ => {
                if is_deterministic(expr, scope, &mut HashSet::new()) {
                    let value = self.evaluator.eval(expr, scope);
                    if value.is_fully_defined() {
                        return value.to_expr();
                    }
                }
                self.rebuild(expr, scope)
            }
        })
    }

    /// `&&` / `||`. A literal side that decides the result wins outright; a
    /// literal side that does not decide it leaves just the other side.
    fn logical(&mut self, op: BinaryOp, left: &Expr, right: &Expr, scope: &ClassAd) -> Expr {
        let decisive = op == BinaryOp::Or;
        let left = self.flatten(left, scope);
        if let Some(Value::Boolean(b)) = Value::from_literal(&left) {
            if b == decisive {
                return Expr::Boolean(b);
            }
            let right = self.flatten(right, scope);
            return self.combine(op, left, right);
        }
        let right = self.flatten(right, scope);
        match Value::from_literal(&right) {
            Some(Value::Boolean(b)) if b == decisive => Expr::Boolean(b),
            Some(Value::Boolean(_)) if Value::from_literal(&left).is_none() => left,
            _ => self.combine(op, left, right),
        }
    }

    /// Evaluate when both sides are literals. When only one side is a
    /// non-deciding boolean literal, the other side stands alone.
    fn combine(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        match (Value::from_literal(&left), Value::from_literal(&right)) {
            (Some(l), Some(r)) => evaluate_binary(op, &l, &r).to_expr(),
            (Some(Value::Boolean(_)), None) => right,
            _ => Expr::binary(op, left, right),
        }
    }

    fn conditional(
        &mut self,
        cond: &Expr,
        then: &Expr,
        otherwise: &Expr,
        scope: &ClassAd,
        build: impl FnOnce(Expr, Expr, Expr) -> Expr,
    ) -> Expr {
        let cond = self.flatten(cond, scope);
        match Value::from_literal(&cond) {
            Some(Value::Boolean(true)) => self.flatten(then, scope),
            Some(Value::Boolean(false)) => self.flatten(otherwise, scope),
            Some(Value::Undefined) => Expr::Undefined,
            Some(_) => Expr::Error,
            None => {
                let then = self.flatten(then, scope);
                let otherwise = self.flatten(otherwise, scope);
                build(cond, then, otherwise)
            }
        }
    }

    /// Same node, children flattened.
    fn rebuild(&mut self, expr: &Expr, scope: &ClassAd) -> Expr {
        match expr {
            Expr::Binary { op, left, right } => {
                Expr::binary(*op, self.flatten(left, scope), self.flatten(right, scope))
            }
            Expr::Unary { op, operand } => Expr::unary(*op, self.flatten(operand, scope)),
            Expr::List(items) => Expr::List(items.iter().map(|e| self.flatten(e, scope)).collect()),
            Expr::Select { record, attr } => Expr::select(self.flatten(record, scope), attr.clone()),
            Expr::Subscript { container, index } => {
                Expr::subscript(self.flatten(container, scope), self.flatten(index, scope))
            }
            Expr::Call { name, args } => Expr::call(
                name.clone(),
                args.iter().map(|e| self.flatten(e, scope)).collect(),
            ),
            other => other.clone(),
        }
    }
}

/// False when evaluating `expr` could call a nondeterministic builtin,
/// directly or through the definitions it references.
fn is_deterministic(expr: &Expr, scope: &ClassAd, seen: &mut HashSet<(usize, String)>) -> bool {
    ensure_sufficient_stack(|| match expr {
        Expr::Call { name, args } => {
            builtins::lookup(name).map_or(true, |b| b.deterministic)
                && args.iter().all(|e| is_deterministic(e, scope, seen))
        }
        Expr::Attribute { name, scope: qualifier } => {
            let Some(owner) = resolve_scope(scope, *qualifier) else {
                return true;
            };
            let Some(definition) = owner.lookup(name) else {
                return true;
            };
            if !seen.insert((owner.id(), name.to_ascii_lowercase())) {
                return true;
            }
            is_deterministic(&definition, &owner, seen)
        }
        Expr::Binary { left, right, .. } | Expr::Elvis { left, right } => {
            is_deterministic(left, scope, seen) && is_deterministic(right, scope, seen)
        }
        Expr::Unary { operand, .. } => is_deterministic(operand, scope, seen),
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => [cond, then, otherwise]
            .iter()
            .all(|e| is_deterministic(e, scope, seen)),
        Expr::List(items) => items.iter().all(|e| is_deterministic(e, scope, seen)),
        Expr::Select { record, .. } => is_deterministic(record, scope, seen),
        Expr::Subscript { container, index } => {
            is_deterministic(container, scope, seen) && is_deterministic(index, scope, seen)
        }
        _ => true,
    })
}
