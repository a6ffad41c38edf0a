//! Core evaluation logic.

use crate::ast::{Expr, Scope};
use crate::builtins;
use crate::classad::ClassAd;
use crate::context::EvalContext;
use crate::operators::{evaluate_binary, evaluate_unary};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;
use std::rc::Rc;

/// Evaluation limits.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Maximum nesting of attribute dereferences. Exceeding it (typically
    /// through a self-referential attribute) yields `Error`.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions { max_depth: 512 }
    }
}

/// Evaluate `expr` with `scope` as the current record.
pub fn evaluate(expr: &Expr, scope: &ClassAd) -> Value {
    Evaluator::default().eval(expr, scope)
}

/// Tree-walking evaluator.
///
/// Evaluation is total: every expression produces a `Value`, with semantic
/// faults reported in-band as `Value::Error`.
#[derive(Default)]
pub struct Evaluator {
    options: EvalOptions,
    context: EvalContext,
    depth: usize,
}

impl Evaluator {
    pub fn new(options: EvalOptions, context: EvalContext) -> Self {
        Evaluator {
            options,
            context,
            depth: 0,
        }
    }

    pub fn with_context(context: EvalContext) -> Self {
        Evaluator::new(EvalOptions::default(), context)
    }

    /// Evaluate an expression node.
    pub fn eval(&mut self, expr: &Expr, scope: &ClassAd) -> Value {
        ensure_sufficient_stack(|| self.eval_inner(expr, scope))
    }

    /// Evaluate the attribute `name` of `scope`, in `scope`.
    ///
    /// Only attribute dereferences count against `max_depth`; a cycle such
    /// as `a = a + 1` is cut off here with `Error`.
    pub fn eval_attr(&mut self, name: &str, scope: &ClassAd) -> Value {
        let Some(expr) = scope.lookup(name) else {
            return Value::Undefined;
        };
        if self.depth >= self.options.max_depth {
            tracing::warn!(
                max_depth = self.options.max_depth,
                attribute = %name,
                "attribute nesting exceeded, probably a self-referential attribute"
            );
            return Value::Error;
        }
        self.depth += 1;
        let result = self.eval(&expr, scope);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr, scope: &ClassAd) -> Value {
        match expr {
            Expr::Integer(i) => Value::Integer(*i),
            Expr::Real(r) => Value::Real(*r),
            Expr::String(s) => Value::String(s.clone()),
            Expr::Boolean(b) => Value::Boolean(*b),
            Expr::Undefined => Value::Undefined,
            Expr::Error => Value::Error,

            Expr::Attribute { name, scope: qualifier } => {
                match resolve_scope(scope, *qualifier) {
                    Some(owner) => self.eval_attr(name, &owner),
                    None => Value::Undefined,
                }
            }

            Expr::Binary { op, left, right } => {
                // Both sides are always evaluated, `&&` and `||` included.
                let l = self.eval(left, scope);
                let r = self.eval(right, scope);
                evaluate_binary(*op, &l, &r)
            }

            Expr::Unary { op, operand } => {
                let v = self.eval(operand, scope);
                evaluate_unary(*op, &v)
            }

            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => match self.eval(cond, scope) {
                Value::Boolean(true) => self.eval(then, scope),
                Value::Boolean(false) => self.eval(otherwise, scope),
                Value::Undefined => Value::Undefined,
                _ => Value::Error,
            },

            Expr::Elvis { left, right } => match self.eval(left, scope) {
                Value::Undefined => self.eval(right, scope),
                other => other,
            },

            Expr::List(items) => {
                Value::List(Rc::new(items.iter().map(|e| self.eval(e, scope)).collect()))
            }

            Expr::Record(ad) => Value::Record(ad.clone()),

            Expr::Select { record, attr } => match self.eval(record, scope) {
                Value::Record(ad) => self.eval_attr(attr, &ad),
                _ => Value::Error,
            },

            Expr::Subscript { container, index } => {
                let c = self.eval(container, scope);
                let i = self.eval(index, scope);
                self.subscript(c, i)
            }

            Expr::Call { name, args } => {
                let Some(builtin) = builtins::lookup(name) else {
                    tracing::trace!(function = %name, "call to unknown function");
                    return Value::Error;
                };
                let args: Vec<Value> = args.iter().map(|a| self.eval(a, scope)).collect();
                builtin.call(&args, &self.context)
            }
        }
    }

    fn subscript(&mut self, container: Value, index: Value) -> Value {
        if container.is_error() || index.is_error() {
            return Value::Error;
        }
        match (container, index) {
            (Value::Undefined, _) | (_, Value::Undefined) => Value::Undefined,
            (Value::List(items), Value::Integer(i)) => usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Undefined),
            (Value::Record(ad), Value::String(key)) => self.eval_attr(&key, &ad),
            _ => Value::Error,
        }
    }
}

/// The record an attribute reference with `qualifier` resolves in, seen
/// from `scope`.
pub(crate) fn resolve_scope(scope: &ClassAd, qualifier: Option<Scope>) -> Option<ClassAd> {
    match qualifier {
        None | Some(Scope::My) => Some(scope.clone()),
        Some(Scope::Target) => scope.target(),
        Some(Scope::Parent) => scope.parent(),
    }
}
