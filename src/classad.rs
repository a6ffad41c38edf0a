use crate::ast::{write_name, Expr};
use crate::eval::Evaluator;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct Attribute {
    /// Name as originally supplied; lookups ignore case.
    name: String,
    expr: Rc<Expr>,
}

#[derive(Default)]
struct Inner {
    attrs: Vec<Attribute>,
    parent: Weak<RefCell<Inner>>,
    target: Weak<RefCell<Inner>>,
}

impl Inner {
    fn position(&self, name: &str) -> Option<usize> {
        self.attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// A ClassAd: an ordered set of named, unevaluated expressions.
///
/// `ClassAd` is a cheap, cloneable handle; clones share the same record.
/// The parent and target links are weak: a record never keeps its parent or
/// its match partner alive, and whole-record traversals (rendering, JSON,
/// equality, flatten) never follow them.
///
/// Records are unsynchronized single-threaded state (`!Send`).
#[derive(Clone, Default)]
pub struct ClassAd {
    inner: Rc<RefCell<Inner>>,
}

impl ClassAd {
    pub fn new() -> Self {
        ClassAd::default()
    }

    fn from_inner(inner: Rc<RefCell<Inner>>) -> Self {
        ClassAd { inner }
    }

    /// True when both handles refer to the same record.
    pub fn ptr_eq(&self, other: &ClassAd) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Identity of the shared record, for visited sets.
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    // ── Attributes ──────────────────────────────────────────────────

    /// Insert or overwrite an attribute. Overwriting keeps the attribute's
    /// position and takes the casing of `name`.
    ///
    /// Record literals inside `expr` get this record as their parent.
    pub fn insert(&self, name: impl Into<String>, expr: Expr) {
        let name = name.into();
        self.adopt_nested(&expr);
        let expr = Rc::new(expr);
        let mut inner = self.inner.borrow_mut();
        match inner.position(&name) {
            Some(i) => inner.attrs[i] = Attribute { name, expr },
            None => inner.attrs.push(Attribute { name, expr }),
        }
    }

    pub fn insert_int(&self, name: impl Into<String>, value: i64) {
        self.insert(name, Expr::Integer(value));
    }

    pub fn insert_real(&self, name: impl Into<String>, value: f64) {
        self.insert(name, Expr::Real(value));
    }

    pub fn insert_string(&self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, Expr::String(value.into()));
    }

    pub fn insert_bool(&self, name: impl Into<String>, value: bool) {
        self.insert(name, Expr::Boolean(value));
    }

    fn adopt_nested(&self, expr: &Expr) {
        ensure_sufficient_stack(|| match expr {
            Expr::Record(nested) => {
                if !nested.ptr_eq(self) {
                    nested.set_parent(Some(self));
                }
            }
            Expr::List(items) => items.iter().for_each(|e| self.adopt_nested(e)),
            Expr::Binary { left, right, .. } | Expr::Elvis { left, right } => {
                self.adopt_nested(left);
                self.adopt_nested(right);
            }
            Expr::Unary { operand, .. } => self.adopt_nested(operand),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.adopt_nested(cond);
                self.adopt_nested(then);
                self.adopt_nested(otherwise);
            }
            Expr::Select { record, .. } => self.adopt_nested(record),
            Expr::Subscript { container, index } => {
                self.adopt_nested(container);
                self.adopt_nested(index);
            }
            Expr::Call { args, .. } => args.iter().for_each(|e| self.adopt_nested(e)),
            _ => {}
        })
    }

    /// The unevaluated expression bound to `name` (case-insensitive).
    pub fn lookup(&self, name: &str) -> Option<Rc<Expr>> {
        let inner = self.inner.borrow();
        inner.position(name).map(|i| Rc::clone(&inner.attrs[i].expr))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().position(name).is_some()
    }

    /// Remove an attribute. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.position(name) {
            Some(i) => {
                inner.attrs.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove every attribute. Parent and target links are kept.
    pub fn clear(&self) {
        self.inner.borrow_mut().attrs.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().attrs.is_empty()
    }

    /// Attribute names in insertion order, with their original casing.
    pub fn names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .attrs
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    /// Snapshot of the attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, Rc<Expr>)> {
        self.inner
            .borrow()
            .attrs
            .iter()
            .map(|a| (a.name.clone(), Rc::clone(&a.expr)))
            .collect()
    }

    /// The canonical spelling stored for `name`, if present.
    pub fn canonical_name(&self, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        inner.position(name).map(|i| inner.attrs[i].name.clone())
    }

    // ── Scope links ─────────────────────────────────────────────────

    pub fn parent(&self) -> Option<ClassAd> {
        self.inner.borrow().parent.upgrade().map(ClassAd::from_inner)
    }

    pub fn set_parent(&self, parent: Option<&ClassAd>) {
        self.inner.borrow_mut().parent = parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.inner));
    }

    pub fn target(&self) -> Option<ClassAd> {
        self.inner.borrow().target.upgrade().map(ClassAd::from_inner)
    }

    pub fn set_target(&self, target: Option<&ClassAd>) {
        self.inner.borrow_mut().target = target.map_or_else(Weak::new, |t| Rc::downgrade(&t.inner));
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Evaluate the attribute `name` in this record's scope.
    /// A missing attribute evaluates to `Undefined`.
    pub fn evaluate_attr(&self, name: &str) -> Value {
        match self.lookup(name) {
            Some(expr) => self.evaluate_expr(&expr),
            None => Value::Undefined,
        }
    }

    /// Evaluate an arbitrary expression with this record as scope.
    pub fn evaluate_expr(&self, expr: &Expr) -> Value {
        Evaluator::default().eval(expr, self)
    }

    pub fn evaluate_attr_int(&self, name: &str) -> Option<i64> {
        self.evaluate_attr(name).as_int()
    }

    pub fn evaluate_attr_real(&self, name: &str) -> Option<f64> {
        match self.evaluate_attr(name) {
            Value::Real(r) => Some(r),
            _ => None,
        }
    }

    /// Integer or real attribute, as `f64`.
    pub fn evaluate_attr_number(&self, name: &str) -> Option<f64> {
        self.evaluate_attr(name).as_f64()
    }

    pub fn evaluate_attr_string(&self, name: &str) -> Option<String> {
        match self.evaluate_attr(name) {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn evaluate_attr_bool(&self, name: &str) -> Option<bool> {
        self.evaluate_attr(name).as_bool()
    }

    pub fn evaluate_attr_list(&self, name: &str) -> Option<Vec<Value>> {
        match self.evaluate_attr(name) {
            Value::List(items) => Some(items.as_ref().clone()),
            _ => None,
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Old-style text: one `name = expr` per line.
    pub fn to_old_format(&self) -> String {
        let mut out = String::new();
        for (name, expr) in self.attributes() {
            // String formatting never fails.
            let _ = write_name(&mut out, &name);
            out.push_str(" = ");
            out.push_str(&expr.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ClassAd {
    /// New-style text: `[name = expr; name = expr]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, expr)) in self.attributes().iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write_name(f, name)?;
            write!(f, " = {}", expr)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for ClassAd {
    // Render through `Display` so the target/parent links are never walked.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassAd({})", self)
    }
}
