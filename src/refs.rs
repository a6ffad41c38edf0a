//! Which attribute names an expression depends on.
//!
//! References are followed through attribute definitions: if `expr` uses
//! `a` and the record defines `a = b + TARGET.c`, then `b` and `c` are
//! dependencies too. A name is *internal* when it resolves in the record
//! itself and *external* otherwise: `TARGET.` references, names found
//! through `PARENT.`, names defined by a nested record literal and names
//! that resolve nowhere.

use crate::ast::{Expr, Scope};
use crate::classad::ClassAd;
use crate::stack::ensure_sufficient_stack;
use std::collections::{BTreeSet, HashSet};

/// Attribute names `expr` depends on that do not resolve in `ad`.
pub fn external_refs(ad: &ClassAd, expr: &Expr) -> BTreeSet<String> {
    collect(ad, expr).external
}

/// Attribute names `expr` depends on that resolve in `ad`, spelled as `ad`
/// spells them.
pub fn internal_refs(ad: &ClassAd, expr: &Expr) -> BTreeSet<String> {
    collect(ad, expr).internal
}

/// Both sets at once.
pub fn refs(ad: &ClassAd, expr: &Expr) -> (BTreeSet<String>, BTreeSet<String>) {
    let collector = collect(ad, expr);
    (collector.external, collector.internal)
}

fn collect(ad: &ClassAd, expr: &Expr) -> Collector {
    let mut collector = Collector {
        root: ad.clone(),
        external: BTreeSet::new(),
        internal: BTreeSet::new(),
        followed: HashSet::new(),
    };
    let frame = Frame {
        record: ad.clone(),
        parent: ad.parent(),
    };
    collector.walk(expr, &frame);
    collector
}

/// The record a name resolves in, and the record `PARENT.` means there.
struct Frame {
    record: ClassAd,
    parent: Option<ClassAd>,
}

struct Collector {
    root: ClassAd,
    external: BTreeSet<String>,
    internal: BTreeSet<String>,
    /// (record id, lower-cased name) of definitions already walked.
    followed: HashSet<(usize, String)>,
}

impl Collector {
    fn walk(&mut self, expr: &Expr, frame: &Frame) {
        ensure_sufficient_stack(|| match expr {
            Expr::Attribute { name, scope } => self.reference(name, *scope, frame),
            Expr::Binary { left, right, .. } | Expr::Elvis { left, right } => {
                self.walk(left, frame);
                self.walk(right, frame);
            }
            Expr::Unary { operand, .. } => self.walk(operand, frame),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.walk(cond, frame);
                self.walk(then, frame);
                self.walk(otherwise, frame);
            }
            Expr::List(items) => items.iter().for_each(|e| self.walk(e, frame)),
            Expr::Call { args, .. } => args.iter().for_each(|e| self.walk(e, frame)),
            // The selected name is looked up in whatever `record` yields,
            // not in this scope.
            Expr::Select { record, .. } => self.walk(record, frame),
            Expr::Subscript { container, index } => {
                self.walk(container, frame);
                self.walk(index, frame);
            }
            Expr::Record(nested) => {
                let inner = Frame {
                    record: nested.clone(),
                    parent: Some(frame.record.clone()),
                };
                for (_, definition) in nested.attributes() {
                    self.walk(&definition, &inner);
                }
            }
            _ => {}
        })
    }

    fn reference(&mut self, name: &str, scope: Option<Scope>, frame: &Frame) {
        let owner = match scope {
            None | Some(Scope::My) => Some(frame.record.clone()),
            Some(Scope::Parent) => frame.parent.clone(),
            Some(Scope::Target) => None,
        };
        let Some(owner) = owner else {
            add_name(&mut self.external, name);
            return;
        };
        let Some(definition) = owner.lookup(name) else {
            add_name(&mut self.external, name);
            return;
        };
        if owner.ptr_eq(&self.root) {
            let canonical = owner.canonical_name(name).unwrap_or_else(|| name.to_string());
            self.internal.insert(canonical);
        } else {
            add_name(&mut self.external, name);
        }
        if self
            .followed
            .insert((owner.id(), name.to_ascii_lowercase()))
        {
            let parent = if owner.ptr_eq(&frame.record) {
                frame.parent.clone()
            } else {
                owner.parent()
            };
            let owner_frame = Frame {
                record: owner,
                parent,
            };
            self.walk(&definition, &owner_frame);
        }
    }
}

/// Insert unless the set already holds the name in another casing.
fn add_name(set: &mut BTreeSet<String>, name: &str) {
    if !set.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        set.insert(name.to_string());
    }
}
