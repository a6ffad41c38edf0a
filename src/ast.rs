//! Expression tree consumed by the evaluator.
//!
//! The tree is produced by `parser` (or built by hand) and never mutated by
//! evaluation. Equality is structural and lives in `equality`.

use crate::classad::ClassAd;
use crate::parser::quote;
use crate::stack::ensure_sufficient_stack;
use std::fmt;

/// The qualifier in front of an attribute reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// `MY.attr`: the record being evaluated.
    My,
    /// `TARGET.attr`: the record paired with it in a match.
    Target,
    /// `PARENT.attr`: the enclosing record.
    Parent,
}

impl Scope {
    pub fn keyword(self) -> &'static str {
        match self {
            Scope::My => "MY",
            Scope::Target => "TARGET",
            Scope::Parent => "PARENT",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Scope> {
        if word.eq_ignore_ascii_case("my") {
            Some(Scope::My)
        } else if word.eq_ignore_ascii_case("target") {
            Some(Scope::Target)
        } else if word.eq_ignore_ascii_case("parent") {
            Some(Scope::Parent)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    /// `is` / `=?=`
    Is,
    /// `isnt` / `=!=`
    Isnt,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    /// `>>>`, logical shift right
    Ushr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Is => "is",
            BinaryOp::Isnt => "isnt",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Ushr => ">>>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// An unevaluated ClassAd expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    Undefined,
    Error,
    /// `name`, `MY.name`, `TARGET.name` or `PARENT.name`
    Attribute {
        name: String,
        scope: Option<Scope>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `left ?: right`
    Elvis {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `{a, b, c}`
    List(Vec<Expr>),
    /// `[a = 1; b = 2]` nested inside an expression
    Record(ClassAd),
    /// `record.attr`
    Select {
        record: Box<Expr>,
        attr: String,
    },
    /// `container[index]`
    Subscript {
        container: Box<Expr>,
        index: Box<Expr>,
    },
    /// `name(args...)`
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn attr(name: impl Into<String>) -> Expr {
        Expr::Attribute {
            name: name.into(),
            scope: None,
        }
    }

    pub fn scoped_attr(scope: Scope, name: impl Into<String>) -> Expr {
        Expr::Attribute {
            name: name.into(),
            scope: Some(scope),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn conditional(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
        Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn elvis(left: Expr, right: Expr) -> Expr {
        Expr::Elvis {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn select(record: Expr, attr: impl Into<String>) -> Expr {
        Expr::Select {
            record: Box::new(record),
            attr: attr.into(),
        }
    }

    pub fn subscript(container: Expr, index: Expr) -> Expr {
        Expr::Subscript {
            container: Box::new(container),
            index: Box::new(index),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    /// Height of the tree: 1 for a leaf. Nested record literals count
    /// through their attribute definitions.
    pub fn depth(&self) -> usize {
        ensure_sufficient_stack(|| {
            let children = match self {
                Expr::Binary { left, right, .. } | Expr::Elvis { left, right } => {
                    left.depth().max(right.depth())
                }
                Expr::Unary { operand, .. } => operand.depth(),
                Expr::Conditional {
                    cond,
                    then,
                    otherwise,
                } => cond.depth().max(then.depth()).max(otherwise.depth()),
                Expr::List(items) | Expr::Call { args: items, .. } => {
                    items.iter().map(Expr::depth).max().unwrap_or(0)
                }
                Expr::Record(ad) => ad
                    .attributes()
                    .iter()
                    .map(|(_, e)| e.depth())
                    .max()
                    .unwrap_or(0),
                Expr::Select { record, .. } => record.depth(),
                Expr::Subscript { container, index } => container.depth().max(index.depth()),
                _ => 0,
            };
            children + 1
        })
    }
}

/// Whether `name` can be written bare, or needs `'single quotes'`.
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_reserved_word(name)
}

pub(crate) fn is_reserved_word(name: &str) -> bool {
    ["true", "false", "undefined", "error", "is", "isnt"]
        .iter()
        .any(|w| w.eq_ignore_ascii_case(name))
}

/// Write an attribute name, quoting it when it is not a plain identifier.
pub(crate) fn write_name(f: &mut impl fmt::Write, name: &str) -> fmt::Result {
    if is_plain_name(name) {
        return f.write_str(name);
    }
    f.write_char('\'')?;
    for ch in name.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}

/// Render a real so that it parses back as a real.
pub(crate) fn format_real(r: f64) -> String {
    if r.is_nan() {
        "real(\"NaN\")".to_string()
    } else if r.is_infinite() {
        if r > 0.0 {
            "real(\"INF\")".to_string()
        } else {
            "real(\"-INF\")".to_string()
        }
    } else {
        // Debug formatting always keeps a `.` or an exponent.
        format!("{:?}", r)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Expr::Integer(i) => write!(f, "{}", i),
            Expr::Real(r) => f.write_str(&format_real(*r)),
            Expr::String(s) => f.write_str(&quote(s)),
            Expr::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Expr::Undefined => f.write_str("undefined"),
            Expr::Error => f.write_str("error"),
            Expr::Attribute { name, scope } => {
                if let Some(scope) = scope {
                    write!(f, "{}.", scope.keyword())?;
                }
                write_name(f, name)
            }
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Unary { op, operand } => write!(f, "({}{})", op.symbol(), operand),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", cond, then, otherwise),
            Expr::Elvis { left, right } => write!(f, "({} ?: {})", left, right),
            Expr::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("}")
            }
            Expr::Record(ad) => write!(f, "{}", ad),
            Expr::Select { record, attr } => {
                write!(f, "{}.", record)?;
                write_name(f, attr)
            }
            Expr::Subscript { container, index } => write!(f, "{}[{}]", container, index),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        })
    }
}
