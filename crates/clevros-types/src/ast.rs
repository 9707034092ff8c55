//! Logical expression tree.
//!
//! A logical form is built from four node kinds: constants, variables,
//! literal applications `(pred arg0 … argN)` and lambda abstractions
//! `(lambda $0:e body)`. Every node carries a [`Span`] pointing back into the
//! text it was read from; spans are ignored by [`LogicalExpr::same_form`].

use crate::ty::{self, Type};
use crate::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Constant(Constant),
    Variable(Variable),
    /// `(predicate arg0 arg1 …)`
    Literal {
        predicate: Box<LogicalExpr>,
        args: Vec<LogicalExpr>,
    },
    /// `(lambda $n:type body)`
    Lambda {
        argument: Variable,
        body: Box<LogicalExpr>,
    },
}

/// A named constant such as `filter_size:<<e,t>,<psi,<e,t>>>` or `large:psi`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant {
    pub name: String,
    pub ty: Option<Type>,
}

impl Constant {
    pub fn new(name: impl Into<String>, ty: Option<Type>) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The name without any type annotation.
    pub fn base_name(&self) -> &str {
        &self.name
    }
}

/// A variable `$n`. Uses inside a lambda body carry the type of their binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub index: u32,
    pub ty: Option<Type>,
}

impl Variable {
    pub fn new(index: u32, ty: Option<Type>) -> Self {
        Self { index, ty }
    }
}

impl LogicalExpr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn constant(name: impl Into<String>, ty: Option<Type>) -> Self {
        Self::new(ExprKind::Constant(Constant::new(name, ty)), Span::default())
    }

    pub fn variable(index: u32, ty: Option<Type>) -> Self {
        Self::new(ExprKind::Variable(Variable::new(index, ty)), Span::default())
    }

    pub fn literal(predicate: LogicalExpr, args: Vec<LogicalExpr>) -> Self {
        Self::new(
            ExprKind::Literal {
                predicate: Box::new(predicate),
                args,
            },
            Span::default(),
        )
    }

    pub fn lambda(argument: Variable, body: LogicalExpr) -> Self {
        Self::new(
            ExprKind::Lambda {
                argument,
                body: Box::new(body),
            },
            Span::default(),
        )
    }

    /// The semantic type of this expression, when it can be derived from the
    /// annotations present in the tree.
    pub fn ty(&self) -> Option<Type> {
        match &self.kind {
            ExprKind::Constant(c) => c.ty.clone(),
            ExprKind::Variable(v) => v.ty.clone(),
            ExprKind::Literal { predicate, args } => {
                predicate.ty().and_then(|t| t.apply(args.len()).cloned())
            }
            ExprKind::Lambda { argument, body } => {
                Some(Type::complex(argument.ty.clone()?, body.ty()?))
            }
        }
    }

    /// True for the canonical truth constant `true:t` (or an untyped `true`).
    pub fn is_true(&self) -> bool {
        match &self.kind {
            ExprKind::Constant(c) => {
                c.name == "true" && c.ty.as_ref().is_none_or(|t| t.is_primitive(ty::TRUTH))
            }
            _ => false,
        }
    }

    /// Structural equality that ignores source spans.
    pub fn same_form(&self, other: &LogicalExpr) -> bool {
        match (&self.kind, &other.kind) {
            (ExprKind::Constant(a), ExprKind::Constant(b)) => a == b,
            (ExprKind::Variable(a), ExprKind::Variable(b)) => a.index == b.index,
            (
                ExprKind::Literal {
                    predicate: pa,
                    args: aa,
                },
                ExprKind::Literal {
                    predicate: pb,
                    args: ab,
                },
            ) => {
                pa.same_form(pb)
                    && aa.len() == ab.len()
                    && aa.iter().zip(ab).all(|(x, y)| x.same_form(y))
            }
            (
                ExprKind::Lambda {
                    argument: va,
                    body: ba,
                },
                ExprKind::Lambda {
                    argument: vb,
                    body: bb,
                },
            ) => va == vb && ba.same_form(bb),
            _ => false,
        }
    }

    /// Nesting depth of the tree; a lone constant has depth 1.
    pub fn depth(&self) -> usize {
        match &self.kind {
            ExprKind::Constant(_) | ExprKind::Variable(_) => 1,
            ExprKind::Literal { predicate, args } => {
                1 + args
                    .iter()
                    .map(LogicalExpr::depth)
                    .chain(std::iter::once(predicate.depth()))
                    .max()
                    .unwrap_or(0)
            }
            ExprKind::Lambda { body, .. } => 1 + body.depth(),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{}:{ty}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Constant(c) => write!(f, "{c}"),
            ExprKind::Variable(v) => write!(f, "${}", v.index),
            ExprKind::Literal { predicate, args } => {
                write!(f, "({predicate}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            ExprKind::Lambda { argument, body } => {
                write!(f, "(lambda ${}", argument.index)?;
                if let Some(ty) = &argument.ty {
                    write!(f, ":{ty}")?;
                }
                write!(f, " {body})")
            }
        }
    }
}
