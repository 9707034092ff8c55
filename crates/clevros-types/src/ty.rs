//! The type language of logical forms.
//!
//! Primitive types are short names (`e` entity, `t` truth value, `i` integer,
//! `a` attribute name, and the attribute-value types `psh`, `psi`, `pc`, `pm`).
//! Function types are written `<domain,range>`, so a one-place predicate over
//! entities is `<e,t>`.

use std::fmt;

pub const ENTITY: &str = "e";
pub const TRUTH: &str = "t";
pub const INTEGER: &str = "i";
pub const ATTRIBUTE: &str = "a";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(String),
    Complex { domain: Box<Type>, range: Box<Type> },
}

impl Type {
    pub fn primitive(name: impl Into<String>) -> Self {
        Type::Primitive(name.into())
    }

    pub fn complex(domain: Type, range: Type) -> Self {
        Type::Complex {
            domain: Box::new(domain),
            range: Box::new(range),
        }
    }

    pub fn entity() -> Self {
        Self::primitive(ENTITY)
    }

    pub fn truth() -> Self {
        Self::primitive(TRUTH)
    }

    /// `<e,t>`: the type of a set of entities.
    pub fn entity_set() -> Self {
        Self::complex(Self::entity(), Self::truth())
    }

    pub fn is_primitive(&self, name: &str) -> bool {
        matches!(self, Type::Primitive(p) if p == name)
    }

    pub fn is_entity(&self) -> bool {
        self.is_primitive(ENTITY)
    }

    pub fn is_truth(&self) -> bool {
        self.is_primitive(TRUTH)
    }

    pub fn is_entity_set(&self) -> bool {
        matches!(self, Type::Complex { domain, range } if domain.is_entity() && range.is_truth())
    }

    /// The type left after applying `n` arguments, or `None` if this type
    /// takes fewer than `n` arguments.
    pub fn apply(&self, n: usize) -> Option<&Type> {
        let mut current = self;
        for _ in 0..n {
            match current {
                Type::Complex { range, .. } => current = range,
                Type::Primitive(_) => return None,
            }
        }
        Some(current)
    }

    /// Number of arguments this type accepts before reaching a primitive.
    pub fn arity(&self) -> usize {
        match self {
            Type::Primitive(_) => 0,
            Type::Complex { range, .. } => 1 + range.arity(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(name) => f.write_str(name),
            Type::Complex { domain, range } => write!(f, "<{domain},{range}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_type() -> Type {
        // <<e,t>,<psi,<e,t>>>
        Type::complex(
            Type::entity_set(),
            Type::complex(Type::primitive("psi"), Type::entity_set()),
        )
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::entity_set().to_string(), "<e,t>");
        assert_eq!(filter_type().to_string(), "<<e,t>,<psi,<e,t>>>");
    }

    #[test]
    fn test_apply_and_arity() {
        let ty = filter_type();
        assert_eq!(ty.arity(), 3);
        assert_eq!(ty.apply(0), Some(&ty));
        assert_eq!(ty.apply(2), Some(&Type::entity_set()));
        assert_eq!(ty.apply(3), Some(&Type::truth()));
        assert_eq!(ty.apply(4), None);
    }

    #[test]
    fn test_predicates() {
        assert!(Type::entity_set().is_entity_set());
        assert!(!filter_type().is_entity_set());
        assert!(Type::truth().is_truth());
        assert!(!Type::entity().is_truth());
    }
}
