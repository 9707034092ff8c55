//! Attributes, relations, attribute vocabularies and the ontology that ties
//! a vocabulary to an operator table.
//!
//! An [`Ontology`] is an ordinary value: every scene holds an `Arc` to the
//! ontology it was built against, so independent tests and workers can use
//! different vocabularies side by side.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::operators::OperatorTable;

// ── Attribute ─────────────────────────────────────────────────────────────────

/// One of the four categorical object properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Color,
    Size,
    Shape,
    Material,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Color,
        Attribute::Size,
        Attribute::Shape,
        Attribute::Material,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Color => "color",
            Attribute::Size => "size",
            Attribute::Shape => "shape",
            Attribute::Material => "material",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Relation ──────────────────────────────────────────────────────────────────

/// One of the four spatial relations over ordered object pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    Right,
    Behind,
    Front,
    Left,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Right,
        Relation::Behind,
        Relation::Front,
        Relation::Left,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Right => "right",
            Relation::Behind => "behind",
            Relation::Front => "front",
            Relation::Left => "left",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Vocabulary ────────────────────────────────────────────────────────────────

/// Closed set of tokens allowed for each attribute.
///
/// Tokens are interned: every object built against the same vocabulary shares
/// one allocation per token.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    values: BTreeMap<Attribute, BTreeSet<Arc<str>>>,
}

impl Vocabulary {
    /// An empty vocabulary; every attribute token is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// The CLEVR dataset vocabulary.
    pub fn clevr() -> Self {
        Self::new()
            .with_values(Attribute::Shape, ["cube", "sphere", "cylinder"])
            .with_values(Attribute::Size, ["small", "large"])
            .with_values(
                Attribute::Color,
                [
                    "gray", "red", "blue", "green", "brown", "purple", "cyan", "yellow", "black",
                    "pink",
                ],
            )
            .with_values(Attribute::Material, ["rubber", "metal"])
    }

    /// Register additional tokens for `attribute`.
    pub fn with_values<I, S>(mut self, attribute: Attribute, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.values.entry(attribute).or_default();
        entry.extend(tokens.into_iter().map(|t| Arc::from(t.as_ref())));
        self
    }

    /// The interned token for `token`, if it is a registered value of `attribute`.
    pub fn intern(&self, attribute: Attribute, token: &str) -> Option<Arc<str>> {
        self.values.get(&attribute)?.get(token).cloned()
    }

    /// The attribute `token` belongs to, checking attributes in
    /// [`Attribute::ALL`] order.
    pub fn lookup(&self, token: &str) -> Option<(Attribute, Arc<str>)> {
        Attribute::ALL
            .into_iter()
            .find_map(|attr| self.intern(attr, token).map(|t| (attr, t)))
    }

    pub fn values(&self, attribute: Attribute) -> impl Iterator<Item = &str> {
        self.values
            .get(&attribute)
            .into_iter()
            .flat_map(|set| set.iter().map(|t| &**t))
    }
}

// ── Ontology ──────────────────────────────────────────────────────────────────

/// A vocabulary together with the operators logical forms may call.
#[derive(Debug, Clone)]
pub struct Ontology {
    vocabulary: Vocabulary,
    operators: OperatorTable,
}

impl Ontology {
    /// An ontology over `vocabulary` with the standard operator table.
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            operators: OperatorTable::standard(),
        }
    }

    /// The CLEVR vocabulary with the standard operator table.
    pub fn clevr() -> Self {
        Self::new(Vocabulary::clevr())
    }

    pub fn with_operators(mut self, operators: OperatorTable) -> Self {
        self.operators = operators;
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    /// Convenience for sharing across scenes.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_and_relation_names() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::from_name(attr.as_str()), Some(attr));
        }
        for rel in Relation::ALL {
            assert_eq!(Relation::from_name(&rel.to_string()), Some(rel));
        }
        assert_eq!(Attribute::from_name("weight"), None);
        assert_eq!(Relation::from_name("above"), None);
    }

    #[test]
    fn test_clevr_vocabulary() {
        let vocab = Vocabulary::clevr();
        assert_eq!(vocab.values(Attribute::Color).count(), 10);
        assert!(vocab.intern(Attribute::Shape, "cube").is_some());
        assert!(vocab.intern(Attribute::Shape, "large").is_none());
        let (attr, token) = vocab.lookup("metal").unwrap();
        assert_eq!(attr, Attribute::Material);
        assert_eq!(&*token, "metal");
        assert!(vocab.lookup("cone").is_none());
    }

    #[test]
    fn test_tokens_are_interned() {
        let vocab = Vocabulary::clevr();
        let a = vocab.intern(Attribute::Color, "red").unwrap();
        let b = vocab.intern(Attribute::Color, "red").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocab = Vocabulary::new().with_values(Attribute::Shape, ["cone"]);
        assert!(vocab.intern(Attribute::Shape, "cone").is_some());
        assert!(vocab.intern(Attribute::Shape, "cube").is_none());
        assert_eq!(vocab.values(Attribute::Color).count(), 0);
    }
}
