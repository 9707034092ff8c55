//! Intermediate values produced while walking a logical form.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{EvalError, EvalResult};
use crate::ontology::{Attribute, Relation};
use crate::scene::ObjectId;

/// The denotation of a quantified sub-expression: every binding of its
/// variables that satisfies it.
///
/// All tuples have exactly `arity` elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LambdaResult {
    arity: usize,
    tuples: BTreeSet<Vec<ObjectId>>,
}

impl LambdaResult {
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            tuples: BTreeSet::new(),
        }
    }

    /// A one-place result holding each of `objects`.
    pub fn unary(objects: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            arity: 1,
            tuples: objects.into_iter().map(|o| vec![o]).collect(),
        }
    }

    /// Add a binding. Tuples of the wrong arity are rejected.
    pub fn insert(&mut self, tuple: Vec<ObjectId>) -> EvalResult<bool> {
        if tuple.len() != self.arity {
            return Err(EvalError::ArgumentType(format!(
                "tuple of arity {} added to a result of arity {}",
                tuple.len(),
                self.arity
            )));
        }
        Ok(self.tuples.insert(tuple))
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[ObjectId]> {
        self.tuples.iter().map(Vec::as_slice)
    }

    /// Whether the one-element binding `(object)` is present.
    pub fn contains(&self, object: ObjectId) -> bool {
        self.tuples.iter().any(|t| t.as_slice() == [object])
    }

    /// The first element of every binding.
    pub fn first_elements(&self) -> BTreeSet<ObjectId> {
        self.tuples.iter().filter_map(|t| t.first().copied()).collect()
    }
}

/// A value flowing between operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// An attribute-value token such as `rubber`.
    Str(Arc<str>),
    /// An attribute name used by the factored operators (`shape:a`).
    Attribute(Attribute),
    Relation(Relation),
    Object(ObjectId),
    Set(LambdaResult),
    /// What `unique` yields for a set that does not hold exactly one object.
    Nothing,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Attribute(_) => "attribute",
            Value::Relation(_) => "relation",
            Value::Object(_) => "object",
            Value::Set(_) => "set",
            Value::Nothing => "nothing",
        }
    }

    fn mismatch(&self, expected: &str) -> EvalError {
        EvalError::ArgumentType(format!("expected {expected}, got {}", self.kind()))
    }

    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_int(&self) -> EvalResult<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(other.mismatch("int")),
        }
    }

    pub fn as_str(&self) -> EvalResult<&str> {
        match self {
            Value::Str(s) => Ok(s.as_ref()),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_attribute(&self) -> EvalResult<Attribute> {
        match self {
            Value::Attribute(a) => Ok(*a),
            other => Err(other.mismatch("attribute")),
        }
    }

    pub fn as_relation(&self) -> EvalResult<Relation> {
        match self {
            Value::Relation(r) => Ok(*r),
            other => Err(other.mismatch("relation")),
        }
    }

    /// The object this value denotes. Dereferencing [`Value::Nothing`] is an
    /// ambiguous-or-empty reference, not a type error.
    pub fn as_object(&self) -> EvalResult<ObjectId> {
        match self {
            Value::Object(o) => Ok(*o),
            Value::Nothing => Err(EvalError::AmbiguousOrEmptyReference(
                "reference does not denote exactly one object".into(),
            )),
            other => Err(other.mismatch("object")),
        }
    }

    pub fn as_set(&self) -> EvalResult<&LambdaResult> {
        match self {
            Value::Set(s) => Ok(s),
            other => Err(other.mismatch("set")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Attribute(a) => write!(f, "{a}"),
            Value::Relation(r) => write!(f, "{r}"),
            Value::Object(o) => write!(f, "{o}"),
            Value::Set(s) => write!(f, "<{} tuples of arity {}>", s.len(), s.arity()),
            Value::Nothing => f.write_str("nothing"),
        }
    }
}
