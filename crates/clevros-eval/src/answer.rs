//! Answer values: the observable result of evaluating a question.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::{EvalError, EvalResult};
use crate::scene::{ObjectId, Scene};
use crate::value::Value;

/// A tagged answer. Equality compares the tag as well as the payload, so
/// `Integer(2)` and `String("2")` are different answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Boolean(bool),
    Integer(i64),
    String(String),
    Object(ObjectId),
    Set(BTreeSet<ObjectId>),
}

impl AnswerValue {
    /// Wrap the top-level result of an evaluation. A tuple-set collapses to
    /// the set of the first element of each binding.
    pub fn from_value(value: Value) -> EvalResult<Self> {
        match value {
            Value::Bool(b) => Ok(AnswerValue::Boolean(b)),
            Value::Int(n) => Ok(AnswerValue::Integer(n)),
            Value::Str(s) => Ok(AnswerValue::String(s.to_string())),
            Value::Object(o) => Ok(AnswerValue::Object(o)),
            Value::Set(result) => Ok(AnswerValue::Set(result.first_elements())),
            Value::Nothing => Err(EvalError::AmbiguousOrEmptyReference(
                "the expression denotes no single object".into(),
            )),
            other @ (Value::Attribute(_) | Value::Relation(_)) => {
                Err(EvalError::UnsupportedConstruct(format!(
                    "a bare {} '{other}' is not an answer",
                    other.kind()
                )))
            }
        }
    }

    /// Parse a gold answer as it appears in a CLEVR questions file.
    ///
    /// `"yes"`/`"true"` and `"no"`/`"false"` are booleans, integer strings are
    /// integers, other strings stay strings, and `{"type": "object",
    /// "index": i}` names the `i`-th object of `scene`.
    pub fn from_gold(json: &serde_json::Value, scene: &Scene) -> EvalResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::String(s) => Ok(Self::from_gold_str(s)),
            Json::Bool(b) => Ok(AnswerValue::Boolean(*b)),
            Json::Number(n) => n
                .as_i64()
                .map(AnswerValue::Integer)
                .ok_or_else(|| EvalError::InvalidAnswer(format!("non-integer number {n}"))),
            Json::Object(map) if map.get("type").and_then(Json::as_str) == Some("object") => {
                let index = map
                    .get("index")
                    .and_then(Json::as_u64)
                    .ok_or_else(|| EvalError::InvalidAnswer(format!("object answer without index: {json}")))?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| scene.object_id(i))
                    .map(AnswerValue::Object)
                    .ok_or_else(|| {
                        EvalError::InvalidAnswer(format!(
                            "object index {index} is out of range for a scene of {} objects",
                            scene.len()
                        ))
                    })
            }
            other => Err(EvalError::InvalidAnswer(format!("unknown answer type {other}"))),
        }
    }

    fn from_gold_str(s: &str) -> Self {
        match s {
            "yes" | "true" => AnswerValue::Boolean(true),
            "no" | "false" => AnswerValue::Boolean(false),
            _ => match s.parse::<i64>() {
                Ok(n) => AnswerValue::Integer(n),
                Err(_) => AnswerValue::String(s.to_string()),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnswerValue::Boolean(_) => "boolean",
            AnswerValue::Integer(_) => "integer",
            AnswerValue::String(_) => "string",
            AnswerValue::Object(_) => "object",
            AnswerValue::Set(_) => "set",
        }
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        AnswerValue::Boolean(b)
    }
}

impl From<i64> for AnswerValue {
    fn from(n: i64) -> Self {
        AnswerValue::Integer(n)
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnswerValue<")?;
        match self {
            AnswerValue::Boolean(b) => write!(f, "{b}")?,
            AnswerValue::Integer(n) => write!(f, "{n}")?,
            AnswerValue::String(s) => f.write_str(s)?,
            AnswerValue::Object(o) => write!(f, "{o}")?,
            AnswerValue::Set(set) => {
                f.write_str("{")?;
                for (i, o) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{o}")?;
                }
                f.write_str("}")?;
            }
        }
        f.write_str(">")
    }
}
