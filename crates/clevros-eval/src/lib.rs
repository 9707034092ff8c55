//! CLEVROS evaluator: answers questions about CLEVR scenes by evaluating
//! logical forms against them.
//!
//! A [`Scene`] is built once from object and relation data against an
//! [`Ontology`]. [`Scene::evaluate`] walks a logical form through the
//! ontology's [`OperatorTable`] and produces an [`AnswerValue`]. The
//! [`AnswerValidator`] compares candidates against a gold answer and
//! [`ExactMatchStats`] accumulates the verdicts.

pub mod answer;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod object;
pub mod ontology;
pub mod operators;
pub mod raw;
pub mod scene;
pub mod stats;
pub mod validator;
pub mod value;

pub use answer::AnswerValue;
pub use error::{EvalError, EvalResult};
pub use evaluator::{Evaluator, DEFAULT_STEP_LIMIT};
pub use object::SceneObject;
pub use ontology::{Attribute, Ontology, Relation, Vocabulary};
pub use operators::{Operator, OperatorTable, Param};
pub use raw::{RawObject, RawScene};
pub use scene::{ObjectId, RelationTable, Scene};
pub use stats::{ExactMatchStats, Outcome};
pub use validator::{AnswerValidator, Verdict};
pub use value::{LambdaResult, Value};
