//! Evaluation error types.

use thiserror::Error;

/// Every way building a scene or evaluating a logical form can fail.
///
/// All variants terminate the current evaluation. Only the validator turns
/// them into a plain "incorrect" verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Scene input that cannot be turned into a usable scene.
    #[error("malformed scene: {0}")]
    MalformedScene(String),
    /// An object handle that does not belong to the scene it was used with.
    #[error("unknown object: {0}")]
    UnknownObject(String),
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
    /// Non-constant predicate position, unbound variable, or a top-level
    /// value that has no answer form.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
    #[error("unknown constant: {0}")]
    UnknownConstant(String),
    /// Arity or value-kind mismatch at a literal application.
    #[error("argument type mismatch: {0}")]
    ArgumentType(String),
    /// A `unique` reduction over a set that did not hold exactly one object
    /// was dereferenced.
    #[error("ambiguous or empty reference: {0}")]
    AmbiguousOrEmptyReference(String),
    #[error("unsupported variable type: {0}")]
    UnsupportedVariableType(String),
    #[error("step limit of {0} exceeded")]
    StepLimitExceeded(u64),
    /// The textual form could not be read.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// A gold answer in a shape the dataset convention does not cover.
    #[error("invalid answer: {0}")]
    InvalidAnswer(String),
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
