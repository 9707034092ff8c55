//! Pipeline error types.

use std::path::PathBuf;

use clevros_eval::EvalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QaError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// The scenes file must list scene `i` at position `i`.
    #[error("scene at position {position} has image_index {image_index}; scenes must be sorted by image_index")]
    SceneOrder { position: usize, image_index: usize },
    #[error("no scene with image_index {0}")]
    UnknownScene(usize),
    #[error("question {question} refers to image_index {image_index}, which has no scene")]
    MissingScene { question: usize, image_index: usize },
}

/// Result alias for pipeline operations.
pub type QaResult<T> = Result<T, QaError>;
