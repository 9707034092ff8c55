//! CLEVROS dataset pipeline.
//!
//! Loads CLEVR scenes and preprocessed questions, evaluates each question's
//! program against its scene, and scores the answers against the gold
//! answers with exact-match statistics.

pub mod dataset;
pub mod error;
pub mod runner;

pub use dataset::{load_scene, Dataset, Example, Question};
pub use error::{QaError, QaResult};
pub use runner::{run, QuestionResult, RunConfig, RunSummary};
