//! Runs every question's program against its scene and scores the answers.

use std::fmt;

use clevros_eval::{AnswerValidator, AnswerValue, ExactMatchStats, Outcome, DEFAULT_STEP_LIMIT};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::{Dataset, Example};

/// Knobs for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Stop after this many runnable questions.
    pub limit: Option<usize>,
    /// Step budget for each evaluation.
    pub step_limit: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            limit: None,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

/// Result of running a single question.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    /// Position of the question in the questions file.
    pub index: usize,
    pub image_index: usize,
    pub question: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Display for QuestionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} [{}] {}", self.outcome, self.index, self.question)?;
        if let Some(error) = &self.error {
            write!(f, ": {error}")?;
        } else if let (Outcome::Incorrect, Some(answer)) = (self.outcome, &self.answer) {
            write!(f, ": got {answer}")?;
        }
        Ok(())
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub results: Vec<QuestionResult>,
    pub stats: ExactMatchStats,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.results {
            writeln!(f, "{r}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.stats)
    }
}

/// Evaluate every question that has both a program and a gold answer.
///
/// Questions are spread over the rayon thread pool; scenes are shared
/// read-only. Results come back in questions-file order.
pub fn run(dataset: &Dataset, config: &RunConfig) -> RunSummary {
    let runnable: Vec<(usize, &Example)> = dataset
        .examples()
        .iter()
        .enumerate()
        .filter(|(_, ex)| ex.question.program_sexpr.is_some() && ex.gold.is_some())
        .take(config.limit.unwrap_or(usize::MAX))
        .collect();
    info!(questions = runnable.len(), "running");

    let validator = AnswerValidator::with_step_limit(config.step_limit);
    let results: Vec<QuestionResult> = runnable
        .par_iter()
        .map(|&(index, example)| run_one(dataset, &validator, index, example))
        .collect();

    let stats = results
        .par_iter()
        .fold(ExactMatchStats::new, |mut stats, r| {
            stats.record(r.outcome);
            stats
        })
        .reduce(ExactMatchStats::new, |mut a, b| {
            a.merge(&b);
            a
        });

    info!(
        correct = stats.correct,
        incorrect = stats.incorrect,
        no_parse = stats.no_parse,
        "run finished"
    );
    RunSummary { results, stats }
}

fn run_one(
    dataset: &Dataset,
    validator: &AnswerValidator,
    index: usize,
    example: &Example,
) -> QuestionResult {
    let question = &example.question;
    let mut result = QuestionResult {
        index,
        image_index: question.image_index,
        question: question.question.clone(),
        outcome: Outcome::Incorrect,
        answer: None,
        error: None,
    };

    let (Some(program), Some(gold), Some(scene)) = (
        question.program_sexpr.as_deref(),
        example.gold.as_ref(),
        dataset.scene(question.image_index),
    ) else {
        result.error = Some("question cannot be run".into());
        return result;
    };

    let label = match clevros_parser::read(program) {
        Ok(label) => label,
        Err(errors) => {
            debug!(question = index, "program does not parse");
            result.outcome = Outcome::NoParse;
            result.error = errors.first().map(|e| e.to_string());
            return result;
        }
    };

    let verdict = validator.grade(scene, gold, &label);
    result.outcome = if verdict.valid {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };
    result.answer = verdict.answer;
    result.error = verdict.error.map(|e| e.to_string());
    result
}
