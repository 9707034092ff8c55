//! Answer validation: decides whether a candidate logical form answers a
//! question correctly.

use clevros_types::ast::LogicalExpr;
use tracing::debug;

use crate::answer::AnswerValue;
use crate::error::EvalError;
use crate::evaluator::DEFAULT_STEP_LIMIT;
use crate::scene::Scene;

/// Compares candidate logical forms against a gold answer.
///
/// This is the one place evaluation failures are swallowed: a candidate that
/// cannot be evaluated is simply wrong.
#[derive(Debug, Clone, Copy)]
pub struct AnswerValidator {
    step_limit: u64,
}

impl AnswerValidator {
    pub fn new() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(step_limit: u64) -> Self {
        Self { step_limit }
    }

    /// Whether `label` evaluates to `gold` in `scene`.
    ///
    /// A truth-typed label is compared structurally against `true` without
    /// evaluating it.
    pub fn is_valid(&self, scene: &Scene, gold: &AnswerValue, label: &LogicalExpr) -> bool {
        self.check(scene, gold, label).valid
    }

    /// Like [`is_valid`](Self::is_valid), keeping the answer the label
    /// produced or the error that stopped it.
    pub fn check(&self, scene: &Scene, gold: &AnswerValue, label: &LogicalExpr) -> Verdict {
        if label.ty().is_some_and(|t| t.is_truth()) {
            let answer = AnswerValue::Boolean(label.is_true());
            return Verdict {
                valid: answer == *gold,
                answer: Some(answer),
                error: None,
            };
        }

        self.grade(scene, gold, label)
    }

    /// Evaluate `program` in `scene` and compare the result against `gold`.
    ///
    /// Unlike [`check`](Self::check), truth-typed programs are evaluated too.
    /// Reference programs are fully typed and go through here.
    pub fn grade(&self, scene: &Scene, gold: &AnswerValue, program: &LogicalExpr) -> Verdict {
        match scene.evaluate_with_limit(program, self.step_limit) {
            Ok(answer) => Verdict {
                valid: answer == *gold,
                answer: Some(answer),
                error: None,
            },
            Err(err) => {
                debug!(%program, error = %err, "program rejected");
                Verdict {
                    valid: false,
                    answer: None,
                    error: Some(err),
                }
            }
        }
    }
}

/// Outcome of checking one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub answer: Option<AnswerValue>,
    pub error: Option<EvalError>,
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::new()
    }
}
