//! Exact-match statistics over a run of questions.

use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

/// How one question came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
    /// The candidate program could not be read.
    NoParse,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Correct => f.write_str("✓"),
            Outcome::Incorrect => f.write_str("✗"),
            Outcome::NoParse => f.write_str("∅"),
        }
    }
}

/// Counts of correct, incorrect and unparsed questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExactMatchStats {
    pub correct: usize,
    pub incorrect: usize,
    pub no_parse: usize,
}

impl ExactMatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Incorrect => self.incorrect += 1,
            Outcome::NoParse => self.no_parse += 1,
        }
    }

    /// Combine counts from another worker.
    pub fn merge(&mut self, other: &ExactMatchStats) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.no_parse += other.no_parse;
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.no_parse
    }

    /// Correct over parsed.
    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.correct + self.incorrect)
    }

    /// Correct over all questions.
    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.total())
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Machine-readable `key=value` pairs separated by tabs.
    pub fn to_tab_delimited(&self) -> String {
        format!(
            "correct={}\tincorrect={}\tno_parse={}\tprecision={:.4}\trecall={:.4}\tf1={:.4}",
            self.correct,
            self.incorrect,
            self.no_parse,
            self.precision(),
            self.recall(),
            self.f1()
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl AddAssign for ExactMatchStats {
    fn add_assign(&mut self, other: Self) {
        self.merge(&other);
    }
}

impl fmt::Display for ExactMatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} correct, {} incorrect, {} no parse ({} total)",
            self.correct,
            self.incorrect,
            self.no_parse,
            self.total()
        )?;
        write!(
            f,
            "precision {:.3}, recall {:.3}, F1 {:.3}",
            self.precision(),
            self.recall(),
            self.f1()
        )
    }
}
