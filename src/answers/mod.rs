//! The answer bank and fuzzy question lookup.

pub mod fuzzy;
pub mod loader;

pub use loader::{load_dir, LoadReport};

use serde::Deserialize;
use tracing::debug;

use fuzzy::{full_process, weighted_ratio};

/// Scores below this are treated as "no match".
pub const DEFAULT_MATCH_THRESHOLD: u32 = 30;

/// One question and its answer letter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnswerRecord {
    #[serde(rename = "q")]
    pub question: String,
    #[serde(rename = "ans")]
    pub answer: String,
}

impl AnswerRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Immutable collection of answer records with fuzzy lookup.
///
/// Ties on the best score go to the record loaded first.
#[derive(Debug, Clone)]
pub struct AnswerIndex {
    records: Vec<AnswerRecord>,
    /// `full_process`ed questions, parallel to `records`
    processed: Vec<String>,
    threshold: u32,
}

impl AnswerIndex {
    pub fn new(records: Vec<AnswerRecord>, threshold: u32) -> Self {
        let processed = records.iter().map(|r| full_process(&r.question)).collect();
        Self {
            records,
            processed,
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest-scoring record and its score, ignoring the threshold.
    pub fn best_scored(&self, question: &str) -> Option<(&AnswerRecord, u32)> {
        let query = full_process(question);
        let mut best: Option<(usize, u32)> = None;
        for (i, candidate) in self.processed.iter().enumerate() {
            let score = weighted_ratio(&query, candidate);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((i, score));
            }
        }
        best.map(|(i, score)| (&self.records[i], score))
    }

    /// Best match for `question`, or `None` if the top score is below the threshold.
    pub fn best_match(&self, question: &str) -> Option<&AnswerRecord> {
        let (record, score) = self.best_scored(question)?;
        debug!(score, question, matched = %record.question, "best answer candidate");
        (score >= self.threshold).then_some(record)
    }
}
