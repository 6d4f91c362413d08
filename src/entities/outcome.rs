//! The unified outcome view: a learning outcome or a standard outcome.

use serde::{Deserialize, Serialize};

use super::learning_outcome::LearningOutcome;
use super::standard_outcome::StandardOutcome;

/// Either kind of outcome, unified for mapping purposes. A learning outcome
/// may map to any `Outcome` to indicate it is similar to or derived from
/// that one. Both variants share the `{author, name, date, outcome}` view
/// exposed by the accessors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Learning(LearningOutcome),
    Standard(StandardOutcome),
}

impl Outcome {
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Outcome::Learning(o) => o.record_id.as_deref(),
            Outcome::Standard(o) => o.record_id.as_deref(),
        }
    }

    pub fn author(&self) -> &str {
        match self {
            Outcome::Learning(o) => &o.author,
            Outcome::Standard(o) => &o.author,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Outcome::Learning(o) => &o.name,
            Outcome::Standard(o) => &o.name,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Outcome::Learning(o) => &o.date,
            Outcome::Standard(o) => &o.date,
        }
    }

    /// The outcome phrase: derived `verb + " " + text` for learning
    /// outcomes, the stored text for standard outcomes.
    pub fn outcome(&self) -> String {
        match self {
            Outcome::Learning(o) => o.outcome(),
            Outcome::Standard(o) => o.outcome.clone(),
        }
    }
}
