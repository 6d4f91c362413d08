//! The learning object entity: a named unit of instruction owned by one
//! user, carrying goals and a list of learning outcomes.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::learning_outcome::LearningOutcome;
use super::taxonomy;
use crate::error::CatalogResult;

/// A free-text goal attached to a learning object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningGoal {
    pub text: String,
}

/// A learning object. The `(author, name)` pair is unique across the
/// catalog; `author` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObject {
    /// Store record id; `None` until persisted or hydrated.
    pub record_id: Option<String>,
    /// Record id of the owning user. Fixed at creation.
    pub author: String,
    pub name: String,
    pub date: String,
    pub length: String,
    pub goals: Vec<LearningGoal>,
    /// Full outcome list. Summary loads leave this empty.
    pub outcomes: Vec<LearningOutcome>,
}

impl LearningObject {
    /// Creates a new object dated now. `length` is validated against the
    /// module-scale taxonomy.
    pub fn new(
        author: impl Into<String>,
        name: impl Into<String>,
        length: &str,
    ) -> CatalogResult<Self> {
        taxonomy::validate_length(length)?;
        Ok(Self {
            record_id: None,
            author: author.into(),
            name: name.into(),
            date: Utc::now().timestamp_millis().to_string(),
            length: length.to_string(),
            goals: Vec::new(),
            outcomes: Vec::new(),
        })
    }

    pub fn set_length(&mut self, length: &str) -> CatalogResult<()> {
        taxonomy::validate_length(length)?;
        self.length = length.to_string();
        Ok(())
    }

    pub fn add_goal(&mut self, text: impl Into<String>) {
        self.goals.push(LearningGoal { text: text.into() });
    }
}
