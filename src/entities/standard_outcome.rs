//! The standard outcome entity: an immutable, citable outcome drawn from a
//! published curriculum standard.

use serde::{Deserialize, Serialize};

/// A standard outcome. Every field is fixed after creation; the store
/// additionally maintains `source`/`tag` aliases of `author`/`outcome` so
/// standard outcomes share the learning-outcome unique index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardOutcome {
    /// Store record id; `None` until persisted or hydrated.
    pub record_id: Option<String>,
    /// The issuing body, e.g. a standards organization.
    pub author: String,
    /// The standard's name, e.g. a document or section title.
    pub name: String,
    pub date: String,
    /// The full outcome text; full-text indexed for suggestion search.
    pub outcome: String,
}

impl StandardOutcome {
    pub fn new(
        author: impl Into<String>,
        name: impl Into<String>,
        date: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            record_id: None,
            author: author.into(),
            name: name.into(),
            date: date.into(),
            outcome: outcome.into(),
        }
    }
}
