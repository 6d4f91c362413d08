//! The user entity: owns learning objects by foreign key + registry.

use serde::{Deserialize, Serialize};

/// A catalog user. `object_ids` mirrors the store-side `objects` registry
/// and is filled on hydration, never set directly by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store record id; `None` until persisted or hydrated.
    pub record_id: Option<String>,
    /// Login id, unique across users.
    pub id: String,
    pub name: String,
    pub email: String,
    pub pwdhash: String,
    /// Record ids of the learning objects this user owns.
    pub object_ids: Vec<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        pwdhash: impl Into<String>,
    ) -> Self {
        Self {
            record_id: None,
            id: id.into(),
            name: name.into(),
            email: email.into(),
            pwdhash: pwdhash.into(),
            object_ids: Vec::new(),
        }
    }
}
