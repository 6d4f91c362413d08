//! Static structural metadata describing each persisted entity type.
//!
//! A descriptor captures everything the generic record operations need to
//! know about one entity shape: which collection it lives in, which fields
//! the store computes itself, which are frozen after insert, which reference
//! other collections, and which participate in unique or full-text indexes.
//! Descriptors are plain static data registered at startup; there is no
//! reflection or derive machinery behind them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the persisted entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    LearningObject,
    LearningOutcome,
    StandardOutcome,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::LearningObject => "learning object",
            EntityKind::LearningOutcome => "learning outcome",
            EntityKind::StandardOutcome => "standard outcome",
        };
        write!(f, "{}", name)
    }
}

/// Per-foreign-key metadata.
///
/// `target` names the collection the referenced id(s) must exist in.
/// `cascade` marks a child relationship: deleting the owner recursively
/// deletes every referenced record. `registry` names an array field on the
/// *target* document that must mirror this relationship (the target lists
/// the ids of all documents pointing at it); registries and foreign keys are
/// always updated together, never independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub target: &'static str,
    pub cascade: bool,
    pub registry: Option<&'static str>,
}

/// Full structural metadata for one entity type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    /// Collection (sled tree) the documents are stored in.
    pub collection: &'static str,
    /// Every persisted field, including autos.
    pub fields: &'static [&'static str],
    /// Fields computed by the store itself; never supplied by a caller.
    pub autos: &'static [&'static str],
    /// Fields settable at insert time but never mutated by `edit`.
    pub fixeds: &'static [&'static str],
    /// Fields that must jointly be unique across the collection.
    pub uniques: &'static [&'static str],
    /// Fields included in the full-text index.
    pub texts: &'static [&'static str],
    /// Foreign-key fields and their specs.
    pub foreigns: &'static [(&'static str, ForeignKeySpec)],
}

impl EntityDescriptor {
    pub fn foreign(&self, field: &str) -> Option<&ForeignKeySpec> {
        self.foreigns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, spec)| spec)
    }

    pub fn is_auto(&self, field: &str) -> bool {
        self.autos.contains(&field)
    }

    pub fn is_fixed(&self, field: &str) -> bool {
        self.fixeds.contains(&field)
    }

    pub fn is_foreign(&self, field: &str) -> bool {
        self.foreigns.iter().any(|(name, _)| *name == field)
    }

    /// True when the unique and text field sets coincide, in which case a
    /// single combined unique+text index serves both purposes.
    pub fn combined_unique_text_index(&self) -> bool {
        !self.uniques.is_empty()
            && self.uniques.len() == self.texts.len()
            && self.uniques.iter().all(|f| self.texts.contains(f))
    }
}
