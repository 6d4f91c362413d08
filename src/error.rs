//! Unified error handling for catalog operations.
//!
//! Every public operation in this crate returns [`CatalogResult`]; composite
//! operations (cascading removes, reconciling updates) stop at the first
//! failing sub-step and surface it, leaving already-completed sub-steps in
//! place. Errors name the collection, field, or id implicated so callers can
//! decide whether a retry makes sense.

use thiserror::Error;

/// Error type covering every failure mode of the catalog core.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A lookup, fetch, or find target does not exist.
    #[error("Record not found: {id} in collection {collection}")]
    NotFound { collection: String, id: String },

    /// A referenced id does not exist in its target collection. Raised
    /// before any write occurs, so a failed insert leaves no partial state.
    #[error("Foreign key violation: field {field} references missing id {id} in collection {collection}")]
    ForeignKey {
        field: String,
        id: String,
        collection: String,
    },

    /// The underlying store rejected a duplicate unique key.
    #[error("Uniqueness violation in {collection}: duplicate key {key}")]
    Uniqueness { collection: String, key: String },

    /// An unregister or reorder named an item not present in the registry,
    /// or a reorder index outside `[0, len)`.
    #[error("Registry inconsistency on {collection}.{field}: {reason}")]
    RegistryConsistency {
        collection: String,
        field: String,
        reason: String,
    },

    /// The store connection failed or an operation was issued against a
    /// closed handle.
    #[error("Store connectivity error: {0}")]
    Connectivity(String),

    /// A document was structurally invalid for the requested operation,
    /// e.g. a caller supplied an auto-generated or foreign field to `edit`.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A taxonomy-constrained field value was rejected.
    #[error("Taxonomy violation: {value} is not a valid {field} for Bloom level '{bloom}'")]
    Taxonomy {
        bloom: String,
        field: String,
        value: String,
    },

    /// Document (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error surfaced by the sled storage layer.
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Configuration file errors.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn foreign_key(field: &str, id: &str, collection: &str) -> Self {
        Self::ForeignKey {
            field: field.to_string(),
            id: id.to_string(),
            collection: collection.to_string(),
        }
    }

    pub fn uniqueness(collection: &str, key: &str) -> Self {
        Self::Uniqueness {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn registry(collection: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::RegistryConsistency {
            collection: collection.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type CatalogResult<T> = Result<T, CatalogError>;
