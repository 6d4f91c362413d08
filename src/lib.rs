//! # Learning Catalog Library
//!
//! This library implements the core of a learning-object catalog backend:
//! CRUD over users, learning objects, learning outcomes, and standard
//! outcome taxonomies, plus a full-text outcome-suggestion search, backed
//! by an embedded sled document store.
//!
//! ## Core Components
//!
//! * `schema` - Static entity descriptors and the registry serving them to
//!   the generic record operations
//! * `store` - The datastore handle and the schema-driven generic
//!   insert/edit/remove/register primitives
//! * `entities` - The mutable domain model with taxonomy-constrained
//!   mutators
//! * `mapping` - Entity-to-record conversion, including denormalized fields
//! * `search` - Ranked outcome suggestion search (text and regex modes)
//! * `catalog` - The operation surface consumed by transport layers
//! * `error` - Error types and handling
//!
//! ## Architecture
//!
//! One generic set of record operations serves all four entity shapes by
//! consulting the schema registry for collection names, field categories,
//! foreign-key targets, cascade flags, and registry back-pointers. The
//! `Catalog` facade composes those primitives into domain operations:
//! denormalization propagation on edits, the tag-keyed reconciling update,
//! outcome mapping, and suggestion search.

pub mod catalog;
pub mod config;
pub mod entities;
pub mod error;
pub mod mapping;
pub mod schema;
pub mod search;
pub mod store;

// Re-export main types for convenience
pub use catalog::{Catalog, LearningObjectEdit, UserEdit};
pub use config::CatalogConfig;
pub use entities::{
    AssessmentPlan, InstructionalStrategy, LearningGoal, LearningObject, LearningOutcome,
    Outcome, StandardOutcome, User,
};
pub use error::{CatalogError, CatalogResult};
pub use schema::{schema_registry, EntityKind};
pub use search::{OutcomeSuggestion, SuggestMode, Suggestions};
pub use store::Datastore;
