//! Index planning and maintenance.
//!
//! Unique constraints are enforced with a side tree per collection mapping
//! the composite unique key to the owning record id; claims happen before
//! the document write so a duplicate is rejected with nothing persisted.
//! Text indexing needs no side structure: the suggestion search scores
//! documents from their indexed fields directly, so the plan only records
//! which fields participate.

use serde_json::Value;
use std::fmt;

use super::{Datastore, Document};
use crate::error::{CatalogError, CatalogResult};
use crate::schema::{EntityDescriptor, SchemaRegistry};

/// Separator for composite key parts. Field values never contain it.
const KEY_SEPARATOR: char = '\u{1f}';

/// One planned index set for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPlan {
    pub collection: &'static str,
    pub unique: bool,
    pub text_fields: Vec<&'static str>,
    /// Unique and text field sets coincide, so one combined index record
    /// serves both purposes instead of two.
    pub combined: bool,
}

impl fmt::Display for IndexPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.unique, self.text_fields.is_empty(), self.combined) {
            (true, _, true) => write!(f, "combined unique+text index"),
            (true, true, _) => write!(f, "unique index"),
            (true, false, _) => write!(f, "unique index, text fields {:?}", self.text_fields),
            (false, false, _) => write!(f, "text fields {:?}", self.text_fields),
            (false, true, _) => write!(f, "no indexes"),
        }
    }
}

impl IndexPlan {
    /// Computes one plan per collection. Kinds sharing a collection (the
    /// two outcome types) are merged: index requirements are unioned.
    pub fn for_registry(registry: &SchemaRegistry) -> Vec<IndexPlan> {
        let mut plans: Vec<IndexPlan> = Vec::new();
        for descriptor in registry.descriptors() {
            match plans.iter_mut().find(|p| p.collection == descriptor.collection) {
                Some(plan) => {
                    plan.unique |= !descriptor.uniques.is_empty();
                    for field in descriptor.texts {
                        if !plan.text_fields.contains(field) {
                            plan.text_fields.push(field);
                        }
                    }
                    plan.combined |= descriptor.combined_unique_text_index();
                }
                None => plans.push(IndexPlan {
                    collection: descriptor.collection,
                    unique: !descriptor.uniques.is_empty(),
                    text_fields: descriptor.texts.to_vec(),
                    combined: descriptor.combined_unique_text_index(),
                }),
            }
        }
        plans.sort_by_key(|p| p.collection);
        plans
    }
}

/// Renders a single field value as a key part. Arrays and objects never
/// participate in unique indexes.
fn key_part(field: &str, value: &Value) -> CatalogResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(CatalogError::InvalidDocument(format!(
            "unique field '{}' has non-scalar value {}",
            field, other
        ))),
    }
}

/// Composes the composite unique key for a document, or `None` when the
/// descriptor declares no unique fields.
pub(crate) fn unique_key(
    descriptor: &EntityDescriptor,
    document: &Document,
) -> CatalogResult<Option<String>> {
    if descriptor.uniques.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(descriptor.uniques.len());
    for field in descriptor.uniques {
        let value = document.get(*field).unwrap_or(&Value::Null);
        parts.push(key_part(field, value)?);
    }
    Ok(Some(parts.join(&KEY_SEPARATOR.to_string())))
}

/// Lowercased alphanumeric tokens of a text, in order of appearance.
pub fn text_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl Datastore {
    /// Claims a unique key for `id`, failing with `Uniqueness` if another
    /// record already holds it. Claiming the same key for the same id again
    /// is a no-op.
    pub(crate) fn claim_unique_key(
        &self,
        collection: &str,
        key: &str,
        id: &str,
    ) -> CatalogResult<()> {
        let tree = self.unique_tree(collection)?;
        if let Some(existing) = tree.get(key.as_bytes())? {
            if existing.as_ref() != id.as_bytes() {
                return Err(CatalogError::uniqueness(collection, key));
            }
            return Ok(());
        }
        tree.insert(key.as_bytes(), id.as_bytes())?;
        tree.flush()?;
        Ok(())
    }

    pub(crate) fn release_unique_key(&self, collection: &str, key: &str) -> CatalogResult<()> {
        let tree = self.unique_tree(collection)?;
        tree.remove(key.as_bytes())?;
        tree.flush()?;
        Ok(())
    }

    /// Resolves a composite unique key to the record id holding it.
    pub(crate) fn lookup_unique_key(
        &self,
        collection: &str,
        key: &str,
    ) -> CatalogResult<Option<String>> {
        let tree = self.unique_tree(collection)?;
        Ok(tree
            .get(key.as_bytes())?
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string()))
    }
}
