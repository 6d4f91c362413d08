//! Schema-driven generic record operations.
//!
//! Insert, edit, cascading remove, point fetch, and the registry primitives
//! (register / unregister / reorder) are implemented once, parametrized by
//! the entity descriptors in the schema registry. Foreign keys are validated
//! before any write; registry arrays on target documents are maintained
//! together with the foreign keys that point at them.
//!
//! Multi-step operations (insert + register, cascading remove) are not
//! transactional: sub-steps run sequentially and the first failure surfaces
//! with completed steps left in place. Registry and cascade sub-steps are
//! idempotent so a caller can re-invoke the whole operation afterwards.

use log::{debug, info};
use serde_json::Value;
use uuid::Uuid;

use super::indexes::unique_key;
use super::{Datastore, Document};
use crate::error::{CatalogError, CatalogResult};
use crate::schema::EntityKind;

/// Extracts the referenced ids from a foreign field value. A foreign field
/// holds either a scalar id or an array of ids; anything else is treated as
/// empty.
fn foreign_ids(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Determines which entity kind a stored document belongs to. Learning and
/// standard outcomes share the `outcomes` collection and are discriminated
/// by the presence of the `bloom` field.
pub fn kind_in_collection(collection: &str, document: &Document) -> CatalogResult<EntityKind> {
    match collection {
        crate::schema::USERS => Ok(EntityKind::User),
        crate::schema::OBJECTS => Ok(EntityKind::LearningObject),
        crate::schema::OUTCOMES => {
            if document.contains_key("bloom") {
                Ok(EntityKind::LearningOutcome)
            } else {
                Ok(EntityKind::StandardOutcome)
            }
        }
        other => Err(CatalogError::InvalidDocument(format!(
            "unknown collection '{}'",
            other
        ))),
    }
}

impl Datastore {
    /// Inserts a document, returning the generated record id.
    ///
    /// The document must carry every persisted field except `_id` and the
    /// registry-maintained child arrays (which start empty). Every foreign
    /// reference is checked against its target collection before anything
    /// is written; the composite unique key is claimed before the document
    /// write so a duplicate leaves no partial state. Registry arrays on the
    /// referenced owners are appended to after the document is persisted.
    pub fn insert(&self, kind: EntityKind, mut document: Document) -> CatalogResult<String> {
        let descriptor = self.registry().descriptor(kind);

        if document.contains_key("_id") {
            return Err(CatalogError::InvalidDocument(
                "'_id' is generated by the store and cannot be supplied".into(),
            ));
        }
        for key in document.keys() {
            if !descriptor.fields.contains(&key.as_str()) {
                return Err(CatalogError::InvalidDocument(format!(
                    "unknown field '{}' for {}",
                    key, kind
                )));
            }
        }

        // Child arrays are owned by the registry machinery; callers never
        // supply them.
        for (field, spec) in descriptor.foreigns {
            if descriptor.is_auto(field) {
                if document.contains_key(*field) {
                    return Err(CatalogError::InvalidDocument(format!(
                        "registry field '{}' is store-maintained",
                        field
                    )));
                }
                document.insert((*field).to_string(), Value::Array(Vec::new()));
                debug!("initialized empty child array '{}' ({})", field, spec.target);
            }
        }

        // Validate every foreign reference before the first write.
        for (field, spec) in descriptor.foreigns {
            if descriptor.is_auto(field) {
                continue;
            }
            for referenced in foreign_ids(document.get(*field)) {
                if !self.exists(spec.target, &referenced)? {
                    return Err(CatalogError::foreign_key(field, &referenced, spec.target));
                }
            }
        }

        let id = Uuid::new_v4().to_string();
        document.insert("_id".to_string(), Value::String(id.clone()));

        if let Some(key) = unique_key(descriptor, &document)? {
            self.claim_unique_key(descriptor.collection, &key, &id)?;
        }
        self.put_document(descriptor.collection, &id, &document)?;

        // Mirror the relationship on each registry-bearing target.
        for (field, spec) in descriptor.foreigns {
            if let Some(registry_field) = spec.registry {
                for owner in foreign_ids(document.get(*field)) {
                    self.register(spec.target, &owner, registry_field, &id)?;
                }
            }
        }

        info!("inserted {} {} into {}", kind, id, descriptor.collection);
        Ok(id)
    }

    /// Overwrites the supplied non-structural fields of an existing record.
    ///
    /// Auto, fixed, and foreign fields are rejected up front; by
    /// construction no foreign-key validation is needed. When an edit
    /// touches a unique field the composite key is re-claimed before the
    /// write, so a duplicate is rejected with the record unchanged. The
    /// derived `outcome` text of a learning outcome is recomputed when its
    /// `verb` or `text` changes.
    pub fn edit(&self, kind: EntityKind, id: &str, partial: Document) -> CatalogResult<()> {
        let descriptor = self.registry().descriptor(kind);
        for key in partial.keys() {
            if !descriptor.fields.contains(&key.as_str()) {
                return Err(CatalogError::InvalidDocument(format!(
                    "unknown field '{}' for {}",
                    key, kind
                )));
            }
            if descriptor.is_auto(key) || descriptor.is_foreign(key) || descriptor.is_fixed(key) {
                return Err(CatalogError::InvalidDocument(format!(
                    "field '{}' of {} cannot be edited",
                    key, kind
                )));
            }
        }

        let existing = self.fetch_document(descriptor.collection, id)?;
        let mut merged = existing.clone();
        for (key, value) in partial {
            merged.insert(key, value);
        }
        if kind == EntityKind::LearningOutcome {
            let verb = merged.get("verb").and_then(Value::as_str).unwrap_or("");
            let text = merged.get("text").and_then(Value::as_str).unwrap_or("");
            merged.insert(
                "outcome".to_string(),
                Value::String(crate::mapping::derived_outcome(verb, text)),
            );
        }

        let old_key = unique_key(descriptor, &existing)?;
        let new_key = unique_key(descriptor, &merged)?;
        if new_key != old_key {
            if let Some(key) = &new_key {
                self.claim_unique_key(descriptor.collection, key, id)?;
            }
            if let Some(key) = &old_key {
                self.release_unique_key(descriptor.collection, key)?;
            }
        }
        self.put_document(descriptor.collection, id, &merged)?;
        debug!("edited {} {}", kind, id);
        Ok(())
    }

    /// Deletes a record, cascading into child relationships.
    ///
    /// For each foreign field: a cascading field recursively removes every
    /// referenced child (already-deleted children are skipped, so a retry
    /// after partial failure is safe); a registry-bearing field unregisters
    /// this record from each referenced owner's registry array. Incoming
    /// non-cascading references from other records (another outcome's
    /// `mappings` array) are swept before the record itself is deleted.
    pub fn remove(&self, kind: EntityKind, id: &str) -> CatalogResult<()> {
        let descriptor = self.registry().descriptor(kind);
        let document = self.fetch_document(descriptor.collection, id)?;
        self.remove_document(kind, id, document)
    }

    fn remove_document(&self, kind: EntityKind, id: &str, document: Document) -> CatalogResult<()> {
        let descriptor = self.registry().descriptor(kind);

        for (field, spec) in descriptor.foreigns {
            let referenced = foreign_ids(document.get(*field));
            if spec.cascade {
                for child_id in &referenced {
                    match self.get_document(spec.target, child_id)? {
                        Some(child) => {
                            let child_kind = kind_in_collection(spec.target, &child)?;
                            self.remove_document(child_kind, child_id, child)?;
                        }
                        None => debug!(
                            "cascade target {} already absent from {}",
                            child_id, spec.target
                        ),
                    }
                }
            } else if let Some(registry_field) = spec.registry {
                for owner in &referenced {
                    self.unregister_quiet(spec.target, owner, registry_field, id)?;
                }
            }
        }

        self.sweep_incoming_references(descriptor.collection, id)?;

        if let Some(key) = unique_key(descriptor, &document)? {
            self.release_unique_key(descriptor.collection, &key)?;
        }
        self.delete_document(descriptor.collection, id)?;
        info!("removed {} {} from {}", kind, id, descriptor.collection);
        Ok(())
    }

    /// Removes `id` from every plain (non-cascading, registry-less) foreign
    /// field that targets `collection`, across all registered kinds. This
    /// covers references with no owning side, such as outcome mappings.
    fn sweep_incoming_references(&self, collection: &str, id: &str) -> CatalogResult<()> {
        for descriptor in self.registry().descriptors() {
            for (field, spec) in descriptor.foreigns {
                if spec.target != collection || spec.cascade || spec.registry.is_some() {
                    continue;
                }
                let entries: Vec<(String, Document)> = self
                    .scan_collection(descriptor.collection)?
                    .collect::<CatalogResult<Vec<_>>>()?;
                for (holder_id, mut holder) in entries {
                    let changed = match holder.get_mut(*field) {
                        Some(Value::Array(items)) => {
                            let before = items.len();
                            items.retain(|item| item.as_str() != Some(id));
                            items.len() != before
                        }
                        Some(value @ Value::String(_)) if value.as_str() == Some(id) => {
                            *value = Value::Null;
                            true
                        }
                        _ => false,
                    };
                    if changed {
                        self.put_document(descriptor.collection, &holder_id, &holder)?;
                        debug!(
                            "swept reference to {} from {}.{} of {}",
                            id, descriptor.collection, field, holder_id
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Appends `item_id` to the named registry array of an existing owner,
    /// creating the array if the document does not carry one yet.
    pub fn register(
        &self,
        collection: &str,
        owner_id: &str,
        field: &str,
        item_id: &str,
    ) -> CatalogResult<()> {
        let mut owner = self.fetch_document(collection, owner_id)?;
        match owner
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => items.push(Value::String(item_id.to_string())),
            _ => {
                return Err(CatalogError::registry(
                    collection,
                    field,
                    "registry field is not an array",
                ))
            }
        }
        self.put_document(collection, owner_id, &owner)
    }

    /// Removes every occurrence of `item_id` from the named registry array.
    /// Fails with `RegistryConsistency` when the item is not present.
    pub fn unregister(
        &self,
        collection: &str,
        owner_id: &str,
        field: &str,
        item_id: &str,
    ) -> CatalogResult<()> {
        let mut owner = self.fetch_document(collection, owner_id)?;
        let items = match owner.get_mut(field) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CatalogError::registry(
                    collection,
                    field,
                    format!("no registry array on {}", owner_id),
                ))
            }
        };
        let before = items.len();
        items.retain(|item| item.as_str() != Some(item_id));
        if items.len() == before {
            return Err(CatalogError::registry(
                collection,
                field,
                format!("{} is not registered on {}", item_id, owner_id),
            ));
        }
        self.put_document(collection, owner_id, &owner)
    }

    /// Best-effort unregister used inside cascading removes: an absent
    /// owner or an already-removed entry is a no-op, which keeps remove
    /// safe to re-invoke after a partial failure.
    fn unregister_quiet(
        &self,
        collection: &str,
        owner_id: &str,
        field: &str,
        item_id: &str,
    ) -> CatalogResult<()> {
        let mut owner = match self.get_document(collection, owner_id)? {
            Some(owner) => owner,
            None => return Ok(()),
        };
        if let Some(Value::Array(items)) = owner.get_mut(field) {
            let before = items.len();
            items.retain(|item| item.as_str() != Some(item_id));
            if items.len() != before {
                self.put_document(collection, owner_id, &owner)?;
            }
        }
        Ok(())
    }

    /// Moves `item_id` to `new_index` within the named registry array,
    /// preserving the relative order of the other entries. The index must
    /// fall in `[0, len)` of the current array.
    pub fn reorder(
        &self,
        collection: &str,
        owner_id: &str,
        field: &str,
        item_id: &str,
        new_index: usize,
    ) -> CatalogResult<()> {
        let mut owner = self.fetch_document(collection, owner_id)?;
        let items = match owner.get_mut(field) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CatalogError::registry(
                    collection,
                    field,
                    format!("no registry array on {}", owner_id),
                ))
            }
        };
        let position = items
            .iter()
            .position(|item| item.as_str() == Some(item_id))
            .ok_or_else(|| {
                CatalogError::registry(
                    collection,
                    field,
                    format!("{} is not registered on {}", item_id, owner_id),
                )
            })?;
        if new_index >= items.len() {
            return Err(CatalogError::registry(
                collection,
                field,
                format!("index {} out of range 0..{}", new_index, items.len()),
            ));
        }
        let item = items.remove(position);
        items.insert(new_index, item);
        self.put_document(collection, owner_id, &owner)
    }

    /// Resolves a composite unique key (values given in declaration order
    /// of the kind's unique fields) to the id of the record holding it.
    pub fn find_by_unique(&self, kind: EntityKind, values: &[Value]) -> CatalogResult<String> {
        let descriptor = self.registry().descriptor(kind);
        if values.len() != descriptor.uniques.len() {
            return Err(CatalogError::InvalidDocument(format!(
                "{} expects {} unique key value(s), got {}",
                kind,
                descriptor.uniques.len(),
                values.len()
            )));
        }
        let mut probe = Document::new();
        for (field, value) in descriptor.uniques.iter().zip(values) {
            probe.insert((*field).to_string(), value.clone());
        }
        let key = unique_key(descriptor, &probe)?
            .ok_or_else(|| CatalogError::InvalidDocument(format!("{} has no unique key", kind)))?;
        self.lookup_unique_key(descriptor.collection, &key)?.ok_or_else(|| {
            let shown: Vec<String> = descriptor
                .uniques
                .iter()
                .zip(values)
                .map(|(field, value)| format!("{}={}", field, value))
                .collect();
            CatalogError::not_found(descriptor.collection, &shown.join(", "))
        })
    }
}
