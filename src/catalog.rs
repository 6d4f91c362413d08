//! The catalog facade: the full operation surface consumed by transport
//! layers (HTTP routes, socket handlers, scripts).
//!
//! `Catalog` owns the datastore handle and composes the generic record
//! operations into domain operations: denormalization propagation on edits,
//! the tag-keyed reconciling update, outcome mapping, and suggestion
//! search. Composite operations run their sub-steps sequentially in a fixed
//! order; the first failure surfaces with completed sub-steps left in place.

use log::info;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::config::CatalogConfig;
use crate::entities::{LearningObject, LearningOutcome, Outcome, StandardOutcome, User};
use crate::error::{CatalogError, CatalogResult};
use crate::mapping;
use crate::schema::{EntityKind, OBJECTS, OUTCOMES, USERS};
use crate::search::{self, OutcomeSuggestion, SuggestMode, Suggestions};
use crate::store::{Datastore, Document};

/// Partial edit of a user. Absent fields are left unchanged. The `objects`
/// registry and record id are store-maintained and not editable.
#[derive(Debug, Clone, Default)]
pub struct UserEdit {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub pwdhash: Option<String>,
}

/// Partial edit of a learning object. `author` is fixed and `outcomes` is
/// store-maintained; neither can appear here.
#[derive(Debug, Clone, Default)]
pub struct LearningObjectEdit {
    pub name: Option<String>,
    pub date: Option<String>,
    pub length: Option<String>,
    pub goals: Option<Vec<crate::entities::LearningGoal>>,
}

/// The catalog service. One per process; all operations borrow it and run
/// sequentially from the caller's point of view.
pub struct Catalog {
    store: Datastore,
}

impl Catalog {
    /// Opens the store and bootstraps collections and indexes. Every other
    /// operation must be bracketed by `open` and [`Catalog::close`].
    pub async fn open(config: &CatalogConfig) -> CatalogResult<Self> {
        let store = Datastore::open(config)?;
        info!("catalog opened at {:?}", config.storage_path);
        Ok(Self { store })
    }

    /// Flushes and releases the store.
    pub async fn close(self) -> CatalogResult<()> {
        self.store.close()
    }

    pub fn store(&self) -> &Datastore {
        &self.store
    }

    // ---------- inserts ----------

    /// Inserts a user, returning the new record id. Fails with `Uniqueness`
    /// on a duplicate login id.
    pub async fn insert_user(&self, user: &User) -> CatalogResult<String> {
        self.store
            .insert(EntityKind::User, mapping::user_to_insert(user))
    }

    /// Inserts a learning object under its author, registering it in the
    /// author's `objects` list, then inserts any outcomes the object
    /// carries. Fails with `ForeignKey` if the author does not exist and
    /// `Uniqueness` on a duplicate (author, name) pair.
    pub async fn insert_learning_object(&self, object: &LearningObject) -> CatalogResult<String> {
        let object_id = self
            .store
            .insert(EntityKind::LearningObject, mapping::object_to_insert(object))?;
        for outcome in &object.outcomes {
            self.insert_outcome_under(&object_id, outcome)?;
        }
        Ok(object_id)
    }

    /// Inserts a learning outcome under `source_id`, filling the
    /// denormalized author/name/date copies from the parent object and its
    /// owner, and registering the outcome in the object's `outcomes` list.
    pub async fn insert_learning_outcome(
        &self,
        source_id: &str,
        outcome: &LearningOutcome,
    ) -> CatalogResult<String> {
        self.insert_outcome_under(source_id, outcome)
    }

    pub async fn insert_standard_outcome(
        &self,
        outcome: &StandardOutcome,
    ) -> CatalogResult<String> {
        self.store.insert(
            EntityKind::StandardOutcome,
            mapping::standard_outcome_to_insert(outcome),
        )
    }

    fn insert_outcome_under(
        &self,
        source_id: &str,
        outcome: &LearningOutcome,
    ) -> CatalogResult<String> {
        let object = self.store.fetch_document(OBJECTS, source_id)?;
        let author_id = object
            .get("author")
            .and_then(Value::as_str)
            .ok_or_else(|| CatalogError::InvalidDocument("object has no author".into()))?;
        let author = self.store.fetch_document(USERS, author_id)?;
        let document = mapping::outcome_to_insert(
            outcome,
            source_id,
            author.get("name").and_then(Value::as_str).unwrap_or_default(),
            object.get("name").and_then(Value::as_str).unwrap_or_default(),
            object.get("date").and_then(Value::as_str).unwrap_or_default(),
        );
        self.store.insert(EntityKind::LearningOutcome, document)
    }

    // ---------- edits ----------

    /// Applies a partial edit to a user. When the user's name changes, the
    /// new name is propagated to the denormalized `author` field of every
    /// outcome under every object the user owns, after the
    /// uniqueness-sensitive edit itself has succeeded.
    pub async fn edit_user(&self, record_id: &str, edit: UserEdit) -> CatalogResult<()> {
        let mut partial = Document::new();
        if let Some(id) = &edit.id {
            partial.insert("id".into(), json!(id));
        }
        if let Some(name) = &edit.name {
            partial.insert("name".into(), json!(name));
        }
        if let Some(email) = &edit.email {
            partial.insert("email".into(), json!(email));
        }
        if let Some(pwdhash) = &edit.pwdhash {
            partial.insert("pwdhash".into(), json!(pwdhash));
        }
        if partial.is_empty() {
            return Ok(());
        }
        self.store.edit(EntityKind::User, record_id, partial)?;

        if let Some(name) = &edit.name {
            let user = self.store.fetch_document(USERS, record_id)?;
            for object_id in mapping::registered_ids(&user, "objects") {
                let object = self.store.fetch_document(OBJECTS, &object_id)?;
                for outcome_id in mapping::object_outcome_ids(&object) {
                    self.overwrite_denormalized(&outcome_id, &[("author", json!(name))])?;
                }
            }
        }
        Ok(())
    }

    /// Applies a partial edit to a learning object. Name and date changes
    /// propagate to the denormalized copies on the object's outcomes, after
    /// the uniqueness-sensitive edit itself has succeeded.
    pub async fn edit_learning_object(
        &self,
        record_id: &str,
        edit: LearningObjectEdit,
    ) -> CatalogResult<()> {
        let mut partial = Document::new();
        if let Some(name) = &edit.name {
            partial.insert("name".into(), json!(name));
        }
        if let Some(date) = &edit.date {
            partial.insert("date".into(), json!(date));
        }
        if let Some(length) = &edit.length {
            crate::entities::taxonomy::validate_length(length)?;
            partial.insert("length".into(), json!(length));
        }
        if let Some(goals) = &edit.goals {
            partial.insert(
                "goals".into(),
                json!(goals
                    .iter()
                    .map(|goal| json!({ "text": goal.text }))
                    .collect::<Vec<_>>()),
            );
        }
        if partial.is_empty() {
            return Ok(());
        }
        self.store
            .edit(EntityKind::LearningObject, record_id, partial)?;

        let mut propagated: Vec<(&str, Value)> = Vec::new();
        if let Some(name) = &edit.name {
            propagated.push(("name", json!(name)));
        }
        if let Some(date) = &edit.date {
            propagated.push(("date", json!(date)));
        }
        if !propagated.is_empty() {
            let object = self.store.fetch_document(OBJECTS, record_id)?;
            for outcome_id in mapping::object_outcome_ids(&object) {
                self.overwrite_denormalized(&outcome_id, &propagated)?;
            }
        }
        Ok(())
    }

    /// Replaces the editable fields of a learning outcome. The supplied
    /// entity's taxonomy constraints have already been enforced by its
    /// mutators; the derived `outcome` phrase is recomputed by the store.
    pub async fn edit_learning_outcome(
        &self,
        record_id: &str,
        outcome: &LearningOutcome,
    ) -> CatalogResult<()> {
        self.store.edit(
            EntityKind::LearningOutcome,
            record_id,
            mapping::outcome_to_edit(outcome),
        )
    }

    /// Denormalized copies are store-maintained autos, so propagation
    /// rewrites them directly rather than going through `edit`.
    fn overwrite_denormalized(
        &self,
        outcome_id: &str,
        fields: &[(&str, Value)],
    ) -> CatalogResult<()> {
        let mut document = self.store.fetch_document(OUTCOMES, outcome_id)?;
        for (field, value) in fields {
            document.insert((*field).to_string(), value.clone());
        }
        self.store.put_document(OUTCOMES, outcome_id, &document)
    }

    // ---------- reconciling update ----------

    /// Full update of a learning object, treating the supplied outcome list
    /// as authoritative. Outcomes are keyed by `tag`: an existing `(source,
    /// tag)` match is edited in place, a new tag is inserted, and any
    /// persisted outcome whose tag is absent from the supplied object is
    /// deleted. Calling this twice with the same object is a no-op the
    /// second time.
    pub async fn update_learning_object(
        &self,
        record_id: &str,
        object: &LearningObject,
    ) -> CatalogResult<()> {
        self.edit_learning_object(
            record_id,
            LearningObjectEdit {
                name: Some(object.name.clone()),
                date: Some(object.date.clone()),
                length: Some(object.length.clone()),
                goals: Some(object.goals.clone()),
            },
        )
        .await?;

        let persisted = self.store.fetch_document(OBJECTS, record_id)?;
        let mut existing_by_tag: HashMap<i64, String> = HashMap::new();
        for outcome_id in mapping::object_outcome_ids(&persisted) {
            let outcome = self.store.fetch_document(OUTCOMES, &outcome_id)?;
            if let Some(tag) = outcome.get("tag").and_then(Value::as_i64) {
                existing_by_tag.insert(tag, outcome_id);
            }
        }

        let mut supplied_tags = Vec::with_capacity(object.outcomes.len());
        for outcome in &object.outcomes {
            supplied_tags.push(outcome.tag);
            match existing_by_tag.get(&outcome.tag) {
                Some(outcome_id) => self.store.edit(
                    EntityKind::LearningOutcome,
                    outcome_id,
                    mapping::outcome_to_edit(outcome),
                )?,
                None => {
                    self.insert_outcome_under(record_id, outcome)?;
                }
            }
        }

        for (tag, outcome_id) in &existing_by_tag {
            if !supplied_tags.contains(tag) {
                self.store.remove(EntityKind::LearningOutcome, outcome_id)?;
            }
        }
        info!(
            "reconciled learning object {}: {} outcome(s) supplied",
            record_id,
            object.outcomes.len()
        );
        Ok(())
    }

    // ---------- deletes ----------

    /// Deletes a user, cascading into every owned learning object and, from
    /// there, every learning outcome.
    pub async fn delete_user(&self, record_id: &str) -> CatalogResult<()> {
        self.store.remove(EntityKind::User, record_id)
    }

    /// Deletes a learning object, cascading into its outcomes and removing
    /// it from the owning user's `objects` list.
    pub async fn delete_learning_object(&self, record_id: &str) -> CatalogResult<()> {
        self.store.remove(EntityKind::LearningObject, record_id)
    }

    /// Deletes a learning outcome, removing it from its object's `outcomes`
    /// list and from any other outcome's `mappings`.
    pub async fn delete_learning_outcome(&self, record_id: &str) -> CatalogResult<()> {
        self.store.remove(EntityKind::LearningOutcome, record_id)
    }

    // ---------- finds ----------

    /// Resolves a login id to a user record id.
    pub async fn find_user(&self, login_id: &str) -> CatalogResult<String> {
        self.store.find_by_unique(EntityKind::User, &[json!(login_id)])
    }

    /// Resolves an (author record id, object name) pair to an object id.
    pub async fn find_learning_object(
        &self,
        author_id: &str,
        name: &str,
    ) -> CatalogResult<String> {
        self.store
            .find_by_unique(EntityKind::LearningObject, &[json!(author_id), json!(name)])
    }

    /// Resolves a (source object id, tag) pair to an outcome id.
    pub async fn find_learning_outcome(
        &self,
        source_id: &str,
        tag: i64,
    ) -> CatalogResult<String> {
        self.store
            .find_by_unique(EntityKind::LearningOutcome, &[json!(source_id), json!(tag)])
    }

    // ---------- fetches ----------

    pub async fn fetch_user(&self, record_id: &str) -> CatalogResult<User> {
        let document = self.store.fetch_document(USERS, record_id)?;
        mapping::user_from_document(record_id, &document)
    }

    /// Full load: hydrates the object and walks its outcome list.
    pub async fn fetch_learning_object(&self, record_id: &str) -> CatalogResult<LearningObject> {
        let document = self.store.fetch_document(OBJECTS, record_id)?;
        let mut object = mapping::object_summary_from_document(record_id, &document)?;
        for outcome_id in mapping::object_outcome_ids(&document) {
            let outcome_document = self.store.fetch_document(OUTCOMES, &outcome_id)?;
            object
                .outcomes
                .push(mapping::learning_outcome_from_document(
                    &outcome_id,
                    &outcome_document,
                )?);
        }
        Ok(object)
    }

    /// Summary load of every object a user owns: scalar fields only, no
    /// goals or outcomes, in registry order.
    pub async fn load_user_objects(&self, record_id: &str) -> CatalogResult<Vec<LearningObject>> {
        let user = self.store.fetch_document(USERS, record_id)?;
        let mut objects = Vec::new();
        for object_id in mapping::registered_ids(&user, "objects") {
            let document = self.store.fetch_document(OBJECTS, &object_id)?;
            let mut summary = mapping::object_summary_from_document(&object_id, &document)?;
            summary.goals.clear();
            objects.push(summary);
        }
        Ok(objects)
    }

    pub async fn fetch_learning_outcome(
        &self,
        record_id: &str,
    ) -> CatalogResult<LearningOutcome> {
        let document = self.store.fetch_document(OUTCOMES, record_id)?;
        mapping::learning_outcome_from_document(record_id, &document)
    }

    /// Fetches either outcome kind from the shared collection.
    pub async fn fetch_outcome(&self, record_id: &str) -> CatalogResult<Outcome> {
        let document = self.store.fetch_document(OUTCOMES, record_id)?;
        mapping::outcome_from_document(record_id, &document)
    }

    // ---------- mappings & reorder ----------

    /// Records that `outcome_id` maps to `target_id` (an outcome of either
    /// kind). Fails with `ForeignKey` if the target does not exist.
    pub async fn map_outcome(&self, outcome_id: &str, target_id: &str) -> CatalogResult<()> {
        if !self.store.exists(OUTCOMES, target_id)? {
            return Err(CatalogError::foreign_key("mappings", target_id, OUTCOMES));
        }
        self.store
            .register(OUTCOMES, outcome_id, "mappings", target_id)
    }

    pub async fn unmap_outcome(&self, outcome_id: &str, target_id: &str) -> CatalogResult<()> {
        self.store
            .unregister(OUTCOMES, outcome_id, "mappings", target_id)
    }

    /// Moves an object to a new position in its owner's `objects` list.
    pub async fn reorder_object(
        &self,
        user_id: &str,
        object_id: &str,
        index: usize,
    ) -> CatalogResult<()> {
        self.store
            .reorder(USERS, user_id, "objects", object_id, index)
    }

    /// Moves an outcome to a new position in its object's `outcomes` list.
    pub async fn reorder_outcome(
        &self,
        object_id: &str,
        outcome_id: &str,
        index: usize,
    ) -> CatalogResult<()> {
        self.store
            .reorder(OBJECTS, object_id, "outcomes", outcome_id, index)
    }

    // ---------- search ----------

    /// Suggestion search over the shared outcomes collection. See
    /// [`crate::search`] for mode semantics.
    pub async fn suggest_outcomes(
        &self,
        query: &str,
        mode: SuggestMode,
        threshold: f64,
        filter: Option<&HashMap<String, String>>,
    ) -> CatalogResult<Suggestions> {
        search::suggest_outcomes(&self.store, query, mode, threshold, filter)
    }

    /// Convenience wrapper collecting the suggestion cursor.
    pub async fn suggest_outcomes_all(
        &self,
        query: &str,
        mode: SuggestMode,
        threshold: f64,
    ) -> CatalogResult<Vec<OutcomeSuggestion>> {
        Ok(self
            .suggest_outcomes(query, mode, threshold, None)
            .await?
            .collect())
    }
}
