//! The schema registry: one descriptor per entity type, registered
//! explicitly at startup and looked up by [`EntityKind`].
//!
//! This table is what lets a single generic insert/edit/remove
//! implementation serve all four entity shapes without per-entity
//! duplication. The four descriptors encode the whole relationship graph:
//! users own learning objects (cascade down, registry back up), learning
//! objects own learning outcomes the same way, and outcomes may map to
//! other outcomes without ownership.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::descriptor::{EntityDescriptor, EntityKind, ForeignKeySpec};

pub const USERS: &str = "users";
pub const OBJECTS: &str = "objects";
/// Shared by learning outcomes and standard outcomes.
pub const OUTCOMES: &str = "outcomes";

static USER: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::User,
    collection: USERS,
    fields: &["_id", "id", "name", "email", "pwdhash", "objects"],
    autos: &["_id", "objects"],
    fixeds: &[],
    uniques: &["id"],
    texts: &[],
    foreigns: &[(
        "objects",
        ForeignKeySpec {
            target: OBJECTS,
            cascade: true,
            registry: None,
        },
    )],
};

static LEARNING_OBJECT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::LearningObject,
    collection: OBJECTS,
    fields: &["_id", "author", "name", "date", "length", "goals", "outcomes"],
    autos: &["_id", "outcomes"],
    fixeds: &["author"],
    uniques: &["author", "name"],
    texts: &[],
    foreigns: &[
        (
            "author",
            ForeignKeySpec {
                target: USERS,
                cascade: false,
                registry: Some("objects"),
            },
        ),
        (
            "outcomes",
            ForeignKeySpec {
                target: OUTCOMES,
                cascade: true,
                registry: None,
            },
        ),
    ],
};

static LEARNING_OUTCOME: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::LearningOutcome,
    collection: OUTCOMES,
    fields: &[
        "_id",
        "source",
        "tag",
        "author",
        "name",
        "date",
        "bloom",
        "verb",
        "text",
        "outcome",
        "assessments",
        "strategies",
        "mappings",
    ],
    // author/name/date are denormalized copies of the parent object's
    // author-name/object-name/object-date; outcome is derived verb+" "+text.
    autos: &["_id", "author", "name", "date", "outcome"],
    fixeds: &["source", "tag"],
    uniques: &["source", "tag"],
    texts: &[],
    foreigns: &[
        (
            "source",
            ForeignKeySpec {
                target: OBJECTS,
                cascade: false,
                registry: Some("outcomes"),
            },
        ),
        (
            "mappings",
            ForeignKeySpec {
                target: OUTCOMES,
                cascade: false,
                registry: None,
            },
        ),
    ],
};

static STANDARD_OUTCOME: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::StandardOutcome,
    collection: OUTCOMES,
    fields: &["_id", "author", "name", "date", "outcome", "source", "tag"],
    // source and tag are aliases filled from author and outcome so that the
    // shared (source, tag) unique index covers both outcome kinds.
    autos: &["_id", "source", "tag"],
    fixeds: &["author", "name", "date", "outcome"],
    uniques: &["source", "tag"],
    texts: &["outcome"],
    foreigns: &[],
};

/// Lookup table over the four entity descriptors.
pub struct SchemaRegistry {
    descriptors: HashMap<EntityKind, &'static EntityDescriptor>,
}

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(|| {
    let registry = SchemaRegistry::with_descriptors(&[
        &USER,
        &LEARNING_OBJECT,
        &LEARNING_OUTCOME,
        &STANDARD_OUTCOME,
    ]);
    registry
        .check_invariants()
        .expect("builtin schema descriptors violate registry invariants");
    registry
});

/// Returns the process-wide registry holding the builtin descriptors.
pub fn schema_registry() -> &'static SchemaRegistry {
    &REGISTRY
}

impl SchemaRegistry {
    fn with_descriptors(descriptors: &[&'static EntityDescriptor]) -> Self {
        let mut table = HashMap::new();
        for descriptor in descriptors {
            table.insert(descriptor.kind, *descriptor);
        }
        Self { descriptors: table }
    }

    pub fn descriptor(&self, kind: EntityKind) -> &'static EntityDescriptor {
        self.descriptors[&kind]
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static EntityDescriptor> + '_ {
        self.descriptors.values().copied()
    }

    pub fn collection_for(&self, kind: EntityKind) -> &'static str {
        self.descriptor(kind).collection
    }

    pub fn fields_for(&self, kind: EntityKind) -> &'static [&'static str] {
        self.descriptor(kind).fields
    }

    pub fn autos_for(&self, kind: EntityKind) -> &'static [&'static str] {
        self.descriptor(kind).autos
    }

    pub fn fixeds_for(&self, kind: EntityKind) -> &'static [&'static str] {
        self.descriptor(kind).fixeds
    }

    pub fn foreigns_for(&self, kind: EntityKind) -> Vec<&'static str> {
        self.descriptor(kind)
            .foreigns
            .iter()
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn foreign_data(&self, kind: EntityKind, field: &str) -> Option<&'static ForeignKeySpec> {
        self.descriptor(kind)
            .foreigns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, spec)| spec)
    }

    pub fn uniques_for(&self, kind: EntityKind) -> &'static [&'static str] {
        self.descriptor(kind).uniques
    }

    pub fn texts_for(&self, kind: EntityKind) -> &'static [&'static str] {
        self.descriptor(kind).texts
    }

    /// Every foreign field carrying a registry back-pointer must be fixed.
    /// A registry holds ids keyed by the owning relationship; if the
    /// relationship field could change under an `edit`, the registry would
    /// point at a value that no longer exists.
    fn check_invariants(&self) -> Result<(), String> {
        for descriptor in self.descriptors.values() {
            for (field, spec) in descriptor.foreigns {
                if spec.registry.is_some() && !descriptor.is_fixed(field) {
                    return Err(format!(
                        "{}: registry-bearing foreign field '{}' is not fixed",
                        descriptor.collection, field
                    ));
                }
                if spec.registry.is_some() && spec.cascade {
                    return Err(format!(
                        "{}: foreign field '{}' cannot both cascade and carry a registry",
                        descriptor.collection, field
                    ));
                }
            }
            for field in descriptor.autos {
                if !descriptor.fields.contains(field) {
                    return Err(format!(
                        "{}: auto field '{}' missing from field list",
                        descriptor.collection, field
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_holds_all_four_kinds() {
        let registry = schema_registry();
        assert_eq!(registry.collection_for(EntityKind::User), "users");
        assert_eq!(registry.collection_for(EntityKind::LearningObject), "objects");
        assert_eq!(registry.collection_for(EntityKind::LearningOutcome), "outcomes");
        assert_eq!(registry.collection_for(EntityKind::StandardOutcome), "outcomes");
    }

    #[test]
    fn registry_bearing_fields_are_fixed() {
        let registry = schema_registry();
        for descriptor in registry.descriptors() {
            for (field, spec) in descriptor.foreigns {
                if spec.registry.is_some() {
                    assert!(
                        descriptor.is_fixed(field),
                        "{}.{} carries a registry but is not fixed",
                        descriptor.collection,
                        field
                    );
                }
            }
        }
    }

    #[test]
    fn cascade_graph_is_acyclic() {
        // users -> objects -> outcomes, with mappings explicitly
        // non-cascading; walking cascade edges must terminate.
        let registry = schema_registry();
        let object_spec = registry
            .foreign_data(EntityKind::User, "objects")
            .expect("user objects spec");
        assert!(object_spec.cascade);
        let outcome_spec = registry
            .foreign_data(EntityKind::LearningObject, "outcomes")
            .expect("object outcomes spec");
        assert!(outcome_spec.cascade);
        let mapping_spec = registry
            .foreign_data(EntityKind::LearningOutcome, "mappings")
            .expect("outcome mappings spec");
        assert!(!mapping_spec.cascade);
    }

    #[test]
    fn standard_outcome_has_text_index() {
        let registry = schema_registry();
        assert_eq!(registry.texts_for(EntityKind::StandardOutcome), &["outcome"]);
        assert!(!registry
            .descriptor(EntityKind::StandardOutcome)
            .combined_unique_text_index());
    }

    #[test]
    fn autos_are_never_fixed_requirements_for_insert() {
        let registry = schema_registry();
        let descriptor = registry.descriptor(EntityKind::LearningOutcome);
        for field in ["author", "name", "date", "outcome"] {
            assert!(descriptor.is_auto(field));
        }
        assert!(!descriptor.is_auto("bloom"));
    }
}
