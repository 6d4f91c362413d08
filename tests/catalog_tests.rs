//! Integration tests for the catalog operation surface: foreign keys,
//! cascades, registries, denormalization, reconciliation, and reordering.

mod common;

use common::CatalogFixture;
use learning_catalog::{
    CatalogError, EntityKind, LearningObject, LearningOutcome, UserEdit,
};
use serde_json::json;

#[tokio::test]
async fn insert_with_missing_author_fails_and_leaves_store_unchanged() {
    let fixture = CatalogFixture::new().await;
    let object = LearningObject::new("no-such-user", "Orphan Object", "module").unwrap();

    let err = fixture
        .catalog
        .insert_learning_object(&object)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ForeignKey { .. }), "{err}");

    // No partial write: the same (author, name) pair must be insertable
    // once the author exists, i.e. no orphaned unique-index entry remains.
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object = LearningObject::new(&ned, "Orphan Object", "module").unwrap();
    fixture
        .catalog
        .insert_learning_object(&object)
        .await
        .expect("insert after fixing the author should succeed");
}

#[tokio::test]
async fn outcome_insert_validates_mapping_targets() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;

    let mut outcome =
        LearningOutcome::new(0, "Apply and Analyze", "employ", "the king's counsel").unwrap();
    outcome.mappings.push("no-such-outcome".to_string());
    let err = fixture
        .catalog
        .insert_learning_outcome(&object_id, &outcome)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ForeignKey { .. }), "{err}");
}

#[tokio::test]
async fn deleting_a_user_cascades_through_objects_and_outcomes() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let first = fixture.seed_object(&ned, "Hand of the King").await;
    let second = fixture.seed_object(&ned, "Warden of the North").await;
    let outcome_a = fixture.seed_outcome(&first, 0, "justice in the king's name").await;
    let outcome_b = fixture.seed_outcome(&first, 1, "counsel at court").await;
    let outcome_c = fixture.seed_outcome(&second, 0, "the northern levies").await;

    fixture.catalog.delete_user(&ned).await.unwrap();

    for object_id in [&first, &second] {
        let err = fixture
            .catalog
            .fetch_learning_object(object_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }
    for outcome_id in [&outcome_a, &outcome_b, &outcome_c] {
        let err = fixture
            .catalog
            .fetch_learning_outcome(outcome_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }
}

#[tokio::test]
async fn object_registry_tracks_insert_and_delete() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;

    let user = fixture.catalog.fetch_user(&ned).await.unwrap();
    assert_eq!(user.object_ids, vec![object_id.clone()]);

    fixture
        .catalog
        .delete_learning_object(&object_id)
        .await
        .unwrap();
    let user = fixture.catalog.fetch_user(&ned).await.unwrap();
    assert!(user.object_ids.is_empty());
}

#[tokio::test]
async fn user_name_edit_propagates_to_outcome_authors() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;
    let outcome_id = fixture.seed_outcome(&object_id, 0, "the king's counsel").await;

    fixture
        .catalog
        .edit_user(
            &ned,
            UserEdit {
                name: Some("Lord Eddard Stark".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = fixture
        .catalog
        .fetch_learning_outcome(&outcome_id)
        .await
        .unwrap();
    assert_eq!(outcome.author, "Lord Eddard Stark");
}

#[tokio::test]
async fn object_name_and_date_edits_propagate_to_outcomes() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;
    let outcome_id = fixture.seed_outcome(&object_id, 0, "the king's counsel").await;

    fixture
        .catalog
        .edit_learning_object(
            &object_id,
            learning_catalog::LearningObjectEdit {
                name: Some("Protector of the Realm".to_string()),
                date: Some("299".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = fixture
        .catalog
        .fetch_learning_outcome(&outcome_id)
        .await
        .unwrap();
    assert_eq!(outcome.name, "Protector of the Realm");
    assert_eq!(outcome.date, "299");
}

#[tokio::test]
async fn duplicate_login_and_duplicate_object_name_are_rejected() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;

    let twin = learning_catalog::User::new("ned", "Other Ned", "other@example.test", "pwdhash");
    let err = fixture.catalog.insert_user(&twin).await.unwrap_err();
    assert!(matches!(err, CatalogError::Uniqueness { .. }), "{err}");

    fixture.seed_object(&ned, "Hand of the King").await;
    let duplicate = LearningObject::new(&ned, "Hand of the King", "module").unwrap();
    let err = fixture
        .catalog
        .insert_learning_object(&duplicate)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Uniqueness { .. }), "{err}");

    // A different author may reuse the name: uniqueness is the pair.
    let robert = fixture.seed_user("robert", "Robert Baratheon").await;
    fixture.seed_object(&robert, "Hand of the King").await;
}

#[tokio::test]
async fn fixed_and_auto_fields_reject_edits() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let robert = fixture.seed_user("robert", "Robert Baratheon").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;

    let mut partial = learning_catalog::store::Document::new();
    partial.insert("author".into(), json!(robert));
    let err = fixture
        .catalog
        .store()
        .edit(EntityKind::LearningObject, &object_id, partial)
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDocument(_)), "{err}");

    // Standard outcomes are immutable after creation: every field is
    // either fixed or auto.
    let standard = fixture
        .seed_standard("NICE", "K0002", "Employ risk management processes")
        .await;
    let mut partial = learning_catalog::store::Document::new();
    partial.insert("name".into(), json!("K9999"));
    let err = fixture
        .catalog
        .store()
        .edit(EntityKind::StandardOutcome, &standard, partial)
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDocument(_)), "{err}");
}

#[tokio::test]
async fn update_learning_object_reconciles_by_tag_and_is_idempotent() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;

    let mut object = LearningObject::new(&ned, "Hand of the King", "module").unwrap();
    object.outcomes.push(
        LearningOutcome::new(0, "Apply and Analyze", "employ", "the king's counsel").unwrap(),
    );
    object.outcomes.push(
        LearningOutcome::new(1, "Apply and Analyze", "analyze", "the realm's finances").unwrap(),
    );
    let object_id = fixture
        .catalog
        .insert_learning_object(&object)
        .await
        .unwrap();

    // Keep tag 0 with new text, drop tag 1, add tag 2.
    let mut revised = object.clone();
    revised.outcomes.clear();
    revised.outcomes.push(
        LearningOutcome::new(0, "Apply and Analyze", "employ", "diplomacy at court").unwrap(),
    );
    revised.outcomes.push(
        LearningOutcome::new(2, "Evaluate and Synthesize", "judge", "disputes fairly").unwrap(),
    );

    fixture
        .catalog
        .update_learning_object(&object_id, &revised)
        .await
        .unwrap();
    let after_first = fixture
        .catalog
        .fetch_learning_object(&object_id)
        .await
        .unwrap();
    let mut tags: Vec<i64> = after_first.outcomes.iter().map(|o| o.tag).collect();
    tags.sort_unstable();
    assert_eq!(tags, vec![0, 2]);
    let kept = after_first.outcomes.iter().find(|o| o.tag == 0).unwrap();
    assert_eq!(kept.text, "diplomacy at court");

    // Second identical call: same outcome set, no duplicates, no deletes.
    fixture
        .catalog
        .update_learning_object(&object_id, &revised)
        .await
        .unwrap();
    let after_second = fixture
        .catalog
        .fetch_learning_object(&object_id)
        .await
        .unwrap();
    assert_eq!(after_second.outcomes.len(), 2);
    let mut tags: Vec<i64> = after_second.outcomes.iter().map(|o| o.tag).collect();
    tags.sort_unstable();
    assert_eq!(tags, vec![0, 2]);
}

#[tokio::test]
async fn reorder_checks_bounds_and_preserves_other_entries() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let first = fixture.seed_object(&ned, "First").await;
    let second = fixture.seed_object(&ned, "Second").await;
    let third = fixture.seed_object(&ned, "Third").await;

    let err = fixture
        .catalog
        .reorder_object(&ned, &third, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::RegistryConsistency { .. }), "{err}");

    fixture.catalog.reorder_object(&ned, &third, 0).await.unwrap();
    let user = fixture.catalog.fetch_user(&ned).await.unwrap();
    assert_eq!(user.object_ids, vec![third, first, second]);
}

#[tokio::test]
async fn reorder_of_unregistered_item_is_rejected() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let robert = fixture.seed_user("robert", "Robert Baratheon").await;
    fixture.seed_object(&ned, "Hand of the King").await;
    let roberts_object = fixture.seed_object(&robert, "Crown Finances").await;

    let err = fixture
        .catalog
        .reorder_object(&ned, &roberts_object, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::RegistryConsistency { .. }), "{err}");
}

#[tokio::test]
async fn mapping_lifecycle_and_sweep_on_target_delete() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;
    let outcome_id = fixture.seed_outcome(&object_id, 0, "risk management processes").await;
    let standard = fixture
        .seed_standard("NICE", "K0002", "Employ risk management processes")
        .await;

    fixture
        .catalog
        .map_outcome(&outcome_id, &standard)
        .await
        .unwrap();
    let outcome = fixture
        .catalog
        .fetch_learning_outcome(&outcome_id)
        .await
        .unwrap();
    assert_eq!(outcome.mappings, vec![standard.clone()]);

    // The full object load carries mappings as raw ids; callers resolve
    // them through fetch_outcome when needed.
    let object = fixture
        .catalog
        .fetch_learning_object(&object_id)
        .await
        .unwrap();
    assert_eq!(object.outcomes[0].mappings, vec![standard.clone()]);

    let err = fixture
        .catalog
        .map_outcome(&outcome_id, "no-such-outcome")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ForeignKey { .. }), "{err}");

    // Deleting the mapped-to outcome sweeps it out of the mappings list.
    fixture
        .catalog
        .store()
        .remove(EntityKind::StandardOutcome, &standard)
        .unwrap();
    let outcome = fixture
        .catalog
        .fetch_learning_outcome(&outcome_id)
        .await
        .unwrap();
    assert!(outcome.mappings.is_empty());

    let err = fixture
        .catalog
        .unmap_outcome(&outcome_id, &standard)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::RegistryConsistency { .. }), "{err}");
}

#[tokio::test]
async fn find_operations_resolve_unique_keys() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;
    let outcome_id = fixture.seed_outcome(&object_id, 7, "the king's counsel").await;

    assert_eq!(fixture.catalog.find_user("ned").await.unwrap(), ned);
    assert_eq!(
        fixture
            .catalog
            .find_learning_object(&ned, "Hand of the King")
            .await
            .unwrap(),
        object_id
    );
    assert_eq!(
        fixture
            .catalog
            .find_learning_outcome(&object_id, 7)
            .await
            .unwrap(),
        outcome_id
    );
    assert!(matches!(
        fixture.catalog.find_user("sansa").await.unwrap_err(),
        CatalogError::NotFound { .. }
    ));
}

#[tokio::test]
async fn summary_load_omits_goals_and_outcomes() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let mut object = LearningObject::new(&ned, "Hand of the King", "unit").unwrap();
    object.add_goal("govern in the king's absence");
    object.outcomes.push(
        LearningOutcome::new(0, "Apply and Analyze", "employ", "the king's counsel").unwrap(),
    );
    let object_id = fixture
        .catalog
        .insert_learning_object(&object)
        .await
        .unwrap();

    let summaries = fixture.catalog.load_user_objects(&ned).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "Hand of the King");
    assert_eq!(summaries[0].length, "unit");
    assert!(summaries[0].goals.is_empty());
    assert!(summaries[0].outcomes.is_empty());

    let full = fixture
        .catalog
        .fetch_learning_object(&object_id)
        .await
        .unwrap();
    assert_eq!(full.goals.len(), 1);
    assert_eq!(full.outcomes.len(), 1);
    assert_eq!(full.outcomes[0].author, "Eddard Stark");
}

#[tokio::test]
async fn fetch_outcome_returns_the_right_variant() {
    let fixture = CatalogFixture::new().await;
    let ned = fixture.seed_user("ned", "Eddard Stark").await;
    let object_id = fixture.seed_object(&ned, "Hand of the King").await;
    let outcome_id = fixture.seed_outcome(&object_id, 0, "the king's counsel").await;
    let standard = fixture
        .seed_standard("NICE", "K0002", "Employ risk management processes")
        .await;

    match fixture.catalog.fetch_outcome(&outcome_id).await.unwrap() {
        learning_catalog::Outcome::Learning(outcome) => {
            assert_eq!(outcome.outcome(), "employ the king's counsel");
        }
        other => panic!("expected a learning outcome, got {:?}", other),
    }
    match fixture.catalog.fetch_outcome(&standard).await.unwrap() {
        learning_catalog::Outcome::Standard(outcome) => {
            assert_eq!(outcome.author, "NICE");
        }
        other => panic!("expected a standard outcome, got {:?}", other),
    }
}
