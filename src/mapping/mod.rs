//! Entity-to-record mapping: converts between the mutable domain entities
//! and the flat documents the store persists.
//!
//! Insert documents strip store-computed fields and flatten nested value
//! objects (goals, assessments, strategies) into plain arrays. Hydration
//! goes the other way; the shallow variants fill only scalar fields so a
//! summary listing never triggers deep fetches. Denormalized fields on
//! learning outcomes (`author`, `name`, `date`) are filled here, at insert
//! time, from the parent object and its owner.

use serde_json::{json, Value};

use crate::entities::{
    AssessmentPlan, InstructionalStrategy, LearningGoal, LearningObject, LearningOutcome,
    Outcome, StandardOutcome, User,
};
use crate::error::{CatalogError, CatalogResult};
use crate::store::Document;

/// The derived outcome phrase stored alongside a learning outcome.
pub fn derived_outcome(verb: &str, text: &str) -> String {
    format!("{} {}", verb, text)
}

fn get_str(document: &Document, field: &str) -> CatalogResult<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            CatalogError::InvalidDocument(format!("missing or non-string field '{}'", field))
        })
}

fn get_i64(document: &Document, field: &str) -> CatalogResult<i64> {
    document.get(field).and_then(Value::as_i64).ok_or_else(|| {
        CatalogError::InvalidDocument(format!("missing or non-integer field '{}'", field))
    })
}

/// Reads an array-of-ids field (a registry or mapping list) as strings.
pub fn registered_ids(document: &Document, field: &str) -> Vec<String> {
    match document.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn nested<T: serde::de::DeserializeOwned>(document: &Document, field: &str) -> CatalogResult<Vec<T>> {
    match document.get(field) {
        Some(value @ Value::Array(_)) => Ok(serde_json::from_value(value.clone())?),
        _ => Ok(Vec::new()),
    }
}

// ---------- users ----------

pub fn user_to_insert(user: &User) -> Document {
    let mut document = Document::new();
    document.insert("id".into(), json!(user.id));
    document.insert("name".into(), json!(user.name));
    document.insert("email".into(), json!(user.email));
    document.insert("pwdhash".into(), json!(user.pwdhash));
    document
}

pub fn user_from_document(record_id: &str, document: &Document) -> CatalogResult<User> {
    Ok(User {
        record_id: Some(record_id.to_string()),
        id: get_str(document, "id")?,
        name: get_str(document, "name")?,
        email: get_str(document, "email")?,
        pwdhash: get_str(document, "pwdhash")?,
        object_ids: registered_ids(document, "objects"),
    })
}

// ---------- learning objects ----------

pub fn object_to_insert(object: &LearningObject) -> Document {
    let mut document = Document::new();
    document.insert("author".into(), json!(object.author));
    document.insert("name".into(), json!(object.name));
    document.insert("date".into(), json!(object.date));
    document.insert("length".into(), json!(object.length));
    document.insert(
        "goals".into(),
        json!(object
            .goals
            .iter()
            .map(|goal| json!({ "text": goal.text }))
            .collect::<Vec<_>>()),
    );
    document
}

/// Shallow hydration: scalar fields only, goals included, outcomes left for
/// the caller to walk if a full load is wanted.
pub fn object_summary_from_document(
    record_id: &str,
    document: &Document,
) -> CatalogResult<LearningObject> {
    Ok(LearningObject {
        record_id: Some(record_id.to_string()),
        author: get_str(document, "author")?,
        name: get_str(document, "name")?,
        date: get_str(document, "date")?,
        length: get_str(document, "length")?,
        goals: nested::<LearningGoal>(document, "goals")?,
        outcomes: Vec::new(),
    })
}

/// Record ids of the object's outcomes, in registry order.
pub fn object_outcome_ids(document: &Document) -> Vec<String> {
    registered_ids(document, "outcomes")
}

// ---------- learning outcomes ----------

/// Builds the storage document for a learning outcome under `source_id`.
/// The denormalized author/name/date copies and the derived outcome phrase
/// are computed here; callers never supply them.
pub fn outcome_to_insert(
    outcome: &LearningOutcome,
    source_id: &str,
    author_name: &str,
    object_name: &str,
    object_date: &str,
) -> Document {
    let mut document = Document::new();
    document.insert("source".into(), json!(source_id));
    document.insert("tag".into(), json!(outcome.tag));
    document.insert("author".into(), json!(author_name));
    document.insert("name".into(), json!(object_name));
    document.insert("date".into(), json!(object_date));
    document.insert("bloom".into(), json!(outcome.bloom));
    document.insert("verb".into(), json!(outcome.verb));
    document.insert("text".into(), json!(outcome.text));
    document.insert(
        "outcome".into(),
        json!(derived_outcome(&outcome.verb, &outcome.text)),
    );
    document.insert(
        "assessments".into(),
        json!(outcome
            .assessments
            .iter()
            .map(|a| json!({ "plan": a.plan, "text": a.text }))
            .collect::<Vec<_>>()),
    );
    document.insert(
        "strategies".into(),
        json!(outcome
            .strategies
            .iter()
            .map(|s| json!({ "instruction": s.instruction, "text": s.text }))
            .collect::<Vec<_>>()),
    );
    document.insert("mappings".into(), json!(outcome.mappings));
    document
}

/// The editable slice of a learning outcome, for tag-keyed reconciliation.
pub fn outcome_to_edit(outcome: &LearningOutcome) -> Document {
    let mut document = Document::new();
    document.insert("bloom".into(), json!(outcome.bloom));
    document.insert("verb".into(), json!(outcome.verb));
    document.insert("text".into(), json!(outcome.text));
    document.insert(
        "assessments".into(),
        json!(outcome
            .assessments
            .iter()
            .map(|a| json!({ "plan": a.plan, "text": a.text }))
            .collect::<Vec<_>>()),
    );
    document.insert(
        "strategies".into(),
        json!(outcome
            .strategies
            .iter()
            .map(|s| json!({ "instruction": s.instruction, "text": s.text }))
            .collect::<Vec<_>>()),
    );
    document
}

pub fn learning_outcome_from_document(
    record_id: &str,
    document: &Document,
) -> CatalogResult<LearningOutcome> {
    Ok(LearningOutcome {
        record_id: Some(record_id.to_string()),
        source: Some(get_str(document, "source")?),
        tag: get_i64(document, "tag")?,
        author: get_str(document, "author")?,
        name: get_str(document, "name")?,
        date: get_str(document, "date")?,
        bloom: get_str(document, "bloom")?,
        verb: get_str(document, "verb")?,
        text: get_str(document, "text")?,
        assessments: nested::<AssessmentPlan>(document, "assessments")?,
        strategies: nested::<InstructionalStrategy>(document, "strategies")?,
        mappings: registered_ids(document, "mappings"),
    })
}

// ---------- standard outcomes ----------

/// Builds the storage document for a standard outcome, including the
/// `source`/`tag` aliases that fold it into the shared unique index.
pub fn standard_outcome_to_insert(outcome: &StandardOutcome) -> Document {
    let mut document = Document::new();
    document.insert("author".into(), json!(outcome.author));
    document.insert("name".into(), json!(outcome.name));
    document.insert("date".into(), json!(outcome.date));
    document.insert("outcome".into(), json!(outcome.outcome));
    document.insert("source".into(), json!(outcome.author));
    document.insert("tag".into(), json!(outcome.outcome));
    document
}

pub fn standard_outcome_from_document(
    record_id: &str,
    document: &Document,
) -> CatalogResult<StandardOutcome> {
    Ok(StandardOutcome {
        record_id: Some(record_id.to_string()),
        author: get_str(document, "author")?,
        name: get_str(document, "name")?,
        date: get_str(document, "date")?,
        outcome: get_str(document, "outcome")?,
    })
}

/// Hydrates either outcome kind from a document in the shared `outcomes`
/// collection, discriminating on the `bloom` field.
pub fn outcome_from_document(record_id: &str, document: &Document) -> CatalogResult<Outcome> {
    if document.contains_key("bloom") {
        Ok(Outcome::Learning(learning_outcome_from_document(
            record_id, document,
        )?))
    } else {
        Ok(Outcome::Standard(standard_outcome_from_document(
            record_id, document,
        )?))
    }
}
