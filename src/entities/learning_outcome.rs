//! The learning outcome entity: one measurable outcome of a learning
//! object, phrased as a taxonomy-constrained verb plus free text.

use serde::{Deserialize, Serialize};

use super::taxonomy;
use crate::error::CatalogResult;

/// How an outcome will be assessed. `plan` is constrained by the outcome's
/// Bloom level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentPlan {
    pub plan: String,
    pub text: String,
}

/// How an outcome will be taught. `instruction` is constrained by the
/// outcome's Bloom level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionalStrategy {
    pub instruction: String,
    pub text: String,
}

/// A learning outcome. `(source, tag)` is unique; `author`, `name`, and
/// `date` are denormalized copies of the parent object's owner name, object
/// name, and object date, maintained by the store rather than by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningOutcome {
    /// Store record id; `None` until persisted or hydrated.
    pub record_id: Option<String>,
    /// Record id of the parent learning object; `None` until attached.
    pub source: Option<String>,
    /// Position tag, unique within the parent object.
    pub tag: i64,
    /// Denormalized: the owning user's name.
    pub author: String,
    /// Denormalized: the parent object's name.
    pub name: String,
    /// Denormalized: the parent object's date.
    pub date: String,
    pub bloom: String,
    pub verb: String,
    pub text: String,
    pub assessments: Vec<AssessmentPlan>,
    pub strategies: Vec<InstructionalStrategy>,
    /// Record ids of outcomes this one maps to (of either kind).
    pub mappings: Vec<String>,
}

impl LearningOutcome {
    /// Creates an outcome at the given Bloom level. The verb must belong to
    /// that level's verb list.
    pub fn new(tag: i64, bloom: &str, verb: &str, text: impl Into<String>) -> CatalogResult<Self> {
        taxonomy::validate_bloom(bloom)?;
        taxonomy::validate_verb(bloom, verb)?;
        Ok(Self {
            record_id: None,
            source: None,
            tag,
            author: String::new(),
            name: String::new(),
            date: String::new(),
            bloom: bloom.to_string(),
            verb: verb.to_string(),
            text: text.into(),
            assessments: Vec::new(),
            strategies: Vec::new(),
            mappings: Vec::new(),
        })
    }

    /// The derived outcome phrase, `verb + " " + text`.
    pub fn outcome(&self) -> String {
        format!("{} {}", self.verb, self.text)
    }

    pub fn set_verb(&mut self, verb: &str) -> CatalogResult<()> {
        taxonomy::validate_verb(&self.bloom, verb)?;
        self.verb = verb.to_string();
        Ok(())
    }

    pub fn add_assessment(
        &mut self,
        plan: &str,
        text: impl Into<String>,
    ) -> CatalogResult<()> {
        taxonomy::validate_assessment_plan(&self.bloom, plan)?;
        self.assessments.push(AssessmentPlan {
            plan: plan.to_string(),
            text: text.into(),
        });
        Ok(())
    }

    pub fn add_strategy(
        &mut self,
        instruction: &str,
        text: impl Into<String>,
    ) -> CatalogResult<()> {
        taxonomy::validate_strategy(&self.bloom, instruction)?;
        self.strategies.push(InstructionalStrategy {
            instruction: instruction.to_string(),
            text: text.into(),
        });
        Ok(())
    }
}
