//! Bloom taxonomy tables and the validation functions consulted by entity
//! mutators.
//!
//! The tier contents are configuration data; the contract is the lookup:
//! every taxonomy-constrained field value (bloom level, verb, assessment
//! plan, instructional strategy, object length) is checked against these
//! tables on mutation and rejected with a typed error instead of being
//! stored unvalidated.

use crate::error::{CatalogError, CatalogResult};

struct BloomTier {
    level: &'static str,
    verbs: &'static [&'static str],
    assessments: &'static [&'static str],
    strategies: &'static [&'static str],
}

static TAXONOMY: &[BloomTier] = &[
    BloomTier {
        level: "Remember and Understand",
        verbs: &[
            "classify", "define", "describe", "explain", "identify", "label", "list", "match",
            "name", "recall", "recognize", "select", "summarize",
        ],
        assessments: &["multiple choice exam", "oral exam", "quiz", "short answer"],
        strategies: &["lecture", "reading", "video"],
    },
    BloomTier {
        level: "Apply and Analyze",
        verbs: &[
            "analyze", "apply", "compare", "contrast", "demonstrate", "differentiate", "employ",
            "examine", "experiment", "illustrate", "solve", "use",
        ],
        assessments: &["case study", "lab", "problem set", "report"],
        strategies: &["case study", "discussion", "practice exercise", "simulation"],
    },
    BloomTier {
        level: "Evaluate and Synthesize",
        verbs: &[
            "argue", "assess", "construct", "create", "critique", "defend", "design", "develop",
            "evaluate", "formulate", "judge", "propose",
        ],
        assessments: &["essay", "peer review", "presentation", "project"],
        strategies: &["debate", "design exercise", "project", "research"],
    },
];

/// Accepted values for a learning object's `length` field.
pub static LENGTHS: &[&str] = &["nanomodule", "micromodule", "module", "unit", "course"];

fn tier(bloom: &str) -> Option<&'static BloomTier> {
    TAXONOMY.iter().find(|t| t.level == bloom)
}

pub fn bloom_levels() -> impl Iterator<Item = &'static str> {
    TAXONOMY.iter().map(|t| t.level)
}

pub fn validate_bloom(bloom: &str) -> CatalogResult<()> {
    if tier(bloom).is_some() {
        Ok(())
    } else {
        Err(CatalogError::Taxonomy {
            bloom: bloom.to_string(),
            field: "bloom".to_string(),
            value: bloom.to_string(),
        })
    }
}

fn validate_against(
    bloom: &str,
    field: &'static str,
    value: &str,
    pick: impl Fn(&'static BloomTier) -> &'static [&'static str],
) -> CatalogResult<()> {
    let tier = tier(bloom).ok_or_else(|| CatalogError::Taxonomy {
        bloom: bloom.to_string(),
        field: "bloom".to_string(),
        value: bloom.to_string(),
    })?;
    if pick(tier).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::Taxonomy {
            bloom: bloom.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

pub fn validate_verb(bloom: &str, verb: &str) -> CatalogResult<()> {
    validate_against(bloom, "verb", verb, |t| t.verbs)
}

pub fn validate_assessment_plan(bloom: &str, plan: &str) -> CatalogResult<()> {
    validate_against(bloom, "assessment plan", plan, |t| t.assessments)
}

pub fn validate_strategy(bloom: &str, instruction: &str) -> CatalogResult<()> {
    validate_against(bloom, "instructional strategy", instruction, |t| t.strategies)
}

pub fn validate_length(length: &str) -> CatalogResult<()> {
    if LENGTHS.contains(&length) {
        Ok(())
    } else {
        Err(CatalogError::Taxonomy {
            bloom: String::new(),
            field: "length".to_string(),
            value: length.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_are_scoped_to_their_tier() {
        assert!(validate_verb("Remember and Understand", "define").is_ok());
        assert!(validate_verb("Remember and Understand", "design").is_err());
        assert!(validate_verb("Evaluate and Synthesize", "design").is_ok());
    }

    #[test]
    fn unknown_bloom_level_is_rejected() {
        assert!(validate_bloom("Memorize").is_err());
        assert!(validate_verb("Memorize", "define").is_err());
    }

    #[test]
    fn lengths_cover_the_module_scale() {
        assert!(validate_length("nanomodule").is_ok());
        assert!(validate_length("course").is_ok());
        assert!(validate_length("semester").is_err());
    }
}
