//! Outcome suggestion search: free text in, ranked outcome candidates out.
//!
//! Two selectable modes. Text mode scores every outcome's indexed text
//! against the query tokens and emits candidates in descending score order,
//! stopping at the first score below the caller's threshold. Regex mode
//! matches a record iff every whitespace-delimited query token appears
//! (case-insensitively) somewhere in the outcome text; no scoring, no
//! threshold. An optional field-to-substring map further restricts results
//! after ranking.
//!
//! The store yields documents in no useful order, so ranking materializes
//! and sorts every candidate up front; the threshold short-circuit applies
//! at the emission boundary of the cursor, not to the scan.
//!
//! The returned [`Suggestions`] cursor is finite and not restartable; a
//! fresh call re-runs the search.

use log::debug;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult};
use crate::schema::OUTCOMES;
use crate::store::{text_tokens, Datastore, Document};

/// One ranked suggestion: the common view shared by both outcome kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeSuggestion {
    pub id: String,
    pub author: String,
    pub name: String,
    pub date: String,
    pub outcome: String,
}

/// Which matching strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestMode {
    /// Token-scored full-text match, ranked, threshold-cut.
    Text,
    /// Every query token must appear as a substring; unranked.
    Regex,
}

/// Scores a document's outcome text against the query tokens: 1.0 per
/// distinct matched token plus 0.5 per repeated occurrence of it.
fn text_score(query_tokens: &[String], outcome_text: &str) -> f64 {
    let doc_tokens = text_tokens(outcome_text);
    let mut score = 0.0;
    for token in query_tokens {
        let occurrences = doc_tokens.iter().filter(|t| *t == token).count();
        if occurrences > 0 {
            score += 1.0 + 0.5 * (occurrences as f64 - 1.0);
        }
    }
    score
}

fn build_token_patterns(query: &str) -> CatalogResult<Vec<Regex>> {
    query
        .split_whitespace()
        .map(|token| {
            RegexBuilder::new(&regex::escape(token))
                .case_insensitive(true)
                .build()
                .map_err(|e| CatalogError::InvalidDocument(format!("bad search token: {}", e)))
        })
        .collect()
}

fn suggestion_from_document(id: &str, document: &Document) -> OutcomeSuggestion {
    let field = |name: &str| {
        document
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    OutcomeSuggestion {
        id: id.to_string(),
        author: field("author"),
        name: field("name"),
        date: field("date"),
        outcome: field("outcome"),
    }
}

/// True when the document satisfies every `field -> substring` restriction
/// (case-insensitive substring match on the stored string value).
fn passes_filter(document: &Document, filter: &HashMap<String, String>) -> bool {
    filter.iter().all(|(field, needle)| {
        document
            .get(field)
            .and_then(Value::as_str)
            .map(|value| value.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    })
}

/// A finite, ordered cursor of suggestions. Candidates are ranked when the
/// cursor is built; emission is one-at-a-time and short-circuits at the
/// first candidate under the threshold, since text-mode candidates arrive
/// pre-sorted by descending score.
pub struct Suggestions {
    ranked: std::vec::IntoIter<(f64, OutcomeSuggestion)>,
    threshold: f64,
    exhausted: bool,
}

impl Iterator for Suggestions {
    type Item = OutcomeSuggestion;

    fn next(&mut self) -> Option<OutcomeSuggestion> {
        if self.exhausted {
            return None;
        }
        match self.ranked.next() {
            Some((score, suggestion)) if score >= self.threshold => Some(suggestion),
            _ => {
                self.exhausted = true;
                None
            }
        }
    }
}

/// Runs a suggestion search over the shared outcomes collection.
///
/// `threshold` only applies in text mode; 0.0 disables the cutoff. `filter`
/// restricts results after ranking.
pub fn suggest_outcomes(
    store: &Datastore,
    query: &str,
    mode: SuggestMode,
    threshold: f64,
    filter: Option<&HashMap<String, String>>,
) -> CatalogResult<Suggestions> {
    let mut ranked: Vec<(f64, OutcomeSuggestion)> = Vec::new();

    match mode {
        SuggestMode::Text => {
            let query_tokens = text_tokens(query);
            for entry in store.scan_collection(OUTCOMES)? {
                let (id, document) = entry?;
                let outcome_text = document
                    .get("outcome")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let score = text_score(&query_tokens, outcome_text);
                if score <= 0.0 {
                    continue;
                }
                if let Some(filter) = filter {
                    if !passes_filter(&document, filter) {
                        continue;
                    }
                }
                ranked.push((score, suggestion_from_document(&id, &document)));
            }
            // Descending score, stable by id so equal scores keep a
            // reproducible order.
            ranked.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.1.id.cmp(&b.1.id))
            });
        }
        SuggestMode::Regex => {
            let patterns = build_token_patterns(query)?;
            for entry in store.scan_collection(OUTCOMES)? {
                let (id, document) = entry?;
                let outcome_text = document
                    .get("outcome")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if !patterns.iter().all(|pattern| pattern.is_match(outcome_text)) {
                    continue;
                }
                if let Some(filter) = filter {
                    if !passes_filter(&document, filter) {
                        continue;
                    }
                }
                ranked.push((f64::INFINITY, suggestion_from_document(&id, &document)));
            }
        }
    }

    debug!(
        "suggest_outcomes: {} candidate(s) for {:?} query '{}'",
        ranked.len(),
        mode,
        query
    );

    Ok(Suggestions {
        ranked: ranked.into_iter(),
        threshold: match mode {
            SuggestMode::Text => threshold,
            SuggestMode::Regex => f64::NEG_INFINITY,
        },
        exhausted: false,
    })
}
