//! In-process search backend
//!
//! Evaluates queries over documents held in memory using the Rust rendering
//! of the index schema ([`IndexDefinition::index_document`]). Useful for
//! embedding and as the engine behind the integration tests.
//!
//! Matching rules:
//! - restriction values match an indexed value when equal ignoring case;
//!   a prefix or substring of a value does not match
//! - each free-text term must occur (case-insensitively, as a substring) in
//!   at least one indexed text value; `field:term` limits it to one field
//! - relevance is the number of indexed values the terms hit; ties keep
//!   insertion order

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::db::backend::{SearchBackend, SearchHits, SearchRequest};
use crate::db::design::{DesignDocument, IndexDefinition, IndexEntry, IndexValue};
use crate::db::search::query::{check_syntax, FieldRestriction, RestrictionValue};
use crate::models::Component;
use crate::{Error, Result};

#[derive(Default)]
struct State {
    documents: Vec<JsonValue>,
    designs: HashMap<String, DesignDocument>,
}

pub struct InMemorySearchBackend {
    index: IndexDefinition,
    state: RwLock<State>,
    unavailable: AtomicBool,
}

impl InMemorySearchBackend {
    pub fn new(index: IndexDefinition) -> Self {
        Self {
            index,
            state: RwLock::new(State::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Store a raw document. Documents of other kinds are kept but never
    /// indexed.
    pub fn insert(&self, document: JsonValue) -> Result<()> {
        self.write_state()?.documents.push(document);
        Ok(())
    }

    pub fn insert_component(&self, component: &Component) -> Result<()> {
        self.insert(serde_json::to_value(component)?)
    }

    /// The stored design document, with its revision.
    pub fn design_document(&self, id: &str) -> Option<DesignDocument> {
        self.state.read().ok()?.designs.get(id).cloned()
    }

    /// Simulate an outage: every call fails with `EngineUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::EngineUnavailable(
                "in-memory backend is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::Engine("in-memory backend state poisoned".to_string()))
    }
}

#[async_trait]
impl SearchBackend for InMemorySearchBackend {
    async fn ensure_design_document(&self, design: &DesignDocument) -> Result<()> {
        self.ensure_available()?;
        let mut state = self.write_state()?;

        let next_rev = match state.designs.get(&design.id) {
            Some(existing) if existing.same_definition(design) => return Ok(()),
            Some(existing) => revision_number(existing.rev.as_deref()) + 1,
            None => 1,
        };

        let mut stored = design.clone();
        stored.rev = Some(format!("{}-memory", next_rev));
        state.designs.insert(design.id.clone(), stored);
        Ok(())
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchHits> {
        self.ensure_available()?;
        check_syntax(&request.query.text)?;

        let state = self
            .state
            .read()
            .map_err(|_| Error::Engine("in-memory backend state poisoned".to_string()))?;

        let registered = state
            .designs
            .get(request.design_doc_id)
            .is_some_and(|d| d.nouveau.contains_key(request.index));
        if !registered || request.index != self.index.name() {
            return Err(Error::Engine(format!(
                "index {}/{} not found",
                request.design_doc_id, request.index
            )));
        }

        let terms = parse_terms(&request.query.text);
        let mut scored: Vec<(usize, &JsonValue)> = Vec::new();

        for document in &state.documents {
            let Some(entries) = self.index.index_document(document) else {
                continue;
            };
            if !request
                .query
                .restrictions
                .iter()
                .all(|r| restriction_matches(r, &entries))
            {
                continue;
            }
            if let Some(score) = text_score(&terms, &entries) {
                scored.push((score, document));
            }
        }

        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let total = scored.len();
        let (offset, limit) = match request.window {
            Some(w) => (w.offset, w.limit),
            None => (0, total),
        };
        let documents = scored
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect();

        Ok(SearchHits { total, documents })
    }
}

fn revision_number(rev: Option<&str>) -> u64 {
    rev.and_then(|r| r.split('-').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

fn restriction_matches(restriction: &FieldRestriction, entries: &[IndexEntry]) -> bool {
    entries
        .iter()
        .filter(|e| e.field == restriction.field)
        .any(|entry| {
            restriction
                .values
                .iter()
                .any(|value| match (value, &entry.value) {
                    (RestrictionValue::Text(want), IndexValue::Text(have)) => {
                        !want.is_empty() && want.to_lowercase() == have.to_lowercase()
                    }
                    (RestrictionValue::Number(want), IndexValue::Double(have)) => want == have,
                    _ => false,
                })
        })
}

#[derive(Debug, PartialEq)]
struct Term {
    field: Option<String>,
    text: String,
}

fn parse_terms(text: &str) -> Vec<Term> {
    text.split_whitespace()
        .filter(|t| !matches!(*t, "AND" | "OR" | "NOT" | "&&" | "||"))
        .filter_map(|raw| {
            let raw = raw.trim_start_matches(['+', '-', '!']);
            let (field, value) = match raw.split_once(':') {
                Some((field, value)) if !field.is_empty() => {
                    (Some(field.trim_matches(['(', ')']).to_string()), value)
                }
                _ => (None, raw),
            };
            let value = value
                .trim_matches(|c: char| matches!(c, '(' | ')' | '"' | '*' | '?' | '\\'))
                .to_lowercase();
            (!value.is_empty()).then_some(Term { field, text: value })
        })
        .collect()
}

/// `None` when some term has no hit.
fn text_score(terms: &[Term], entries: &[IndexEntry]) -> Option<usize> {
    let mut score = 0;
    for term in terms {
        let hits = entries
            .iter()
            .filter(|e| term.field.as_deref().map_or(true, |f| f == e.field))
            .filter(|e| match &e.value {
                IndexValue::Text(s) => s.to_lowercase().contains(&term.text),
                IndexValue::Double(_) => false,
            })
            .count();
        if hits == 0 {
            return None;
        }
        score += hits;
    }
    Some(score)
}
