//! Query execution against the registered component index

use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::query::{SearchQuery, SubQueryRestrictions};
use super::sort::ResolvedSort;
use crate::db::backend::{PageWindow, SearchBackend, SearchHits, SearchRequest};
use crate::db::design::IndexDefinition;
use crate::models::{Component, PaginationData};
use crate::{Error, Result};

/// Runs text + restriction queries through a [`SearchBackend`].
///
/// Performs no permission filtering; results are exactly what the engine
/// matched.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn SearchBackend>,
    index: Arc<IndexDefinition>,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn SearchBackend>, index: Arc<IndexDefinition>) -> Self {
        Self { backend, index }
    }

    pub fn index(&self) -> &IndexDefinition {
        &self.index
    }

    /// Install the index design document.
    ///
    /// Any failure is reported as `SchemaRegistration`; the caller must not
    /// serve searches afterwards.
    pub async fn register_index(&self) -> Result<()> {
        let design = self.index.design_document();
        self.backend
            .ensure_design_document(&design)
            .await
            .map_err(|e| Error::SchemaRegistration {
                name: design.id.clone(),
                reason: e.to_string(),
            })?;
        tracing::info!(
            design_doc = %design.id,
            index = %self.index.name(),
            "Search index registered"
        );
        Ok(())
    }

    /// Every match, in relevance order.
    pub async fn search(
        &self,
        text: &str,
        restrictions: &SubQueryRestrictions,
    ) -> Result<Vec<Component>> {
        let query = SearchQuery::build(text, restrictions, &self.index)?;
        let hits = self.run(&query, None).await?;
        decode_components(hits.documents)
    }

    /// One page of matches.
    ///
    /// The engine selects the page by relevance. With a `sort`, the records
    /// of that page are re-sorted; the returned envelope still describes the
    /// engine's page (offset, size, total matches).
    pub async fn search_paged(
        &self,
        text: &str,
        restrictions: &SubQueryRestrictions,
        page: &PaginationData,
        sort: Option<&ResolvedSort>,
    ) -> Result<(PaginationData, Vec<Component>)> {
        let query = SearchQuery::build(text, restrictions, &self.index)?;
        let window = PageWindow {
            offset: page.row_offset,
            limit: page.page_size,
        };
        let hits = self.run(&query, Some(window)).await?;

        let mut response = page.clone();
        response.total_row_count = hits.total;

        let mut components = decode_components(hits.documents)?;
        if let Some(sort) = sort {
            sort.apply(&mut components);
        }
        Ok((response, components))
    }

    async fn run(&self, query: &SearchQuery, window: Option<PageWindow>) -> Result<SearchHits> {
        if query.matches_nothing() {
            tracing::debug!("Restriction without usable values, skipping engine");
            return Ok(SearchHits::default());
        }

        let request = SearchRequest {
            design_doc_id: self.index.design_doc_id(),
            index: self.index.name(),
            query,
            window,
        };
        let hits = self.backend.search(&request).await?;
        tracing::debug!(
            query = %query.to_lucene(),
            total = hits.total,
            returned = hits.documents.len(),
            "Component search executed"
        );
        Ok(hits)
    }
}

/// A stored component the model cannot read fails the whole search.
fn decode_components(documents: Vec<JsonValue>) -> Result<Vec<Component>> {
    documents
        .into_iter()
        .map(|doc| {
            let id = doc
                .get("_id")
                .and_then(JsonValue::as_str)
                .unwrap_or("?")
                .to_string();
            serde_json::from_value::<Component>(doc).map_err(|e| {
                Error::Engine(format!("undecodable component document {}: {}", id, e))
            })
        })
        .collect()
}
