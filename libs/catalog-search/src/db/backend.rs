//! The search engine seam
//!
//! The document store and its full-text index are an external service. The
//! search core only needs two capabilities from it: installing the index
//! design document at startup and running a text query with field
//! restrictions over that index. Any engine (CouchDB + Nouveau over HTTP,
//! the in-process reference backend, a test double) implements this trait.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::db::design::DesignDocument;
use crate::db::search::query::SearchQuery;
use crate::Result;

/// A contiguous slice of the relevance-ordered hit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

/// Everything the engine needs to answer one query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest<'a> {
    /// Design document holding the index
    pub design_doc_id: &'a str,
    /// Index name inside the design document
    pub index: &'a str,
    pub query: &'a SearchQuery,
    /// `None` returns every hit
    pub window: Option<PageWindow>,
}

/// Documents in relevance order plus the engine's total hit count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub total: usize,
    pub documents: Vec<JsonValue>,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Install `design` unless an identical definition is already present.
    ///
    /// Re-registering an identical definition is a no-op. A differing
    /// definition with the same id is replaced.
    async fn ensure_design_document(&self, design: &DesignDocument) -> Result<()>;

    /// Run a query against a registered index.
    ///
    /// # Errors
    /// * `EngineUnavailable` - the engine could not be reached
    /// * `InvalidQuery` - the engine rejected the query text
    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchHits>;
}
