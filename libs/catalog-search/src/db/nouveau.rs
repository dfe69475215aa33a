//! CouchDB + Nouveau search backend
//!
//! Talks to CouchDB over HTTP:
//! - design documents: `GET/PUT {db}/_design/{name}`
//! - queries: `POST {db}/_design/{name}/_nouveau/{index}`
//!
//! Nouveau pages with opaque bookmarks and caps hits per request, so offset
//! paging walks bookmarks: skip `offset` hits, then read `limit` hits, each
//! request asking for at most `max_limit` hits.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::config::CouchDbConfig;
use crate::db::backend::{SearchBackend, SearchHits, SearchRequest};
use crate::db::design::{DesignDocument, DEFAULT_DESIGN_PREFIX};
use crate::{Error, Result};

pub struct NouveauConnector {
    client: Client,
    base_url: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
    max_limit: usize,
}

#[derive(Debug, Serialize)]
struct NouveauQuery<'a> {
    q: &'a str,
    limit: usize,
    include_docs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bookmark: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct NouveauResponse {
    #[serde(default)]
    total_hits: usize,
    #[serde(default)]
    hits: Vec<NouveauHit>,
    #[serde(default)]
    bookmark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NouveauHit {
    id: String,
    #[serde(default)]
    doc: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(default)]
    rev: Option<String>,
}

impl NouveauConnector {
    pub fn new(config: &CouchDbConfig, max_limit: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Engine(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            max_limit: max_limit.max(1),
        })
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(&self.database))
    }

    /// `_design/lucene` → `{db}/_design/lucene`
    fn design_url(&self, design_doc_id: &str) -> String {
        let name = design_doc_id
            .strip_prefix(DEFAULT_DESIGN_PREFIX)
            .unwrap_or(design_doc_id);
        format!(
            "{}/{}{}",
            self.database_url(),
            DEFAULT_DESIGN_PREFIX,
            urlencoding::encode(name)
        )
    }

    fn search_url(&self, design_doc_id: &str, index: &str) -> String {
        format!(
            "{}/_nouveau/{}",
            self.design_url(design_doc_id),
            urlencoding::encode(index)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }

    async fn fetch_design_document(&self, id: &str) -> Result<Option<DesignDocument>> {
        let response = self
            .authorized(self.client.get(self.design_url(id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn put_design_document(&self, design: &DesignDocument) -> Result<StatusCode> {
        let response = self
            .authorized(self.client.put(self.design_url(&design.id)))
            .json(design)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Ok(status);
        }
        let response = check_status(response).await?;
        let put: PutResponse = response.json().await?;
        tracing::info!(
            design_doc = %design.id,
            rev = put.rev.as_deref().unwrap_or("?"),
            "Design document written"
        );
        Ok(status)
    }

    async fn query(
        &self,
        url: &str,
        q: &str,
        limit: usize,
        bookmark: Option<&str>,
        include_docs: bool,
    ) -> Result<NouveauResponse> {
        let body = NouveauQuery {
            q,
            limit,
            include_docs,
            bookmark,
        };
        let response = self
            .authorized(self.client.post(url))
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SearchBackend for NouveauConnector {
    async fn ensure_design_document(&self, design: &DesignDocument) -> Result<()> {
        let existing = self.fetch_design_document(&design.id).await?;
        if let Some(existing) = &existing {
            if existing.same_definition(design) {
                tracing::debug!(design_doc = %design.id, "Design document up to date");
                return Ok(());
            }
        }

        let mut desired = design.clone();
        desired.rev = existing.and_then(|d| d.rev);
        if self.put_design_document(&desired).await? != StatusCode::CONFLICT {
            return Ok(());
        }

        // Another writer won the race; accept it only if it wrote the same definition.
        match self.fetch_design_document(&design.id).await? {
            Some(current) if current.same_definition(design) => Ok(()),
            _ => Err(Error::Engine(format!(
                "design document {} was modified concurrently",
                design.id
            ))),
        }
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchHits> {
        let url = self.search_url(request.design_doc_id, request.index);
        let q = request.query.to_lucene();

        let (mut to_skip, mut to_read) = match request.window {
            Some(w) => (w.offset, Some(w.limit)),
            None => (0, None),
        };

        let mut bookmark: Option<String> = None;
        let mut total = 0;

        while to_skip > 0 {
            let page = self
                .query(&url, &q, to_skip.min(self.max_limit), bookmark.as_deref(), false)
                .await?;
            total = page.total_hits;
            if page.hits.is_empty() {
                return Ok(SearchHits {
                    total,
                    documents: Vec::new(),
                });
            }
            to_skip -= page.hits.len().min(to_skip);
            bookmark = page.bookmark;
        }

        let mut documents = Vec::new();
        loop {
            let limit = match to_read {
                Some(0) => break,
                Some(n) => n.min(self.max_limit),
                None => self.max_limit,
            };
            let page = self
                .query(&url, &q, limit, bookmark.as_deref(), true)
                .await?;
            total = page.total_hits;
            if page.hits.is_empty() {
                break;
            }
            if let Some(n) = to_read.as_mut() {
                *n -= page.hits.len().min(*n);
            }
            for hit in page.hits {
                match hit.doc {
                    Some(doc) => documents.push(doc),
                    None => tracing::warn!(id = %hit.id, "Search hit without document"),
                }
            }
            bookmark = page.bookmark;
            if to_read.is_none() && documents.len() >= total {
                break;
            }
        }

        Ok(SearchHits { total, documents })
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = couch_reason(&body).unwrap_or(body);
    Err(status_error(status, reason))
}

fn status_error(status: StatusCode, reason: String) -> Error {
    match status {
        StatusCode::BAD_REQUEST => Error::InvalidQuery(reason),
        s if s.is_server_error() => {
            Error::EngineUnavailable(format!("status {}: {}", s.as_u16(), reason))
        }
        s => Error::Engine(format!("status {}: {}", s.as_u16(), reason)),
    }
}

/// CouchDB error bodies look like `{"error": "...", "reason": "..."}`.
fn couch_reason(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    let error = value.get("error").and_then(JsonValue::as_str);
    let reason = value.get("reason").and_then(JsonValue::as_str);
    match (error, reason) {
        (Some(e), Some(r)) => Some(format!("{}: {}", e, r)),
        (Some(e), None) => Some(e.to_string()),
        (None, Some(r)) => Some(r.to_string()),
        (None, None) => None,
    }
}
