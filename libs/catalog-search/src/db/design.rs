//! Index schema and the design document that installs it
//!
//! A single field table drives both renderings of the schema:
//! - the JavaScript index function stored in the `_design/lucene` document and
//!   executed by Nouveau for every document it (re)indexes
//! - [`IndexDefinition::index_document`], the same rules in Rust, used by the
//!   in-process backend
//!
//! Only documents whose `type` is `component` are indexed. Text values are
//! lower-cased and indexed with the `keyword` analyzer, so restrictions match
//! whole elements ignoring case on every backend.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::models::COMPONENT_DOCUMENT_TYPE;

/// Prefix of every design document id.
pub const DEFAULT_DESIGN_PREFIX: &str = "_design/";

/// Design document holding the component index.
pub const DESIGN_DOC_ID: &str = "_design/lucene";

/// Name of the component index inside the design document.
pub const COMPONENT_INDEX_NAME: &str = "components";

const DEFAULT_ANALYZER: &str = "standard";

/// Text fields are indexed untokenized, so a restriction matches a whole
/// element only.
const KEYWORD_ANALYZER: &str = "keyword";

/// Engine-side value type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Double,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Double => "double",
        }
    }
}

/// How a field's value is read from the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Non-empty string
    Scalar,
    /// Array of strings, one entry per non-empty element
    Set,
    /// `YYYY-MM-DD` date, indexed as `YYYYMMDD`
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub stored: bool,
    pub source: FieldSource,
}

impl IndexFieldSpec {
    const fn text_set(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            stored: true,
            source: FieldSource::Set,
        }
    }

    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            stored: true,
            source: FieldSource::Scalar,
        }
    }

    const fn date(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Double,
            stored: true,
            source: FieldSource::Date,
        }
    }
}

const COMPONENT_FIELDS: &[IndexFieldSpec] = &[
    IndexFieldSpec::text_set("categories"),
    IndexFieldSpec::text_set("languages"),
    IndexFieldSpec::text_set("softwarePlatforms"),
    IndexFieldSpec::text_set("operatingSystems"),
    IndexFieldSpec::text_set("vendorNames"),
    IndexFieldSpec::text_set("mainLicenseIds"),
    IndexFieldSpec::text("componentType"),
    IndexFieldSpec::text("name"),
    IndexFieldSpec::text("createdBy"),
    IndexFieldSpec::date("createdOn"),
    IndexFieldSpec::text("businessUnit"),
];

/// One value the index function emits for a document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub field: &'static str,
    pub value: IndexValue,
    pub stored: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    Text(String),
    Double(f64),
}

/// Immutable description of the component index.
///
/// Built once at startup and shared (`Arc`) with the query executor.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    name: String,
    design_doc_id: String,
    document_type: &'static str,
    fields: Vec<IndexFieldSpec>,
}

impl IndexDefinition {
    pub fn components() -> Self {
        Self {
            name: COMPONENT_INDEX_NAME.to_string(),
            design_doc_id: DESIGN_DOC_ID.to_string(),
            document_type: COMPONENT_DOCUMENT_TYPE,
            fields: COMPONENT_FIELDS.to_vec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn design_doc_id(&self) -> &str {
        &self.design_doc_id
    }

    pub fn document_type(&self) -> &str {
        self.document_type
    }

    pub fn fields(&self) -> &[IndexFieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&IndexFieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Entries the index function produces for `doc`, or `None` when the
    /// document is not of the indexed kind.
    pub fn index_document(&self, doc: &JsonValue) -> Option<Vec<IndexEntry>> {
        if doc.get("type").and_then(JsonValue::as_str) != Some(self.document_type) {
            return None;
        }

        let mut entries = Vec::new();
        for spec in &self.fields {
            let Some(value) = doc.get(spec.name) else {
                continue;
            };
            match spec.source {
                FieldSource::Scalar => {
                    if let Some(s) = value.as_str().filter(|s| !s.is_empty()) {
                        entries.push(IndexEntry {
                            field: spec.name,
                            value: IndexValue::Text(s.to_lowercase()),
                            stored: spec.stored,
                        });
                    }
                }
                FieldSource::Set => {
                    let Some(items) = value.as_array() else {
                        continue;
                    };
                    for s in items
                        .iter()
                        .filter_map(JsonValue::as_str)
                        .filter(|s| !s.is_empty())
                    {
                        entries.push(IndexEntry {
                            field: spec.name,
                            value: IndexValue::Text(s.to_lowercase()),
                            stored: spec.stored,
                        });
                    }
                }
                FieldSource::Date => {
                    if let Some(key) = value.as_str().and_then(date_key) {
                        entries.push(IndexEntry {
                            field: spec.name,
                            value: IndexValue::Double(f64::from(key)),
                            stored: spec.stored,
                        });
                    }
                }
            }
        }
        Some(entries)
    }

    /// JavaScript source of the Nouveau index function.
    pub fn index_function(&self) -> String {
        let mut js = String::from("function(doc) {");
        js.push_str(
            "  function arrayToStringIndex(arr, prop) {\
                 if (!arr || !arr.length) return;\
                 for (var i = 0; i < arr.length; i++) {\
                   if (typeof(arr[i]) == 'string' && arr[i].length > 0) {\
                     index('text', prop, arr[i].toLowerCase(), {'store': true});\
                   }\
                 }\
               }",
        );
        let _ = write!(
            js,
            "  if(!doc.type || doc.type != '{}') return;",
            self.document_type
        );

        for spec in &self.fields {
            let store = if spec.stored { "true" } else { "false" };
            match spec.source {
                FieldSource::Set => {
                    let _ = write!(js, "  arrayToStringIndex(doc.{0}, '{0}');", spec.name);
                }
                FieldSource::Scalar => {
                    let _ = write!(
                        js,
                        "  if(doc.{0} && typeof(doc.{0}) == 'string' && doc.{0}.length > 0) {{\
                             index('{1}', '{0}', doc.{0}.toLowerCase(), {{'store': {2}}});\
                           }}",
                        spec.name,
                        spec.kind.as_str(),
                        store
                    );
                }
                FieldSource::Date => {
                    let _ = write!(
                        js,
                        "  if(doc.{0} && typeof(doc.{0}) == 'string') {{\
                             var m = doc.{0}.match(/^(\\d{{4}})-(\\d{{2}})-(\\d{{2}})/);\
                             if(m) {{\
                               index('{1}', '{0}', Number(m[1] + m[2] + m[3]), {{'store': {2}}});\
                             }}\
                           }}",
                        spec.name,
                        spec.kind.as_str(),
                        store
                    );
                }
            }
        }
        js.push('}');
        js
    }

    pub fn design_document(&self) -> DesignDocument {
        let mut nouveau = BTreeMap::new();
        nouveau.insert(
            self.name.clone(),
            NouveauIndex {
                index: self.index_function(),
                default_analyzer: Some(DEFAULT_ANALYZER.to_string()),
                field_analyzers: self
                    .fields
                    .iter()
                    .filter(|f| f.kind == FieldKind::Text)
                    .map(|f| (f.name.to_string(), KEYWORD_ANALYZER.to_string()))
                    .collect(),
            },
        );
        DesignDocument {
            id: self.design_doc_id.clone(),
            rev: None,
            nouveau,
        }
    }
}

/// Numeric key `year*10000 + month*100 + day` for a date string.
///
/// Accepts `YYYY-MM-DD` and anything that starts with it (RFC 3339
/// timestamps). Returns `None` for anything else.
pub fn date_key(raw: &str) -> Option<u32> {
    let date = NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
    let year = u32::try_from(date.year()).ok()?;
    Some(year * 10_000 + date.month() * 100 + date.day())
}

/// Design document as stored in CouchDB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default)]
    pub nouveau: BTreeMap<String, NouveauIndex>,
}

impl DesignDocument {
    /// Same indexes, ignoring revision.
    pub fn same_definition(&self, other: &DesignDocument) -> bool {
        self.id == other.id && self.nouveau == other.nouveau
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NouveauIndex {
    pub index: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_analyzer: Option<String>,
    /// Per-field analyzers overriding the default
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_analyzers: BTreeMap<String, String>,
}
