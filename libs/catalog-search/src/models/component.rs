//! Component records as stored in the catalog database

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::user::RequestedAction;

/// Value of the `type` discriminator for component documents.
pub const COMPONENT_DOCUMENT_TYPE: &str = "component";

/// A catalog component.
///
/// The search core only reads these; documents are written by the storage
/// layer. Unknown fields in stored documents are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Document kind discriminator (`"component"`)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_platforms: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_systems: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_names: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_license_ids: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Creation date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_unit: Option<String>,

    /// Per-action flags for the requesting principal, filled by
    /// `search_with_accessibility`. Never written back to storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeMap<RequestedAction, bool>>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            document_type: Some(COMPONENT_DOCUMENT_TYPE.to_string()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn is_component_document(&self) -> bool {
        self.document_type.as_deref() == Some(COMPONENT_DOCUMENT_TYPE)
    }

    /// Whether `action` was annotated as allowed. `false` when not annotated.
    pub fn is_allowed(&self, action: RequestedAction) -> bool {
        self.permissions
            .as_ref()
            .and_then(|p| p.get(&action).copied())
            .unwrap_or(false)
    }
}
