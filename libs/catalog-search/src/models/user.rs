//! Requesting identities and the actions they may be granted

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The identity a search runs on behalf of.
///
/// Opaque to the search core: it is only handed to the permission evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub user_group: Option<String>,
    /// Secondary department → roles held there
    #[serde(default)]
    pub secondary_departments_and_roles: BTreeMap<String, Vec<String>>,
}

impl Principal {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_user_group(mut self, group: impl Into<String>) -> Self {
        self.user_group = Some(group.into());
        self
    }

    pub fn with_secondary_department(
        mut self,
        department: impl Into<String>,
        roles: &[&str],
    ) -> Self {
        self.secondary_departments_and_roles.insert(
            department.into(),
            roles.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    /// Primary department or any secondary one.
    pub fn belongs_to(&self, department: &str) -> bool {
        self.department.as_deref() == Some(department)
            || self.secondary_departments_and_roles.contains_key(department)
    }
}

/// Actions a principal may request on a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestedAction {
    Read,
    Write,
    Delete,
    Attachments,
    Clearing,
}

impl RequestedAction {
    pub const ALL: [RequestedAction; 5] = [
        RequestedAction::Read,
        RequestedAction::Write,
        RequestedAction::Delete,
        RequestedAction::Attachments,
        RequestedAction::Clearing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Delete => "DELETE",
            Self::Attachments => "ATTACHMENTS",
            Self::Clearing => "CLEARING",
        }
    }
}

impl fmt::Display for RequestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
