//! Secondary sort of a result page
//!
//! The engine orders hits by relevance only. When the caller asks for a sort
//! column, the page the engine returned is re-sorted in memory. The page
//! window itself is fixed by the engine before the re-sort, so sorting only
//! reorders the records already on the page.

use std::cmp::Ordering;

use crate::db::design::date_key;
use crate::models::{Component, COMPONENT_DOCUMENT_TYPE};
use crate::{Error, Result};

pub type ComponentComparator = fn(&Component, &Component) -> Ordering;

/// Columns a component page can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentSortColumn {
    ByName,
    ByCreatedOn,
    ByType,
}

impl ComponentSortColumn {
    /// Column for a wire sort number. Unknown numbers mean "relevance order".
    pub fn find_by_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::ByName),
            1 => Some(Self::ByCreatedOn),
            2 => Some(Self::ByType),
            _ => None,
        }
    }

    /// Column for a name such as `name`, `BY_NAME` or `createdOn`.
    /// `none` and anything unrecognized mean "relevance order".
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "by_name" | "name" => Some(Self::ByName),
            "by_createdon" | "createdon" => Some(Self::ByCreatedOn),
            "by_type" | "componenttype" | "type" => Some(Self::ByType),
            _ => None,
        }
    }

    pub fn value(&self) -> i32 {
        match self {
            Self::ByName => 0,
            Self::ByCreatedOn => 1,
            Self::ByType => 2,
        }
    }

    /// Document field the column sorts on.
    pub fn field(&self) -> &'static str {
        match self {
            Self::ByName => "name",
            Self::ByCreatedOn => "createdOn",
            Self::ByType => "componentType",
        }
    }
}

const COMPONENT_COMPARATORS: &[(&str, ComponentComparator)] = &[
    ("name", compare_name),
    ("createdOn", compare_created_on),
    ("componentType", compare_component_type),
];

/// Looks up comparators by document type and field name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparatorGenerator;

impl ComparatorGenerator {
    pub fn generate(&self, document_type: &str, field: &str) -> Result<ComponentComparator> {
        let resolution_error = || Error::SortResolution {
            document_type: document_type.to_string(),
            field: field.to_string(),
        };

        if document_type != COMPONENT_DOCUMENT_TYPE {
            return Err(resolution_error());
        }
        COMPONENT_COMPARATORS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, compare)| *compare)
            .ok_or_else(resolution_error)
    }
}

/// A comparator bound to a direction.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSort {
    pub column: ComponentSortColumn,
    pub ascending: bool,
    compare: ComponentComparator,
}

impl ResolvedSort {
    /// Stable in-place sort; ties keep their incoming (relevance) order.
    pub fn apply(&self, components: &mut [Component]) {
        let compare = self.compare;
        if self.ascending {
            components.sort_by(compare);
        } else {
            components.sort_by(|a, b| compare(a, b).reverse());
        }
    }
}

/// Resolve a requested column to a sort, or `None` for relevance order.
///
/// A lookup failure degrades to relevance order instead of failing the search.
pub fn resolve_sort(
    generator: &ComparatorGenerator,
    column: Option<ComponentSortColumn>,
    ascending: bool,
) -> Option<ResolvedSort> {
    let column = column?;
    match generator.generate(COMPONENT_DOCUMENT_TYPE, column.field()) {
        Ok(compare) => Some(ResolvedSort {
            column,
            ascending,
            compare,
        }),
        Err(e) => {
            tracing::warn!(
                column = ?column,
                error = %e,
                "Falling back to relevance order"
            );
            None
        }
    }
}

fn compare_name(a: &Component, b: &Component) -> Ordering {
    compare_case_insensitive(a.name.as_deref(), b.name.as_deref())
}

fn compare_component_type(a: &Component, b: &Component) -> Ordering {
    compare_case_insensitive(a.component_type.as_deref(), b.component_type.as_deref())
}

fn compare_created_on(a: &Component, b: &Component) -> Ordering {
    let key = |c: &Component| c.created_on.as_deref().and_then(date_key);
    key(a).cmp(&key(b))
}

// Missing values order first.
fn compare_case_insensitive(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}
