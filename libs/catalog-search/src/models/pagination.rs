//! Page requests and the page envelope returned with results

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Page request and, once filled by the engine, the page envelope.
///
/// `total_row_count` is the engine's count of all matches before any
/// permission filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationData {
    pub row_offset: usize,
    pub page_size: usize,
    /// Sort column number; see `ComponentSortColumn::find_by_value`
    pub sort_column_number: i32,
    pub ascending: bool,
    #[serde(default)]
    pub total_row_count: usize,
}

impl PaginationData {
    pub fn new(row_offset: usize, page_size: usize) -> Self {
        Self {
            row_offset,
            page_size,
            sort_column_number: -1,
            ascending: true,
            total_row_count: 0,
        }
    }

    pub fn sorted_by(mut self, sort_column_number: i32, ascending: bool) -> Self {
        self.sort_column_number = sort_column_number;
        self.ascending = ascending;
        self
    }

    pub fn validate(&self, max_page_size: usize) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Validation("pageSize must be greater than 0".to_string()));
        }
        if self.page_size > max_page_size {
            return Err(Error::Validation(format!(
                "pageSize {} exceeds the maximum of {}",
                self.page_size, max_page_size
            )));
        }
        Ok(())
    }

    /// Whether rows remain after this page.
    pub fn has_next(&self) -> bool {
        self.row_offset.saturating_add(self.page_size) < self.total_row_count
    }
}
