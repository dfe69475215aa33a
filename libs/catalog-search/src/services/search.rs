//! Component search service
//!
//! Orchestrates a search by:
//! - running the text + restriction query through the executor
//! - removing (or annotating) records according to the caller's permissions
//! - re-sorting the returned page when a sort column is requested

use std::sync::Arc;

use crate::access::{AccessFilter, PermissionEvaluator};
use crate::config::SearchConfig;
use crate::db::backend::SearchBackend;
use crate::db::design::IndexDefinition;
use crate::db::search::executor::QueryExecutor;
use crate::db::search::query::SubQueryRestrictions;
use crate::db::search::sort::{resolve_sort, ComparatorGenerator, ComponentSortColumn};
use crate::models::{Component, PaginationData, Principal};
use crate::Result;

pub struct ComponentSearchService {
    executor: QueryExecutor,
    access: AccessFilter,
    comparators: ComparatorGenerator,
    default_page_size: usize,
    max_page_size: usize,
}

impl ComponentSearchService {
    /// Register the component index with the engine and build the service.
    ///
    /// Fails with `SchemaRegistration` when the index cannot be installed.
    pub async fn connect(
        backend: Arc<dyn SearchBackend>,
        evaluator: Arc<dyn PermissionEvaluator>,
        config: &SearchConfig,
    ) -> Result<Self> {
        let index = Arc::new(IndexDefinition::components());
        let executor = QueryExecutor::new(backend, index);
        executor.register_index().await?;

        Ok(Self {
            executor,
            access: AccessFilter::new(evaluator),
            comparators: ComparatorGenerator,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        })
    }

    pub fn index(&self) -> &IndexDefinition {
        self.executor.index()
    }

    /// First page at the configured default size, relevance order.
    pub fn first_page(&self) -> PaginationData {
        PaginationData::new(0, self.default_page_size)
    }

    /// All matches in relevance order, without permission filtering.
    pub async fn search(
        &self,
        text: &str,
        restrictions: &SubQueryRestrictions,
    ) -> Result<Vec<Component>> {
        self.executor.search(text, restrictions).await
    }

    /// One page of matches the principal may read.
    ///
    /// The page is chosen by the engine before filtering, so it can hold
    /// fewer than `page_size` records. The returned envelope carries the
    /// engine's total match count.
    pub async fn search_accessible_components(
        &self,
        text: &str,
        restrictions: &SubQueryRestrictions,
        principal: &Principal,
        page: &PaginationData,
    ) -> Result<(PaginationData, Vec<Component>)> {
        page.validate(self.max_page_size)?;

        let column = ComponentSortColumn::find_by_value(page.sort_column_number);
        let sort = resolve_sort(&self.comparators, column, page.ascending);

        let (response, components) = self
            .executor
            .search_paged(text, restrictions, page, sort.as_ref())
            .await?;

        let components = self.access.retain_readable(components, principal);
        Ok((response, components))
    }

    /// All matches, each annotated with the principal's permissions.
    pub async fn search_with_accessibility(
        &self,
        text: &str,
        restrictions: &SubQueryRestrictions,
        principal: &Principal,
    ) -> Result<Vec<Component>> {
        let mut components = self.executor.search(text, restrictions).await?;
        self.access.annotate(&mut components, principal);
        Ok(components)
    }
}
