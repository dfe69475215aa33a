use anyhow::Context as _;
use catalog_search::config::SearchConfig;
use catalog_search::db::{IndexDefinition, InMemorySearchBackend};
use catalog_search::{
    Component, ComponentSearchService, PermissionEvaluator, Principal, RequestedAction, Result,
    SubQueryRestrictions,
};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::builders::ComponentBuilder;

/// A backend seeded with components plus a connected service
pub struct TestCatalog {
    pub backend: Arc<InMemorySearchBackend>,
    pub service: ComponentSearchService,
}

impl TestCatalog {
    pub async fn new(components: Vec<Component>) -> anyhow::Result<Self> {
        Self::with_evaluator(components, allow_all()).await
    }

    pub async fn with_evaluator(
        components: Vec<Component>,
        evaluator: Arc<dyn PermissionEvaluator>,
    ) -> anyhow::Result<Self> {
        let backend = Arc::new(InMemorySearchBackend::new(IndexDefinition::components()));
        for component in &components {
            backend
                .insert_component(component)
                .context("seed component")?;
        }

        let service = ComponentSearchService::connect(backend.clone(), evaluator, &search_config())
            .await
            .context("connect search service")?;

        Ok(Self { backend, service })
    }
}

pub fn search_config() -> SearchConfig {
    SearchConfig {
        default_page_size: 10,
        max_page_size: 100,
        nouveau_max_limit: 200,
    }
}

pub fn principal() -> Principal {
    Principal::new("user@example.org").with_department("DEPT A")
}

pub fn allow_all() -> Arc<dyn PermissionEvaluator> {
    Arc::new(|_: &Component, _: &Principal, _: RequestedAction| -> Result<bool> { Ok(true) })
}

/// READ allowed only for the listed ids; every other action allowed
pub fn readable_only(ids: &[&str]) -> Arc<dyn PermissionEvaluator> {
    let readable: BTreeSet<String> = ids.iter().map(|s| s.to_string()).collect();
    Arc::new(
        move |c: &Component, _: &Principal, action: RequestedAction| -> Result<bool> {
            Ok(action != RequestedAction::Read || readable.contains(c.id()))
        },
    )
}

/// Admins may do anything; others write only in departments they belong to
pub fn department_policy() -> Arc<dyn PermissionEvaluator> {
    Arc::new(
        |c: &Component, p: &Principal, action: RequestedAction| -> Result<bool> {
            if p.user_group.as_deref() == Some("ADMIN") {
                return Ok(true);
            }
            Ok(match action {
                RequestedAction::Read => true,
                _ => c.business_unit.as_deref().is_some_and(|unit| p.belongs_to(unit)),
            })
        },
    )
}

pub fn restrictions(items: &[(&str, &[&str])]) -> SubQueryRestrictions {
    items
        .iter()
        .map(|(field, values)| {
            (
                field.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

pub fn no_restrictions() -> SubQueryRestrictions {
    SubQueryRestrictions::new()
}

/// `count` components `c00`, `c01`, … named so that name order is the
/// reverse of insertion order, dated one day apart.
pub fn numbered_components(count: usize) -> Vec<Component> {
    (0..count)
        .map(|i| {
            ComponentBuilder::new(format!("c{:02}", i))
                .name(format!("lib-{:02}", count - i))
                .component_type(if i % 2 == 0 { "OSS" } else { "INTERNAL" })
                .created_on(format!("2024-01-{:02}", (i % 28) + 1))
                .build()
        })
        .collect()
}
