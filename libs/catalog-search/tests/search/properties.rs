use crate::support::*;
use catalog_search::{Component, PaginationData};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn typed_components(types: &[u8]) -> Vec<Component> {
    const TYPES: [&str; 3] = ["OSS", "internal", "Freeware"];
    types
        .iter()
        .enumerate()
        .map(|(i, t)| {
            ComponentBuilder::new(format!("c{:03}", i))
                .name(format!("n{}", (i * 7) % 5))
                .component_type(TYPES[*t as usize % TYPES.len()])
                .created_on(format!("2024-02-{:02}", (i % 28) + 1))
                .build()
        })
        .collect()
}

async fn walk_pages(
    catalog: &TestCatalog,
    page_size: usize,
    sort: i32,
    ascending: bool,
) -> anyhow::Result<(usize, Vec<Vec<Component>>)> {
    let mut pages = Vec::new();
    let mut offset = 0;
    loop {
        let request = PaginationData::new(offset, page_size).sorted_by(sort, ascending);
        let (envelope, page) = catalog
            .service
            .search_accessible_components("", &no_restrictions(), &principal(), &request)
            .await?;
        pages.push(page);
        if !envelope.has_next() {
            return Ok((envelope.total_row_count, pages));
        }
        offset += page_size;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pages_are_disjoint_and_complete(
        types in prop::collection::vec(0u8..3, 0..40),
        page_size in 1usize..12,
        sort in -1i32..4,
        ascending in any::<bool>(),
    ) {
        let count = types.len();
        let (total, pages) = runtime().block_on(async {
            let catalog = TestCatalog::new(typed_components(&types)).await?;
            walk_pages(&catalog, page_size, sort, ascending).await
        }).expect("search");

        prop_assert_eq!(total, count);
        let all: Vec<String> = pages.iter().flat_map(|p| ids(p)).collect();
        let distinct: BTreeSet<&String> = all.iter().collect();
        prop_assert_eq!(all.len(), count);
        prop_assert_eq!(distinct.len(), count);
        prop_assert!(pages.iter().all(|p| p.len() <= page_size));
    }

    #[test]
    fn equal_sort_keys_keep_engine_order(
        types in prop::collection::vec(0u8..3, 1..40),
        page_size in 1usize..12,
        ascending in any::<bool>(),
    ) {
        let (_, pages) = runtime().block_on(async {
            let catalog = TestCatalog::new(typed_components(&types)).await?;
            walk_pages(&catalog, page_size, 2, ascending).await
        }).expect("search");

        for page in &pages {
            for pair in page.windows(2) {
                let a = pair[0].component_type.as_deref().unwrap_or_default().to_lowercase();
                let b = pair[1].component_type.as_deref().unwrap_or_default().to_lowercase();
                if ascending {
                    prop_assert!(a <= b);
                } else {
                    prop_assert!(a >= b);
                }
                if a == b {
                    prop_assert!(pair[0].id() < pair[1].id(), "{} before {}", pair[0].id(), pair[1].id());
                }
            }
        }
    }
}
