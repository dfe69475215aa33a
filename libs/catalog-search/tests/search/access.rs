use crate::support::*;
use catalog_search::{
    Component, Error, PaginationData, Principal, RequestedAction, Result,
};
use std::sync::Arc;

fn department_components() -> Vec<Component> {
    vec![
        ComponentBuilder::new("a1").name("alpha").business_unit("DEPT A").build(),
        ComponentBuilder::new("b1").name("beta").business_unit("DEPT B").build(),
        ComponentBuilder::new("a2").name("gamma").business_unit("DEPT A").build(),
        ComponentBuilder::new("none").name("delta").build(),
    ]
}

#[tokio::test]
async fn unreadable_records_are_never_returned() -> anyhow::Result<()> {
    let catalog =
        TestCatalog::with_evaluator(numbered_components(25), readable_only(&["c01", "c03", "c12"]))
            .await?;

    let mut seen = Vec::new();
    for offset in [0, 10, 20] {
        let (envelope, page) = catalog
            .service
            .search_accessible_components(
                "",
                &no_restrictions(),
                &principal(),
                &PaginationData::new(offset, 10),
            )
            .await?;
        assert_eq!(envelope.total_row_count, 25, "total counts unfiltered matches");
        seen.extend(ids(&page));
    }
    assert_eq!(seen, vec!["c01", "c03", "c12"]);
    Ok(())
}

#[tokio::test]
async fn filtered_pages_may_be_short() -> anyhow::Result<()> {
    let catalog =
        TestCatalog::with_evaluator(numbered_components(5), readable_only(&["c00", "c02", "c04"]))
            .await?;

    let (envelope, page) = catalog
        .service
        .search_accessible_components(
            "",
            &no_restrictions(),
            &principal(),
            &PaginationData::new(0, 3),
        )
        .await?;
    assert_ids(&page, &["c00", "c02"], "c01 dropped from the first window");
    assert!(envelope.has_next());
    Ok(())
}

#[tokio::test]
async fn evaluator_errors_deny_access() -> anyhow::Result<()> {
    let failing = Arc::new(
        |c: &Component, _: &Principal, _: RequestedAction| -> Result<bool> {
            if c.id() == "b1" {
                Err(Error::Permission("policy store offline".into()))
            } else {
                Ok(true)
            }
        },
    );
    let catalog = TestCatalog::with_evaluator(department_components(), failing).await?;

    let (_, page) = catalog
        .service
        .search_accessible_components(
            "",
            &no_restrictions(),
            &principal(),
            &PaginationData::new(0, 10),
        )
        .await?;
    assert_ids(&page, &["a1", "a2", "none"], "erroring record is withheld");

    let annotated = catalog
        .service
        .search_with_accessibility("", &no_restrictions(), &principal())
        .await?;
    let b1 = annotated
        .iter()
        .find(|c| c.id() == "b1")
        .expect("annotated results are not filtered");
    assert!(RequestedAction::ALL.iter().all(|&a| !b1.is_allowed(a)));
    Ok(())
}

#[tokio::test]
async fn annotation_keeps_every_match() -> anyhow::Result<()> {
    let catalog =
        TestCatalog::with_evaluator(department_components(), department_policy()).await?;

    let plain = catalog.service.search("", &no_restrictions()).await?;
    let annotated = catalog
        .service
        .search_with_accessibility("", &no_restrictions(), &principal())
        .await?;

    assert_eq!(ids(&annotated), ids(&plain));
    assert!(plain.iter().all(|c| c.permissions.is_none()));
    for component in &annotated {
        let permissions = component.permissions.as_ref().expect("annotated");
        assert_eq!(permissions.len(), RequestedAction::ALL.len(), "{}", component.id());
    }
    Ok(())
}

#[tokio::test]
async fn annotation_depends_on_the_principal() -> anyhow::Result<()> {
    let catalog =
        TestCatalog::with_evaluator(department_components(), department_policy()).await?;

    let dept_a = Principal::new("a@example.org").with_department("DEPT A");
    let dept_b = Principal::new("b@example.org").with_department("DEPT B");

    let as_a = catalog
        .service
        .search_with_accessibility("", &no_restrictions(), &dept_a)
        .await?;
    let as_b = catalog
        .service
        .search_with_accessibility("", &no_restrictions(), &dept_b)
        .await?;

    let writable = |components: &[Component]| -> Vec<String> {
        components
            .iter()
            .filter(|c| c.is_allowed(RequestedAction::Write))
            .map(|c| c.id().to_string())
            .collect()
    };
    assert_eq!(writable(&as_a), vec!["a1", "a2"]);
    assert_eq!(writable(&as_b), vec!["b1"]);
    assert!(as_a.iter().chain(as_b.iter()).all(|c| c.is_allowed(RequestedAction::Read)));
    Ok(())
}

#[tokio::test]
async fn restrictions_apply_before_annotation() -> anyhow::Result<()> {
    let catalog =
        TestCatalog::with_evaluator(department_components(), department_policy()).await?;

    let annotated = catalog
        .service
        .search_with_accessibility(
            "",
            &restrictions(&[("businessUnit", &["dept a"])]),
            &principal(),
        )
        .await?;
    assert_ids(&annotated, &["a1", "a2"], "only DEPT A matches");
    assert!(annotated.iter().all(|c| c.is_allowed(RequestedAction::Delete)));
    Ok(())
}

#[tokio::test]
async fn malformed_documents_fail_instead_of_shrinking_results() -> anyhow::Result<()> {
    let catalog = TestCatalog::new(department_components()).await?;
    catalog.backend.insert(serde_json::json!({
        "_id": "broken",
        "type": "component",
        "name": "zlib",
        "categories": "notalist"
    }))?;

    let err = catalog
        .service
        .search_with_accessibility("", &no_restrictions(), &principal())
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Engine(message) if message.contains("broken")), "{err}");

    let err = catalog
        .service
        .search_accessible_components(
            "zlib",
            &no_restrictions(),
            &principal(),
            &PaginationData::new(0, 10),
        )
        .await
        .unwrap_err();
    assert!(!err.is_client_error());
    Ok(())
}

#[tokio::test]
async fn annotation_honours_groups_and_secondary_departments() -> anyhow::Result<()> {
    let catalog =
        TestCatalog::with_evaluator(department_components(), department_policy()).await?;

    let writable = |components: &[Component]| -> Vec<String> {
        components
            .iter()
            .filter(|c| c.is_allowed(RequestedAction::Write))
            .map(|c| c.id().to_string())
            .collect()
    };

    let seconded = Principal::new("s@example.org")
        .with_department("DEPT A")
        .with_secondary_department("DEPT B", &["CONTRIBUTOR"]);
    let annotated = catalog
        .service
        .search_with_accessibility("", &no_restrictions(), &seconded)
        .await?;
    assert_eq!(writable(&annotated), vec!["a1", "b1", "a2"]);

    let admin = Principal::new("root@example.org").with_user_group("ADMIN");
    let annotated = catalog
        .service
        .search_with_accessibility("", &no_restrictions(), &admin)
        .await?;
    assert_eq!(writable(&annotated), vec!["a1", "b1", "a2", "none"]);
    Ok(())
}
