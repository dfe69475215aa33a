use catalog_search::Component;

/// Component ids in result order
pub fn ids(components: &[Component]) -> Vec<String> {
    components.iter().map(|c| c.id().to_string()).collect()
}

/// Assert the exact ids, in order
pub fn assert_ids(components: &[Component], expected: &[&str], context: &str) {
    assert_eq!(ids(components), expected, "{context}");
}

/// Assert the ids regardless of order
pub fn assert_id_set(components: &[Component], expected: &[&str], context: &str) {
    let mut actual = ids(components);
    actual.sort();
    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(actual, expected, "{context}");
}
