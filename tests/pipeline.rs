mod common;

use common::{executor, graph, ids, manager, options, posts_query};

use tablekit::manager::{ManagerConfig, TableManager, TableOptions};
use tablekit::request::{Constraint, FilterGroup, MatchMode, TableRequest};
use tablekit_core::{Row, SelectQuery, TableKitError, Value};

#[test]
fn windows_skip_and_cap_the_result() {
    let graph = graph();
    let base = graph.model("post").unwrap();
    let request = TableRequest::default()
        .with_sort("views", 1)
        .with_window(1, 2);
    let result = manager()
        .handle(&graph, base, posts_query(), &request, &options(&[], &[]))
        .unwrap();
    // views ascending: 4 (10), 3 (40), 1 (100), 2 (250); skip one, take two
    assert_eq!(ids(&result), vec![3, 1]);
    assert_eq!(result.total, 4);
}

#[test]
fn total_ignores_the_window() {
    let graph = graph();
    let base = graph.model("post").unwrap();
    let request = TableRequest::default().with_window(0, 1);
    let result = manager()
        .handle(&graph, base, posts_query(), &request, &options(&[], &[]))
        .unwrap();
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.total, 4);
}

#[test]
fn callers_preconditions_survive_translation() {
    let graph = graph();
    let base = graph.model("post").unwrap();
    let mut query = posts_query();
    query.and_where(tablekit_core::conditions::eq(
        tablekit_core::Sql::raw("posts.published"),
        1i64,
    ));
    let request = TableRequest::default().with_filter(
        "author.name",
        FilterGroup::all([Constraint::new(MatchMode::Equals, "Alice")]),
    );
    let result = manager()
        .handle(&graph, base, query, &request, &options(&[], &["author.name"]))
        .unwrap();
    // Alice's posts are 1 (published) and 3 (draft)
    assert_eq!(ids(&result), vec![1]);
    assert_eq!(result.total, 1);
}

#[test]
fn transform_hook_reshapes_the_window() {
    let graph = graph();
    let base = graph.model("post").unwrap();
    let opts = options(&[], &[]).transform(|rows| {
        rows.into_iter()
            .map(|row| {
                let mut out = Row::new();
                let title = row
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_uppercase();
                out.push("title", Value::Text(title));
                out
            })
            .collect()
    });
    let result = manager()
        .handle(&graph, base, posts_query(), &TableRequest::default(), &opts)
        .unwrap();
    assert_eq!(
        result.data[0].get("title").and_then(Value::as_str),
        Some("INTRO TO RUST")
    );
}

#[test]
fn statement_capture_populates_diagnostics_only_when_enabled() {
    let graph = graph();
    let base = graph.model("post").unwrap();

    let silent = manager()
        .handle(
            &graph,
            base,
            posts_query(),
            &TableRequest::default(),
            &options(&[], &[]),
        )
        .unwrap();
    assert!(silent.queries.is_empty());

    let debugging = TableManager::new(executor()).with_config(ManagerConfig {
        capture_queries: true,
    });
    let result = debugging
        .handle(
            &graph,
            base,
            posts_query(),
            &TableRequest::default(),
            &options(&[], &[]),
        )
        .unwrap();
    // at least the counting statement and the windowed fetch
    assert!(result.queries.len() >= 2);
    assert!(result.queries[0].sql.contains("COUNT"));
}

#[test]
fn unknown_exporter_names_fail_fast() {
    let graph = graph();
    let base = graph.model("post").unwrap();
    let opts = TableOptions::new().exporter("missing");
    let error = manager()
        .process(&graph, base, posts_query(), &TableRequest::default(), &opts)
        .unwrap_err();
    assert!(matches!(error, TableKitError::Configuration(_)));
}

#[test]
fn mismatched_base_models_are_rejected() {
    let graph = graph();
    let base = graph.model("post").unwrap();
    let error = manager()
        .process(
            &graph,
            base,
            SelectQuery::new("users"),
            &TableRequest::default(),
            &TableOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(error, TableKitError::Configuration(_)));
}

#[test]
fn result_serializes_as_the_wire_payload() {
    let graph = graph();
    let base = graph.model("post").unwrap();
    let request = TableRequest::default().with_window(0, 1);
    let result = manager()
        .handle(&graph, base, posts_query(), &request, &options(&[], &[]))
        .unwrap();
    let payload = serde_json::to_value(&result).unwrap();
    assert_eq!(payload["total"], 4);
    assert_eq!(payload["data"][0]["id"], 1);
    assert!(payload["queries"].as_array().unwrap().is_empty());
}
