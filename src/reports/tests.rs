//! Tests for report definitions

use super::*;
use crate::github::RecordShape;
use crate::items::{ItemKind, WorkItem};
use crate::pagination::{Direction, PageRequest};
use crate::types::StringMap;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use test_case::test_case;

const MINIMAL_GRAPHQL: &str = r#"
name: stars
item_kind: repo
query: "query($owner: String!, $repo: String!, $pageSize: Int!, $cursor: String) { x }"
connection: repository.stargazers
variables:
  owner: "{{ item.owner }}"
  repo: "{{ item.repo }}"
"#;

#[test]
fn test_all_builtins_load() {
    let names = list_builtin();
    assert_eq!(
        names,
        vec![
            "commits",
            "enterprise-owners",
            "forks",
            "inclusivity",
            "keyword-search",
            "mystery-orgs",
            "org-members",
            "pinned-repos",
            "pr-activity",
            "repo-activity",
            "rest-repos",
        ]
    );

    for name in names {
        let def = load_report(name).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(def.name, name);
        assert!(is_builtin(name));
    }
}

#[test_case("repo-activity", ItemKind::Org, 100, None, Direction::Forward ; "repo activity")]
#[test_case("inclusivity", ItemKind::Org, 5, None, Direction::Forward ; "inclusivity")]
#[test_case("pr-activity", ItemKind::Repo, 10, Some(10), Direction::Backward ; "pr activity samples newest")]
#[test_case("forks", ItemKind::Repo, 20, None, Direction::Forward ; "forks")]
#[test_case("keyword-search", ItemKind::Keyword, 100, None, Direction::Forward ; "keyword search")]
fn test_builtin_pagination(
    name: &str,
    kind: ItemKind,
    page_size: u32,
    max_pages: Option<usize>,
    direction: Direction,
) {
    let def = load_report(name).unwrap();
    assert_eq!(def.item_kind, kind);
    assert_eq!(def.pagination.page_size, page_size);
    assert_eq!(def.pagination.max_pages, max_pages);
    assert_eq!(def.pagination.direction, direction);
}

#[test]
fn test_commits_uses_edges_and_optional_dates() {
    let def = load_report("commits").unwrap();
    assert_eq!(def.records, RecordShape::Edges);
    assert_eq!(
        def.connection.as_deref(),
        Some("repository.defaultBranchRef.target.history")
    );

    let vars = def.resolve_vars(&StringMap::new());
    assert_eq!(vars, json!({ "since": null, "until": null }));
    check_vars(&def, &vars).unwrap();

    let query = def.connection_query(vars).unwrap();
    let variables = query
        .variables_for(
            &WorkItem::repo("vmware", "pyvmomi"),
            &PageRequest::first(100, Direction::Forward),
        )
        .unwrap();
    assert_eq!(variables.get("since"), Some(&json!(null)));
    assert_eq!(variables.get("owner"), Some(&json!("vmware")));
}

#[test]
fn test_org_members_keeps_edge_role() {
    let def = load_report("org-members").unwrap();
    assert_eq!(def.records, RecordShape::Edges);
    assert!(def.query.as_deref().unwrap().contains("role"));
}

#[test_case("mystery-orgs", "organization" ; "mystery orgs")]
#[test_case("pinned-repos", "organization.pinnedItems" ; "pinned repos")]
fn test_single_shot_reports_send_no_cursor(name: &str, connection: &str) {
    let def = load_report(name).unwrap();
    assert!(!def.pagination.paged);
    assert_eq!(def.connection.as_deref(), Some(connection));

    let query = def.connection_query(def.resolve_vars(&StringMap::new())).unwrap();
    assert!(!query.paged);
    let variables = query
        .variables_for(
            &WorkItem::org("vmware"),
            &PageRequest::first(100, Direction::Forward),
        )
        .unwrap();
    assert_eq!(variables.len(), 1);
    assert_eq!(variables.get("org"), Some(&json!("vmware")));
}

#[test]
fn test_resolve_vars_overrides_defaults() {
    let def = load_report("commits").unwrap();
    let mut overrides = StringMap::new();
    overrides.insert("since".to_string(), "2023-01-01T00:00:00Z".to_string());

    let vars = def.resolve_vars(&overrides);
    assert_eq!(
        vars,
        json!({ "since": "2023-01-01T00:00:00Z", "until": null })
    );
}

#[test]
fn test_rest_report_listing() {
    let def = load_report("rest-repos").unwrap();
    assert_eq!(def.api, ApiKind::Rest);
    assert!(def.rest_listing(json!({})).is_ok());
    assert!(def.connection_query(json!({})).is_err());
}

#[test]
fn test_output_prefix() {
    let def = load_report("forks").unwrap();
    assert_eq!(def.output_prefix(), "sunset");

    let def = load_report_from_str(MINIMAL_GRAPHQL).unwrap();
    assert_eq!(def.output_prefix(), "stars");
}

#[test]
fn test_pagination_overrides() {
    let def = load_report("pr-activity").unwrap();

    let config = def.pagination_config(None, None);
    assert_eq!(config.page_size, 10);
    assert_eq!(config.max_pages, Some(10));
    assert_eq!(config.direction, Direction::Backward);

    let config = def.pagination_config(Some(50), Some(2));
    assert_eq!(config.page_size, 50);
    assert_eq!(config.max_pages, Some(2));
}

#[test]
fn test_minimal_defaults() {
    let def = load_report_from_str(MINIMAL_GRAPHQL).unwrap();
    assert_eq!(def.api, ApiKind::Graphql);
    assert_eq!(def.records, RecordShape::Nodes);
    assert_eq!(def.pagination, PaginationDefinition::default());
    assert!(def.description.is_none());
}

#[test]
fn test_load_report_from_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(MINIMAL_GRAPHQL.as_bytes()).unwrap();

    let def = load_report(file.path()).unwrap();
    assert_eq!(def.name, "stars");
}

#[test]
fn test_load_unknown_report_lists_builtins() {
    let err = load_report("does-not-exist").unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("repo-activity"));
}

#[test_case(
    "name: x\nitem_kind: org\nconnection: organization.repositories\n",
    "no query" ; "graphql without query"
)]
#[test_case(
    "name: x\nitem_kind: org\nquery: q\n",
    "no connection" ; "graphql without connection"
)]
#[test_case(
    "name: x\nitem_kind: org\nquery: q\nconnection: organization..repositories\n",
    "invalid connection" ; "empty path segment"
)]
#[test_case(
    "name: x\nitem_kind: org\napi: rest\n",
    "no path" ; "rest without path"
)]
#[test_case(
    "name: x\nitem_kind: org\napi: rest\npath: /orgs/{{ item.org }}/repos\npagination:\n  direction: backward\n",
    "forward" ; "rest backward"
)]
#[test_case(
    "name: x\nitem_kind: org\napi: rest\npath: /orgs/{{ item.org }}\npagination:\n  paged: false\n",
    "single-shot" ; "rest single shot"
)]
#[test_case(
    "name: x\nitem_kind: org\nquery: q\nconnection: a.b\npagination:\n  page_size: 0\n",
    "page_size" ; "zero page size"
)]
#[test_case(
    "name: x\nitem_kind: org\nquery: q\nconnection: a.b\npagination:\n  max_pages: 0\n",
    "max_pages" ; "zero max pages"
)]
#[test_case(
    "name: x\nitem_kind: keyword\nquery: q\nconnection: a.b\nvariables:\n  org: \"{{ item.org }}\"\n",
    "keyword items only have" ; "item field for wrong kind"
)]
#[test_case(
    "name: x\nitem_kind: org\nquery: q\nconnection: a.b\nvariables:\n  t: \"{{ config.token }}\"\n",
    "unknown template root" ; "unknown root"
)]
#[test_case(
    "name: x\nitem_kind: org\nquery: q\nconnection: a.b\nsurprise: true\n",
    "unknown field" ; "unknown key"
)]
#[test_case("name: ''\nitem_kind: org\nquery: q\nconnection: a.b\n", "name" ; "empty name")]
fn test_invalid_definitions(yaml: &str, expected: &str) {
    let err = load_report_from_str(yaml).unwrap_err();
    assert!(err.is_configuration());
    assert!(
        err.to_string().contains(expected),
        "expected '{expected}' in: {err}"
    );
}

#[test]
fn test_check_vars_reports_missing() {
    let yaml = "name: x\nitem_kind: org\nquery: q\nconnection: a.b\nvariables:\n  since: \"{{ vars.since }}\"\n";
    let def = load_report_from_str(yaml).unwrap();

    let err = check_vars(&def, &def.resolve_vars(&StringMap::new())).unwrap_err();
    assert!(err.to_string().contains("since"));

    let mut overrides = StringMap::new();
    overrides.insert("since".to_string(), "2024-01-01".to_string());
    check_vars(&def, &def.resolve_vars(&overrides)).unwrap();
}
