//! Tests for the GitHub fetchers

use super::extract::{get_path, get_str, get_string, graphql_errors, select_records};
use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::items::WorkItem;
use crate::pagination::{Direction, PageFetcher, PageRequest, PaginationConfig, Paginator};
use crate::types::BackoffType;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPOS_QUERY: &str = "query($org: String!, $pageSize: Int!, $cursor: String) { \
    organization(login: $org) { repositories(first: $pageSize, after: $cursor) { \
    pageInfo { hasNextPage endCursor } nodes { name } } } }";

fn client(server: &MockServer) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(1)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_millis(50),
        )
        .no_rate_limit()
        .build();
    Arc::new(HttpClient::with_config(config).unwrap())
}

fn repos_query() -> ConnectionQuery {
    ConnectionQuery::new(REPOS_QUERY, "organization.repositories")
        .with_variable("org", json!("{{ item.org }}"))
}

fn repos_page(names: &[&str], has_next: bool, end_cursor: Option<&str>) -> Value {
    let nodes: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
    json!({
        "data": {
            "organization": {
                "repositories": {
                    "pageInfo": { "hasNextPage": has_next, "endCursor": end_cursor },
                    "nodes": nodes
                }
            }
        }
    })
}

fn names(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| get_str(r, "name").map(String::from))
        .collect()
}

// ============================================================================
// Extract Tests
// ============================================================================

#[test]
fn test_get_path_treats_null_as_missing() {
    let value = json!({
        "repository": {
            "defaultBranchRef": null,
            "languages": { "nodes": [{ "name": "Go" }, { "name": "Rust" }] },
            "stargazerCount": 42
        }
    });

    assert!(get_path(&value, "repository.defaultBranchRef").is_none());
    assert!(get_path(&value, "repository.defaultBranchRef.name").is_none());
    assert!(get_path(&value, "repository.missing").is_none());
    assert_eq!(get_str(&value, "repository.languages.nodes.1.name"), Some("Rust"));
    assert_eq!(
        get_string(&value, "$.repository.stargazerCount").as_deref(),
        Some("42")
    );
}

#[test]
fn test_select_records() {
    let body = json!({ "total_count": 2, "items": [{ "id": 1 }, { "id": 2 }] });

    let records = select_records(&body, "$.items[*]").unwrap();
    assert_eq!(records, vec![json!({ "id": 1 }), json!({ "id": 2 })]);

    assert!(select_records(&body, "$.items[?(@.id ==").is_err());
}

#[test]
fn test_graphql_errors() {
    let response = json!({
        "errors": [
            { "message": "first" },
            { "message": "second" }
        ]
    });
    assert_eq!(graphql_errors(&response).as_deref(), Some("first; second"));
    assert!(graphql_errors(&json!({ "errors": [] })).is_none());
    assert!(graphql_errors(&json!({ "data": {} })).is_none());
}

// ============================================================================
// Connection Parsing Tests
// ============================================================================

#[test]
fn test_parse_connection_forward() {
    let response = repos_page(&["a", "b"], true, Some("Y3Vyc29yOjI="));
    let page = parse_connection_page(
        &response,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Forward,
    )
    .unwrap();

    assert_eq!(names(&page.records), vec!["a", "b"]);
    assert!(page.has_more);
    assert_eq!(page.next_cursor.as_deref(), Some("Y3Vyc29yOjI="));
}

#[test]
fn test_parse_connection_backward_uses_start_cursor() {
    let response = json!({
        "data": { "repository": { "pullRequests": {
            "pageInfo": {
                "hasPreviousPage": true,
                "startCursor": "start",
                "hasNextPage": false,
                "endCursor": "end"
            },
            "nodes": [{ "number": 9 }, { "number": 10 }]
        }}}
    });

    let page = parse_connection_page(
        &response,
        "repository.pullRequests",
        RecordShape::Nodes,
        Direction::Backward,
    )
    .unwrap();

    assert!(page.has_more);
    assert_eq!(page.next_cursor.as_deref(), Some("start"));
}

#[test]
fn test_parse_connection_last_page_has_no_cursor() {
    let response = repos_page(&["z"], false, Some("end"));
    let page = parse_connection_page(
        &response,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Forward,
    )
    .unwrap();

    assert!(!page.has_more);
    assert!(page.next_cursor.is_none());
}

#[test]
fn test_parse_connection_edges() {
    let response = json!({
        "data": { "organization": { "membersWithRole": {
            "pageInfo": { "hasNextPage": false, "endCursor": null },
            "edges": [
                { "role": "ADMIN", "node": { "login": "alice" } },
                { "role": "MEMBER", "node": { "login": "bob" } }
            ]
        }}}
    });

    let page = parse_connection_page(
        &response,
        "organization.membersWithRole",
        RecordShape::Edges,
        Direction::Forward,
    )
    .unwrap();

    assert_eq!(
        page.records,
        vec![
            json!({ "login": "alice", "role": "ADMIN" }),
            json!({ "login": "bob", "role": "MEMBER" })
        ]
    );
}

#[test]
fn test_parse_connection_edge_field_clash_keeps_node_value() {
    let response = json!({
        "data": { "organization": { "enterpriseOwners": {
            "pageInfo": { "hasNextPage": false },
            "edges": [{
                "cursor": "Y3Vyc29yOjE=",
                "login": "from-edge",
                "node": { "login": "alice" }
            }]
        }}}
    });

    let page = parse_connection_page(
        &response,
        "organization.enterpriseOwners",
        RecordShape::Edges,
        Direction::Forward,
    )
    .unwrap();

    assert_eq!(
        page.records,
        vec![json!({
            "login": "alice",
            "cursor": "Y3Vyc29yOjE=",
            "edge.login": "from-edge"
        })]
    );
}

#[test]
fn test_parse_connection_edge_without_node_is_malformed() {
    let response = json!({
        "data": { "organization": { "membersWithRole": {
            "pageInfo": { "hasNextPage": false },
            "edges": [{ "role": "ADMIN", "node": null }]
        }}}
    });

    let err = parse_connection_page(
        &response,
        "organization.membersWithRole",
        RecordShape::Edges,
        Direction::Forward,
    )
    .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { ref path } if path.ends_with("edges[].node")));
}

// ============================================================================
// Single-Shot Parsing Tests
// ============================================================================

#[test]
fn test_parse_single_page_object_is_one_record() {
    let response = json!({
        "data": { "organization": {
            "name": "VMware",
            "url": "https://github.com/vmware",
            "websiteUrl": null,
            "membersWithRole": { "nodes": [{ "login": "alice" }] }
        }}
    });

    let page = parse_single_page(&response, "organization", RecordShape::Nodes).unwrap();

    assert!(!page.has_more);
    assert!(page.next_cursor.is_none());
    assert_eq!(page.records, vec![response["data"]["organization"].clone()]);
}

#[test]
fn test_parse_single_page_reads_nodes_without_page_info() {
    let response = json!({
        "data": { "organization": { "pinnedItems": {
            "nodes": [{ "name": "pyvmomi" }, { "name": "govmomi" }]
        }}}
    });

    let page =
        parse_single_page(&response, "organization.pinnedItems", RecordShape::Nodes).unwrap();

    assert!(!page.has_more);
    assert_eq!(names(&page.records), vec!["pyvmomi", "govmomi"]);
}

#[test]
fn test_parse_single_page_list_and_errors() {
    let list = json!({ "data": { "viewer": { "topics": [{ "name": "a" }, { "name": "b" }] } } });
    let page = parse_single_page(&list, "viewer.topics", RecordShape::Nodes).unwrap();
    assert_eq!(page.len(), 2);

    let missing = json!({
        "data": { "organization": null },
        "errors": [{ "message": "Could not resolve to an Organization" }]
    });
    let err = parse_single_page(&missing, "organization", RecordShape::Nodes).unwrap_err();
    assert!(matches!(err, Error::GraphQl { .. }));

    let scalar = json!({ "data": { "organization": { "name": "VMware" } } });
    let err = parse_single_page(&scalar, "organization.name", RecordShape::Nodes).unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[test]
fn test_parse_connection_errors_without_data() {
    let response = json!({
        "data": { "organization": null },
        "errors": [{
            "type": "NOT_FOUND",
            "message": "Could not resolve to an Organization with the login of 'nope'."
        }]
    });

    let err = parse_connection_page(
        &response,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Forward,
    )
    .unwrap_err();

    assert!(matches!(err, Error::GraphQl { ref message } if message.contains("Could not resolve")));
}

#[test]
fn test_parse_connection_partial_errors_use_data() {
    let mut response = repos_page(&["a"], false, None);
    response["errors"] = json!([{ "message": "some field was forbidden" }]);

    let page = parse_connection_page(
        &response,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Forward,
    )
    .unwrap();
    assert_eq!(page.len(), 1);
}

#[test]
fn test_parse_connection_missing_keys() {
    let no_connection = json!({ "data": { "organization": {} } });
    let err = parse_connection_page(
        &no_connection,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Forward,
    )
    .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { ref path } if path == "data.organization.repositories"));

    let no_page_info = json!({ "data": { "organization": { "repositories": { "nodes": [] } } } });
    let err = parse_connection_page(
        &no_page_info,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Forward,
    )
    .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { ref path } if path.ends_with("pageInfo")));

    let no_nodes = json!({ "data": { "organization": { "repositories": {
        "pageInfo": { "hasNextPage": false }
    } } } });
    assert!(parse_connection_page(
        &no_nodes,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Forward,
    )
    .is_err());

    let backward_without_flag = repos_page(&["a"], true, Some("c"));
    assert!(parse_connection_page(
        &backward_without_flag,
        "organization.repositories",
        RecordShape::Nodes,
        Direction::Backward,
    )
    .is_err());
}

// ============================================================================
// GraphQL Fetcher Tests
// ============================================================================

#[test]
fn test_variables_for_first_and_later_pages() {
    let query = repos_query().with_vars(json!({ "since": "2024-01-01" }));
    let item = WorkItem::org("vmware");

    let first = query
        .variables_for(&item, &PageRequest::first(50, Direction::Forward))
        .unwrap();
    assert_eq!(
        Value::Object(first),
        json!({ "org": "vmware", "pageSize": 50, "cursor": null })
    );

    let later = PageRequest {
        cursor: Some("abc".to_string()),
        page_size: 50,
        direction: Direction::Forward,
        page_number: 2,
    };
    let second = query.variables_for(&item, &later).unwrap();
    assert_eq!(second.get(CURSOR_VAR), Some(&json!("abc")));
}

#[test]
fn test_variables_for_single_shot_query_has_no_cursor() {
    let query = repos_query().with_paged(false);
    let variables = query
        .variables_for(
            &WorkItem::org("vmware"),
            &PageRequest::first(50, Direction::Forward),
        )
        .unwrap();
    assert_eq!(Value::Object(variables), json!({ "org": "vmware" }));
}

#[tokio::test]
async fn test_graphql_fetcher_single_shot_makes_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "org": "vmware" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "organization": { "name": "VMware", "createdAt": "2012-01-01T00:00:00Z" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ConnectionQuery::new("query($org: String!) { x }", "organization")
        .with_variable("org", json!("{{ item.org }}"))
        .with_paged(false);
    let fetcher = GraphQlFetcher::new(client(&server), "/graphql", query);
    let result = Paginator::new(PaginationConfig::new(100))
        .unwrap()
        .run(&fetcher, WorkItem::org("vmware"))
        .await;

    assert!(result.is_ok());
    assert_eq!(result.pages_fetched(), 1);
    assert_eq!(names(&result.records), vec!["VMware"]);
}

#[test]
fn test_variables_for_wrong_item_kind() {
    let query = repos_query();
    let err = query
        .variables_for(
            &WorkItem::keyword("kubernetes"),
            &PageRequest::first(10, Direction::Forward),
        )
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedVariable { .. }));
}

#[tokio::test]
async fn test_graphql_fetcher_paginates_with_cursor_variables() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({
            "variables": { "org": "vmware", "pageSize": 2, "cursor": null }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(repos_page(
            &["a", "b"],
            true,
            Some("c1"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "cursor": "c1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(repos_page(
            &["c"],
            false,
            Some("c2"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = GraphQlFetcher::new(client(&server), "/graphql", repos_query());
    let result = Paginator::new(PaginationConfig::new(2))
        .unwrap()
        .run(&fetcher, WorkItem::org("vmware"))
        .await;

    assert!(result.is_ok());
    assert_eq!(names(&result.records), vec!["a", "b", "c"]);
    assert_eq!(result.pages_fetched(), 2);
}

#[tokio::test]
async fn test_graphql_fetcher_error_on_second_page_keeps_first() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "cursor": null } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(repos_page(
            &["a", "b"],
            true,
            Some("c1"),
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "cursor": "c1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Something went wrong while executing your query." }]
        })))
        .mount(&server)
        .await;

    let fetcher = GraphQlFetcher::new(client(&server), "/graphql", repos_query());
    let result = Paginator::new(PaginationConfig::new(2))
        .unwrap()
        .run(&fetcher, WorkItem::org("vmware"))
        .await;

    assert!(result.is_error());
    assert_eq!(names(&result.records), vec!["a", "b"]);
    assert!(matches!(result.error, Some(Error::GraphQl { .. })));
}

#[tokio::test]
async fn test_graphql_fetcher_http_error_is_page_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let fetcher = GraphQlFetcher::new(client(&server), "/graphql", repos_query());
    let err = fetcher
        .fetch_page(
            &WorkItem::org("vmware"),
            &PageRequest::first(10, Direction::Forward),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}

// ============================================================================
// REST Fetcher / Link Header Tests
// ============================================================================

#[test]
fn test_parse_link_header_next() {
    let header = r#"<https://api.github.com/organizations/1/repos?page=2>; rel="next", <https://api.github.com/organizations/1/repos?page=5>; rel="last""#;
    assert_eq!(
        parse_link_header(header, "next").as_deref(),
        Some("https://api.github.com/organizations/1/repos?page=2")
    );
    assert_eq!(
        parse_link_header(header, "last").as_deref(),
        Some("https://api.github.com/organizations/1/repos?page=5")
    );
}

#[test]
fn test_parse_link_header_no_next() {
    let header = r#"<https://api.example.com/items?page=1>; rel="prev", <https://api.example.com/items?page=1>; rel="first""#;
    assert!(parse_link_header(header, "next").is_none());
    assert!(parse_link_header("", "next").is_none());
}

#[test]
fn test_parse_link_header_multiple_rels() {
    let header = r#"<https://api.example.com/items?page=3>; rel="next last""#;
    assert_eq!(
        parse_link_header(header, "last").as_deref(),
        Some("https://api.example.com/items?page=3")
    );
}

#[tokio::test]
async fn test_rest_fetcher_follows_link_header() {
    let server = MockServer::start().await;
    let next_url = format!("{}/organizations/42/repos?per_page=2&page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/orgs/vmware/repos"))
        .and(query_param("per_page", "2"))
        .and(query_param("type", "public"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!("<{next_url}>; rel=\"next\"").as_str())
                .set_body_json(json!([{ "name": "a" }, { "name": "b" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/42/repos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "c" }])))
        .expect(1)
        .mount(&server)
        .await;

    let listing = RestListing::new("/orgs/{{ item.org }}/repos").with_param("type", "public");
    let fetcher = RestFetcher::new(client(&server), listing);
    let result = Paginator::new(PaginationConfig::new(2))
        .unwrap()
        .run(&fetcher, WorkItem::org("vmware"))
        .await;

    assert!(result.is_ok());
    assert_eq!(names(&result.records), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_rest_fetcher_records_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "kubernetes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "items": [{ "name": "kubernetes" }]
        })))
        .mount(&server)
        .await;

    let listing = RestListing::new("/search/repositories")
        .with_param("q", "{{ item.keyword }}")
        .with_records_path(Some("$.items[*]".to_string()));
    let fetcher = RestFetcher::new(client(&server), listing);

    let page = fetcher
        .fetch_page(
            &WorkItem::keyword("kubernetes"),
            &PageRequest::first(100, Direction::Forward),
        )
        .await
        .unwrap();

    assert!(!page.has_more);
    assert_eq!(names(&page.records), vec!["kubernetes"]);
}

#[tokio::test]
async fn test_rest_fetcher_object_body_without_path_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/vmware/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "?" })))
        .mount(&server)
        .await;

    let fetcher = RestFetcher::new(client(&server), RestListing::new("/orgs/{{ item.org }}/repos"));
    let err = fetcher
        .fetch_page(
            &WorkItem::org("vmware"),
            &PageRequest::first(100, Direction::Forward),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { .. }));
}
