//! GraphQL connection fetcher
//!
//! Posts a report's query with the work item's variables plus `pageSize` and
//! `cursor`, then maps the Relay connection found at the configured path into
//! a `Page`. Single-shot queries (no `pageInfo`) are read as one final page.

use super::extract::{get_bool, get_path, get_str, graphql_errors, require};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::items::WorkItem;
use crate::pagination::{Direction, Page, PageFetcher, PageRequest};
use crate::template::{render_value, TemplateContext};
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Variable carrying the page size
pub const PAGE_SIZE_VAR: &str = "pageSize";

/// Variable carrying the cursor (null on the first page)
pub const CURSOR_VAR: &str = "cursor";

/// Where a connection keeps its records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    /// `connection.nodes[]`
    #[default]
    Nodes,
    /// `connection.edges[].node`, with edge-level fields such as `role`
    /// merged into the node
    Edges,
}

/// A paged GraphQL query
#[derive(Debug, Clone)]
pub struct ConnectionQuery {
    /// Query document, using `$pageSize` and `$cursor`
    pub query: String,
    /// Dot path of the connection under `data`
    pub connection: String,
    /// Where records sit in the connection
    pub records: RecordShape,
    /// Whether the query pages through `pageInfo`
    pub paged: bool,
    /// Variable templates rendered per work item
    pub variables: JsonObject,
    /// Values for `{{ vars.* }}`
    pub vars: JsonValue,
}

impl ConnectionQuery {
    /// Create a query reading `nodes` of the connection at `connection`
    pub fn new(query: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            connection: connection.into(),
            records: RecordShape::Nodes,
            paged: true,
            variables: JsonObject::new(),
            vars: Value::Object(JsonObject::new()),
        }
    }

    /// Set the record shape
    #[must_use]
    pub fn with_records(mut self, records: RecordShape) -> Self {
        self.records = records;
        self
    }

    /// Mark the query as single-shot: one request, no cursor variables
    #[must_use]
    pub fn with_paged(mut self, paged: bool) -> Self {
        self.paged = paged;
        self
    }

    /// Add a variable template
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Set the values available as `{{ vars.* }}`
    #[must_use]
    pub fn with_vars(mut self, vars: Value) -> Self {
        self.vars = vars;
        self
    }

    /// Build the variables for one page request
    pub fn variables_for(&self, item: &WorkItem, request: &PageRequest) -> Result<JsonObject> {
        let ctx = TemplateContext::new()
            .with_item(item.template_value())
            .with_vars(self.vars.clone());

        let mut variables = match render_value(&Value::Object(self.variables.clone()), &ctx)? {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        };
        if !self.paged {
            return Ok(variables);
        }
        variables.insert(PAGE_SIZE_VAR.to_string(), json!(request.page_size));
        variables.insert(
            CURSOR_VAR.to_string(),
            request.cursor.clone().map_or(Value::Null, Value::String),
        );
        Ok(variables)
    }
}

/// Fetches pages of a GraphQL connection for each work item
#[derive(Debug, Clone)]
pub struct GraphQlFetcher {
    client: Arc<HttpClient>,
    endpoint: String,
    query: ConnectionQuery,
}

impl GraphQlFetcher {
    /// Create a fetcher posting to `endpoint`
    pub fn new(client: Arc<HttpClient>, endpoint: impl Into<String>, query: ConnectionQuery) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            query,
        }
    }

    /// Get the query
    pub fn query(&self) -> &ConnectionQuery {
        &self.query
    }
}

#[async_trait]
impl PageFetcher<WorkItem> for GraphQlFetcher {
    async fn fetch_page(&self, item: &WorkItem, request: &PageRequest) -> Result<Page> {
        let variables = self.query.variables_for(item, request)?;
        debug!(
            "POST {} for {item} page {} (cursor: {:?})",
            self.endpoint, request.page_number, request.cursor
        );

        let body = json!({
            "query": self.query.query,
            "variables": variables,
        });
        let response: Value = self.client.post_json(&self.endpoint, body).await?;

        if !self.query.paged {
            return parse_single_page(&response, &self.query.connection, self.query.records);
        }
        parse_connection_page(
            &response,
            &self.query.connection,
            self.query.records,
            request.direction,
        )
    }
}

/// Map a GraphQL response into a page
///
/// `errors` without a connection fails the page. `errors` alongside a
/// connection (partial data) is logged and the data is used.
pub fn parse_connection_page(
    response: &Value,
    connection_path: &str,
    shape: RecordShape,
    direction: Direction,
) -> Result<Page> {
    let full_path = format!("data.{connection_path}");
    let connection = resolve_data(response, &full_path)?;
    let records = connection_records(connection, &full_path, shape)?;

    let page_info = require(connection, "pageInfo")
        .map_err(|_| Error::malformed(format!("{full_path}.pageInfo")))?;

    let (more_key, cursor_key) = match direction {
        Direction::Forward => ("hasNextPage", "endCursor"),
        Direction::Backward => ("hasPreviousPage", "startCursor"),
    };

    let has_more = get_bool(page_info, more_key)
        .ok_or_else(|| Error::malformed(format!("{full_path}.pageInfo.{more_key}")))?;
    let next_cursor = if has_more {
        get_str(page_info, cursor_key).map(String::from)
    } else {
        None
    };

    Ok(Page {
        records,
        has_more,
        next_cursor,
    })
}

/// Map a single-shot GraphQL response into a final page
///
/// The value at the path may be a connection (records read per `shape`,
/// any `pageInfo` ignored), a list of records, or one object that becomes
/// a single record.
pub fn parse_single_page(
    response: &Value,
    connection_path: &str,
    shape: RecordShape,
) -> Result<Page> {
    let full_path = format!("data.{connection_path}");
    let value = resolve_data(response, &full_path)?;

    let shape_key = match shape {
        RecordShape::Nodes => "nodes",
        RecordShape::Edges => "edges",
    };

    let records = match value {
        Value::Object(map) if map.contains_key(shape_key) => {
            connection_records(value, &full_path, shape)?
        }
        Value::Object(_) => vec![value.clone()],
        Value::Array(items) => items.clone(),
        _ => return Err(Error::malformed(full_path)),
    };

    Ok(Page::last(records))
}

/// Find the value under `data`, turning top-level `errors` into failures
fn resolve_data<'a>(response: &'a Value, full_path: &str) -> Result<&'a Value> {
    let errors = graphql_errors(response);

    let Some(value) = get_path(response, full_path) else {
        return Err(match errors {
            Some(message) => Error::graphql(message),
            None => Error::malformed(full_path),
        });
    };

    if let Some(message) = errors {
        warn!("GraphQL returned partial data with errors: {message}");
    }
    Ok(value)
}

fn connection_records(
    connection: &Value,
    full_path: &str,
    shape: RecordShape,
) -> Result<Vec<Value>> {
    match shape {
        RecordShape::Nodes => require(connection, "nodes")?
            .as_array()
            .cloned()
            .ok_or_else(|| Error::malformed(format!("{full_path}.nodes"))),
        RecordShape::Edges => require(connection, "edges")?
            .as_array()
            .ok_or_else(|| Error::malformed(format!("{full_path}.edges")))?
            .iter()
            .map(|edge| edge_record(edge, full_path))
            .collect(),
    }
}

/// The edge's node with the edge's own fields merged in
///
/// A node field wins over an edge field of the same name; the edge value is
/// kept as `edge.<name>`. A non-object node is kept whole under `node`.
fn edge_record(edge: &Value, full_path: &str) -> Result<Value> {
    let node = get_path(edge, "node")
        .ok_or_else(|| Error::malformed(format!("{full_path}.edges[].node")))?;
    let Some(edge_fields) = edge.as_object() else {
        return Err(Error::malformed(format!("{full_path}.edges[]")));
    };

    let mut record = match node {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = JsonObject::new();
            map.insert("node".to_string(), other.clone());
            map
        }
    };

    for (key, value) in edge_fields {
        if key == "node" {
            continue;
        }
        if record.contains_key(key) {
            record.insert(format!("edge.{key}"), value.clone());
        } else {
            record.insert(key.clone(), value.clone());
        }
    }

    Ok(Value::Object(record))
}
