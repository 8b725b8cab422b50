//! Report definition types
//!
//! These types map directly to the YAML structure of report definitions.

use crate::error::{Error, Result};
use crate::github::{ConnectionQuery, RecordShape, RestListing};
use crate::items::ItemKind;
use crate::pagination::{Direction, PaginationConfig};
use crate::types::{JsonObject, OptionStringExt, StringMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which GitHub API a report talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    /// GraphQL v4, cursor pagination via `pageInfo`
    #[default]
    Graphql,
    /// REST v3, pagination via `Link` headers
    Rest,
}

/// Complete report definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportDefinition {
    /// Report name
    pub name: String,

    /// What the report collects
    #[serde(default)]
    pub description: Option<String>,

    /// Kind of work item the report iterates over
    pub item_kind: ItemKind,

    /// API the report uses
    #[serde(default)]
    pub api: ApiKind,

    /// GraphQL query document (graphql only)
    #[serde(default)]
    pub query: Option<String>,

    /// Dot path of the connection under `data` (graphql only)
    #[serde(default)]
    pub connection: Option<String>,

    /// Where records sit in the connection (graphql only)
    #[serde(default)]
    pub records: RecordShape,

    /// GraphQL variable templates (graphql only)
    #[serde(default)]
    pub variables: JsonObject,

    /// Path template (rest only)
    #[serde(default)]
    pub path: Option<String>,

    /// JSONPath selecting records from the body (rest only)
    #[serde(default)]
    pub records_path: Option<String>,

    /// Query parameter templates (rest only)
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Default values for `{{ vars.* }}`
    #[serde(default)]
    pub vars: JsonObject,

    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationDefinition,

    /// Output settings
    #[serde(default)]
    pub output: OutputDefinition,
}

/// Pagination section of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationDefinition {
    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop after this many pages
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Cursor direction
    #[serde(default)]
    pub direction: Direction,

    /// False for single-shot GraphQL queries without `pageInfo`
    #[serde(default = "default_paged")]
    pub paged: bool,
}

fn default_page_size() -> u32 {
    100
}

fn default_paged() -> bool {
    true
}

impl Default for PaginationDefinition {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: None,
            direction: Direction::Forward,
            paged: default_paged(),
        }
    }
}

/// Output section of a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDefinition {
    /// File name prefix; defaults to the report name
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ReportDefinition {
    /// File name prefix for output
    pub fn output_prefix(&self) -> String {
        self.output
            .prefix
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| self.name.replace('-', "_"))
    }

    /// Pagination config with optional overrides
    pub fn pagination_config(
        &self,
        page_size: Option<u32>,
        max_pages: Option<usize>,
    ) -> PaginationConfig {
        PaginationConfig::new(page_size.unwrap_or(self.pagination.page_size))
            .with_max_pages(max_pages.or(self.pagination.max_pages))
            .with_direction(self.pagination.direction)
    }

    /// Report defaults merged with overrides; overrides win
    pub fn resolve_vars(&self, overrides: &StringMap) -> Value {
        let mut vars = self.vars.clone();
        for (key, value) in overrides {
            vars.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(vars)
    }

    /// The GraphQL query for this report
    pub fn connection_query(&self, vars: Value) -> Result<ConnectionQuery> {
        let query = self
            .query
            .as_ref()
            .ok_or_else(|| Error::missing_field(format!("{}.query", self.name)))?;
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| Error::missing_field(format!("{}.connection", self.name)))?;

        let mut cq = ConnectionQuery::new(query.clone(), connection.clone())
            .with_records(self.records)
            .with_paged(self.pagination.paged)
            .with_vars(vars);
        for (name, template) in &self.variables {
            cq = cq.with_variable(name.clone(), template.clone());
        }
        Ok(cq)
    }

    /// The REST listing for this report
    pub fn rest_listing(&self, vars: Value) -> Result<RestListing> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| Error::missing_field(format!("{}.path", self.name)))?;

        let mut listing = RestListing::new(path.clone())
            .with_records_path(self.records_path.clone())
            .with_vars(vars);
        for (key, value) in &self.params {
            listing = listing.with_param(key.clone(), value.clone());
        }
        Ok(listing)
    }
}
