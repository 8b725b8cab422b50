//! REST fetcher with Link header pagination
//!
//! The first request goes to the templated path with `per_page`; every later
//! request follows the absolute URL from the previous response's
//! `Link: <...>; rel="next"` header. Walks forward only.

use super::extract::select_records;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::items::WorkItem;
use crate::pagination::{Page, PageFetcher, PageRequest};
use crate::template::{render, TemplateContext};
use crate::types::JsonValue;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A paged REST listing
#[derive(Debug, Clone)]
pub struct RestListing {
    /// Path template, e.g. `/orgs/{{ item.org }}/repos`
    pub path: String,
    /// JSONPath selecting records; None means the body is the record array
    pub records_path: Option<String>,
    /// Extra query parameters (templated)
    pub params: Vec<(String, String)>,
    /// Values for `{{ vars.* }}`
    pub vars: JsonValue,
}

impl RestListing {
    /// Create a listing whose body is a JSON array
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            records_path: None,
            params: Vec::new(),
            vars: Value::Object(serde_json::Map::new()),
        }
    }

    /// Select records with a JSONPath expression
    #[must_use]
    pub fn with_records_path(mut self, path: Option<String>) -> Self {
        self.records_path = path;
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Set the values available as `{{ vars.* }}`
    #[must_use]
    pub fn with_vars(mut self, vars: Value) -> Self {
        self.vars = vars;
        self
    }

    /// Build the first-page request for an item
    fn first_request(&self, item: &WorkItem, page_size: u32) -> Result<(String, RequestConfig)> {
        let ctx = TemplateContext::new()
            .with_item(item.template_value())
            .with_vars(self.vars.clone());

        let path = render(&self.path, &ctx)?;
        let mut config = RequestConfig::new();
        for (key, value) in &self.params {
            config = config.query(key.as_str(), render(value, &ctx)?);
        }
        Ok((path, config.query("per_page", page_size.to_string())))
    }
}

/// Fetches pages of a REST listing for each work item
#[derive(Debug, Clone)]
pub struct RestFetcher {
    client: Arc<HttpClient>,
    listing: RestListing,
}

impl RestFetcher {
    /// Create a fetcher; relative paths resolve against the client's base URL
    pub fn new(client: Arc<HttpClient>, listing: RestListing) -> Self {
        Self { client, listing }
    }
}

#[async_trait]
impl PageFetcher<WorkItem> for RestFetcher {
    async fn fetch_page(&self, item: &WorkItem, request: &PageRequest) -> Result<Page> {
        let (url, config) = match &request.cursor {
            Some(next_url) => (next_url.clone(), RequestConfig::new()),
            None => self.listing.first_request(item, request.page_size)?,
        };
        debug!("GET {url} for {item} page {}", request.page_number);

        let response = self.client.get_with_config(&url, config).await?;
        let next_url = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(|header| parse_link_header(header, "next"));
        if let Some(next) = &next_url {
            url::Url::parse(next)?;
        }

        let bytes = response.bytes().await.map_err(Error::Http)?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::decode(format!("invalid JSON from {url}: {e}")))?;

        let records = match &self.listing.records_path {
            Some(path) => select_records(&body, path)?,
            None => match body {
                Value::Array(records) => records,
                _ => return Err(Error::malformed("$[*] (expected a JSON array body)")),
            },
        };

        Ok(match next_url {
            Some(next) => Page::with_next(records, next),
            None => Page::last(records),
        })
    }
}

/// Find the URL for `target_rel` in an RFC 5988 `Link` header
///
/// Format: `<url>; rel="next", <url>; rel="last"`
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    for part in header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"').trim_matches('\''));
            }
        }

        if let (Some(url), Some(rel)) = (url, rel) {
            // rel may hold several space-separated relation types
            if rel.split_whitespace().any(|r| r == target_rel) {
                return Some(url.to_string());
            }
        }
    }

    None
}
