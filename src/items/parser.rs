//! Work item parsing
//!
//! Accepts the forms people paste around: bare logins, `owner/repo`,
//! `owner,repo` CSV rows and github.com URLs. Item files hold one item per
//! line; blank lines and `#` comments are skipped.

use super::types::{ItemKind, WorkItem};
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// github.com URL with an owner and optional repository segment
///
/// Organization pages live under `/orgs/<login>`; that prefix is skipped.
static GITHUB_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/(?:orgs/)?([^/\s?#]+)(?:/([^/\s?#]+))?")
        .unwrap()
});

/// Characters GitHub allows in logins and repository names
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

/// Parse one item of the given kind
pub fn parse_item(input: &str, kind: ItemKind) -> Result<WorkItem> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::invalid_value("item", "empty work item"));
    }

    match kind {
        ItemKind::Org => parse_org(input),
        ItemKind::Repo => parse_repo(input),
        ItemKind::Keyword => Ok(WorkItem::keyword(input)),
    }
}

fn parse_org(input: &str) -> Result<WorkItem> {
    let login = match GITHUB_URL_REGEX.captures(input) {
        Some(cap) => cap[1].to_string(),
        None => input.to_string(),
    };
    validate_name(&login, input)?;
    Ok(WorkItem::org(login))
}

fn parse_repo(input: &str) -> Result<WorkItem> {
    if let Some(cap) = GITHUB_URL_REGEX.captures(input) {
        let owner = &cap[1];
        let Some(name) = cap.get(2) else {
            return Err(Error::invalid_value(
                "item",
                format!("'{input}' has no repository name"),
            ));
        };
        let name = name.as_str().trim_end_matches(".git");
        return repo(owner, name, input);
    }

    let fields = parse_csv_line(input, ',');
    if fields.len() >= 2 && !fields[1].is_empty() {
        return repo(&fields[0], &fields[1], input);
    }

    match fields[0].split_once('/') {
        Some((owner, name)) => repo(owner, name, input),
        None => Err(Error::invalid_value(
            "item",
            format!("'{input}' is not owner/repo, owner,repo or a GitHub URL"),
        )),
    }
}

fn repo(owner: &str, name: &str, input: &str) -> Result<WorkItem> {
    let (owner, name) = (owner.trim(), name.trim());
    validate_name(owner, input)?;
    validate_name(name, input)?;
    Ok(WorkItem::repo(owner, name))
}

fn validate_name(name: &str, input: &str) -> Result<()> {
    if NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_value(
            "item",
            format!("'{input}' is not a valid GitHub name"),
        ))
    }
}

/// Parse a list of items, dropping duplicates (first occurrence wins)
pub fn parse_items<'a>(
    inputs: impl IntoIterator<Item = &'a str>,
    kind: ItemKind,
) -> Result<Vec<WorkItem>> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for input in inputs {
        let item = parse_item(input, kind)?;
        if seen.insert(item.clone()) {
            items.push(item);
        } else {
            debug!("Skipping duplicate item {item}");
        }
    }

    Ok(items)
}

/// Parse the contents of an item file
///
/// For orgs the first CSV column is the login; for repositories a row may
/// be `owner,repo`, `owner/repo` or a URL; keywords use the whole line.
pub fn parse_items_str(content: &str, kind: ItemKind) -> Result<Vec<WorkItem>> {
    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match kind {
            ItemKind::Org => parse_csv_line(line, ',')
                .into_iter()
                .next()
                .unwrap_or_default(),
            ItemKind::Repo | ItemKind::Keyword => line.to_string(),
        })
        .collect();

    parse_items(lines.iter().map(String::as_str), kind)
}

/// Read work items from a file
pub fn read_items(path: impl AsRef<Path>, kind: ItemKind) -> Result<Vec<WorkItem>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read items file '{}': {e}",
                path.display()
            ))
        }
    })?;

    let items = parse_items_str(&content, kind)?;
    debug!("Read {} {kind} items from {}", items.len(), path.display());
    Ok(items)
}

/// Parse a CSV line into fields
pub(crate) fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}
