//! Optional-field access into GitHub responses
//!
//! GitHub returns `null` freely (a repo without a default branch, a commit
//! author without a linked user). These accessors treat `null` the same as a
//! missing key so callers deal with a single `Option`.

use crate::error::{Error, Result};
use serde_json::Value;

/// Walk a dot-separated path (`repository.defaultBranchRef.name`)
///
/// Numeric segments index into arrays. Returns None when any step is
/// missing or null.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    let mut current = value;

    for part in path.split('.').filter(|p| !p.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    (!current.is_null()).then_some(current)
}

/// Like `get_path`, but a missing value means the response is malformed
pub fn require<'a>(value: &'a Value, path: &str) -> Result<&'a Value> {
    get_path(value, path).ok_or_else(|| Error::malformed(path))
}

/// String at `path`
pub fn get_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    get_path(value, path).and_then(Value::as_str)
}

/// Boolean at `path`
pub fn get_bool(value: &Value, path: &str) -> Option<bool> {
    get_path(value, path).and_then(Value::as_bool)
}

/// Scalar at `path` rendered as text
pub fn get_string(value: &Value, path: &str) -> Option<String> {
    match get_path(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Select records with a JSONPath expression (`$.items[*]`)
///
/// A single match becomes a one-record list; no match is an empty list.
pub fn select_records(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}

/// Messages from a GraphQL `errors` array, joined with "; "
pub fn graphql_errors(response: &Value) -> Option<String> {
    let errors = response.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }

    let messages: Vec<String> = errors
        .iter()
        .map(|e| get_string(e, "message").unwrap_or_else(|| e.to_string()))
        .collect();
    Some(messages.join("; "))
}
