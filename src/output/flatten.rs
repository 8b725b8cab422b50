//! Record flattening
//!
//! Turns nested GitHub records into flat rows: nested objects become dotted
//! column names, arrays of scalars are joined with `;`, and arrays holding
//! objects or arrays are kept as JSON text. A dotted name that already
//! exists (a literal `"owner.login"` key next to a nested `owner.login`)
//! gets a numeric suffix instead of overwriting the earlier value.

use crate::types::{JsonObject, JsonValue, Record};
use serde_json::Value;
use tracing::warn;

/// Name of the column that carries the work item label
pub const WORK_ITEM_COLUMN: &str = "work_item";

/// Separator for arrays of scalars
pub const ARRAY_SEPARATOR: &str = ";";

/// Flatten one record into a single-level object
///
/// A record that is not an object lands in a `value` column.
pub fn flatten_record(record: &Record) -> JsonObject {
    let mut out = JsonObject::new();
    match record {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(key, value, &mut out);
            }
        }
        other => flatten_into("value", other, &mut out),
    }
    out
}

fn flatten_into(prefix: &str, value: &JsonValue, out: &mut JsonObject) {
    match value {
        // An empty object still yields its column so sibling rows line up
        Value::Object(map) if map.is_empty() => {
            insert_unique(out, prefix, Value::Null);
        }
        Value::Object(map) => {
            for (key, inner) in map {
                flatten_into(&format!("{prefix}.{key}"), inner, out);
            }
        }
        Value::Array(items) => {
            insert_unique(out, prefix, flatten_array(items));
        }
        scalar => {
            insert_unique(out, prefix, scalar.clone());
        }
    }
}

fn insert_unique(out: &mut JsonObject, key: &str, value: JsonValue) {
    if !out.contains_key(key) {
        out.insert(key.to_string(), value);
        return;
    }

    let renamed = (2..)
        .map(|n| format!("{key}_{n}"))
        .find(|candidate| !out.contains_key(candidate))
        .unwrap_or_else(|| format!("{key}_dup"));
    warn!("Column '{key}' appears twice in a record; keeping the second as '{renamed}'");
    out.insert(renamed, value);
}

fn flatten_array(items: &[JsonValue]) -> JsonValue {
    if items.is_empty() {
        return Value::Null;
    }

    if items.iter().any(|v| v.is_object() || v.is_array()) {
        return Value::String(Value::Array(items.to_vec()).to_string());
    }

    let joined = items
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(ARRAY_SEPARATOR);
    Value::String(joined)
}

/// Flatten every record of one work item, prefixed with its label
pub fn flatten_rows<'a>(
    label: &str,
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<JsonObject> {
    records
        .into_iter()
        .map(|record| {
            let mut row = JsonObject::new();
            row.insert(
                WORK_ITEM_COLUMN.to_string(),
                Value::String(label.to_string()),
            );
            for (key, value) in flatten_record(record) {
                // A record field named work_item must not clobber the label
                if key == WORK_ITEM_COLUMN {
                    row.insert(format!("record.{key}"), value);
                } else {
                    row.insert(key, value);
                }
            }
            row
        })
        .collect()
}
