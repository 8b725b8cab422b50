//! Arrow schema inference and conversion for flattened rows

use crate::error::{Error, Result};
use crate::types::JsonObject;
use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Infer an Arrow schema from flattened rows
///
/// Columns appear in first-seen order across all rows. Every column is
/// nullable. A column that is null in every row becomes Utf8.
pub fn infer_schema(rows: &[JsonObject]) -> Schema {
    let mut order: Vec<String> = Vec::new();
    let mut types: HashMap<String, Option<DataType>> = HashMap::new();

    for row in rows {
        for (key, value) in row {
            let observed = infer_type(value);
            match types.get_mut(key) {
                Some(current) => {
                    *current = merge_types(current.take(), observed);
                }
                None => {
                    order.push(key.clone());
                    types.insert(key.clone(), observed);
                }
            }
        }
    }

    let fields: Vec<Field> = order
        .into_iter()
        .map(|name| {
            let data_type = types
                .remove(&name)
                .flatten()
                .unwrap_or(DataType::Utf8);
            Field::new(name, data_type, true)
        })
        .collect();

    Schema::new(fields)
}

/// Type of a single flattened value; `None` for null
fn infer_type(value: &Value) -> Option<DataType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(DataType::Boolean),
        Value::Number(n) if n.is_i64() => Some(DataType::Int64),
        Value::Number(_) => Some(DataType::Float64),
        Value::String(_) | Value::Array(_) | Value::Object(_) => Some(DataType::Utf8),
    }
}

fn merge_types(a: Option<DataType>, b: Option<DataType>) -> Option<DataType> {
    match (a, b) {
        (None, t) | (t, None) => t,
        (Some(a), Some(b)) if a == b => Some(a),
        (Some(DataType::Int64), Some(DataType::Float64))
        | (Some(DataType::Float64), Some(DataType::Int64)) => Some(DataType::Float64),
        _ => Some(DataType::Utf8),
    }
}

/// Convert flattened rows into a RecordBatch with the given schema
///
/// Missing keys become nulls. Values that do not match the column type are
/// rendered as text for Utf8 columns and become null otherwise.
pub fn rows_to_batch(rows: &[JsonObject], schema: SchemaRef) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| build_column(rows, field.name(), field.data_type()))
        .collect::<Result<_>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(schema, columns, &options).map_err(Error::from)
}

fn build_column(rows: &[JsonObject], name: &str, data_type: &DataType) -> Result<ArrayRef> {
    let values = rows.iter().map(|row| row.get(name).unwrap_or(&Value::Null));

    let array: ArrayRef = match data_type {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(rows.len());
            for v in values {
                builder.append_option(v.as_bool());
            }
            Arc::new(builder.finish())
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for v in values {
                builder.append_option(v.as_i64());
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(rows.len());
            for v in values {
                builder.append_option(v.as_f64());
            }
            Arc::new(builder.finish())
        }
        DataType::Utf8 => {
            let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
            for v in values {
                match v {
                    Value::Null => builder.append_null(),
                    Value::String(s) => builder.append_value(s),
                    other => builder.append_value(other.to_string()),
                }
            }
            Arc::new(builder.finish())
        }
        other => {
            return Err(Error::output(format!(
                "Unsupported column type {other:?} for '{name}'"
            )))
        }
    };

    Ok(array)
}

/// Infer a schema and build the batch in one step
pub fn rows_to_record_batch(rows: &[JsonObject]) -> Result<RecordBatch> {
    let schema = Arc::new(infer_schema(rows));
    rows_to_batch(rows, schema)
}
