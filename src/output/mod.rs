//! Output module
//!
//! Turns harvested records into tables on disk.
//!
//! # Overview
//!
//! - Flattening nested records into dotted columns
//! - Arrow schema inference with first-seen column order
//! - CSV, Parquet and JSON Lines writers with dated file names

mod flatten;
mod schema;
mod writer;

pub use flatten::{flatten_record, flatten_rows, ARRAY_SEPARATOR, WORK_ITEM_COLUMN};
pub use schema::{infer_schema, rows_to_batch, rows_to_record_batch};
pub use writer::{
    output_path, write_csv, write_jsonl, write_parquet, ParquetWriterConfig, TableWriter,
};
