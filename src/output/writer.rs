//! Table writers
//!
//! Writes flattened rows to `<dir>/<prefix>_<YYYY-MM-DD>.<ext>` as CSV,
//! Parquet or JSON Lines.

use super::flatten::WORK_ITEM_COLUMN;
use super::schema::rows_to_record_batch;
use crate::error::{Error, Result};
use crate::types::{JsonObject, OutputFormat};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Local, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// File naming
// ============================================================================

/// Path of a dated output file
pub fn output_path(dir: &Path, prefix: &str, format: OutputFormat, date: NaiveDate) -> PathBuf {
    dir.join(format!(
        "{prefix}_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    ))
}

// ============================================================================
// Parquet
// ============================================================================

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Write a RecordBatch to a Parquet file, returning the row count
pub fn write_parquet(path: &Path, batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<usize> {
    let file = create_file(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(config.build_properties()))
        .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;

    writer.write(batch)?;
    writer
        .close()
        .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))?;
    Ok(batch.num_rows())
}

// ============================================================================
// CSV
// ============================================================================

/// Write a RecordBatch to a CSV file with a header row
pub fn write_csv(path: &Path, batch: &RecordBatch) -> Result<usize> {
    let file = create_file(path)?;
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch)?;
    writer.into_inner().flush()?;
    Ok(batch.num_rows())
}

// ============================================================================
// JSON Lines
// ============================================================================

/// Write rows as JSON Lines, one object per line
pub fn write_jsonl(path: &Path, rows: &[JsonObject]) -> Result<usize> {
    let mut out = BufWriter::new(create_file(path)?);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(rows.len())
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path)
        .map_err(|e| Error::output(format!("Failed to create '{}': {e}", path.display())))
}

/// Batch for a table; an empty run still gets its `work_item` column
fn table_batch(rows: &[JsonObject]) -> Result<RecordBatch> {
    if rows.is_empty() {
        let schema = Schema::new(vec![Field::new(WORK_ITEM_COLUMN, DataType::Utf8, true)]);
        return Ok(RecordBatch::new_empty(Arc::new(schema)));
    }
    rows_to_record_batch(rows)
}

// ============================================================================
// Table writer
// ============================================================================

/// Writes one table per report run into an output directory
#[derive(Debug, Clone)]
pub struct TableWriter {
    dir: PathBuf,
    format: OutputFormat,
    parquet: ParquetWriterConfig,
}

impl TableWriter {
    /// Create a writer for the given directory and format
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            parquet: ParquetWriterConfig::default(),
        }
    }

    /// Override Parquet settings
    #[must_use]
    pub fn with_parquet_config(mut self, config: ParquetWriterConfig) -> Self {
        self.parquet = config;
        self
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write rows to today's file for `prefix`
    pub fn write(&self, prefix: &str, rows: &[JsonObject]) -> Result<PathBuf> {
        self.write_dated(prefix, rows, Local::now().date_naive())
    }

    /// Write rows to the file for `prefix` on `date`
    ///
    /// Creates the output directory if needed and replaces an existing file.
    pub fn write_dated(&self, prefix: &str, rows: &[JsonObject], date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::output(format!(
                "Failed to create output directory '{}': {e}",
                self.dir.display()
            ))
        })?;

        let path = output_path(&self.dir, prefix, self.format, date);
        let written = match self.format {
            OutputFormat::Jsonl => write_jsonl(&path, rows)?,
            OutputFormat::Csv => write_csv(&path, &table_batch(rows)?)?,
            OutputFormat::Parquet => write_parquet(&path, &table_batch(rows)?, &self.parquet)?,
        };

        info!("Wrote {written} rows to {}", path.display());
        Ok(path)
    }
}
