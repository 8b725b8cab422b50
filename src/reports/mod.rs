//! Report definitions
//!
//! A report is a declarative YAML description of one harvest: the query (or
//! REST path), where the records live in the response, how to paginate, what
//! kind of work item it takes and how to name the output file.
//!
//! # Overview
//!
//! - `ReportDefinition` - the parsed YAML
//! - Built-in reports embedded in the binary, loadable by name
//! - Validation of structure and template references

mod builtin;
mod parser;
mod types;

pub use builtin::{get_builtin, is_builtin, list_builtin};
pub use parser::{check_vars, load_report, load_report_from_str, validate_report};
pub use types::{ApiKind, OutputDefinition, PaginationDefinition, ReportDefinition};

#[cfg(test)]
mod tests;
