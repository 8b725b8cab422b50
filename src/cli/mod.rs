//! CLI module
//!
//! Command-line interface for running reports.
//!
//! # Commands
//!
//! - `run` - Paginate a report over work items and write a table
//! - `reports` - List built-in reports
//! - `show` - Print a report definition
//! - `validate` - Validate a report definition file

mod commands;
mod runner;

pub use commands::{parse_key_val, Cli, Commands, RunArgs};
pub use runner::{RunOutcome, Runner};
