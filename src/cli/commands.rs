//! CLI commands and argument parsing

use crate::types::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Harvest GitHub organization, repository and commit metadata into tables
#[derive(Parser, Debug)]
#[command(name = "gh-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// File holding the GitHub token (first line); overrides GITHUB_TOKEN
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    /// Directory for output tables
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Output table format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a report over a set of work items
    Run(RunArgs),

    /// List built-in reports
    Reports,

    /// Print a report definition
    Show {
        /// Built-in report name or path to a YAML file
        report: String,
    },

    /// Validate a report definition file
    Validate {
        /// Path to the YAML file
        file: PathBuf,
    },
}

/// Arguments for `run`
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Built-in report name or path to a YAML file
    pub report: String,

    /// Work item: org name, owner/repo, keyword or GitHub URL (repeatable)
    #[arg(short, long = "item")]
    pub items: Vec<String>,

    /// File with one work item per line (`#` starts a comment)
    #[arg(long)]
    pub items_file: Option<PathBuf>,

    /// GitHub URL of an org or repository (repeatable)
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// Report variable as key=value (repeatable)
    #[arg(long = "var", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,

    /// Records requested per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Stop after this many pages per item
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Work items processed at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Parse a `key=value` pair
pub fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
