//! # gh-harvest
//!
//! Harvests GitHub organization, repository, commit and pull-request
//! metadata through the GraphQL and REST APIs and writes it as flat tables
//! (CSV, Parquet or JSON Lines) for offline analysis.
//!
//! ## Features
//!
//! - **One pagination loop**: cursor pagination forward or backward, with a
//!   page cap, per-page timeout and run deadline
//! - **Partial failure isolation**: one work item failing never stops the
//!   rest, and records fetched before a failure are kept
//! - **Declarative reports**: YAML definitions with built-ins for common
//!   organization and repository audits
//! - **Table output**: flattened records with first-seen column order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gh_harvest::pagination::{BatchDriver, PaginationConfig};
//! use gh_harvest::github::GraphQlFetcher;
//!
//! let def = gh_harvest::reports::load_report("repo-activity")?;
//! let fetcher = GraphQlFetcher::new(client, "https://api.github.com/graphql", def.connection_query(vars)?);
//! let driver = BatchDriver::new(def.pagination_config(None, None), 1)?;
//! let report = driver.run_all(&fetcher, items).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Report (YAML)                           │
//! │  query / path    connection    item kind    pagination   prefix │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Items   │  GitHub   │  Pagination   │   HTTP    │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Orgs     │ GraphQL   │ Paginator     │ Retry     │ Flatten     │
//! │ Repos    │ REST      │ BatchDriver   │ Rate Limit│ CSV         │
//! │ Keywords │ Extract   │ Forward/Back  │ Backoff   │ Parquet     │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Token loading and request authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Generic cursor pagination and the multi-item driver
pub mod pagination;

/// GitHub GraphQL and REST page fetchers
pub mod github;

/// Work item parsing
pub mod items;

/// Report definitions
pub mod reports;

/// Template interpolation
pub mod template;

/// Flattening and table writers
pub mod output;

/// Layered run settings
pub mod settings;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use items::WorkItem;
pub use pagination::{AggregateResult, BatchDriver, PageFetcher, Paginator, RunStatus};
pub use reports::{load_report, ReportDefinition};
pub use settings::Settings;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
