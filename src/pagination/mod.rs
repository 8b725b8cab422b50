//! Pagination module
//!
//! One generic cursor-pagination loop shared by every report.
//!
//! # Overview
//!
//! - `Paginator` walks a single work item's connection through a
//!   `PageFetcher`, forward or backward, and returns an `AggregateResult`
//!   holding every record collected plus an `ok`/`error` status.
//! - `BatchDriver` runs the paginator over many work items; one item's
//!   failure never stops the others.
//!
//! Termination: the connection reports no more pages, the page cap is
//! reached, a fetch fails, the cursor stops advancing, or the deadline
//! passes. Records from pages before a failure are always kept.

mod driver;
mod paginator;
mod types;

pub use driver::{BatchDriver, BatchReport, BatchStats};
pub use paginator::{FnFetcher, PageFetcher, Paginator};
pub use types::{
    AggregateResult, Direction, Page, PageRequest, PaginationConfig, PaginationState, RunStatus,
};
