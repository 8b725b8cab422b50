//! Pagination types
//!
//! Page requests and responses exchanged with a fetcher, the per-run
//! configuration, and the aggregate result handed back to callers.

use crate::error::{Error, Result};
use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Direction
// ============================================================================

/// Which way a cursor walks through a connection
///
/// Forward follows `endCursor`/`hasNextPage` (oldest first for most
/// connections), backward follows `startCursor`/`hasPreviousPage` and is used
/// to sample the most recent entries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

// ============================================================================
// Page Request / Page
// ============================================================================

/// Parameters for a single page fetch
///
/// Built fresh for every call and never shared between work items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Cursor returned by the previous page (none for the first page)
    pub cursor: Option<String>,
    /// Upper bound on records per page
    pub page_size: u32,
    /// Cursor direction
    pub direction: Direction,
    /// 1-based index of the page being requested
    pub page_number: usize,
}

impl PageRequest {
    /// Request for the first page
    pub fn first(page_size: u32, direction: Direction) -> Self {
        Self {
            cursor: None,
            page_size,
            direction,
            page_number: 1,
        }
    }

    /// Check if this is the first page of a run
    pub fn is_first(&self) -> bool {
        self.cursor.is_none()
    }
}

/// A successfully decoded page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in response order
    pub records: Vec<Record>,
    /// Whether the connection has more pages in the requested direction
    pub has_more: bool,
    /// Cursor for the next request, only meaningful when `has_more`
    pub next_cursor: Option<String>,
}

impl Page {
    /// Final page with no continuation
    pub fn last(records: Vec<Record>) -> Self {
        Self {
            records,
            has_more: false,
            next_cursor: None,
        }
    }

    /// Page followed by more pages at `cursor`
    pub fn with_next(records: Vec<Record>, cursor: impl Into<String>) -> Self {
        Self {
            records,
            has_more: true,
            next_cursor: Some(cursor.into()),
        }
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page carried no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for one pagination run
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Records requested per page
    pub page_size: u32,
    /// Stop after this many pages (sampling), None = until exhausted
    pub max_pages: Option<usize>,
    /// Cursor direction
    pub direction: Direction,
    /// Bound on a single fetch
    pub page_timeout: Option<Duration>,
    /// Absolute point after which no new page is requested
    pub deadline: Option<Instant>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: None,
            direction: Direction::Forward,
            page_timeout: None,
            deadline: None,
        }
    }
}

impl PaginationConfig {
    /// Create a config with the given page size
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    /// Cap the number of pages fetched
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the cursor direction
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Bound each page fetch
    #[must_use]
    pub fn with_page_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.page_timeout = timeout;
        self
    }

    /// Set an absolute deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set a deadline relative to now
    #[must_use]
    pub fn with_time_budget(self, budget: Option<Duration>) -> Self {
        let deadline = budget.map(|b| Instant::now() + b);
        self.with_deadline(deadline)
    }

    /// Reject parameters that indicate a caller bug
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be a positive integer"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::invalid_value(
                "max_pages",
                "must be a positive integer when set",
            ));
        }
        if self.page_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_value("page_timeout", "must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Pagination State
// ============================================================================

/// Tracks cursor progress during one run
///
/// Page and record counts live on the `AggregateResult` being built.
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Cursor for the next request
    pub cursor: Option<String>,
    seen: HashSet<String>,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a cursor was already used in this run
    pub fn has_seen(&self, cursor: &str) -> bool {
        self.seen.contains(cursor)
    }

    /// Move to the next cursor
    ///
    /// Returns false when the cursor does not advance: it equals the cursor
    /// just used or any cursor used earlier in the run.
    pub fn advance(&mut self, next: String) -> bool {
        if self.has_seen(&next) {
            return false;
        }
        self.seen.insert(next.clone());
        self.cursor = Some(next);
        true
    }

    /// Build the request for the page after `pages_fetched` pages
    pub fn request(&self, config: &PaginationConfig, pages_fetched: usize) -> PageRequest {
        PageRequest {
            cursor: self.cursor.clone(),
            page_size: config.page_size,
            direction: config.direction,
            page_number: pages_fetched + 1,
        }
    }
}

// ============================================================================
// Aggregate Result
// ============================================================================

/// Terminal status of one work item's run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Exhausted or stopped at the page cap
    Ok,
    /// Ended by a failure; records before it are kept
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ok => f.write_str("ok"),
            RunStatus::Error => f.write_str("error"),
        }
    }
}

/// Records collected for one work item plus how the run ended
#[derive(Debug)]
pub struct AggregateResult<W> {
    /// The work item this result belongs to
    pub work_item: W,
    /// Records in page arrival order
    pub records: Vec<Record>,
    /// Terminal status
    pub status: RunStatus,
    /// The failure that ended the run, if any
    pub error: Option<Error>,
    direction: Direction,
    page_lengths: Vec<usize>,
}

impl<W> AggregateResult<W> {
    /// Start an empty, successful result
    pub fn new(work_item: W, direction: Direction) -> Self {
        Self {
            work_item,
            records: Vec::new(),
            status: RunStatus::Ok,
            error: None,
            direction,
            page_lengths: Vec::new(),
        }
    }

    /// Append one page of records
    pub fn push_page(&mut self, records: Vec<Record>) {
        self.page_lengths.push(records.len());
        self.records.extend(records);
    }

    /// Mark the run as failed, keeping everything collected so far
    pub fn fail(&mut self, error: Error) {
        self.status = RunStatus::Error;
        self.error = Some(error);
    }

    /// Check if the run finished normally
    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }

    /// Check if the run ended on an error
    pub fn is_error(&self) -> bool {
        self.status == RunStatus::Error
    }

    /// Number of records collected
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pages successfully fetched
    pub fn pages_fetched(&self) -> usize {
        self.page_lengths.len()
    }

    /// Direction the run walked in
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Record counts per page, in arrival order
    pub fn page_lengths(&self) -> &[usize] {
        &self.page_lengths
    }

    /// Error message for reporting
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Records in chronological order
    ///
    /// Backward runs receive the newest page first; pages are reversed while
    /// each page keeps its own (already chronological) order.
    pub fn into_chronological(self) -> Vec<Record> {
        match self.direction {
            Direction::Forward => self.records,
            Direction::Backward => {
                let mut pages = Vec::with_capacity(self.page_lengths.len());
                let mut records = self.records.into_iter();
                for len in &self.page_lengths {
                    pages.push(records.by_ref().take(*len).collect::<Vec<_>>());
                }
                pages.into_iter().rev().flatten().collect()
            }
        }
    }

    /// Borrowing variant of [`AggregateResult::into_chronological`]
    pub fn chronological(&self) -> Vec<&Record> {
        match self.direction {
            Direction::Forward => self.records.iter().collect(),
            Direction::Backward => {
                let mut pages = Vec::with_capacity(self.page_lengths.len());
                let mut start = 0;
                for len in &self.page_lengths {
                    let end = (start + len).min(self.records.len());
                    pages.push(&self.records[start..end]);
                    start = end;
                }
                pages.into_iter().rev().flatten().collect()
            }
        }
    }
}
