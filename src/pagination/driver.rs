//! Multi-item driver
//!
//! Runs the paginator once per work item and keeps going regardless of how
//! earlier items ended. With `concurrency > 1` independent items overlap,
//! but results still come back in input order and each item's pages stay
//! sequential.

use super::paginator::{PageFetcher, Paginator};
use super::types::{AggregateResult, PaginationConfig};
use crate::error::{Error, Result};
use futures::stream::{self, StreamExt};
use std::fmt::Display;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Runs a batch of work items through one paginator
#[derive(Debug, Clone)]
pub struct BatchDriver {
    paginator: Paginator,
    concurrency: usize,
}

impl BatchDriver {
    /// Create a driver; fails fast on invalid configuration
    pub fn new(config: PaginationConfig, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::invalid_value(
                "concurrency",
                "must be a positive integer",
            ));
        }
        Ok(Self {
            paginator: Paginator::new(config)?,
            concurrency,
        })
    }

    /// Driver that processes items one at a time
    pub fn sequential(config: PaginationConfig) -> Result<Self> {
        Self::new(config, 1)
    }

    /// Get the underlying paginator
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Maximum number of items in flight
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Paginate every item, collecting one result per item in input order
    pub async fn run_all<W, F>(&self, fetcher: &F, items: Vec<W>) -> BatchReport<W>
    where
        W: Display + Send + Sync,
        F: PageFetcher<W> + ?Sized,
    {
        let start = Instant::now();
        let total = items.len();

        let results: Vec<AggregateResult<W>> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| async move {
                info!("Processing {item} ({}/{total})", index + 1);
                let result = self.paginator.run(fetcher, item).await;
                match &result.error {
                    Some(e) => error!(
                        "Cannot process {}: {e} ({} records kept)",
                        result.work_item,
                        result.len()
                    ),
                    None => info!(
                        "Finished {}: {} records in {} pages",
                        result.work_item,
                        result.len(),
                        result.pages_fetched()
                    ),
                }
                result
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        BatchReport {
            results,
            duration: start.elapsed(),
        }
    }
}

/// Results of a batch, keyed by work item
#[derive(Debug)]
pub struct BatchReport<W> {
    /// One result per work item, in input order
    pub results: Vec<AggregateResult<W>>,
    /// Wall-clock time for the batch
    pub duration: Duration,
}

impl<W> BatchReport<W> {
    /// Look up the result for a work item
    pub fn get(&self, item: &W) -> Option<&AggregateResult<W>>
    where
        W: PartialEq,
    {
        self.results.iter().find(|r| &r.work_item == item)
    }

    /// Iterate over results
    pub fn iter(&self) -> impl Iterator<Item = &AggregateResult<W>> {
        self.results.iter()
    }

    /// Results that ended on an error
    pub fn failed(&self) -> impl Iterator<Item = &AggregateResult<W>> {
        self.results.iter().filter(|r| r.is_error())
    }

    /// Summary counters
    pub fn stats(&self) -> BatchStats {
        let mut stats = BatchStats::default();
        for result in &self.results {
            stats.items += 1;
            if result.is_ok() {
                stats.succeeded += 1;
            } else {
                stats.failed += 1;
            }
            stats.records += result.len();
            stats.pages += result.pages_fetched();
        }
        stats.duration_ms = self.duration.as_millis() as u64;
        stats
    }
}

impl<W> IntoIterator for BatchReport<W> {
    type Item = AggregateResult<W>;
    type IntoIter = std::vec::IntoIter<AggregateResult<W>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Statistics from a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Work items processed
    pub items: usize,
    /// Items that finished with status ok
    pub succeeded: usize,
    /// Items that finished with status error
    pub failed: usize,
    /// Total records collected, including partial results
    pub records: usize,
    /// Total pages fetched
    pub pages: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
