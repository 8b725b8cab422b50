//! The pagination loop
//!
//! `Paginator::run` walks one work item's connection page by page through a
//! `PageFetcher`, accumulating records until the connection is exhausted,
//! the page cap is reached, or a page fails.

use super::types::{AggregateResult, Page, PageRequest, PaginationConfig, PaginationState};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Capability that fetches one page for a work item
///
/// Implementations own transport, authentication, decoding, and mapping the
/// API's response shape into a `Page`. Any failure, including a response
/// that is missing expected keys, is returned as an `Err`.
#[async_trait]
pub trait PageFetcher<W: ?Sized + Sync>: Send + Sync {
    /// Fetch the page described by `request` for `item`
    async fn fetch_page(&self, item: &W, request: &PageRequest) -> Result<Page>;
}

/// Adapter turning a closure into a `PageFetcher`
///
/// The returned future must not borrow the arguments.
pub struct FnFetcher<F>(pub F);

#[async_trait]
impl<W, F, Fut> PageFetcher<W> for FnFetcher<F>
where
    W: ?Sized + Sync,
    F: Fn(&W, &PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page>> + Send,
{
    async fn fetch_page(&self, item: &W, request: &PageRequest) -> Result<Page> {
        (self.0)(item, request).await
    }
}

/// Drives pagination for a single work item
#[derive(Debug, Clone)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    /// Create a paginator, rejecting invalid configuration up front
    pub fn new(config: PaginationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Collect every page for `work_item`
    ///
    /// Never returns an error: failures end the run with an `error` status
    /// and the records from earlier pages are kept.
    pub async fn run<W, F>(&self, fetcher: &F, work_item: W) -> AggregateResult<W>
    where
        W: Display + Send + Sync,
        F: PageFetcher<W> + ?Sized,
    {
        let mut state = PaginationState::new();
        let mut result = AggregateResult::new(work_item, self.config.direction);

        loop {
            let request = state.request(&self.config, result.pages_fetched());

            let page = match self.fetch(fetcher, &result.work_item, &request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "Pagination for {} stopped at page {}: {e}",
                        result.work_item, request.page_number
                    );
                    result.fail(e);
                    break;
                }
            };

            let Page {
                records,
                has_more,
                next_cursor,
            } = page;

            debug!(
                "{}: page {} returned {} records (has_more: {has_more})",
                result.work_item,
                request.page_number,
                records.len()
            );
            result.push_page(records);

            if !has_more {
                break;
            }

            if let Some(max) = self.config.max_pages {
                if result.pages_fetched() >= max {
                    debug!("{}: page cap of {max} reached", result.work_item);
                    break;
                }
            }

            let advanced = match next_cursor.clone() {
                Some(cursor) => state.advance(cursor),
                None => false,
            };
            if !advanced {
                let e = Error::NonAdvancingCursor {
                    page: result.pages_fetched(),
                    cursor: next_cursor,
                };
                warn!("Pagination for {} stopped: {e}", result.work_item);
                result.fail(e);
                break;
            }
        }

        result
    }

    /// Fetch one page under the configured timeout and deadline
    async fn fetch<W, F>(&self, fetcher: &F, item: &W, request: &PageRequest) -> Result<Page>
    where
        W: Send + Sync,
        F: PageFetcher<W> + ?Sized,
    {
        let remaining = match self.config.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(Error::DeadlineExceeded {
                        pages: request.page_number - 1,
                    });
                }
                Some(deadline - now)
            }
            None => None,
        };

        let bound = match (self.config.page_timeout, remaining) {
            (Some(timeout), Some(remaining)) => Some(timeout.min(remaining)),
            (timeout, remaining) => timeout.or(remaining),
        };

        let Some(bound) = bound else {
            return fetcher.fetch_page(item, request).await;
        };

        match tokio::time::timeout(bound, fetcher.fetch_page(item, request)).await {
            Ok(page) => page,
            Err(_) if remaining.is_some_and(|r| r <= bound) => Err(Error::DeadlineExceeded {
                pages: request.page_number - 1,
            }),
            Err(_) => Err(Error::PageTimeout {
                timeout_ms: duration_ms(bound),
            }),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
