//! Sequential page-by-page crawling of listing endpoints.
//!
//! A page is requested only after the previous one completed; requests to one
//! source are never issued in parallel.

use crate::error::{ParserError, Result};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Source-reported page counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub last_page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// Absent when the source does not report pagination metadata
    pub pagination: Option<PageInfo>,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, pagination: Option<PageInfo>) -> Self {
        Self { items, pagination }
    }

    /// A page that is known to be the only one
    pub fn single(items: Vec<T>) -> Self {
        Self::new(
            items,
            Some(PageInfo {
                current_page: 1,
                last_page: 1,
            }),
        )
    }

    fn is_last(&self) -> bool {
        self.items.is_empty()
            || self
                .pagination
                .map(|p| p.current_page >= p.last_page)
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Paginator {
    first_page: u32,
    max_pages: Option<u32>,
    delay: Duration,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Paginator {
    /// `first_page` follows the source's indexing convention (0 or 1)
    pub fn new(first_page: u32) -> Self {
        Self {
            first_page,
            max_pages: None,
            delay: Duration::ZERO,
        }
    }

    /// Hard cap on the number of fetches
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Pause between consecutive page requests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_first_page(mut self, first_page: u32) -> Self {
        self.first_page = first_page;
        self
    }

    /// Same policy without the page cap
    pub fn uncapped(&self) -> Self {
        self.clone().with_max_pages(None)
    }

    /// Lazily fetch pages and yield their items in page order.
    ///
    /// Stops on an empty page, when `current_page >= last_page`, when the page
    /// cap is reached, or after yielding the first error.
    pub fn stream<T, F, Fut>(&self, fetch_page: F) -> impl Stream<Item = Result<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<PageResult<T>>>,
    {
        let state = (fetch_page, Some(self.first_page), 0u32);
        let max_pages = self.max_pages;
        let delay = self.delay;

        stream::unfold(state, move |(mut fetch_page, next, fetched)| async move {
            let page = next?;
            if max_pages.is_some_and(|max| fetched >= max) {
                log::debug!("page cap of {} reached", fetched);
                return None;
            }
            if fetched > 0 && !delay.is_zero() {
                sleep(delay).await;
            }
            log::debug!("fetching page {}", page);
            match fetch_page(page).await {
                Ok(result) => {
                    let next = if result.is_last() { None } else { Some(page + 1) };
                    Some((Ok(result.items), (fetch_page, next, fetched + 1)))
                }
                Err(e) => Some((Err(e), (fetch_page, None, fetched + 1))),
            }
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, ParserError>)))
        .try_flatten()
    }

    /// Drain every page into one list; the first error aborts.
    pub async fn collect<T, F, Fut>(&self, fetch_page: F) -> Result<Vec<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<PageResult<T>>>,
    {
        self.stream(fetch_page).try_collect().await
    }
}
