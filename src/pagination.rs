//! Exhaustive pagination over paged upstream collections.
//!
//! [`PageFetcher`] walks a paged resource from page 1 until every item the
//! server reported has been fetched. The upstream total is re-read on every
//! page and is not trusted to stay stable, so the walk also ends on an empty
//! or short page.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::client::ClientError;

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Page request parameters. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub page_size: usize,
    pub page_number: usize,
}

/// One page of items plus the total item count reported upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: usize) -> Self {
        Self { items, total_count }
    }
}

/// Drains a paged resource into a single ordered `Vec`.
#[derive(Debug, Clone, Copy)]
pub struct PageFetcher {
    page_size: usize,
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageFetcher {
    /// Create a fetcher requesting `page_size` items per page.
    ///
    /// A page size of zero is raised to one.
    pub fn new(page_size: usize) -> Self {
        if page_size == 0 {
            tracing::warn!("Page size of 0 requested. Using 1.");
        }
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch every item of the resource, in upstream page order.
    ///
    /// The walk stops when the fetched count reaches the last reported total,
    /// or when a page comes back empty or shorter than requested. Any page
    /// error aborts the walk and the items gathered so far are dropped.
    ///
    /// # Errors
    /// Returns the first page error, or [`ClientError::Cancelled`] as soon as
    /// `cancel` fires.
    pub async fn fetch_all<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut fetch_page: F,
    ) -> Result<Vec<T>, ClientError>
    where
        F: FnMut(PageOptions) -> Fut,
        Fut: Future<Output = Result<Page<T>, ClientError>>,
    {
        let mut items = Vec::new();
        let mut page_number = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let options = PageOptions {
                page_size: self.page_size,
                page_number,
            };
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                page = fetch_page(options) => page?,
            };

            let received = page.items.len();
            items.extend(page.items);
            tracing::trace!(
                page_number,
                received,
                fetched = items.len(),
                total = page.total_count,
                "Fetched page"
            );

            if received == 0 || received < self.page_size || items.len() >= page.total_count {
                break;
            }
            page_number += 1;
        }

        Ok(items)
    }
}
