//! Offset pagination shared by repositories and services.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a page request is out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// Pages are 1-based.
    #[error("Page must be greater than 0")]
    InvalidPage,

    /// Limit outside the accepted window.
    #[error("Limit must be between 1 and {max}")]
    InvalidLimit { max: u32 },
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Largest page size any listing will return.
    pub const MAX_LIMIT: u32 = 100;

    /// Page size used when the caller does not ask for one.
    pub const DEFAULT_LIMIT: u32 = 20;

    /// Creates a page request, rejecting out-of-range values.
    pub fn new(page: u32, limit: u32) -> Result<Self, PageError> {
        if page < 1 {
            return Err(PageError::InvalidPage);
        }
        if limit < 1 || limit > Self::MAX_LIMIT {
            return Err(PageError::InvalidLimit {
                max: Self::MAX_LIMIT,
            });
        }
        Ok(Self { page, limit })
    }

    /// Creates a page request, forcing values into range instead of failing.
    pub fn clamped(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items to skip before this page starts.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Cuts one page out of an already filtered and ordered sequence.
    ///
    /// The total counts every item in the sequence, not only the page.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Page<T> {
        let mut total = 0;
        let mut page_items = Vec::with_capacity(self.limit as usize);
        let offset = self.offset();

        for item in items {
            if total >= offset && page_items.len() < self.limit as usize {
                page_items.push(item);
            }
            total += 1;
        }

        Page {
            items: page_items,
            total,
            page: self.page,
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Returns an empty page for the given request.
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: request.page,
            limit: request.limit,
        }
    }

    /// Number of pages needed to hold `total` items.
    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as usize)
    }

    /// Converts every item while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}
