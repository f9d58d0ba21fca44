//! The three crawl task kinds and their payloads.

use serde::{Deserialize, Serialize};

use crate::typed::Task;

/// Entry point of a crawl: the page that lists every category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub root: String,
}

impl Discovery {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl Task for Discovery {
    const KIND: &'static str = "crawl.discovery.v1";
}

/// One page of a category listing.
///
/// `page` is the continuation state: a listing that reports more pages
/// enqueues its successor with `page + 1` and the same category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage {
    pub category: String,
    pub page: u32,
}

impl ListingPage {
    /// First page of `category`.
    pub fn first(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            page: 1,
        }
    }

    /// The following page, or `None` when the offset cannot advance.
    pub fn next(&self) -> Option<Self> {
        Some(Self {
            category: self.category.clone(),
            page: self.page.checked_add(1)?,
        })
    }

    /// Category address with the page offset appended as a query parameter.
    pub fn locator(&self) -> String {
        let sep = if self.category.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", self.category, sep, self.page)
    }
}

impl Task for ListingPage {
    const KIND: &'static str = "crawl.listing.v1";
}

/// A single item page. Terminal: produces a record, never child tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPage {
    pub url: String,
}

impl DetailPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Task for DetailPage {
    const KIND: &'static str = "crawl.detail.v1";
}

/// Every crawl kind, for `AppBuilder::expect_tasks`.
pub const KINDS: [&str; 3] = [Discovery::KIND, ListingPage::KIND, DetailPage::KIND];
