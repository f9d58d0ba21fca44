//! Per-kind steps plugged into the shared [`Scraper`](super::Scraper) template.

use std::sync::Arc;

use super::tasks::{DetailPage, Discovery, ListingPage};
use super::template::{Derived, ScrapeStep};
use crate::domain::{ParseError, TaskError};
use crate::ports::{CategoryParser, DetailParser, ListingParser};
use crate::typed::PayloadCodec;

/// Discovery: root page → one ListingPage (page 1) per category.
pub struct DiscoveryStep {
    parser: Arc<dyn CategoryParser>,
}

impl DiscoveryStep {
    pub fn new(parser: Arc<dyn CategoryParser>) -> Self {
        Self { parser }
    }
}

impl ScrapeStep for DiscoveryStep {
    type Task = Discovery;

    fn locator(&self, task: &Discovery) -> String {
        task.root.clone()
    }

    fn derive(&self, _task: &Discovery, _locator: &str, content: &str) -> Result<Derived, TaskError> {
        let categories = self.parser.parse(content)?;
        tracing::info!(count = categories.len(), "discovered categories");

        let children = categories
            .into_iter()
            .map(|category| PayloadCodec::encode(&ListingPage::first(category)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Derived {
            children,
            record: None,
        })
    }
}

/// ListingPage: one DetailPage per item, plus the next page when there is one.
pub struct ListingStep {
    parser: Arc<dyn ListingParser>,
}

impl ListingStep {
    pub fn new(parser: Arc<dyn ListingParser>) -> Self {
        Self { parser }
    }
}

impl ScrapeStep for ListingStep {
    type Task = ListingPage;

    fn locator(&self, task: &ListingPage) -> String {
        task.locator()
    }

    fn derive(&self, task: &ListingPage, _locator: &str, content: &str) -> Result<Derived, TaskError> {
        let listing = self.parser.parse(content)?;
        tracing::info!(
            category = %task.category,
            page = task.page,
            items = listing.items.len(),
            has_next = listing.has_next,
            "parsed listing page"
        );

        let mut children = listing
            .items
            .into_iter()
            .map(|url| PayloadCodec::encode(&DetailPage::new(url)))
            .collect::<Result<Vec<_>, _>>()?;
        if listing.has_next {
            let next = task.next().ok_or_else(|| {
                ParseError::Malformed(format!("page offset overflow after page {}", task.page))
            })?;
            children.push(PayloadCodec::encode(&next)?);
        }
        Ok(Derived {
            children,
            record: None,
        })
    }
}

/// DetailPage: extracts a record, never produces tasks.
pub struct DetailStep {
    parser: Arc<dyn DetailParser>,
}

impl DetailStep {
    pub fn new(parser: Arc<dyn DetailParser>) -> Self {
        Self { parser }
    }
}

impl ScrapeStep for DetailStep {
    type Task = DetailPage;

    fn locator(&self, task: &DetailPage) -> String {
        task.url.clone()
    }

    fn derive(&self, _task: &DetailPage, locator: &str, content: &str) -> Result<Derived, TaskError> {
        let record = self.parser.parse(locator, content)?;
        Ok(Derived {
            children: Vec::new(),
            record: Some(record),
        })
    }
}
