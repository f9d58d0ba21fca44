//! Crawl - ページネーション付きクロールを駆動するタスク群
//!
//! Discovery → ListingPage（ページごと）→ DetailPage の三段。
//! どの kind も [`Scraper`] の共通テンプレートで実行され、違いは
//! locator の作り方・抽出内容・子タスクの種類だけ。

pub mod steps;
pub mod tasks;
pub mod template;

use std::sync::Arc;

pub use self::steps::{DetailStep, DiscoveryStep, ListingStep};
pub use self::tasks::{DetailPage, Discovery, KINDS, ListingPage};
pub use self::template::{Derived, ScrapeStep, Scraper};

use crate::app::AppBuilder;
use crate::impls::{LineFormat, LogSink};
use crate::ports::{CategoryParser, DetailParser, Fetcher, ListingParser, RecordSink};
use crate::typed::RegistryError;

/// Collaborators injected into the crawl handlers.
#[derive(Clone)]
pub struct CrawlDeps {
    pub fetcher: Arc<dyn Fetcher>,
    pub categories: Arc<dyn CategoryParser>,
    pub listings: Arc<dyn ListingParser>,
    pub details: Arc<dyn DetailParser>,
    pub sink: Arc<dyn RecordSink>,
}

impl CrawlDeps {
    /// `fetcher` with [`LineFormat`] parsers and records logged via [`LogSink`].
    pub fn line_format(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            categories: Arc::new(LineFormat),
            listings: Arc::new(LineFormat),
            details: Arc::new(LineFormat),
            sink: Arc::new(LogSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }
}

/// Register the Discovery, ListingPage and DetailPage handlers.
pub fn install(builder: AppBuilder, deps: &CrawlDeps) -> Result<AppBuilder, RegistryError> {
    builder
        .register::<Discovery, _>(Scraper::new(
            DiscoveryStep::new(Arc::clone(&deps.categories)),
            Arc::clone(&deps.fetcher),
            Arc::clone(&deps.sink),
        ))?
        .register::<ListingPage, _>(Scraper::new(
            ListingStep::new(Arc::clone(&deps.listings)),
            Arc::clone(&deps.fetcher),
            Arc::clone(&deps.sink),
        ))?
        .register::<DetailPage, _>(Scraper::new(
            DetailStep::new(Arc::clone(&deps.details)),
            Arc::clone(&deps.fetcher),
            Arc::clone(&deps.sink),
        ))
}
