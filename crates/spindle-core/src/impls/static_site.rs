//! StaticSite - ネットワークなしで動く Fetcher
//!
//! locator → 本文 の対応表。CLI のデモとテストで使う。

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::FetchError;
use crate::ports::Fetcher;

/// Fetcher serving pages from a fixed map.
///
/// Locators can be made to fail a number of times before they succeed, to
/// simulate an unreliable upstream.
#[derive(Default)]
pub struct StaticSite {
    pages: HashMap<String, String>,
    failures: Mutex<HashMap<String, u32>>,
    hits: Mutex<HashMap<String, u32>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, locator: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(locator.into(), body.into());
        self
    }

    /// Make the next `times` fetches of `locator` fail.
    pub fn failing(self, locator: impl Into<String>, times: u32) -> Self {
        self.lock_failures().insert(locator.into(), times);
        self
    }

    /// Load a `{ "<locator>": "<body>", ... }` JSON document.
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let pages: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self {
            pages,
            ..Self::default()
        })
    }

    /// How many times `locator` was requested, failures included.
    pub fn hits(&self, locator: &str) -> u32 {
        self.lock_hits().get(locator).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<String, u32>> {
        // a poisoned counter map is still usable
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_hits(&self) -> std::sync::MutexGuard<'_, HashMap<String, u32>> {
        self.hits.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Fetcher for StaticSite {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        *self.lock_hits().entry(locator.to_string()).or_insert(0) += 1;

        if let Some(left) = self.lock_failures().get_mut(locator)
            && *left > 0
        {
            *left -= 1;
            return Err(FetchError::Unavailable {
                locator: locator.to_string(),
                reason: "simulated outage".to_string(),
            });
        }

        self.pages
            .get(locator)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(locator.to_string()))
    }
}
