//! Parser ports - 取得したコンテンツから構造化データを取り出す
//!
//! タスクの種類ごとに一つ。マークアップの解析方法はここでは決めない。

use serde::{Deserialize, Serialize};

use crate::domain::ParseError;

/// What a listing page contains: item locators plus whether another page follows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingContent {
    pub items: Vec<String>,
    pub has_next: bool,
}

/// The record extracted from a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub url: String,
    pub title: String,
}

/// Extracts category locators from the discovery root.
pub trait CategoryParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<Vec<String>, ParseError>;
}

/// Extracts item locators and the continuation flag from one listing page.
pub trait ListingParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<ListingContent, ParseError>;
}

/// Extracts the record from a detail page found at `url`.
pub trait DetailParser: Send + Sync {
    fn parse(&self, url: &str, content: &str) -> Result<DetailRecord, ParseError>;
}
