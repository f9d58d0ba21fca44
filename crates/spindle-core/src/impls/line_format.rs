//! LineFormat - 1 行 1 指令のテキスト形式パーサ
//!
//! マークアップ解析の代わりに使う。認識する指令:
//! - `category <url>`
//! - `item <url>`
//! - `next`
//! - `title <text>`
//!
//! 空行と `#` で始まる行は無視する。知らない指令は ParseError。

use crate::domain::ParseError;
use crate::ports::{CategoryParser, DetailParser, DetailRecord, ListingContent, ListingParser};

/// Parser for all three crawl kinds over the line format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

enum Directive<'a> {
    Category(&'a str),
    Item(&'a str),
    Next,
    Title(&'a str),
}

fn directives(content: &str) -> Result<Vec<Directive<'_>>, ParseError> {
    let mut out = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let directive = match (word, rest) {
            ("next", "") => Directive::Next,
            ("category", url) if !url.is_empty() => Directive::Category(url),
            ("item", url) if !url.is_empty() => Directive::Item(url),
            ("title", text) if !text.is_empty() => Directive::Title(text),
            _ => {
                return Err(ParseError::Malformed(format!(
                    "line {}: unrecognized directive `{line}`",
                    n + 1
                )));
            }
        };
        out.push(directive);
    }
    Ok(out)
}

impl CategoryParser for LineFormat {
    fn parse(&self, content: &str) -> Result<Vec<String>, ParseError> {
        Ok(directives(content)?
            .into_iter()
            .filter_map(|d| match d {
                Directive::Category(url) => Some(url.to_string()),
                _ => None,
            })
            .collect())
    }
}

impl ListingParser for LineFormat {
    fn parse(&self, content: &str) -> Result<ListingContent, ParseError> {
        let mut listing = ListingContent::default();
        for d in directives(content)? {
            match d {
                Directive::Item(url) => listing.items.push(url.to_string()),
                Directive::Next => listing.has_next = true,
                _ => {}
            }
        }
        Ok(listing)
    }
}

impl DetailParser for LineFormat {
    fn parse(&self, url: &str, content: &str) -> Result<DetailRecord, ParseError> {
        directives(content)?
            .into_iter()
            .find_map(|d| match d {
                Directive::Title(text) => Some(DetailRecord {
                    url: url.to_string(),
                    title: text.to_string(),
                }),
                _ => None,
            })
            .ok_or_else(|| ParseError::Malformed(format!("no title on {url}")))
    }
}
