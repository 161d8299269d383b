//! Helper functions shared by the framework and the site adapters
//!
//! - URL joining and locator relativization
//! - Chapter number extraction from free text
//! - Whitespace normalization for scraped text
//!
//! # Examples
//!
//! ```
//! use rust_manga_parsers::helpers::{extract_number, join_url};
//!
//! assert_eq!(extract_number("Bölüm 12.5 - Final"), Some(12.5));
//! assert_eq!(join_url("https://siyahmelek.pro", "seri/"), "https://siyahmelek.pro/seri/");
//! ```

use regex::Regex;
use std::sync::OnceLock;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("valid number regex"))
}

/// First number in a chapter label, accepting `,` as decimal separator
pub fn extract_number(s: &str) -> Option<f32> {
    number_re()
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

/// Join a base origin and a path without doubling or dropping slashes
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Strip the origin from an absolute URL on the same site
pub fn to_relative_url(url: &str) -> String {
    match url.split_once("://") {
        Some((_, rest)) => match rest.find('/') {
            Some(i) => rest[i..].to_string(),
            None => "/".to_string(),
        },
        None => url.to_string(),
    }
}

/// Collapse runs of whitespace and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
