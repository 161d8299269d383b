//! Manga source parsers: a small crawling framework plus per-site adapters.
//!
//! [`parser::SourceParser`] drives a [`parser::SiteAdapter`] over an
//! [`http_client::HttpGateway`], handling pagination, chapter reconciliation
//! and detail enrichment so adapters stay pure translation code.

pub mod config;
pub mod details;
pub mod error;
pub mod helpers;
pub mod http_client;
pub mod locator;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pages;
pub mod pagination;
pub mod parser;
pub mod reconcile;
pub mod sources;

pub use error::{ParserError, Result};
pub use parser::{SiteAdapter, SourceParser};
