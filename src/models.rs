use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MangaState {
    Ongoing,
    Finished,
    Paused,
    Abandoned,
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentRating {
    Safe,
    Adult,
}

/// Normalized rating in [0, 1], or an explicit unknown marker
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum Rating {
    Unknown,
    Known(f32),
}

impl Rating {
    pub fn is_known(&self) -> bool {
        matches!(self, Rating::Known(_))
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            Rating::Known(v) => Some(*v),
            Rating::Unknown => None,
        }
    }
}

/// Tag keys are only unique within their source
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub title: String,
    pub source: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            source: source.into(),
        }
    }
}

/// One browsable title in the aggregated catalog
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Manga {
    pub id: i64,
    /// Source-relative locator, e.g. `/title/{hash}-{slug}`
    pub url: String,
    pub public_url: String,
    pub title: String,
    pub alt_titles: Vec<String>,
    pub description: Option<String>,
    pub cover_url: String,
    pub state: MangaState,
    pub rating: Rating,
    pub content_rating: ContentRating,
    pub tags: Vec<Tag>,
    pub authors: Vec<String>,
    pub source: String,
    /// `None` until details were fetched
    pub chapters: Option<Vec<Chapter>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub title: String,
    pub number: f32,
    pub volume: i32,
    pub url: String,
    /// Epoch millis, 0 when unknown
    pub upload_date: i64,
    pub scanlator: Option<String>,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page {
    pub id: i64,
    pub url: String,
    pub preview: Option<String>,
    pub source: String,
}

/// Chapter record as reported by a source, before reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct RawChapter {
    pub chapter_id: String,
    pub number: f32,
    pub name: Option<String>,
    /// Epoch millis
    pub created_at: i64,
    pub volume: i32,
    pub scanlator: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Relevance,
    Updated,
    Popularity,
    Newest,
    Alphabetical,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListFilter {
    pub query: Option<String>,
    pub tags: Vec<Tag>,
    pub tags_exclude: Vec<Tag>,
}

impl ListFilter {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Query text when it is not blank
    pub fn query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty() || !self.tags_exclude.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterCapabilities {
    pub search: bool,
    pub search_with_filters: bool,
    pub multiple_tags: bool,
    pub tags_exclusion: bool,
}

/// Keep the first occurrence of every value, preserving order
pub fn dedup_ordered<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Stable 64-bit id derived from a source name and a source-local key
pub fn generate_uid(source: &str, key: &str) -> i64 {
    let mut h: i64 = 1125899906842597;
    for c in source.chars().chain(key.chars()) {
        h = h.wrapping_mul(31).wrapping_add(c as i64);
    }
    h
}
