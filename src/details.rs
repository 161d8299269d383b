//! Concurrent metadata + chapter enrichment with per-branch failure isolation.

use crate::error::Result;
use crate::models::{Chapter, Manga};
use std::future::Future;

/// Outcome of the two enrichment branches after downgrading failures
#[derive(Debug)]
pub struct DetailParts {
    /// `None` when the metadata fetch failed or returned nothing usable
    pub metadata: Option<Manga>,
    pub chapters: Vec<Chapter>,
}

/// Run both branches concurrently and wait for both.
///
/// A failing branch is logged and replaced by its empty value; neither
/// failure aborts the other branch.
pub async fn fetch_both<M, C>(source: &str, metadata: M, chapters: C) -> DetailParts
where
    M: Future<Output = Result<Option<Manga>>>,
    C: Future<Output = Result<Vec<Chapter>>>,
{
    let (metadata, chapters) = tokio::join!(metadata, chapters);

    let metadata = metadata.unwrap_or_else(|e| {
        log::warn!("{}: metadata fetch failed, keeping listing data: {}", source, e);
        None
    });
    let chapters = chapters.unwrap_or_else(|e| {
        log::warn!("{}: chapter fetch failed, using empty list: {}", source, e);
        Vec::new()
    });

    DetailParts { metadata, chapters }
}

/// Fold enrichment results into the entry. The chapter list always replaces
/// whatever the entry carried before.
pub fn merge(entry: &Manga, parts: DetailParts) -> Manga {
    let mut merged = parts.metadata.unwrap_or_else(|| entry.clone());
    merged.chapters = Some(parts.chapters);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParserError;
    use crate::models::{ContentRating, MangaState, Rating};
    use std::time::{Duration, Instant};

    fn manga(title: &str) -> Manga {
        Manga {
            id: 1,
            url: "/title/abc".into(),
            public_url: "https://comix.to/title/abc".into(),
            title: title.into(),
            alt_titles: Vec::new(),
            description: None,
            cover_url: String::new(),
            state: MangaState::Unknown,
            rating: Rating::Unknown,
            content_rating: ContentRating::Safe,
            tags: Vec::new(),
            authors: Vec::new(),
            source: "COMIX".into(),
            chapters: None,
        }
    }

    fn chapter(n: f32) -> Chapter {
        Chapter {
            id: n as i64,
            title: format!("Chapter {}", n),
            number: n,
            volume: 0,
            url: String::new(),
            upload_date: 0,
            scanlator: None,
            source: "COMIX".into(),
        }
    }

    #[tokio::test]
    async fn test_chapter_failure_keeps_metadata() {
        let parts = fetch_both(
            "COMIX",
            async { Ok::<_, ParserError>(Some(manga("Fetched"))) },
            async { Err::<Vec<Chapter>, _>(ParserError::transport(Some(502), "bad gateway")) },
        )
        .await;
        let merged = merge(&manga("Listing"), parts);
        assert_eq!(merged.title, "Fetched");
        assert_eq!(merged.chapters, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_entry() {
        let parts = fetch_both(
            "COMIX",
            async { Err::<Option<Manga>, _>(ParserError::parse("shape", "/title/abc")) },
            async { Ok::<_, ParserError>(vec![chapter(1.0), chapter(2.0)]) },
        )
        .await;
        let merged = merge(&manga("Listing"), parts);
        assert_eq!(merged.title, "Listing");
        assert_eq!(merged.chapters.map(|c| c.len()), Some(2));
    }

    #[tokio::test]
    async fn test_both_failures_still_yield_entry() {
        let parts = fetch_both(
            "COMIX",
            async { Err::<Option<Manga>, _>(ParserError::transport(None, "down")) },
            async { Err::<Vec<Chapter>, _>(ParserError::transport(None, "down")) },
        )
        .await;
        let mut entry = manga("Listing");
        entry.chapters = Some(vec![chapter(9.0)]);
        let merged = merge(&entry, parts);
        assert_eq!(merged.title, "Listing");
        assert_eq!(merged.chapters, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_branches_run_concurrently() {
        let start = Instant::now();
        let parts = fetch_both(
            "COMIX",
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<Option<Manga>, ParserError>(None)
            },
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, ParserError>(vec![chapter(1.0)])
            },
        )
        .await;
        assert!(start.elapsed() < Duration::from_millis(390));
        assert_eq!(parts.chapters.len(), 1);
    }
}
