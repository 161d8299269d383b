//! Positional parsing of entry and chapter locators.
//!
//! Entry locators look like `/title/{id}` or `/title/{id}-{slug}`, chapter
//! locators like `/title/{id}/{chapterId}-chapter-{number}`. Consumers rely on
//! extracting `{id}` and `{chapterId}` by position, so both layouts are fixed.

use crate::error::{ParserError, Result};

const TITLE_MARKER: &str = "/title/";

/// Extract `{id}` from an entry (or chapter) locator
pub fn entry_id(locator: &str) -> Result<&str> {
    let start = locator
        .find(TITLE_MARKER)
        .map(|i| i + TITLE_MARKER.len())
        .ok_or_else(|| ParserError::parse("Invalid manga URL", locator))?;
    let rest = &locator[start..];
    let end = rest.find(&['-', '/', '?'][..]).unwrap_or(rest.len());
    let id = &rest[..end];
    if id.is_empty() {
        return Err(ParserError::parse("Invalid manga URL", locator));
    }
    Ok(id)
}

/// Extract `{chapterId}` from a chapter locator
pub fn chapter_id(locator: &str) -> Result<&str> {
    let last = locator
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let id = last.split('-').next().unwrap_or_default();
    if id.is_empty() || !locator.contains(TITLE_MARKER) {
        return Err(ParserError::parse("Invalid chapter URL", locator));
    }
    Ok(id)
}

pub fn entry_locator(id: &str, slug: Option<&str>) -> String {
    match slug {
        Some(slug) => format!("{}{}-{}", TITLE_MARKER, id, slug),
        None => format!("{}{}", TITLE_MARKER, id),
    }
}

pub fn chapter_locator(entry_id: &str, chapter_id: &str, number: f32) -> String {
    format!(
        "{}{}/{}-chapter-{}",
        TITLE_MARKER,
        entry_id,
        chapter_id,
        number.trunc() as i64
    )
}
