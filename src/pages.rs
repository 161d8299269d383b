//! Chapter image list extraction.
//!
//! Sources hand back the image list in several shapes: a bare JSON array of
//! URLs, an array of objects with a `url` field, either of those nested under
//! a result object, or an array literal embedded in a `<script>` of an HTML
//! page. All shapes go through [`resolve_image_urls`].

use crate::error::{ParserError, Result};
use crate::models::{generate_uid, Page};
use scraper::{Html, Selector};
use serde_json::Value;

/// JSON pointers tried, in order, when the payload is an object
const IMAGE_POINTERS: &[&str] = &[
    "/result/images",
    "/result/pages",
    "/images",
    "/pages",
    "/data/images",
    "/chapter/images",
];

/// Script keys that usually precede an embedded image array
const SCRIPT_KEYS: &[&str] = &["\"images\"", "\\\"images\\\"", "images:", "images =", "chapter_preloaded_images"];

/// Image URLs from a raw chapter payload, in reading order
pub fn resolve_image_urls(payload: &str, locator: &str) -> Result<Vec<String>> {
    let images = match serde_json::from_str::<Value>(payload) {
        Ok(json) => match find_image_array(&json) {
            Some(images) => images,
            None => find_in_scripts(payload)
                .ok_or_else(|| ParserError::parse("Image list not found", locator))?,
        },
        Err(_) => find_in_scripts(payload)
            .ok_or_else(|| ParserError::parse("Image list not found", locator))?,
    };
    let urls = image_urls(&images, locator)?;
    if urls.is_empty() {
        return Err(ParserError::NotFound(format!("no images for {}", locator)));
    }
    Ok(urls)
}

/// Pages with ids derived from the chapter id and image position
pub fn build_pages(source: &str, chapter_id: &str, urls: Vec<String>) -> Vec<Page> {
    urls.into_iter()
        .enumerate()
        .map(|(i, url)| Page {
            id: generate_uid(source, &format!("{}-{}", chapter_id, i)),
            url,
            preview: None,
            source: source.to_string(),
        })
        .collect()
}

fn find_image_array(json: &Value) -> Option<Vec<Value>> {
    if let Value::Array(items) = json {
        return Some(items.clone());
    }
    IMAGE_POINTERS
        .iter()
        .find_map(|ptr| json.pointer(ptr).and_then(Value::as_array).cloned())
}

/// Each item is either a URL string or an object with a non-empty `url`
fn image_urls(images: &[Value], locator: &str) -> Result<Vec<String>> {
    images
        .iter()
        .map(|item| match item {
            Value::String(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
            Value::Object(_) => item
                .get("url")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ParserError::parse("Image object without url", locator)),
            _ => Err(ParserError::parse("Unexpected image format", locator)),
        })
        .collect()
}

/// Scan `<script>` bodies for an image array literal
fn find_in_scripts(html: &str) -> Option<Vec<Value>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").ok()?;
    document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .find_map(|content| extract_array_after_keys(&content))
}

fn extract_array_after_keys(content: &str) -> Option<Vec<Value>> {
    SCRIPT_KEYS.iter().find_map(|key| {
        let mut from = 0;
        while let Some(pos) = content[from..].find(key) {
            let after = from + pos + key.len();
            if let Some(items) = bracketed_array(&content[after..]) {
                return Some(items);
            }
            from = after;
        }
        None
    })
}

/// Parse the first balanced `[...]` in `text`, unescaping `\"` if needed
fn bracketed_array(text: &str) -> Option<Vec<Value>> {
    let start = text.find('[')?;
    // only accept an array that follows the key closely
    if text[..start].trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '=').len() > 2 {
        return None;
    }
    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in text[start..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + i + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let literal = &text[start..end?];
    serde_json::from_str::<Vec<Value>>(literal)
        .or_else(|_| serde_json::from_str::<Vec<Value>>(&literal.replace("\\\"", "\"").replace("\\/", "/")))
        .ok()
}
