//! Mapping of heterogeneous source fields onto the shared catalog vocabulary.
//!
//! Every function here is pure and works on loosely-typed JSON, because the
//! remote payload shape varies by field presence.

use crate::models::{dedup_ordered, ContentRating, MangaState, Rating, Tag};
use serde_json::Value;

/// Non-empty string field, `None` for missing, null or blank values
pub fn opt_str<'a>(json: &'a Value, key: &str) -> Option<&'a str> {
    json.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Numeric field that may also be encoded as a string
pub fn opt_f64(json: &Value, key: &str) -> Option<f64> {
    match json.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Cover image: medium, then large, then small, then empty
pub fn cover_url(poster: Option<&Value>) -> String {
    let Some(poster) = poster else {
        return String::new();
    };
    ["medium", "large", "small"]
        .iter()
        .find_map(|size| opt_str(poster, size))
        .unwrap_or_default()
        .to_string()
}

/// Score on a 0..=100 scale to the [0, 1] domain rating.
///
/// The score is first divided by 20 (five-star scale) and then by 5. Zero,
/// negative and missing scores are unknown, never a numeric zero.
pub fn rating_from_score(score: Option<f64>) -> Rating {
    match score {
        Some(s) if s > 0.0 && s.is_finite() => {
            let stars = s / 20.0;
            Rating::Known(((stars / 5.0) as f32).min(1.0))
        }
        _ => Rating::Unknown,
    }
}

/// Score already on a five-star scale (0..=5)
pub fn rating_from_stars(stars: Option<f64>) -> Rating {
    rating_from_score(stars.map(|s| s * 20.0))
}

pub fn parse_state(status: &str) -> MangaState {
    match status.trim().to_lowercase().as_str() {
        "finished" => MangaState::Finished,
        "releasing" => MangaState::Ongoing,
        "on_hiatus" => MangaState::Paused,
        "discontinued" => MangaState::Abandoned,
        _ => MangaState::Unknown,
    }
}

/// Prefer the source hash; synthesize a fresh id per call otherwise.
///
/// Synthetic ids are random, so re-fetching an item without a hash yields a
/// different entry. They carry no `-` so positional locator parsing still works.
pub fn resolve_identifier(hash: Option<&str>) -> String {
    match hash.map(str::trim).filter(|h| !h.is_empty()) {
        Some(h) => h.to_string(),
        None => uuid::Uuid::new_v4().simple().to_string(),
    }
}

pub fn content_rating(is_nsfw: bool) -> ContentRating {
    if is_nsfw {
        ContentRating::Adult
    } else {
        ContentRating::Safe
    }
}

/// Titles of objects in the given array fields, deduplicated in order
pub fn authors_from(json: &Value, fields: &[&str]) -> Vec<String> {
    dedup_ordered(
        fields
            .iter()
            .filter_map(|field| json.get(*field).and_then(Value::as_array))
            .flatten()
            .filter_map(|person| opt_str(person, "title"))
            .map(str::to_string),
    )
}

/// Tags keyed by `term_id`; entries without an id or title are skipped
pub fn tags_from(json: &Value, fields: &[&str], source: &str) -> Vec<Tag> {
    dedup_ordered(
        fields
            .iter()
            .filter_map(|field| json.get(*field).and_then(Value::as_array))
            .flatten()
            .filter_map(|term| {
                let title = opt_str(term, "title")?;
                let id = term.get("term_id").and_then(Value::as_i64).filter(|id| *id != 0)?;
                Some(Tag::new(id.to_string(), title, source))
            }),
    )
}

/// Star line such as `★★★★☆ 8.2/10` for a 0..=100 score, empty when unknown
pub fn fancy_score(score: f64) -> String {
    if !(score > 0.0) {
        return String::new();
    }
    let score = score.min(100.0);
    let filled = (score / 20.0).round() as usize;
    format!(
        "{}{} {:.1}/10",
        "★".repeat(filled),
        "☆".repeat(5 - filled),
        score / 10.0
    )
}
