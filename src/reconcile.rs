//! Collapsing translation variants into one chapter per number.

use crate::models::{generate_uid, Chapter, RawChapter};
use std::collections::HashMap;

/// Keep the most recently created record for each chapter number and return
/// the survivors in ascending number order.
///
/// Numbers are grouped by exact value. When two records share a creation
/// time, the one encountered last wins.
pub fn reconcile_chapters(source: &str, raw: Vec<RawChapter>) -> Vec<Chapter> {
    let mut latest: HashMap<u32, RawChapter> = HashMap::new();
    for record in raw {
        // 0.0 and -0.0 are the same chapter
        let key = (record.number + 0.0).to_bits();
        match latest.get(&key) {
            Some(current) if current.created_at > record.created_at => {}
            _ => {
                latest.insert(key, record);
            }
        }
    }

    let mut survivors: Vec<RawChapter> = latest.into_values().collect();
    survivors.sort_by(|a, b| a.number.total_cmp(&b.number));
    survivors
        .into_iter()
        .map(|record| to_chapter(source, record))
        .collect()
}

/// `Chapter 12: Name` or `Chapter 12` when the record has no name
pub fn chapter_title(number: f32, name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Chapter {}: {}", number, name),
        None => format!("Chapter {}", number),
    }
}

fn to_chapter(source: &str, record: RawChapter) -> Chapter {
    Chapter {
        id: generate_uid(source, &record.chapter_id),
        title: chapter_title(record.number, record.name.as_deref()),
        number: record.number,
        volume: record.volume,
        url: record.url,
        upload_date: record.created_at,
        scanlator: record.scanlator,
        source: source.to_string(),
    }
}
