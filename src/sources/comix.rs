use crate::error::{ParserError, Result};
use crate::http_client::{decode_json, HttpRequest};
use crate::locator;
use crate::models::{
    dedup_ordered, generate_uid, Chapter, FilterCapabilities, ListFilter, Manga, Page, RawChapter, SortOrder, Tag,
};
use crate::normalize::{
    authors_from, content_rating, cover_url, fancy_score, opt_f64, opt_str, parse_state,
    rating_from_score, resolve_identifier, tags_from,
};
use crate::pages::{build_pages, resolve_image_urls};
use crate::pagination::{PageInfo, PageResult};
use crate::parser::{SiteAdapter, SiteConfig};
use serde_json::Value;

pub const SOURCE_NAME: &str = "COMIX";
pub const DEFAULT_DOMAIN: &str = "comix.to";
const API_BASE: &str = "api/v2";
const PAGE_SIZE: u32 = 28;
const CHAPTER_PAGE_SIZE: u32 = 100;

/// Adult genres hidden from unfiltered listings
const NSFW_GENRE_IDS: &[&str] = &["87264", "87265", "87266", "87267", "87268"];

const TAGS: &[(&str, &str)] = &[
    ("6", "Action"), ("87264", "Adult"), ("7", "Adventure"), ("8", "Boys Love"),
    ("9", "Comedy"), ("10", "Crime"), ("11", "Drama"), ("87265", "Ecchi"),
    ("12", "Fantasy"), ("13", "Girls Love"), ("87266", "Hentai"), ("14", "Historical"),
    ("15", "Horror"), ("16", "Isekai"), ("17", "Magical Girls"), ("87267", "Mature"),
    ("18", "Mecha"), ("19", "Medical"), ("20", "Mystery"), ("21", "Philosophical"),
    ("22", "Psychological"), ("23", "Romance"), ("24", "Sci-Fi"), ("25", "Slice of Life"),
    ("87268", "Smut"), ("26", "Sports"), ("27", "Superhero"), ("28", "Thriller"),
    ("29", "Tragedy"), ("30", "Wuxia"), ("31", "Aliens"), ("32", "Animals"),
    ("33", "Cooking"), ("34", "Crossdressing"), ("35", "Delinquents"), ("36", "Demons"),
    ("37", "Genderswap"), ("38", "Ghosts"), ("39", "Gyaru"), ("40", "Harem"),
    ("41", "Incest"), ("42", "Loli"), ("43", "Mafia"), ("44", "Magic"),
    ("45", "Martial Arts"), ("46", "Military"), ("47", "Monster Girls"), ("48", "Monsters"),
    ("49", "Music"), ("50", "Ninja"), ("51", "Office Workers"), ("52", "Police"),
    ("53", "Post-Apocalyptic"), ("54", "Reincarnation"), ("55", "Reverse Harem"), ("56", "Samurai"),
    ("57", "School Life"), ("58", "Shota"), ("59", "Supernatural"), ("60", "Survival"),
    ("61", "Time Travel"), ("62", "Traditional Games"), ("63", "Vampires"), ("64", "Video Games"),
    ("65", "Villainess"), ("66", "Virtual Reality"), ("67", "Zombies"),
];

/// JSON/REST content API adapter
pub struct Comix {
    site: SiteConfig,
}

impl Comix {
    pub fn new() -> Self {
        Self::with_domain(DEFAULT_DOMAIN)
    }

    pub fn with_domain(domain: &str) -> Self {
        Self {
            site: SiteConfig {
                name: SOURCE_NAME.to_string(),
                domain: domain.to_string(),
                page_size: PAGE_SIZE,
                first_page: 1,
                locale: "en".to_string(),
            },
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.site.base_url(), API_BASE, path)
    }

    fn sort_param(order: SortOrder) -> (&'static str, &'static str) {
        match order {
            SortOrder::Relevance => ("relevance", "desc"),
            SortOrder::Updated => ("chapter_updated_at", "desc"),
            SortOrder::Popularity => ("views_30d", "desc"),
            SortOrder::Newest => ("created_at", "desc"),
            SortOrder::Alphabetical => ("title", "asc"),
        }
    }

    fn result_of(json: &Value) -> Option<&Value> {
        json.get("result").filter(|r| r.is_object())
    }

    fn pagination_of(result: &Value) -> Option<PageInfo> {
        let p = result.get("pagination")?;
        Some(PageInfo {
            current_page: u32::try_from(p.get("current_page")?.as_u64()?).ok()?,
            last_page: u32::try_from(p.get("last_page")?.as_u64()?).ok()?,
        })
    }

    /// Listing record to a catalog entry
    fn parse_manga(&self, json: &Value) -> Manga {
        let hash = resolve_identifier(opt_str(json, "hash_id"));
        let url = locator::entry_locator(&hash, opt_str(json, "slug"));
        Manga {
            id: generate_uid(SOURCE_NAME, &hash),
            public_url: self.site.absolute_url(&url),
            url,
            title: opt_str(json, "title").unwrap_or("Unknown").to_string(),
            alt_titles: Vec::new(),
            description: opt_str(json, "synopsis").map(str::to_string),
            cover_url: cover_url(json.get("poster")),
            state: parse_state(opt_str(json, "status").unwrap_or_default()),
            rating: rating_from_score(opt_f64(json, "rated_avg")),
            content_rating: content_rating(
                json.get("is_nsfw").and_then(Value::as_bool).unwrap_or(false),
            ),
            tags: Vec::new(),
            authors: Vec::new(),
            source: SOURCE_NAME.to_string(),
            chapters: None,
        }
    }

    fn parse_raw_chapter(hash: &str, item: &Value) -> Option<RawChapter> {
        let chapter_id = match item.get("chapter_id")? {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => return None,
        };
        let number = opt_f64(item, "number")? as f32;
        Some(RawChapter {
            url: locator::chapter_locator(hash, &chapter_id, number),
            chapter_id,
            number,
            name: opt_str(item, "name").map(str::to_string),
            // seconds upstream; out-of-range values count as unknown
            created_at: item
                .get("created_at")
                .and_then(Value::as_i64)
                .and_then(|secs| secs.checked_mul(1000))
                .unwrap_or(0),
            volume: item.get("volume").and_then(Value::as_i64).unwrap_or(0) as i32,
            scanlator: item
                .get("scanlation_group")
                .and_then(|g| opt_str(g, "name"))
                .map(str::to_string),
        })
    }
}

impl Default for Comix {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for Comix {
    fn config(&self) -> &SiteConfig {
        &self.site
    }

    fn sort_orders(&self) -> Vec<SortOrder> {
        vec![
            SortOrder::Relevance,
            SortOrder::Updated,
            SortOrder::Popularity,
            SortOrder::Newest,
            SortOrder::Alphabetical,
        ]
    }

    fn filter_capabilities(&self) -> FilterCapabilities {
        FilterCapabilities {
            search: true,
            search_with_filters: true,
            multiple_tags: true,
            tags_exclusion: true,
        }
    }

    fn available_tags(&self) -> Vec<Tag> {
        TAGS.iter()
            .map(|(key, title)| Tag::new(*key, *title, SOURCE_NAME))
            .collect()
    }

    fn list_request(&self, page: u32, order: SortOrder, filter: &ListFilter) -> Result<HttpRequest> {
        let mut request = HttpRequest::get(self.api_url("manga"));
        if let Some(query) = filter.query() {
            request = request.query("keyword", query);
        }
        let (field, dir) = Self::sort_param(order);
        request = request.query(format!("order[{}]", field), dir);

        let included = dedup_ordered(filter.tags.iter().map(|t| t.key.as_str()));
        for key in &included {
            request = request.query("genres[]", *key);
        }
        for key in dedup_ordered(filter.tags_exclude.iter().map(|t| t.key.as_str())) {
            if included.contains(&key) {
                log::warn!("{}: tag {} both included and excluded, keeping inclusion", SOURCE_NAME, key);
                continue;
            }
            request = request.query("genres[]", format!("-{}", key));
        }
        if !filter.has_tags() {
            for id in NSFW_GENRE_IDS {
                request = request.query("genres[]", format!("-{}", id));
            }
        }

        Ok(request
            .query("limit", self.site.page_size.to_string())
            .query("page", page.to_string()))
    }

    fn parse_list(&self, body: &str) -> Result<PageResult<Manga>> {
        let json = decode_json(body)?;
        let Some(result) = Self::result_of(&json) else {
            return Ok(PageResult::new(Vec::new(), None));
        };
        let items = result
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|it| it.is_object())
                    .map(|it| self.parse_manga(it))
                    .collect()
            })
            .unwrap_or_default();
        Ok(PageResult::new(items, Self::pagination_of(result)))
    }

    fn details_request(&self, manga: &Manga) -> Result<HttpRequest> {
        let hash = locator::entry_id(&manga.url)?;
        let mut request = HttpRequest::get(self.api_url(&format!("manga/{}", hash)));
        for include in ["author", "artist", "genre", "theme", "demographic"] {
            request = request.query("includes[]", include);
        }
        Ok(request)
    }

    fn parse_details(&self, _manga: &Manga, body: &str) -> Result<Option<Manga>> {
        let json = decode_json(body)?;
        let Some(result) = Self::result_of(&json) else {
            return Ok(None);
        };
        let mut manga = self.parse_manga(result);

        manga.authors = authors_from(result, &["author", "artist"]);
        manga.tags = tags_from(result, &["genre", "theme", "demographic"], SOURCE_NAME);
        manga.alt_titles = result
            .get("alt_titles")
            .and_then(Value::as_array)
            .map(|titles| {
                titles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut description = String::new();
        let score = fancy_score(opt_f64(result, "rated_avg").unwrap_or(0.0));
        if !score.is_empty() {
            description.push_str(&score);
            description.push_str("\n\n");
        }
        description.push_str(opt_str(result, "synopsis").unwrap_or_default());
        if !manga.alt_titles.is_empty() {
            description.push_str("\n\nAlternative Names:\n");
            description.push_str(&manga.alt_titles.join("\n"));
        }
        manga.description = Some(description);

        Ok(Some(manga))
    }

    fn chapters_request(&self, manga: &Manga, page: u32) -> Result<HttpRequest> {
        let hash = locator::entry_id(&manga.url)?;
        Ok(HttpRequest::get(self.api_url(&format!("manga/{}/chapters", hash)))
            .query("order[number]", "desc")
            .query("limit", CHAPTER_PAGE_SIZE.to_string())
            .query("page", page.to_string()))
    }

    fn parse_chapters(&self, manga: &Manga, body: &str) -> Result<PageResult<RawChapter>> {
        let hash = locator::entry_id(&manga.url)?;
        let json = decode_json(body)?;
        let result = Self::result_of(&json)
            .ok_or_else(|| ParserError::parse("Chapter list without result", &manga.url))?;
        let items = result
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ParserError::parse("Chapter list without items", &manga.url))?;
        let chapters = items
            .iter()
            .filter_map(|item| Self::parse_raw_chapter(hash, item))
            .collect();
        Ok(PageResult::new(chapters, Self::pagination_of(result)))
    }

    fn pages_request(&self, chapter: &Chapter) -> Result<HttpRequest> {
        let chapter_id = locator::chapter_id(&chapter.url)?;
        Ok(HttpRequest::get(self.api_url(&format!("chapters/{}", chapter_id))))
    }

    fn parse_pages(&self, chapter: &Chapter, body: &str) -> Result<Vec<Page>> {
        let chapter_id = locator::chapter_id(&chapter.url)?;
        let urls = resolve_image_urls(body, &chapter.url)?;
        Ok(build_pages(SOURCE_NAME, chapter_id, urls))
    }
}
