//! Template adapter for WordPress sites running the Madara manga theme.
//!
//! All behaviour lives here; a concrete site only supplies a [`MadaraConfig`].

use crate::error::{ParserError, Result};
use crate::helpers::{extract_number, normalize_whitespace, to_relative_url};
use crate::http_client::{HttpRequest, SessionContext};
use crate::models::{
    dedup_ordered, generate_uid, Chapter, ContentRating, FilterCapabilities, ListFilter, Manga,
    MangaState, Page, RawChapter, Rating, SortOrder, Tag,
};
use crate::normalize::rating_from_stars;
use crate::pages::{build_pages, resolve_image_urls};
use crate::pagination::PageResult;
use crate::parser::{SiteAdapter, SiteConfig};
use chrono::{Duration, NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Per-site settings for the Madara template
#[derive(Debug, Clone, PartialEq)]
pub struct MadaraConfig {
    pub name: String,
    pub domain: String,
    pub page_size: u32,
    pub locale: String,
    /// Catalog path relative to the domain, with trailing slash
    pub list_url: String,
    /// chrono format for absolute chapter dates
    pub date_format: String,
    /// Localized month names, January first, substituted before parsing
    pub month_names: Option<[&'static str; 12]>,
    /// Cookie name fragment that marks a logged-in session
    pub auth_cookie: Option<String>,
}

impl MadaraConfig {
    pub fn new(name: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_string(),
            page_size: 20,
            locale: "en".to_string(),
            list_url: "manga/".to_string(),
            date_format: "%B %d, %Y".to_string(),
            month_names: None,
            auth_cookie: None,
        }
    }
}

const ENGLISH_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

fn sel(css: &str) -> Selector {
    // selectors below are literals; a failure here is a programming error
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {}: {:?}", css, e))
}

fn text_of(el: ElementRef) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

fn first_text(scope: ElementRef, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        scope
            .select(&sel(css))
            .map(text_of)
            .find(|t| !t.is_empty())
    })
}

fn image_src(img: ElementRef) -> Option<String> {
    let v = img.value();
    ["data-src", "data-lazy-src", "src"]
        .iter()
        .filter_map(|attr| v.attr(attr))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .or_else(|| {
            v.attr("srcset")
                .and_then(|set| set.split_whitespace().next())
        })
        .map(str::to_string)
}

pub struct Madara {
    site: SiteConfig,
    config: MadaraConfig,
}

impl Madara {
    pub fn new(config: MadaraConfig) -> Self {
        let site = SiteConfig {
            name: config.name.clone(),
            domain: config.domain.clone(),
            page_size: config.page_size,
            first_page: 1,
            locale: config.locale.clone(),
        };
        Self { site, config }
    }

    pub fn madara_config(&self) -> &MadaraConfig {
        &self.config
    }

    fn order_param(order: SortOrder) -> Option<&'static str> {
        match order {
            SortOrder::Relevance => None,
            SortOrder::Updated => Some("latest"),
            SortOrder::Popularity => Some("views"),
            SortOrder::Newest => Some("new-manga"),
            SortOrder::Alphabetical => Some("alphabet"),
        }
    }

    fn require_locator<'a>(locator: &'a str, what: &str) -> Result<&'a str> {
        if locator.starts_with('/') && locator.len() > 1 {
            Ok(locator)
        } else {
            Err(ParserError::parse(format!("Invalid {} URL", what), locator))
        }
    }

    fn entry(&self, url: String, title: String) -> Manga {
        Manga {
            id: generate_uid(&self.site.name, &url),
            public_url: self.site.absolute_url(&url),
            url,
            title,
            alt_titles: Vec::new(),
            description: None,
            cover_url: String::new(),
            state: MangaState::Unknown,
            rating: Rating::Unknown,
            content_rating: ContentRating::Safe,
            tags: Vec::new(),
            authors: Vec::new(),
            source: self.site.name.clone(),
            chapters: None,
        }
    }

    fn parse_list_item(&self, item: ElementRef) -> Option<Manga> {
        let link = ["div.post-title a", "h3 a", "h4 a", "a"]
            .iter()
            .find_map(|css| item.select(&sel(css)).next())?;
        let href = link.value().attr("href")?.trim();
        let title = text_of(link);
        if href.is_empty() || title.is_empty() {
            return None;
        }
        let mut manga = self.entry(to_relative_url(href), title);
        manga.cover_url = item
            .select(&sel("img"))
            .next()
            .and_then(image_src)
            .unwrap_or_default();
        manga.rating = rating_from_stars(
            first_text(item, &["span.score"]).and_then(|s| s.replace(',', ".").parse().ok()),
        );
        if item.select(&sel("span.manga-title-badges.adult")).next().is_some() {
            manga.content_rating = ContentRating::Adult;
        }
        Some(manga)
    }

    fn parse_status(text: &str) -> MangaState {
        let t = text.to_lowercase();
        if ["ongoing", "devam ediyor", "güncel", "updating"].iter().any(|k| t.contains(k)) {
            MangaState::Ongoing
        } else if ["completed", "tamamlandı", "bitti", "finished"].iter().any(|k| t.contains(k)) {
            MangaState::Finished
        } else if ["on hold", "hiatus", "askıda", "ara verildi"].iter().any(|k| t.contains(k)) {
            MangaState::Paused
        } else if ["canceled", "cancelled", "dropped", "iptal", "bırakıldı"].iter().any(|k| t.contains(k)) {
            MangaState::Abandoned
        } else {
            MangaState::Unknown
        }
    }

    /// Chapter date to epoch millis; relative dates count back from now
    pub fn parse_date(&self, text: &str) -> Option<i64> {
        let text = normalize_whitespace(text);
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        if lower.contains("ago") || lower.contains("önce") {
            let n = extract_number(&lower)? as i64;
            let delta = if lower.contains("min") || lower.contains("dakika") {
                Duration::try_minutes(n)
            } else if lower.contains("hour") || lower.contains("saat") {
                Duration::try_hours(n)
            } else if lower.contains("day") || lower.contains("gün") {
                Duration::try_days(n)
            } else if lower.contains("week") || lower.contains("hafta") {
                Duration::try_weeks(n)
            } else {
                None
            }?;
            return Utc::now()
                .checked_sub_signed(delta)
                .map(|at| at.timestamp_millis());
        }

        let mut normalized = text.clone();
        if let Some(months) = self.config.month_names {
            for (local, english) in months.iter().zip(ENGLISH_MONTHS) {
                normalized = normalized.replace(local, english);
            }
        }
        let date = NaiveDate::parse_from_str(&normalized, &self.config.date_format).ok()?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
    }

    /// Parsed record plus whether the label carried its own number
    fn parse_chapter_item(&self, item: ElementRef) -> Option<(RawChapter, bool)> {
        let link = item.select(&sel("a")).next()?;
        let href = link.value().attr("href")?.trim();
        if href.is_empty() || href == "#" {
            return None;
        }
        let url = to_relative_url(href);
        let label = text_of(link);
        let parsed = extract_number(&label);
        let name = match parsed {
            Some(_) => label
                .split_once(" - ")
                .map(|(_, name)| name.trim().to_string())
                .filter(|n| !n.is_empty()),
            None => Some(label).filter(|l| !l.is_empty()),
        };
        let created_at = first_text(item, &["span.chapter-release-date i", "span.chapter-release-date"])
            .and_then(|d| self.parse_date(&d))
            .unwrap_or(0);
        let chapter = RawChapter {
            chapter_id: url.clone(),
            number: parsed.unwrap_or(0.0),
            name,
            created_at,
            volume: 0,
            scanlator: None,
            url,
        };
        Some((chapter, parsed.is_some()))
    }
}

/// Give chapters without a number in their label one of their own.
///
/// The list is newest first. Walking it oldest first, an unlabelled chapter
/// sits just above the chapter before it, on a number no labelled chapter
/// uses, so reconciliation never merges it with a real one.
fn number_unlabelled(parsed: Vec<(RawChapter, bool)>) -> Vec<RawChapter> {
    let mut used: HashSet<u32> = parsed
        .iter()
        .filter(|(_, labelled)| *labelled)
        .map(|(c, _)| (c.number + 0.0).to_bits())
        .collect();
    let mut previous = 0.0f32;
    let mut chapters: Vec<RawChapter> = parsed
        .into_iter()
        .rev()
        .map(|(mut chapter, labelled)| {
            if !labelled {
                chapter.number = next_free_number(previous + UNLABELLED_STEP, &used);
                used.insert(chapter.number.to_bits());
            }
            previous = chapter.number;
            chapter
        })
        .collect();
    chapters.reverse();
    chapters
}

const UNLABELLED_STEP: f32 = 0.01;

fn next_free_number(mut candidate: f32, used: &HashSet<u32>) -> f32 {
    while used.contains(&(candidate + 0.0).to_bits()) {
        let stepped = candidate + UNLABELLED_STEP;
        // past f32 precision the step vanishes; move to the next float instead
        candidate = if stepped > candidate {
            stepped
        } else {
            f32::from_bits(candidate.to_bits() + 1)
        };
    }
    candidate
}

impl SiteAdapter for Madara {
    fn config(&self) -> &SiteConfig {
        &self.site
    }

    fn sort_orders(&self) -> Vec<SortOrder> {
        vec![
            SortOrder::Updated,
            SortOrder::Popularity,
            SortOrder::Newest,
            SortOrder::Alphabetical,
            SortOrder::Relevance,
        ]
    }

    fn filter_capabilities(&self) -> FilterCapabilities {
        FilterCapabilities {
            search: true,
            search_with_filters: true,
            multiple_tags: true,
            tags_exclusion: false,
        }
    }

    fn list_request(&self, page: u32, order: SortOrder, filter: &ListFilter) -> Result<HttpRequest> {
        let base = self.site.base_url();
        let mut request = if filter.query().is_some() || !filter.tags.is_empty() {
            let mut req = HttpRequest::get(format!("{}/page/{}/", base, page))
                .query("s", filter.query().unwrap_or_default())
                .query("post_type", "wp-manga");
            for tag in &filter.tags {
                req = req.query("genre[]", tag.key.as_str());
            }
            req
        } else {
            HttpRequest::get(format!("{}/{}page/{}/", base, self.config.list_url, page))
        };
        if !filter.tags_exclude.is_empty() {
            log::debug!("{}: tag exclusion not supported, ignoring", self.site.name);
        }
        if let Some(orderby) = Self::order_param(order) {
            request = request.query("m_orderby", orderby);
        }
        Ok(request)
    }

    fn parse_list(&self, body: &str) -> Result<PageResult<Manga>> {
        let document = Html::parse_document(body);
        let root = document.root_element();
        let items = ["div.page-item-detail", "div.c-tabs-item__content", "div.page-listing-item"]
            .iter()
            .map(|css| {
                root.select(&sel(css))
                    .filter_map(|item| self.parse_list_item(item))
                    .collect::<Vec<_>>()
            })
            .find(|items| !items.is_empty())
            .unwrap_or_default();
        Ok(PageResult::new(items, None))
    }

    fn details_request(&self, manga: &Manga) -> Result<HttpRequest> {
        let url = Self::require_locator(&manga.url, "manga")?;
        Ok(HttpRequest::get(self.site.absolute_url(url)))
    }

    fn parse_details(&self, manga: &Manga, body: &str) -> Result<Option<Manga>> {
        let document = Html::parse_document(body);
        let root = document.root_element();
        if root.select(&sel("div.post-title, div.summary_content")).next().is_none() {
            return Ok(None);
        }

        let mut out = manga.clone();
        if let Some(title) = root.select(&sel("div.post-title h1")).next() {
            // badges such as "HOT" sit inside the heading
            let title = title
                .text()
                .filter(|t| !t.trim().is_empty())
                .last()
                .map(normalize_whitespace);
            if let Some(title) = title.filter(|t| !t.is_empty()) {
                out.title = title;
            }
        }
        out.description = first_text(
            root,
            &["div.description-summary div.summary__content", "div.summary__content", "div.manga-excerpt"],
        )
        .or(out.description);
        if let Some(cover) = root.select(&sel("div.summary_image img")).next().and_then(image_src) {
            out.cover_url = cover;
        }
        out.tags = dedup_ordered(root.select(&sel("div.genres-content a")).filter_map(|a| {
            let key = a
                .value()
                .attr("href")?
                .trim_end_matches('/')
                .rsplit('/')
                .next()?
                .to_string();
            let title = text_of(a);
            (!key.is_empty() && !title.is_empty()).then(|| Tag::new(key, title, &self.site.name))
        }));
        out.authors = dedup_ordered(
            root.select(&sel("div.author-content a, div.artist-content a"))
                .map(text_of)
                .filter(|a| !a.is_empty()),
        );
        if let Some(status) = first_text(root, &["div.post-status div.summary-content"]) {
            out.state = Self::parse_status(&status);
        }
        let score = first_text(root, &["div.post-total-rating span.score", "span#averagerate"])
            .and_then(|s| s.replace(',', ".").parse().ok());
        if score.is_some() {
            out.rating = rating_from_stars(score);
        }
        if root.select(&sel("span.manga-title-badges.adult")).next().is_some() {
            out.content_rating = ContentRating::Adult;
        }
        Ok(Some(out))
    }

    fn chapters_request(&self, manga: &Manga, _page: u32) -> Result<HttpRequest> {
        let url = Self::require_locator(&manga.url, "manga")?;
        let manga_url = self.site.absolute_url(url);
        let ajax = format!("{}/ajax/chapters/", manga_url.trim_end_matches('/'));
        Ok(HttpRequest::post(ajax)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", manga_url))
    }

    fn parse_chapters(&self, _manga: &Manga, body: &str) -> Result<PageResult<RawChapter>> {
        let document = Html::parse_document(body);
        let parsed: Vec<(RawChapter, bool)> = document
            .root_element()
            .select(&sel("li.wp-manga-chapter"))
            .filter_map(|item| self.parse_chapter_item(item))
            .collect();
        Ok(PageResult::single(number_unlabelled(parsed)))
    }

    fn pages_request(&self, chapter: &Chapter) -> Result<HttpRequest> {
        let url = Self::require_locator(&chapter.url, "chapter")?;
        Ok(HttpRequest::get(self.site.absolute_url(url)))
    }

    fn parse_pages(&self, chapter: &Chapter, body: &str) -> Result<Vec<Page>> {
        let document = Html::parse_document(body);
        let urls: Vec<String> = dedup_ordered(
            document
                .root_element()
                .select(&sel("div.page-break img, div.reading-content img"))
                .filter_map(image_src),
        );
        let urls = if urls.is_empty() {
            resolve_image_urls(body, &chapter.url)?
        } else {
            urls
        };
        Ok(build_pages(&self.site.name, &chapter.url, urls))
    }

    fn is_authorized(&self, session: Option<&SessionContext>) -> bool {
        match &self.config.auth_cookie {
            Some(marker) => session
                .map(|s| s.has_cookie(|name| name.contains(marker.as_str())))
                .unwrap_or(false),
            None => true,
        }
    }
}
