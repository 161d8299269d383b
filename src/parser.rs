//! Adapter boundary and the shared framework behaviour built on top of it.
//!
//! A [`SiteAdapter`] only knows how to build requests for one website and how
//! to read that website's payloads. [`SourceParser`] owns the gateway and the
//! session and drives pagination, reconciliation and detail aggregation.

use crate::details;
use crate::error::{ParserError, Result};
use crate::http_client::{HttpGateway, HttpRequest, SessionContext};
use crate::models::{
    Chapter, FilterCapabilities, ListFilter, Manga, Page, RawChapter, SortOrder, Tag,
};
use crate::pagination::{PageResult, Paginator};
use crate::reconcile::reconcile_chapters;
use futures::Stream;
use std::sync::Arc;

/// Static description of one website
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    /// Source name used to scope ids and tags, e.g. `COMIX`
    pub name: String,
    /// Bare domain, or a full origin (`http://127.0.0.1:8080`) for local setups
    pub domain: String,
    pub page_size: u32,
    /// Index of the first listing page
    pub first_page: u32,
    pub locale: String,
}

impl SiteConfig {
    pub fn base_url(&self) -> String {
        if self.domain.starts_with("http://") || self.domain.starts_with("https://") {
            self.domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.domain.trim_end_matches('/'))
        }
    }

    /// Absolute URL for a source-relative locator
    pub fn absolute_url(&self, locator: &str) -> String {
        crate::helpers::join_url(&self.base_url(), locator)
    }
}

/// Per-website translation hooks. Every hook is pure: no I/O, no shared state.
pub trait SiteAdapter: Send + Sync {
    fn config(&self) -> &SiteConfig;

    fn sort_orders(&self) -> Vec<SortOrder>;

    fn filter_capabilities(&self) -> FilterCapabilities;

    fn available_tags(&self) -> Vec<Tag> {
        Vec::new()
    }

    fn list_request(&self, page: u32, order: SortOrder, filter: &ListFilter) -> Result<HttpRequest>;

    fn parse_list(&self, body: &str) -> Result<PageResult<Manga>>;

    /// Fails with a parse error when the entry locator is unusable
    fn details_request(&self, manga: &Manga) -> Result<HttpRequest>;

    /// `None` when the payload carries no detail record
    fn parse_details(&self, manga: &Manga, body: &str) -> Result<Option<Manga>>;

    fn chapters_request(&self, manga: &Manga, page: u32) -> Result<HttpRequest>;

    fn parse_chapters(&self, manga: &Manga, body: &str) -> Result<PageResult<RawChapter>>;

    fn pages_request(&self, chapter: &Chapter) -> Result<HttpRequest>;

    fn parse_pages(&self, chapter: &Chapter, body: &str) -> Result<Vec<Page>>;

    /// Whether the session carries whatever the site needs for authenticated content
    fn is_authorized(&self, _session: Option<&SessionContext>) -> bool {
        true
    }
}

/// Framework facade for one source
#[derive(Clone)]
pub struct SourceParser {
    adapter: Arc<dyn SiteAdapter>,
    gateway: Arc<dyn HttpGateway>,
    session: Option<SessionContext>,
    paginator: Paginator,
}

impl SourceParser {
    pub fn new(adapter: Arc<dyn SiteAdapter>, gateway: Arc<dyn HttpGateway>) -> Self {
        let paginator = Paginator::new(adapter.config().first_page);
        Self {
            adapter,
            gateway,
            session: None,
            paginator,
        }
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    /// Replace the pagination policy. The first page always follows the adapter.
    ///
    /// The page cap bounds listing walks only; chapter lists are always fetched whole.
    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator.with_first_page(self.adapter.config().first_page);
        self
    }

    pub fn adapter(&self) -> &dyn SiteAdapter {
        self.adapter.as_ref()
    }

    pub fn source_name(&self) -> &str {
        &self.adapter.config().name
    }

    pub fn sort_orders(&self) -> Vec<SortOrder> {
        self.adapter.sort_orders()
    }

    pub fn filter_capabilities(&self) -> FilterCapabilities {
        self.adapter.filter_capabilities()
    }

    pub fn available_tags(&self) -> Vec<Tag> {
        self.adapter.available_tags()
    }

    pub fn is_authorized(&self) -> bool {
        self.adapter.is_authorized(self.session.as_ref())
    }

    async fn fetch(&self, request: &HttpRequest) -> Result<String> {
        self.gateway.execute(request, self.session.as_ref()).await
    }

    /// One listing page. Errors propagate unchanged.
    pub async fn get_list_page(
        &self,
        page: u32,
        order: SortOrder,
        filter: &ListFilter,
    ) -> Result<Vec<Manga>> {
        Ok(self.fetch_list_page(page, order, filter).await?.items)
    }

    async fn fetch_list_page(
        &self,
        page: u32,
        order: SortOrder,
        filter: &ListFilter,
    ) -> Result<PageResult<Manga>> {
        let request = self.adapter.list_request(page, order, filter)?;
        let body = self.fetch(&request).await?;
        self.adapter.parse_list(&body)
    }

    /// Every listing page, fetched lazily and sequentially
    pub fn list_stream<'a>(
        &'a self,
        order: SortOrder,
        filter: &'a ListFilter,
    ) -> impl Stream<Item = Result<Manga>> + 'a {
        self.paginator
            .stream(move |page| self.fetch_list_page(page, order, filter))
    }

    /// Full chapter list: all pages, then one chapter per number, ascending
    pub async fn get_chapters(&self, manga: &Manga) -> Result<Vec<Chapter>> {
        let raw = self
            .paginator
            .uncapped()
            .collect(move |page| async move {
                let request = self.adapter.chapters_request(manga, page)?;
                let body = self.fetch(&request).await?;
                self.adapter.parse_chapters(manga, &body)
            })
            .await?;
        log::debug!(
            "{}: {} raw chapter records for {}",
            self.source_name(),
            raw.len(),
            manga.url
        );
        Ok(reconcile_chapters(self.source_name(), raw))
    }

    async fn fetch_metadata(&self, manga: &Manga, request: HttpRequest) -> Result<Option<Manga>> {
        let body = self.fetch(&request).await?;
        self.adapter.parse_details(manga, &body)
    }

    /// Enrich an entry with metadata and chapters fetched concurrently.
    ///
    /// Only an unusable entry locator fails the call; a failing metadata or
    /// chapter fetch degrades to the listing data or an empty chapter list.
    pub async fn get_details(&self, manga: &Manga) -> Result<Manga> {
        let request = self.adapter.details_request(manga)?;
        let parts = details::fetch_both(
            self.source_name(),
            self.fetch_metadata(manga, request),
            self.get_chapters(manga),
        )
        .await;
        Ok(details::merge(manga, parts))
    }

    /// Ordered pages of a chapter. An empty image list is an error.
    pub async fn get_pages(&self, chapter: &Chapter) -> Result<Vec<Page>> {
        let request = self.adapter.pages_request(chapter)?;
        let body = self.fetch(&request).await?;
        let pages = self.adapter.parse_pages(chapter, &body)?;
        if pages.is_empty() {
            return Err(ParserError::NotFound(format!("no pages in {}", chapter.url)));
        }
        Ok(pages)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sources::comix::Comix;
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory gateway keyed by URL path; unknown paths answer 404
    #[derive(Default)]
    pub struct StubGateway {
        pub routes: HashMap<String, std::result::Result<String, u16>>,
        pub seen: Mutex<Vec<HttpRequest>>,
    }

    impl StubGateway {
        pub fn route(mut self, path: &str, body: &str) -> Self {
            self.routes.insert(path.to_string(), Ok(body.to_string()));
            self
        }

        pub fn fail(mut self, path: &str, status: u16) -> Self {
            self.routes.insert(path.to_string(), Err(status));
            self
        }
    }

    fn path_of(url: &str) -> String {
        let without_scheme = url.split("://").nth(1).unwrap_or(url);
        match without_scheme.find('/') {
            Some(i) => without_scheme[i..].to_string(),
            None => "/".to_string(),
        }
    }

    #[async_trait]
    impl HttpGateway for StubGateway {
        async fn execute(
            &self,
            request: &HttpRequest,
            _session: Option<&SessionContext>,
        ) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            let path = path_of(&request.url);
            let page = request
                .query_values("page")
                .first()
                .map(|p| format!("?page={}", p))
                .unwrap_or_default();
            let route = self
                .routes
                .get(&format!("{}{}", path, page))
                .or_else(|| self.routes.get(&path));
            match route {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(ParserError::transport(Some(*status), "stub failure")),
                None => Err(ParserError::transport(Some(404), format!("no route for {}", path))),
            }
        }
    }

    fn parser(gateway: StubGateway) -> (SourceParser, Arc<StubGateway>) {
        let gateway = Arc::new(gateway);
        let parser = SourceParser::new(Arc::new(Comix::new()), gateway.clone());
        (parser, gateway)
    }

    fn listed(url: &str) -> Manga {
        let mut m = Comix::new()
            .parse_list(r#"{"result":{"items":[{"hash_id":"abc","slug":"s","title":"Listed","poster":{}}]}}"#)
            .unwrap()
            .items
            .remove(0);
        m.url = url.to_string();
        m
    }

    const DETAILS: &str = r#"{"result":{"hash_id":"abc","slug":"s","title":"Fetched","synopsis":"Story","rated_avg":80,"poster":{"large":"l.jpg"},"author":[{"title":"A"}],"genre":[{"term_id":6,"title":"Action"}]}}"#;

    const CHAPTERS_P1: &str = r#"{"result":{"items":[
        {"chapter_id":11,"number":2,"name":"Two","created_at":100},
        {"chapter_id":12,"number":1,"created_at":100},
        {"chapter_id":13,"number":2,"created_at":300,"scanlation_group":{"name":"G"}}
    ],"pagination":{"current_page":1,"last_page":2}}}"#;

    const CHAPTERS_P2: &str = r#"{"result":{"items":[
        {"chapter_id":14,"number":3,"created_at":400}
    ],"pagination":{"current_page":2,"last_page":2}}}"#;

    #[tokio::test]
    async fn test_details_merge_metadata_and_chapters() {
        let (parser, gateway) = parser(
            StubGateway::default()
                .route("/api/v2/manga/abc", DETAILS)
                .route("/api/v2/manga/abc/chapters?page=1", CHAPTERS_P1)
                .route("/api/v2/manga/abc/chapters?page=2", CHAPTERS_P2),
        );
        let manga = parser.get_details(&listed("/title/abc-s")).await.unwrap();
        assert_eq!(manga.title, "Fetched");
        assert_eq!(manga.authors, vec!["A"]);
        let chapters = manga.chapters.unwrap();
        let numbers: Vec<f32> = chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1.0, 2.0, 3.0]);
        assert_eq!(chapters[1].scanlator.as_deref(), Some("G"));
        assert_eq!(chapters[1].upload_date, 300_000);
        // details + two chapter pages, nothing fetched twice
        assert_eq!(gateway.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_details_survive_chapter_failure() {
        let (parser, _) = parser(
            StubGateway::default()
                .route("/api/v2/manga/abc", DETAILS)
                .fail("/api/v2/manga/abc/chapters", 500),
        );
        let manga = parser.get_details(&listed("/title/abc-s")).await.unwrap();
        assert_eq!(manga.title, "Fetched");
        assert_eq!(manga.chapters, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_details_survive_metadata_failure() {
        let (parser, _) = parser(
            StubGateway::default()
                .fail("/api/v2/manga/abc", 503)
                .route("/api/v2/manga/abc/chapters?page=1", CHAPTERS_P1)
                .route("/api/v2/manga/abc/chapters?page=2", CHAPTERS_P2),
        );
        let manga = parser.get_details(&listed("/title/abc-s")).await.unwrap();
        assert_eq!(manga.title, "Listed");
        assert_eq!(manga.chapters.map(|c| c.len()), Some(3));
    }

    #[tokio::test]
    async fn test_details_invalid_locator_is_fatal() {
        let (parser, gateway) = parser(StubGateway::default());
        let result = parser.get_details(&listed("/manga/abc")).await;
        assert!(matches!(result, Err(ParserError::Parse { .. })));
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_page_errors_propagate() {
        let (parser, _) = parser(StubGateway::default().fail("/api/v2/manga", 502));
        let result = parser
            .get_list_page(1, SortOrder::Updated, &ListFilter::default())
            .await;
        assert!(matches!(result, Err(ParserError::Transport { status: Some(502), .. })));
    }

    #[tokio::test]
    async fn test_pages_resolved_in_order() {
        let (parser, _) = parser(
            StubGateway::default()
                .route("/api/v2/chapters/77", r#"{"result":{"images":["a.jpg",{"url":"b.jpg"}]}}"#),
        );
        let chapter = Chapter {
            id: 0,
            title: "Chapter 1".into(),
            number: 1.0,
            volume: 0,
            url: "/title/abc/77-chapter-1".into(),
            upload_date: 0,
            scanlator: None,
            source: "COMIX".into(),
        };
        let pages = parser.get_pages(&chapter).await.unwrap();
        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["a.jpg", "b.jpg"]);

        let missing = Chapter {
            url: "/title/abc/78-chapter-2".into(),
            ..chapter
        };
        let result = parser.get_pages(&missing).await;
        assert!(matches!(result, Err(ParserError::Transport { status: Some(404), .. })));
    }

    #[tokio::test]
    async fn test_page_cap_leaves_chapter_list_whole() {
        let (parser, gateway) = parser(
            StubGateway::default()
                .route("/api/v2/manga?page=1", r#"{"result":{"items":[{"hash_id":"abc","title":"A"}],"pagination":{"current_page":1,"last_page":5}}}"#)
                .route("/api/v2/manga/abc/chapters?page=1", CHAPTERS_P1)
                .route("/api/v2/manga/abc/chapters?page=2", CHAPTERS_P2),
        );
        let parser = parser.with_paginator(Paginator::new(1).with_max_pages(Some(1)));

        let chapters = parser.get_chapters(&listed("/title/abc-s")).await.unwrap();
        assert_eq!(chapters.len(), 3);

        let filter = ListFilter::default();
        let entries: Vec<Manga> = parser
            .list_stream(SortOrder::Updated, &filter)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(gateway.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_replacement_paginator_keeps_adapter_first_page() {
        let (parser, gateway) = parser(
            StubGateway::default()
                .route("/api/v2/manga/abc/chapters?page=1", CHAPTERS_P1)
                .route("/api/v2/manga/abc/chapters?page=2", CHAPTERS_P2),
        );
        let parser = parser.with_paginator(Paginator::new(0));

        parser.get_chapters(&listed("/title/abc-s")).await.unwrap();
        let seen = gateway.seen.lock().unwrap();
        let pages: Vec<&str> = seen.iter().flat_map(|r| r.query_values("page")).collect();
        assert_eq!(pages, vec!["1", "2"]);
    }

    #[test]
    fn test_base_url() {
        let mut site = Comix::new().config().clone();
        assert_eq!(site.base_url(), "https://comix.to");
        site.domain = "http://127.0.0.1:9000/".into();
        assert_eq!(site.base_url(), "http://127.0.0.1:9000");
        assert_eq!(site.absolute_url("/title/x"), "http://127.0.0.1:9000/title/x");
    }
}
