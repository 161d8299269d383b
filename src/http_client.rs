use crate::error::{ParserError, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::time::Duration;

/// User agents to rotate through to avoid bot detection
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outbound request. Query pairs keep their order and may repeat a key.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// All values sent for a query key, in order
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Explicit cookie/session state for authenticated sources
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionContext {
    cookies: Vec<(String, String)>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.cookies.retain(|(n, _)| n != &name);
        self.cookies.push((name, value.into()));
        self
    }

    pub fn has_cookie(&self, predicate: impl Fn(&str) -> bool) -> bool {
        self.cookies.iter().any(|(name, _)| predicate(name))
    }

    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(n, v)| format!("{}={}", n, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Transport seam between the framework and the network
#[async_trait]
pub trait HttpGateway: Send + Sync {
    /// Execute a request and return the body. Non-2xx statuses are errors.
    async fn execute(
        &self,
        request: &HttpRequest,
        session: Option<&SessionContext>,
    ) -> Result<String>;
}

/// Decode a JSON body. Failures are reported as transport errors since the body never arrived intact.
pub fn decode_json(body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| ParserError::transport(None, format!("invalid JSON body: {}", e)))
}

/// Configuration for the reqwest-backed gateway
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub enable_gzip: bool,
    /// Fixed user agent; rotates through a built-in pool when unset
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            enable_gzip: true,
            user_agent: None,
        }
    }
}

/// Gateway with browser-like headers. Retry is left to callers.
pub struct EnhancedHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl EnhancedHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static("application/json,text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(config.enable_gzip)
            .brotli(config.enable_gzip)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    }

    fn user_agent(&self) -> &str {
        self.config
            .user_agent
            .as_deref()
            .unwrap_or_else(|| Self::random_user_agent())
    }

    fn build_headers(
        &self,
        request: &HttpRequest,
        session: Option<&SessionContext>,
    ) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut put = |name: &str, value: &str| -> Result<()> {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ParserError::transport(None, format!("bad header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ParserError::transport(None, format!("bad header value: {}", e)))?;
            headers.append(name, value);
            Ok(())
        };
        put("User-Agent", self.user_agent())?;
        if let Some(cookie) = session.and_then(SessionContext::cookie_header) {
            put("Cookie", &cookie)?;
        }
        for (name, value) in &request.headers {
            put(name, value)?;
        }
        Ok(headers)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpGateway for EnhancedHttpClient {
    async fn execute(
        &self,
        request: &HttpRequest,
        session: Option<&SessionContext>,
    ) -> Result<String> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url).form(&request.form),
        };
        let builder = builder
            .query(&request.query)
            .headers(self.build_headers(request, session)?);

        log::debug!("{:?} {} {:?}", request.method, request.url, request.query);
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ParserError::transport(
                Some(status.as_u16()),
                format!("unexpected status for {}", request.url),
            ));
        }
        response
            .text()
            .await
            .map_err(|e| ParserError::transport(Some(status.as_u16()), e.to_string()))
    }
}
