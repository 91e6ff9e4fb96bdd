//! Page fetch surface
//!
//! This module handles all page loads for the crawler, including:
//! - The `PageFetcher`/`FetcherLauncher` traits the engine drives
//! - Building HTTP clients with proper user agent strings
//! - An HTTP implementation that follows redirects and parses HTML bodies
//! - Error classification (timeout, network, crash)

use crate::config::UserAgentConfig;
use crate::crawler::parser::{parse_page, ExtractedLink, LoadedPage};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed per navigation
pub const MAX_REDIRECTS: usize = 10;

/// Outcome of a navigation that produced (or failed to produce) a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// HTTP status of the final response; `None` when nothing came back
    pub status: Option<u16>,

    /// URL of the loaded document after redirects
    pub final_url: Url,
}

impl Navigation {
    /// Returns true if the navigation loaded something worth expanding
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(code) if code < 400)
    }
}

/// A surface that loads one document at a time
///
/// `extract_anchors` and `title` operate on the document loaded by the most
/// recent successful `navigate`.
#[async_trait]
pub trait PageFetcher: Send {
    /// Loads a URL, giving up after `timeout`
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<Navigation, FetchError>;

    /// Anchors of the current document
    fn extract_anchors(&self) -> Vec<ExtractedLink>;

    /// Title of the current document
    fn title(&self) -> String;

    /// Releases the surface; called once on every exit path of a scan
    async fn close(&mut self);
}

/// Acquires a fresh fetch surface for one scan
#[async_trait]
pub trait FetcherLauncher: Send + Sync {
    type Fetcher: PageFetcher + 'static;

    async fn launch(&self) -> Result<Self::Fetcher, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use page_atlas::config::UserAgentConfig;
/// use page_atlas::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageAtlas".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP-backed fetch surface
///
/// Bodies served as HTML are parsed right after the load, so the engine never
/// holds a DOM across an await point.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    current: Option<LoadedPage>,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    async fn load(&self, url: &Url) -> Result<(Navigation, Option<LoadedPage>), reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let final_url = response.url().clone();

        let navigation = Navigation {
            status: Some(status.as_u16()),
            final_url,
        };

        if !navigation.is_success() || !is_html(&response) {
            return Ok((navigation, None));
        }

        let body = response.text().await?;
        let page = parse_page(&body, &navigation.final_url);
        Ok((navigation, Some(page)))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<Navigation, FetchError> {
        self.current = None;

        match tokio::time::timeout(timeout, self.load(url)).await {
            Ok(Ok((navigation, page))) => {
                self.current = page;
                Ok(navigation)
            }
            Ok(Err(e)) => Err(classify_error(&e, timeout)),
            Err(_) => Err(FetchError::Timeout(timeout.as_millis() as u64)),
        }
    }

    fn extract_anchors(&self) -> Vec<ExtractedLink> {
        self.current
            .as_ref()
            .map(|page| page.anchors.clone())
            .unwrap_or_default()
    }

    fn title(&self) -> String {
        self.current
            .as_ref()
            .map(|page| page.title.clone())
            .unwrap_or_default()
    }

    async fn close(&mut self) {
        self.current = None;
    }
}

/// Launches `HttpFetcher`s that share one user agent
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    user_agent: UserAgentConfig,
}

impl HttpLauncher {
    pub fn new(user_agent: UserAgentConfig) -> Self {
        Self { user_agent }
    }
}

#[async_trait]
impl FetcherLauncher for HttpLauncher {
    type Fetcher = HttpFetcher;

    async fn launch(&self) -> Result<HttpFetcher, FetchError> {
        let client =
            build_http_client(&self.user_agent).map_err(|e| FetchError::Launch(e.to_string()))?;
        Ok(HttpFetcher::new(client))
    }
}

fn is_html(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        // A missing Content-Type is sniffed as HTML by browsers
        .map_or(true, |ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        })
}

/// Maps a reqwest failure onto the per-page error kinds
fn classify_error(error: &reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout.as_millis() as u64)
    } else if error.is_connect() {
        FetchError::Network("Connection refused".to_string())
    } else if error.is_redirect() {
        FetchError::Network(format!("Too many redirects (max {})", MAX_REDIRECTS))
    } else if error.is_builder() {
        FetchError::Network(format!("Invalid request: {}", error))
    } else {
        FetchError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "test@example.com".to_string(),
        }
    }

    async fn fetcher() -> HttpFetcher {
        HttpLauncher::new(create_test_config())
            .launch()
            .await
            .unwrap()
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html; charset=utf-8")
            .set_body_string(body)
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_navigation_success_boundary() {
        let url = Url::parse("https://example.com/").unwrap();
        let nav = |status| Navigation {
            status,
            final_url: url.clone(),
        };
        assert!(nav(Some(200)).is_success());
        assert!(nav(Some(304)).is_success());
        assert!(!nav(Some(400)).is_success());
        assert!(!nav(Some(500)).is_success());
        assert!(!nav(None).is_success());
    }

    #[tokio::test]
    async fn test_navigate_parses_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(
                r#"<html><head><title>Home</title></head>
                   <body><footer><a href="/contact">Contact</a></footer></body></html>"#,
            ))
            .mount(&server)
            .await;

        let mut fetcher = fetcher().await;
        let url = Url::parse(&server.uri()).unwrap();
        let navigation = fetcher
            .navigate(&url, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(navigation.status, Some(200));
        assert_eq!(fetcher.title(), "Home");

        let anchors = fetcher.extract_anchors();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href, format!("{}/contact", server.uri()));
        assert_eq!(anchors[0].context, crate::LinkContext::Footer);
    }

    #[tokio::test]
    async fn test_navigate_reports_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut fetcher = fetcher().await;
        let url = Url::parse(&format!("{}/broken", server.uri())).unwrap();
        let navigation = fetcher
            .navigate(&url, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(navigation.status, Some(500));
        assert!(fetcher.extract_anchors().is_empty());
    }

    #[tokio::test]
    async fn test_navigate_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/new"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(html("<title>New</title>"))
            .mount(&server)
            .await;

        let mut fetcher = fetcher().await;
        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let navigation = fetcher
            .navigate(&url, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(navigation.final_url.path(), "/new");
        assert_eq!(fetcher.title(), "New");
    }

    #[tokio::test]
    async fn test_navigate_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html("<title>Slow</title>").set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let mut fetcher = fetcher().await;
        let url = Url::parse(&server.uri()).unwrap();
        let result = fetcher.navigate(&url, Duration::from_millis(200)).await;

        assert!(matches!(result, Err(FetchError::Timeout(200))));
    }

    #[tokio::test]
    async fn test_non_html_body_is_not_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"href": "<a href='/x'>x</a>"}"#),
            )
            .mount(&server)
            .await;

        let mut fetcher = fetcher().await;
        let url = Url::parse(&server.uri()).unwrap();
        let navigation = fetcher
            .navigate(&url, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(navigation.status, Some(200));
        assert_eq!(fetcher.title(), "");
        assert!(fetcher.extract_anchors().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let mut fetcher = fetcher().await;
        // Port 9 (discard) is essentially never listening on loopback
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = fetcher.navigate(&url, Duration::from_secs(5)).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
