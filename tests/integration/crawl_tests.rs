//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full scans
//! end-to-end through the HTTP fetcher and the SQLite store.

use page_atlas::config::UserAgentConfig;
use page_atlas::crawler::{start_scan, HttpLauncher, ScanEngine, ScanSettings};
use page_atlas::state::{LinkContext, LinkStatus, PageKind, ScanStatus};
use page_atlas::storage::{ProjectRecord, SqliteStore, Store};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn settings(max_pages: usize) -> ScanSettings {
    ScanSettings {
        max_pages,
        navigation_timeout: Duration::from_secs(5),
        settle_delay: Duration::ZERO,
        snapshot_interval: 5,
    }
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

/// Creates a project for the mock server's root and runs a scan on it
async fn run_scan(server: &MockServer, max_pages: usize) -> ProjectRecord {
    let mut store = SqliteStore::new_in_memory().expect("Failed to open in-memory store");
    let start = url::Url::parse(&server.uri()).expect("Failed to parse server URL");
    let project = store
        .create_project(&start, "test-hash")
        .expect("Failed to create project");
    assert_eq!(project.snapshot.status, ScanStatus::Pending);

    let store = Arc::new(Mutex::new(store));
    let launcher = Arc::new(HttpLauncher::new(create_user_agent()));
    let engine = ScanEngine::new(launcher, Arc::clone(&store), settings(max_pages), &project.id);
    engine.run(&server.uri()).await;

    let store = store.lock().unwrap();
    store
        .get_project(&project.id)
        .expect("Failed to load project")
        .expect("Project missing")
}

#[tokio::test]
async fn test_full_scan_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "Home",
        &format!(
            r#"<nav><a href="/page1">Page 1</a></nav>
               <main><a href="{}/page2">Page 2</a></main>
               <footer><a href="/page1/">Page 1</a></footer>"#,
            base
        ),
    )
    .await;
    mount_page(&server, "/page1", "Page 1", "Content 1").await;
    mount_page(&server, "/page2", "Page 2", "Content 2").await;

    let project = run_scan(&server, 100).await;
    let snapshot = &project.snapshot;

    assert_eq!(snapshot.status, ScanStatus::Completed);
    assert!(snapshot.error.is_none());

    let titles: Vec<_> = snapshot.pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);

    let contexts: Vec<_> = snapshot.links.iter().map(|l| l.context).collect();
    assert_eq!(
        contexts,
        vec![LinkContext::Nav, LinkContext::Content, LinkContext::Footer]
    );
    assert!(snapshot.broken_links.is_empty());
}

#[tokio::test]
async fn test_cycle_visits_each_page_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("A", r#"<a href="/b">B</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("B", r#"<a href="/">Back to A</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let project = run_scan(&server, 100).await;

    assert_eq!(project.snapshot.status, ScanStatus::Completed);
    assert_eq!(project.snapshot.pages.len(), 2);
    assert_eq!(project.snapshot.links.len(), 2);
}

#[tokio::test]
async fn test_server_error_is_broken_link() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Home", r#"<a href="/broken">Broken</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string(r#"<a href="/hidden">Hidden</a>"#)
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html_page("Hidden", ""))
        .expect(0)
        .mount(&server)
        .await;

    let project = run_scan(&server, 100).await;
    let snapshot = &project.snapshot;

    assert_eq!(snapshot.status, ScanStatus::Completed);
    assert_eq!(snapshot.pages.len(), 1);
    assert_eq!(snapshot.broken_links.len(), 1);

    let broken = &snapshot.broken_links[0];
    assert!(broken.url.ends_with("/broken"));
    assert_eq!(broken.source.as_deref(), Some(format!("{}/", server.uri()).as_str()));
    assert_eq!(broken.status, LinkStatus::Code(500));
}

#[tokio::test]
async fn test_documents_are_never_fetched() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/files/report.pdf">Annual report</a>
           <a href="/img/logo.png"><img src="/img/logo.png" alt="Logo"></a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let project = run_scan(&server, 100).await;
    let snapshot = &project.snapshot;

    assert_eq!(snapshot.pages.len(), 2);
    let document = &snapshot.pages[1];
    assert_eq!(document.kind, PageKind::Document);
    assert_eq!(document.title, "[DOC] report.pdf");

    assert_eq!(snapshot.links.len(), 1);
    assert_eq!(snapshot.links[0].text, "Annual report");
}

#[tokio::test]
async fn test_page_cap_limits_fetches() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a><a href="/4">4</a>"#,
    )
    .await;
    for n in 1..=4 {
        mount_page(&server, &format!("/{}", n), &format!("Page {}", n), "").await;
    }

    let project = run_scan(&server, 2).await;

    assert_eq!(project.snapshot.status, ScanStatus::Completed);
    assert_eq!(project.snapshot.pages.len(), 2);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_locale_picker_links_are_ignored() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Home",
        r#"<header><a href="/about">About</a></header>
           <div class="language-selector">
             <a href="/fr">Français</a>
             <a href="/de">Deutsch</a>
           </div>"#,
    )
    .await;
    mount_page(&server, "/about", "About", "").await;

    let project = run_scan(&server, 100).await;

    assert_eq!(project.snapshot.pages.len(), 2);
    assert_eq!(project.snapshot.links.len(), 1);
    assert_eq!(project.snapshot.links[0].context, LinkContext::Nav);
}

#[tokio::test]
async fn test_background_scans_share_one_store() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_page(&first, "/", "First", r#"<a href="/x">X</a>"#).await;
    mount_page(&first, "/x", "X", "").await;
    mount_page(&second, "/", "Second", "").await;

    let mut store = SqliteStore::new_in_memory().expect("Failed to open in-memory store");
    let a = store
        .create_project(&url::Url::parse(&first.uri()).unwrap(), "hash")
        .unwrap();
    let b = store
        .create_project(&url::Url::parse(&second.uri()).unwrap(), "hash")
        .unwrap();

    let store = Arc::new(Mutex::new(store));
    let launcher = Arc::new(HttpLauncher::new(create_user_agent()));

    let handle_a = start_scan(
        Arc::clone(&store),
        Arc::clone(&launcher),
        settings(100),
        a.id.clone(),
        first.uri(),
    );
    let handle_b = start_scan(
        Arc::clone(&store),
        Arc::clone(&launcher),
        settings(100),
        b.id.clone(),
        second.uri(),
    );
    handle_a.await.unwrap();
    handle_b.await.unwrap();

    let store = store.lock().unwrap();
    let a = store.get_project(&a.id).unwrap().unwrap();
    let b = store.get_project(&b.id).unwrap().unwrap();

    assert_eq!(a.snapshot.status, ScanStatus::Completed);
    assert_eq!(a.snapshot.pages.len(), 2);
    assert_eq!(b.snapshot.status, ScanStatus::Completed);
    assert_eq!(b.snapshot.pages.len(), 1);
    assert_eq!(b.snapshot.pages[0].title, "Second");
}
