//! Crawl engine - bounded breadth-first traversal of one site
//!
//! This module contains the main scan loop that coordinates all aspects of
//! one project's scan, including:
//! - Launching and releasing the fetch surface
//! - Driving the frontier and the visited set
//! - Recording pages, links and broken links
//! - Persisting periodic and terminal snapshots

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetcherLauncher, Navigation, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::ExtractedLink;
use crate::state::{BrokenLink, CrawlState, Link, LinkStatus, Page, ScanStatus};
use crate::storage::{SharedStore, SnapshotSink, SnapshotUpdate};
use crate::url::{canonicalize, classify, file_name, normalize_url, DomainScope, FileKind};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Tunables for one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Maximum number of URLs visited (fetched or attempted), and of pages
    /// recorded (fetched plus documents)
    pub max_pages: usize,

    /// Per-navigation timeout
    pub navigation_timeout: Duration,

    /// Pause after each navigation that returned, before links are read
    pub settle_delay: Duration,

    /// Persist a progress snapshot every N visits
    pub snapshot_interval: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for ScanSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            navigation_timeout: config.navigation_timeout(),
            settle_delay: config.settle_delay(),
            snapshot_interval: config.snapshot_interval.max(1),
        }
    }
}

/// One scan of one project
pub struct ScanEngine<L, S> {
    launcher: Arc<L>,
    sink: SharedStore<S>,
    settings: ScanSettings,
    project_id: String,
}

impl<L, S> ScanEngine<L, S>
where
    L: FetcherLauncher,
    S: SnapshotSink,
{
    pub fn new(
        launcher: Arc<L>,
        sink: SharedStore<S>,
        settings: ScanSettings,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            launcher,
            sink,
            settings,
            project_id: project_id.into(),
        }
    }

    /// Runs the scan to completion and returns its terminal status
    ///
    /// Every outcome is also persisted through the sink: `scanning` before the
    /// first fetch, then either the final results with `completed`, or
    /// `failed` with an error message.
    pub async fn run(&self, start_url: &str) -> ScanStatus {
        let mut state = CrawlState::new(String::new());

        if let Err(e) = state.transition(ScanStatus::Scanning) {
            tracing::warn!("[{}] {}", self.project_id, e);
        }
        self.persist(&SnapshotUpdate::new().with_status(ScanStatus::Scanning));
        tracing::info!("[{}] Starting scan of {}", self.project_id, start_url);

        let outcome = match self.crawl(&mut state, start_url).await {
            Ok(()) => {
                tracing::info!(
                    "[{}] Scan completed: {} pages, {} links, {} broken",
                    self.project_id,
                    state.pages().len(),
                    state.links().len(),
                    state.broken_links().len()
                );
                state.transition(ScanStatus::Completed)
            }
            Err(e) => {
                tracing::error!("[{}] Scan failed: {}", self.project_id, e);
                state.fail(e.to_string())
            }
        };
        if let Err(e) = outcome {
            tracing::warn!("[{}] {}", self.project_id, e);
        }

        self.persist(&state.terminal_update());
        state.status()
    }

    /// Resolves the start URL, acquires the fetch surface and traverses
    ///
    /// The surface is closed whether or not the traversal succeeds.
    async fn crawl(&self, state: &mut CrawlState, start_url: &str) -> crate::Result<()> {
        let start = normalize_url(start_url, None)?;
        let mut scope = DomainScope::new(&start)?;
        state.set_base_domain(scope.base());

        let mut fetcher = self.launcher.launch().await?;
        let result = self
            .traverse(&mut fetcher, state, &mut scope, start)
            .await;
        fetcher.close().await;

        result
    }

    /// The main loop
    async fn traverse<F: PageFetcher>(
        &self,
        fetcher: &mut F,
        state: &mut CrawlState,
        scope: &mut DomainScope,
        start: Url,
    ) -> crate::Result<()> {
        let mut frontier = Frontier::with_start(start);

        while frontier.visited_len() < self.settings.max_pages
            && state.pages().len() < self.settings.max_pages
        {
            let Some(entry) = frontier.dequeue() else {
                tracing::debug!("[{}] Frontier is empty", self.project_id);
                break;
            };

            let current = canonicalize(entry.url);
            if !frontier.mark_visited(&current) {
                continue;
            }
            let source = entry.source.map(|s| s.to_string());

            tracing::info!(
                "[{}] Visiting {} ({}/{})",
                self.project_id,
                current,
                frontier.visited_len(),
                self.settings.max_pages
            );

            let navigation = match fetcher
                .navigate(&current, self.settings.navigation_timeout)
                .await
            {
                Ok(navigation) => navigation,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    self.record_broken(state, &current, source, LinkStatus::error(&e));
                    self.maybe_snapshot(state, &frontier);
                    continue;
                }
            };

            if source.is_none() {
                self.check_rebase(state, scope, &navigation);
            }

            if !self.settings.settle_delay.is_zero() {
                tokio::time::sleep(self.settings.settle_delay).await;
            }

            match navigation.status {
                None => self.record_broken(state, &current, source, LinkStatus::no_response()),
                Some(code) if code >= 400 => {
                    self.record_broken(state, &current, source, LinkStatus::Code(code))
                }
                Some(_) => {
                    state.add_page(Page::fetched(current.as_str(), fetcher.title()));
                    let anchors = fetcher.extract_anchors();
                    self.handle_discovered_links(state, &mut frontier, scope, &current, anchors);
                }
            }

            self.maybe_snapshot(state, &frontier);
        }

        if !frontier.is_empty() {
            tracing::info!(
                "[{}] Page cap of {} reached, discarding {} queued URLs",
                self.project_id,
                self.settings.max_pages,
                frontier.len()
            );
        }

        Ok(())
    }

    /// Applies the one-time domain rebase after the first navigation
    fn check_rebase(&self, state: &mut CrawlState, scope: &mut DomainScope, navigation: &Navigation) {
        if let Some(new_base) = scope.rebase_once(&navigation.final_url) {
            tracing::info!(
                "[{}] Start URL forwarded to {}, rebasing scope from {} to {}",
                self.project_id,
                navigation.final_url,
                state.base_domain(),
                new_base
            );
            state.set_base_domain(new_base);
        }
    }

    /// Records, and where appropriate queues, the anchors of a loaded page
    ///
    /// Links are recorded here, on the referring page, with the text and
    /// context of the anchor. Documents become leaf pages and are never queued.
    fn handle_discovered_links(
        &self,
        state: &mut CrawlState,
        frontier: &mut Frontier,
        scope: &DomainScope,
        current: &Url,
        anchors: Vec<ExtractedLink>,
    ) {
        for anchor in anchors {
            let target = match normalize_url(&anchor.href, Some(current)) {
                Ok(target) => target,
                Err(e) => {
                    tracing::debug!("Failed to normalize URL {}: {}", anchor.href, e);
                    continue;
                }
            };

            let kind = classify(&target);
            if kind == FileKind::Asset {
                tracing::trace!("Skipping asset {}", target);
                continue;
            }

            if !scope.in_scope(&target) {
                tracing::debug!("Skipping out-of-scope link {}", target);
                continue;
            }

            if target == *current {
                continue;
            }

            state.add_link(Link {
                source: current.to_string(),
                target: target.to_string(),
                text: anchor.text,
                context: anchor.context,
            });

            if kind == FileKind::Document {
                if state.pages().len() >= self.settings.max_pages {
                    tracing::debug!("Page cap reached, not recording document {}", target);
                    continue;
                }
                let name = file_name(&target).unwrap_or("document").to_string();
                state.add_page(Page::document(target.as_str(), &name));
            } else {
                frontier.enqueue(target, Some(current.clone()));
            }
        }
    }

    fn record_broken(
        &self,
        state: &mut CrawlState,
        url: &Url,
        source: Option<String>,
        status: LinkStatus,
    ) {
        tracing::info!("[{}] Broken link {} ({})", self.project_id, url, status);
        state.add_broken_link(BrokenLink {
            url: url.to_string(),
            source,
            status,
        });
    }

    fn maybe_snapshot(&self, state: &CrawlState, frontier: &Frontier) {
        if frontier.visited_len() % self.settings.snapshot_interval == 0 {
            tracing::debug!(
                "[{}] Snapshot: {} pages, {} links, {} broken",
                self.project_id,
                state.pages().len(),
                state.links().len(),
                state.broken_links().len()
            );
            self.persist(&state.progress_update());
        }
    }

    /// Writes an update through the sink; failures are logged, never raised
    fn persist(&self, update: &SnapshotUpdate) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = sink.update(&self.project_id, update) {
            tracing::warn!("[{}] Failed to persist snapshot: {}", self.project_id, e);
        }
    }
}

/// Starts a scan in the background
///
/// The caller is expected to have created the project in `pending` status.
/// Progress and completion are observable only through the sink; the returned
/// handle resolves once the terminal snapshot has been written. A panic inside
/// a fetcher or sink implementation is caught here and persisted as `failed`.
pub fn start_scan<L, S>(
    sink: SharedStore<S>,
    launcher: Arc<L>,
    settings: ScanSettings,
    project_id: impl Into<String>,
    start_url: impl Into<String>,
) -> JoinHandle<()>
where
    L: FetcherLauncher + 'static,
    S: SnapshotSink + 'static,
{
    let engine = ScanEngine::new(launcher, sink, settings, project_id);
    let start_url = start_url.into();

    tokio::spawn(async move {
        let outcome = AssertUnwindSafe(engine.run(&start_url))
            .catch_unwind()
            .await;

        if let Err(payload) = outcome {
            let message = format!("Scan aborted: {}", panic_message(payload.as_ref()));
            tracing::error!("[{}] {}", engine.project_id, message);
            engine.persist(
                &SnapshotUpdate::new()
                    .with_status(ScanStatus::Failed)
                    .with_error(message),
            );
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
