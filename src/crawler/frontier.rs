//! Breadth-first frontier and visited set
//!
//! Every membership check goes through `canonicalize`, so fragment and
//! trailing-slash variants of one URL collapse to a single entry.

use crate::url::canonicalize;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting to be visited, with the page that referred to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to visit
    pub url: Url,

    /// The referring page; `None` only for the start URL
    pub source: Option<Url>,
}

/// FIFO queue of pending visits plus the set of URLs already visited
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier seeded with the start URL
    pub fn with_start(start: Url) -> Self {
        let mut frontier = Self::new();
        frontier.enqueue(start, None);
        frontier
    }

    /// Adds a URL to the back of the queue
    ///
    /// Returns false (and does nothing) if the URL was already visited or is
    /// already waiting in the queue.
    pub fn enqueue(&mut self, url: Url, source: Option<Url>) -> bool {
        let url = canonicalize(url);
        let key = url.as_str();

        if self.visited.contains(key) || self.queued.contains(key) {
            return false;
        }

        self.queued.insert(key.to_string());
        self.queue.push_back(FrontierEntry { url, source });
        true
    }

    /// Pops the oldest entry
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.queued.remove(entry.url.as_str());
        Some(entry)
    }

    /// Records a URL as visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        let url = canonicalize(url.clone());
        self.visited.insert(url.as_str().to_string())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(canonicalize(url.clone()).as_str())
    }

    pub fn is_queued(&self, url: &Url) -> bool {
        self.queued.contains(canonicalize(url.clone()).as_str())
    }

    /// Number of URLs marked visited so far
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Number of entries waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        frontier.enqueue(url("https://example.com/a"), None);
        frontier.enqueue(url("https://example.com/b"), None);
        frontier.enqueue(url("https://example.com/c"), None);

        assert_eq!(frontier.len(), 3);
        assert_eq!(frontier.dequeue().unwrap().url.path(), "/a");
        assert_eq!(frontier.dequeue().unwrap().url.path(), "/b");
        assert_eq!(frontier.dequeue().unwrap().url.path(), "/c");
        assert!(frontier.dequeue().is_none());
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_enqueue_dedups_queued_variants() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue(url("https://example.com/a"), None));
        assert!(!frontier.enqueue(url("https://example.com/a/"), None));
        assert!(!frontier.enqueue(url("https://example.com/a#part"), None));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_enqueue_skips_visited() {
        let mut frontier = Frontier::new();
        assert!(frontier.mark_visited(&url("https://example.com/a")));
        assert!(!frontier.enqueue(url("https://example.com/a/"), None));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_mark_visited_once() {
        let mut frontier = Frontier::new();
        assert!(frontier.mark_visited(&url("https://example.com/a")));
        assert!(!frontier.mark_visited(&url("https://example.com/a/")));
        assert_eq!(frontier.visited_len(), 1);
        assert!(frontier.is_visited(&url("https://example.com/a#x")));
    }

    #[test]
    fn test_dequeue_clears_queued_flag() {
        let mut frontier = Frontier::new();
        frontier.enqueue(url("https://example.com/a"), None);
        assert!(frontier.is_queued(&url("https://example.com/a")));
        frontier.dequeue();
        assert!(!frontier.is_queued(&url("https://example.com/a")));
    }

    #[test]
    fn test_with_start_keeps_source_empty() {
        let mut frontier = Frontier::with_start(url("https://example.com/"));
        let entry = frontier.dequeue().unwrap();
        assert_eq!(entry.url.as_str(), "https://example.com/");
        assert!(entry.source.is_none());
    }

    #[test]
    fn test_entries_keep_their_source() {
        let mut frontier = Frontier::new();
        let source = url("https://example.com/");
        frontier.enqueue(url("https://example.com/b"), Some(source.clone()));
        assert_eq!(frontier.dequeue().unwrap().source, Some(source));
    }
}
