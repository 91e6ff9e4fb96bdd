use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page Atlas
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages visited per scan
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Navigation timeout per page (milliseconds)
    #[serde(rename = "navigation-timeout", default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Delay after each navigation before links are read (milliseconds)
    #[serde(rename = "settle-delay", default = "default_settle_delay")]
    pub settle_delay: u64,

    /// Persist a progress snapshot every N visited pages
    #[serde(rename = "snapshot-interval", default = "default_snapshot_interval")]
    pub snapshot_interval: usize,
}

impl CrawlerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            navigation_timeout: default_navigation_timeout(),
            settle_delay: default_settle_delay(),
            snapshot_interval: default_snapshot_interval(),
        }
    }
}

fn default_max_pages() -> usize {
    100
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_settle_delay() -> u64 {
    1_000
}

fn default_snapshot_interval() -> usize {
    5
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}
