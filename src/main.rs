//! Page Atlas main entry point
//!
//! This is the command-line interface for the Page Atlas page-graph auditor.

use anyhow::{bail, Context};
use clap::Parser;
use page_atlas::config::{load_config_with_hash, Config};
use page_atlas::crawler::{start_scan, HttpLauncher, ScanSettings};
use page_atlas::storage::{open_store, SqliteStore, Store};
use page_atlas::{normalize_url, ScanStatus};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::EnvFilter;

/// Page Atlas: a website page-graph auditor
///
/// Page Atlas crawls a single site breadth-first, recording every reachable
/// page, every link between pages (classified as nav, footer or content),
/// and every broken link. Results are stored per project in SQLite.
#[derive(Parser, Debug)]
#[command(name = "page-atlas")]
#[command(version = "1.0.0")]
#[command(about = "A website page-graph auditor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Create a project for each URL and scan them concurrently
    #[arg(long, value_name = "URL", num_args = 1.., conflicts_with_all = ["show", "list", "delete", "dry_run"])]
    scan: Vec<String>,

    /// Print a project's stored results as JSON
    #[arg(long, value_name = "ID", conflicts_with_all = ["list", "delete", "dry_run"])]
    show: Option<String>,

    /// List all projects, newest first
    #[arg(long, conflicts_with_all = ["delete", "dry_run"])]
    list: bool,

    /// Delete a project and its results
    #[arg(long, value_name = "ID", conflicts_with = "dry_run")]
    delete: Option<String>,

    /// Validate config and show the effective settings without scanning
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(id) = &cli.show {
        handle_show(&config, id)?;
    } else if cli.list {
        handle_list(&config)?;
    } else if let Some(id) = &cli.delete {
        handle_delete(&config, id)?;
    } else if !cli.scan.is_empty() {
        handle_scan(&config, &config_hash, &cli.scan).await?;
    } else {
        bail!("Nothing to do: pass --scan, --show, --list, --delete or --dry-run");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_atlas=info,warn"),
            1 => EnvFilter::new("page_atlas=debug,info"),
            2 => EnvFilter::new("page_atlas=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open(config: &Config) -> anyhow::Result<SqliteStore> {
    let path = Path::new(&config.output.database_path);
    open_store(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles the --dry-run mode: validates config and shows the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Page Atlas Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!(
        "  Navigation timeout: {}ms",
        config.crawler.navigation_timeout
    );
    println!("  Settle delay: {}ms", config.crawler.settle_delay);
    println!(
        "  Snapshot every: {} pages",
        config.crawler.snapshot_interval
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --show mode: prints the stored project as pretty JSON
fn handle_show(config: &Config, id: &str) -> anyhow::Result<()> {
    let store = open(config)?;
    let Some(project) = store.get_project(id)? else {
        bail!("Project not found: {}", id);
    };

    println!("{}", serde_json::to_string_pretty(&project)?);
    Ok(())
}

/// Handles the --list mode
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let store = open(config)?;
    let projects = store.list_projects()?;

    if projects.is_empty() {
        println!("No projects in {}", config.output.database_path);
        return Ok(());
    }

    println!(
        "{:<36}  {:<10}  {:>6}  {:>6}  {:>6}  URL",
        "ID", "STATUS", "PAGES", "LINKS", "BROKEN"
    );
    for project in projects {
        println!(
            "{:<36}  {:<10}  {:>6}  {:>6}  {:>6}  {}",
            project.id,
            project.snapshot.status.to_string(),
            project.snapshot.pages.len(),
            project.snapshot.links.len(),
            project.snapshot.broken_links.len(),
            project.url
        );
    }

    Ok(())
}

/// Handles the --delete mode
fn handle_delete(config: &Config, id: &str) -> anyhow::Result<()> {
    let mut store = open(config)?;
    if !store.delete_project(id)? {
        bail!("Project not found: {}", id);
    }

    println!("✓ Deleted project {}", id);
    Ok(())
}

/// Handles the main scan operation
///
/// Every URL gets its own project (created `pending`); the scans then run
/// concurrently and share the database handle.
async fn handle_scan(config: &Config, config_hash: &str, urls: &[String]) -> anyhow::Result<()> {
    let store = Arc::new(Mutex::new(open(config)?));
    let launcher = Arc::new(HttpLauncher::new(config.user_agent.clone()));
    let settings = ScanSettings::from(&config.crawler);

    let mut scans = Vec::with_capacity(urls.len());
    for raw in urls {
        let url = normalize_url(raw, None).with_context(|| format!("Invalid URL: {}", raw))?;
        let project = store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .create_project(&url, config_hash)?;

        println!("Created project {} for {}", project.id, url);
        let handle = start_scan(
            Arc::clone(&store),
            Arc::clone(&launcher),
            settings,
            project.id.clone(),
            url.to_string(),
        );
        scans.push((project.id, handle));
    }

    let mut failures = 0;
    for (id, handle) in scans {
        if let Err(e) = handle.await {
            tracing::error!("[{}] Scan task aborted: {}", id, e);
            failures += 1;
            continue;
        }

        let project = store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_project(&id)?;
        let Some(project) = project else {
            tracing::warn!("[{}] Project disappeared before the scan finished", id);
            continue;
        };

        let snapshot = &project.snapshot;
        match snapshot.status {
            ScanStatus::Completed => println!(
                "✓ {} ({}): {} pages, {} links, {} broken links",
                project.url,
                id,
                snapshot.pages.len(),
                snapshot.links.len(),
                snapshot.broken_links.len()
            ),
            status => {
                failures += 1;
                println!(
                    "✗ {} ({}): {} - {}",
                    project.url,
                    id,
                    status,
                    snapshot.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} scans did not complete", failures, urls.len());
    }

    Ok(())
}
