use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use portada::api::{ApiClient, RetryPolicy, TimeFilter};
use portada::app::{App, AppEvent};
use portada::config::Config;
use portada::selection::Selection;
use portada::{notify, ui};

/// Get the config file path (~/.config/portada/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("portada")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "portada",
    about = "Terminal client for a news-aggregation backend"
)]
struct Args {
    /// Base URL of the backend API (overrides config)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Start with this category selected
    #[arg(long, value_name = "ID")]
    category: Option<i64>,

    /// Start with this subcategory selected (requires --category)
    #[arg(long, value_name = "ID", requires = "category")]
    subcategory: Option<i64>,

    /// Time window: 24h, 48h or 72h (overrides config)
    #[arg(long, value_name = "FILTER")]
    time_filter: Option<TimeFilter>,

    /// Path to the config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable update notifications for this session
    #[arg(long)]
    no_notifications: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let base_url = args
        .api_url
        .as_deref()
        .unwrap_or(&config.api_base_url);
    let base = Url::parse(base_url)
        .with_context(|| format!("Invalid API base URL: {}", base_url))?;

    let time_filter = match args.time_filter {
        Some(filter) => filter,
        None => config
            .parsed_time_filter()
            .context("Invalid time_filter in config")?,
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("portada/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let client = ApiClient::new(
        base,
        http,
        RetryPolicy {
            max_retries: config.max_retries,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        },
    );

    let selection = Selection::new(args.category, args.subcategory, time_filter);
    let mut app = App::new(client.clone(), selection);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Update poller runs for the whole session unless disabled
    let notifications = config.notifications && !args.no_notifications;
    let poller = if notifications && config.poll_interval_secs > 0 {
        Some(tokio::spawn(notify::poll_updates(
            client,
            event_tx.clone(),
            Duration::from_secs(config.poll_interval_secs),
        )))
    } else {
        tracing::info!("Update notifications disabled");
        None
    };

    // Run the TUI
    let result = ui::run(&mut app, event_tx, event_rx).await;

    if let Some(handle) = poller {
        handle.abort();
    }

    result
}
