//! AppSearch-RS: an App Search client written in Rust
//!
//! Command-line entry point: runs one search and prints the result as JSON.

use anyhow::Result;
use appsearch_rs::{config, Client, SearchOptions, Settings};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Run one App Search query and print the formatted result list
#[derive(Debug, Parser)]
#[command(
    name = "appsearch-rs",
    version,
    about = "An App Search client written in Rust",
    after_help = "ENVIRONMENT VARIABLES:
    APPSEARCH_HOST_IDENTIFIER   Host identifier
    APPSEARCH_SEARCH_KEY        Public search key
    APPSEARCH_ENGINE_NAME       Engine name
    APPSEARCH_ENDPOINT_BASE     Base URL for self-managed deployments
    APPSEARCH_CACHE_RESPONSES   Cache identical requests (true/false)
    APPSEARCH_LOG               Log filter (default: info)"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "APPSEARCH_SETTINGS_PATH")]
    config: Option<PathBuf>,

    /// Search options as JSON, e.g. '{"disjunctive_facets": ["states"]}'
    #[arg(short, long, value_parser = parse_options)]
    options: Option<SearchOptions>,

    /// Query text
    query: String,
}

fn parse_options(raw: &str) -> std::result::Result<SearchOptions, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid options JSON: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_env("APPSEARCH_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting AppSearch-RS v{}", appsearch_rs::VERSION);

    // Load configuration
    let settings = load_settings(cli.config.as_ref())?;
    info!("Using engine: {}", settings.client.engine_name);

    let options = cli.options.unwrap_or_default();
    let client = Client::new(settings)?;
    let results = client.search(&cli.query, &options).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// Load settings from file or use defaults, then apply environment overrides
fn load_settings(explicit: Option<&PathBuf>) -> Result<&'static Settings> {
    if let Some(path) = explicit {
        info!("Loading settings from: {}", path.display());
        return Ok(config::init_from_file(path)?);
    }

    let paths = [
        PathBuf::from("appsearch.yml"),
        PathBuf::from("config/appsearch.yml"),
        dirs::config_dir()
            .map(|p| p.join("appsearch-rs/appsearch.yml"))
            .unwrap_or_default(),
    ];

    for path in paths.iter() {
        if path.is_file() {
            info!("Loading settings from: {}", path.display());
            return Ok(config::init_from_file(path)?);
        }
    }

    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(config::init(settings)?)
}
