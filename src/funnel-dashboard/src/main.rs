//! Funnel Dashboard — UTM funnel analytics over tracked application sessions.
//!
//! Loads the configured dataset, then either serves the dashboard API or
//! prints a one-off report.

use clap::{Parser, Subcommand};
use funnel_api::ApiServer;
use funnel_core::config::AppConfig;
use funnel_source::{DatasetLoader, JsonFileSource};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "funnel-dashboard")]
#[command(about = "UTM funnel analytics for tracked application sessions")]
#[command(version)]
struct Cli {
    /// Dataset file with `sessions` and `utm_urls` (overrides config)
    #[arg(long, env = "FUNNEL_DASHBOARD__SOURCE__DATA_PATH")]
    data: Option<String>,

    /// Only load sessions from the last N days (overrides config)
    #[arg(long, env = "FUNNEL_DASHBOARD__SOURCE__DAYS_BACK")]
    days_back: Option<u32>,

    /// HTTP port (overrides config)
    #[arg(long, env = "FUNNEL_DASHBOARD__API__HTTP_PORT")]
    http_port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard API (default)
    Serve,
    /// Load the dataset once and print the report as JSON
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "funnel_dashboard=info,funnel_source=info,tower_http=info".into()
            }),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(data) = cli.data {
        config.source.data_path = data;
    }
    if let Some(days) = cli.days_back {
        config.source.days_back = days;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }

    info!(
        data_path = %config.source.data_path,
        days_back = config.source.days_back,
        http_port = config.api.http_port,
        "Configuration loaded"
    );

    let source = Arc::new(JsonFileSource::from_config(&config.source));
    let loader = Arc::new(DatasetLoader::new(source, &config.source));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Report => {
            let snapshot = loader.refresh().await?;
            let mut report = serde_json::to_value(&snapshot.report)?;
            if let Some(fields) = report.as_object_mut() {
                fields.insert(
                    "last_updated".to_string(),
                    serde_json::to_value(snapshot.last_updated)?,
                );
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve => {
            // A failed first load leaves the API answering 503 until a refresh succeeds.
            if let Err(e) = loader.refresh().await {
                error!(error = %e, "Initial dataset load failed");
            }

            let api_server = ApiServer::new(config.clone(), loader);

            if config.metrics.enabled {
                if let Err(e) = api_server.start_metrics() {
                    error!(error = %e, "Failed to start metrics exporter");
                }
            }

            info!("Funnel Dashboard is ready to serve traffic");

            // Start HTTP server (blocks until shutdown)
            api_server.start_http().await?;
        }
    }

    Ok(())
}
