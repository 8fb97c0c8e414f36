//! aw-importer-lastfm - Last.fm scrobble importer for ActivityWatch
//!
//! Watches a folder for scrobble CSV exports, turns every new scrobble into an
//! ActivityWatch event and renames each processed file to `<name>_imported.csv`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scrobble_common::config::{default_config_path, TomlConfig};
use scrobble_common::TriggerMode;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrobble_import::services::StatusLine;
use scrobble_import::store::activitywatch::{resolve_hostname, DEFAULT_SERVER_URL, TESTING_SERVER_URL};
use scrobble_import::store::ensure_bucket;
use scrobble_import::{ActivityWatchClient, FileImporter, Trigger};

/// Command-line arguments for aw-importer-lastfm
#[derive(Parser, Debug)]
#[command(name = "aw-importer-lastfm")]
#[command(about = "Import Last.fm scrobble exports into ActivityWatch")]
#[command(version)]
struct Args {
    /// Config file (defaults to the per-user config directory)
    #[arg(short, long, env = "AW_IMPORTER_LASTFM_CONFIG")]
    config: Option<PathBuf>,

    /// Use the testing server instead of the production one
    #[arg(long)]
    testing: bool,

    /// Trigger strategy, overrides the config file (poll or watch)
    #[arg(long)]
    trigger: Option<TriggerMode>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let default_filter = if args.verbose {
        "aw_importer_lastfm=debug,scrobble_import=debug,scrobble_common=debug"
    } else {
        "aw_importer_lastfm=info,scrobble_import=info,scrobble_common=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting aw-importer-lastfm");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path().context("Failed to locate config directory")?,
    };
    let config = TomlConfig::load_or_create(&config_path)
        .with_context(|| format!("Failed to load config file {}", config_path.display()))?;

    let mut settings = match config.validate() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(
                "{}. You can find the config file here: {}",
                e,
                config_path.display()
            );
            std::process::exit(1);
        }
    };
    if let Some(trigger) = args.trigger {
        settings.trigger = trigger;
    }

    info!("Data path: {}", settings.data_path.display());
    info!("Trigger: {}", settings.trigger);

    let server_url = if args.testing {
        TESTING_SERVER_URL.to_string()
    } else {
        settings
            .server_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    };
    let hostname = resolve_hostname(settings.hostname.as_deref());

    let client = Arc::new(
        ActivityWatchClient::new(&server_url, hostname).context("Failed to create client")?,
    );
    let bucket = client.bucket_name();
    ensure_bucket(client.as_ref(), &bucket)
        .await
        .with_context(|| format!("Failed to prepare bucket {} on {}", bucket, server_url))?;
    info!("Importing into bucket {} on {}", bucket, server_url);

    let importer = FileImporter::new(client, bucket, settings.default_duration);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let trigger = Trigger::from_settings(&settings);
    let mut status = StatusLine::stdout();
    trigger
        .run(&importer, &mut status, shutdown)
        .await
        .context("Trigger failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }

    token.cancel();
}
