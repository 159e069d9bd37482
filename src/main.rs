//! moto-sentinel - Telemetry Push-Notification Dispatcher
//!
//! Watches the GPS and vibration telemetry collections and delivers an FCM
//! push notification for each actionable insert.
//!
//! # Usage
//!
//! ```bash
//! # Poll Firestore for new records (default)
//! moto-sentinel
//!
//! # Replay insert events from stdin (JSON lines)
//! cat events.jsonl | moto-sentinel --stdin
//! ```
//!
//! # Environment Variables
//!
//! - `SENTINEL_CONFIG`: Path to a TOML settings file
//! - `SENTINEL_FCM_TOKEN`: OAuth bearer token for Firestore/FCM
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use moto_sentinel::config::{self, Settings};
use moto_sentinel::credentials::FirestoreTokenStore;
use moto_sentinel::dispatch_loop;
use moto_sentinel::feed::{PollFeed, StdinFeed};
use moto_sentinel::pipeline::Pipeline;
use moto_sentinel::push::FcmClient;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "moto-sentinel")]
#[command(about = "Telemetry push-notification dispatcher")]
#[command(version)]
struct CliArgs {
    /// Read insert events from stdin (JSON lines) instead of polling Firestore
    #[arg(long)]
    stdin: bool,

    /// Path to a TOML settings file (takes precedence over SENTINEL_CONFIG)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the poll interval in seconds
    #[arg(long, value_name = "SECS")]
    poll_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Load dispatcher settings
    let mut settings = match &args.config {
        Some(path) => Settings::load_from_file(std::path::Path::new(path))
            .with_context(|| format!("loading settings from {path}"))?
            .with_env_overrides(),
        None => Settings::load(),
    };
    if let Some(secs) = args.poll_interval {
        settings.feed.poll_interval_secs = secs;
    }

    info!(
        "Project: {} | GPS: {} | Vibration: {} | Tokens: {}",
        settings.firebase.project_id,
        settings.collections.gps,
        settings.collections.vibration,
        settings.collections.tokens
    );
    if settings.firebase.bearer_token.is_none() {
        info!("No bearer token configured — assuming emulator/unauthenticated endpoints");
    }
    config::init(settings);
    let settings = config::get();

    // Construct the process-wide clients once, before the first invocation;
    // they are shared read-only by every spawned dispatch afterwards.
    let timeout = Duration::from_secs(settings.http.timeout_secs);
    let credentials = FirestoreTokenStore::new(
        &settings.firebase.firestore_url,
        &settings.firebase.project_id,
        &settings.collections.tokens,
        settings.firebase.bearer_token.clone(),
        timeout,
    );
    let transport = FcmClient::new(
        &settings.firebase.fcm_url,
        &settings.firebase.project_id,
        settings.firebase.bearer_token.clone(),
        timeout,
    );
    let pipeline = Arc::new(Pipeline::new(credentials, transport));

    // Graceful shutdown on ctrl-c
    let cancel_token = CancellationToken::new();
    {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, shutting down");
                cancel_token.cancel();
            }
        });
    }

    let events_seen = if args.stdin {
        let mut feed = StdinFeed::new(&settings.collections.gps, &settings.collections.vibration);
        dispatch_loop::run(&mut feed, pipeline, cancel_token).await
    } else {
        let mut feed = PollFeed::new(settings);
        dispatch_loop::run(&mut feed, pipeline, cancel_token).await
    };

    info!("Dispatcher stopped ({} events seen)", events_seen);
    Ok(())
}
