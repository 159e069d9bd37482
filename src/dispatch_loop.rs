//! Unified insert-event consumption loop shared across all feed modes.
//!
//! Routes each event to the matching alert rule and spawns one pipeline
//! invocation per record. Invocations are fully independent — no shared
//! mutable state and no ordering guarantee between records; within one
//! invocation the pipeline itself sequences credential lookup before
//! dispatch. Outcomes are logged inside the pipeline and never fed back to
//! the feed.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::credentials::CredentialStore;
use crate::feed::{ChangeFeed, FeedEvent};
use crate::pipeline::{Pipeline, PositionAlertRule, VibrationAlertRule};
use crate::push::PushTransport;
use crate::types::RecordKind;

/// Consume the feed until EOF or cancellation.
///
/// Waits for in-flight dispatches to finish before returning. Returns the
/// number of insert events seen.
pub async fn run<F, S, T>(
    feed: &mut F,
    pipeline: Arc<Pipeline<S, T>>,
    cancel_token: CancellationToken,
) -> u64
where
    F: ChangeFeed,
    S: CredentialStore + 'static,
    T: PushTransport + 'static,
{
    let mut events_seen = 0u64;
    let mut tasks: JoinSet<()> = JoinSet::new();

    info!("Watching for telemetry inserts from {}...", feed.feed_name());

    loop {
        let event = tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("[DispatchLoop] Shutdown signal received");
                break;
            }
            result = feed.next_event() => {
                match result {
                    Ok(ev) => ev,
                    Err(e) => {
                        warn!("[DispatchLoop] Feed error: {}", e);
                        break;
                    }
                }
            }
        };

        let insert = match event {
            FeedEvent::Inserted(insert) => insert,
            FeedEvent::Eof => {
                info!(
                    "[DispatchLoop] Feed reached end ({} events seen)",
                    events_seen
                );
                break;
            }
        };

        events_seen += 1;

        let pipeline = Arc::clone(&pipeline);
        tasks.spawn(async move {
            match insert.kind {
                RecordKind::Position => {
                    pipeline
                        .process(&PositionAlertRule, &insert.doc_id, insert.fields)
                        .await;
                }
                RecordKind::Vibration => {
                    pipeline
                        .process(&VibrationAlertRule, &insert.doc_id, insert.fields)
                        .await;
                }
            }
        });

        // Reap finished invocations so the set never grows unbounded.
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                warn!("[DispatchLoop] Dispatch task panicked: {}", e);
            }
        }
    }

    // Let in-flight dispatches complete before shutting down.
    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            warn!("[DispatchLoop] Dispatch task panicked: {}", e);
        }
    }

    events_seen
}
