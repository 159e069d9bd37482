//! Change-feed abstraction over the telemetry collections.
//!
//! The document store's change-notification mechanism is an external
//! collaborator; the dispatcher only consumes insert events. Implementations
//! handle transport, pacing, and recovery internally. The dispatcher never
//! writes back to the store.

mod poll;
mod stdin;

pub use poll::PollFeed;
pub use stdin::StdinFeed;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::types::RecordKind;

/// One newly inserted telemetry document.
#[derive(Debug, Clone)]
pub struct InsertEvent {
    /// Which watched collection the document landed in.
    pub kind: RecordKind,
    /// Opaque document identifier, used only for diagnostics.
    pub doc_id: String,
    /// Raw field set as inserted by the device ingest path.
    pub fields: Value,
}

/// Events produced by a change feed.
pub enum FeedEvent {
    /// A record was inserted into one of the watched collections.
    Inserted(InsertEvent),
    /// Feed reached end of data (EOF for stdin replay; polling never ends).
    Eof,
}

/// Trait abstracting where insert events come from.
///
/// The dispatch loop calls [`next_event`](ChangeFeed::next_event) in a
/// select! with cancellation.
#[async_trait]
pub trait ChangeFeed: Send + 'static {
    /// Wait for the next insert event.
    ///
    /// Returns `FeedEvent::Eof` when no more data will arrive.
    /// Returns `Err` on unrecoverable errors.
    async fn next_event(&mut self) -> Result<FeedEvent>;

    /// Human-readable name for logging (e.g. "stdin", "firestore-poll").
    fn feed_name(&self) -> &str;
}
