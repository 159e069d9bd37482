//! Reads insert events from stdin as JSON lines.
//!
//! Used for local replay and testing:
//! `cat events.jsonl | moto-sentinel --stdin`
//!
//! Each line is one insert event:
//! `{"collection": "gps_data", "id": "doc-1", "fields": {"status": "ALERT", ...}}`

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{ChangeFeed, FeedEvent, InsertEvent};
use crate::types::RecordKind;

#[derive(Debug, Deserialize)]
struct StdinLine {
    collection: String,
    id: String,
    #[serde(default)]
    fields: Value,
}

pub struct StdinFeed {
    reader: tokio::io::BufReader<tokio::io::Stdin>,
    line_buffer: String,
    gps_collection: String,
    vibration_collection: String,
}

impl StdinFeed {
    pub fn new(gps_collection: &str, vibration_collection: &str) -> Self {
        Self {
            reader: tokio::io::BufReader::new(tokio::io::stdin()),
            line_buffer: String::with_capacity(2048),
            gps_collection: gps_collection.to_string(),
            vibration_collection: vibration_collection.to_string(),
        }
    }

    fn kind_for(&self, collection: &str) -> Option<RecordKind> {
        if collection == self.gps_collection {
            Some(RecordKind::Position)
        } else if collection == self.vibration_collection {
            Some(RecordKind::Vibration)
        } else {
            None
        }
    }
}

#[async_trait]
impl ChangeFeed for StdinFeed {
    async fn next_event(&mut self) -> Result<FeedEvent> {
        use tokio::io::AsyncBufReadExt;
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(FeedEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<StdinLine>(line) {
                Ok(event) => match self.kind_for(&event.collection) {
                    Some(kind) => {
                        return Ok(FeedEvent::Inserted(InsertEvent {
                            kind,
                            doc_id: event.id,
                            fields: event.fields,
                        }))
                    }
                    None => {
                        tracing::warn!(
                            collection = %event.collection,
                            "[StdinFeed] Unknown collection, skipping event"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!("[StdinFeed] Failed to parse event: {}", e);
                    // Skip malformed lines and keep reading
                }
            }
        }
    }

    fn feed_name(&self) -> &str {
        "stdin"
    }
}
