//! Firestore polling feed.
//!
//! Approximates the document store's insert trigger by sweeping the watched
//! collections on an interval and emitting documents not seen before. The
//! first sweep only primes the seen-set, so documents that predate startup
//! never fire — matching on-create trigger semantics. Restarting re-primes
//! against the current collection contents; inserts that happened while the
//! process was down are not replayed.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ChangeFeed, FeedEvent, InsertEvent};
use crate::config::defaults::{POLL_BACKOFF_CAP_SECS, POLL_MAX_BACKOFF_EXPONENT};
use crate::config::Settings;
use crate::types::RecordKind;

/// One page of a `documents.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<ListedDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedDocument {
    /// Fully qualified resource name; the last segment is the doc id.
    name: String,
    #[serde(default)]
    fields: Value,
}

pub struct PollFeed {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    bearer_token: Option<String>,
    collections: Vec<(RecordKind, String)>,
    interval_secs: u64,
    jitter_secs: u64,
    page_size: u32,
    seen: HashSet<String>,
    pending: VecDeque<InsertEvent>,
    primed: bool,
    consecutive_failures: u32,
}

impl PollFeed {
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: settings.firebase.firestore_url.trim_end_matches('/').to_string(),
            project_id: settings.firebase.project_id.clone(),
            bearer_token: settings.firebase.bearer_token.clone(),
            collections: vec![
                (RecordKind::Position, settings.collections.gps.clone()),
                (RecordKind::Vibration, settings.collections.vibration.clone()),
            ],
            interval_secs: settings.feed.poll_interval_secs,
            jitter_secs: settings.feed.poll_jitter_secs,
            page_size: settings.feed.page_size,
            seen: HashSet::new(),
            pending: VecDeque::new(),
            primed: false,
            consecutive_failures: 0,
        }
    }

    /// Sweep all watched collections once, returning unseen documents.
    async fn sweep(&mut self) -> Result<Vec<InsertEvent>> {
        let collections = self.collections.clone();
        let mut events = Vec::new();

        for (kind, collection) in &collections {
            let url = format!(
                "{}/v1/projects/{}/databases/(default)/documents/{}",
                self.base_url, self.project_id, collection
            );
            let mut page_token: Option<String> = None;

            loop {
                let mut req = self
                    .http
                    .get(&url)
                    .query(&[("pageSize", self.page_size.to_string())]);
                if let Some(token) = &page_token {
                    req = req.query(&[("pageToken", token.as_str())]);
                }
                if let Some(bearer) = &self.bearer_token {
                    req = req.header("Authorization", format!("Bearer {bearer}"));
                }

                let resp = req.send().await?;
                if !resp.status().is_success() {
                    bail!(
                        "listing collection {} returned status {}",
                        collection,
                        resp.status()
                    );
                }

                let page: ListResponse = resp.json().await?;
                for doc in page.documents {
                    if !self.seen.insert(doc.name.clone()) {
                        continue;
                    }
                    let doc_id = doc
                        .name
                        .rsplit('/')
                        .next()
                        .unwrap_or(doc.name.as_str())
                        .to_string();
                    events.push(InsertEvent {
                        kind: *kind,
                        doc_id,
                        fields: decode_document_fields(&doc.fields),
                    });
                }

                match page.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl ChangeFeed for PollFeed {
    async fn next_event(&mut self) -> Result<FeedEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(FeedEvent::Inserted(event));
            }

            let jitter = if self.jitter_secs > 0 {
                rand::thread_rng().gen_range(0..self.jitter_secs)
            } else {
                0
            };

            match self.sweep().await {
                Ok(new_events) => {
                    self.consecutive_failures = 0;
                    if self.primed {
                        self.pending.extend(new_events);
                    } else {
                        // First sweep only fills the seen-set.
                        debug!(
                            existing = self.seen.len(),
                            "[PollFeed] Primed against current collection contents"
                        );
                        self.primed = true;
                    }
                    if self.pending.is_empty() {
                        tokio::time::sleep(Duration::from_secs(self.interval_secs + jitter))
                            .await;
                    }
                }
                Err(e) => {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    let backoff = 1u64 << self.consecutive_failures.min(POLL_MAX_BACKOFF_EXPONENT);
                    let backoff_secs =
                        (self.interval_secs.saturating_mul(backoff)).min(POLL_BACKOFF_CAP_SECS);
                    warn!(
                        error = %e,
                        consecutive_failures = self.consecutive_failures,
                        next_retry_secs = backoff_secs + jitter,
                        "Poll sweep failed, backing off"
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs + jitter)).await;
                }
            }
        }
    }

    fn feed_name(&self) -> &str {
        "firestore-poll"
    }
}

/// Strip Firestore's typed-value wrappers from a document's field map.
///
/// `{"distance": {"integerValue": "150"}}` becomes `{"distance": 150}`, so
/// the pipeline sees the same plain JSON shape the stdin feed delivers.
fn decode_document_fields(fields: &Value) -> Value {
    match fields.as_object() {
        Some(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), decode_value(value)))
                .collect(),
        ),
        None => Value::Object(serde_json::Map::new()),
    }
}

fn decode_value(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return Value::Null;
    };
    let Some((tag, inner)) = map.iter().next() else {
        return Value::Null;
    };
    match tag.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" => inner.clone(),
        "doubleValue" | "booleanValue" => inner.clone(),
        // Firestore serializes 64-bit integers as JSON strings
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map_or(Value::Null, Value::from),
        "nullValue" => Value::Null,
        "mapValue" => decode_document_fields(inner.get("fields").unwrap_or(&Value::Null)),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}
