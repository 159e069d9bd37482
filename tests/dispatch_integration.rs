//! Dispatch Integration Tests
//!
//! Exercises both alert pipelines end-to-end against an in-process mock of
//! the Firestore document API and the FCM v1 send endpoint, asserting on the
//! exact HTTP bodies the dispatcher produces.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use moto_sentinel::config::Settings;
use moto_sentinel::credentials::FirestoreTokenStore;
use moto_sentinel::dispatch_loop;
use moto_sentinel::feed::{ChangeFeed, FeedEvent, InsertEvent, PollFeed};
use moto_sentinel::pipeline::{Pipeline, PositionAlertRule, VibrationAlertRule};
use moto_sentinel::push::FcmClient;
use moto_sentinel::types::{DispatchOutcome, FailureReason, RecordKind, SkipReason};

// ============================================================================
// Mock Firestore + FCM backend
// ============================================================================

#[derive(Clone, Default)]
struct MockBackend {
    /// userId -> credential document fields (Firestore typed-value form)
    tokens: Arc<Mutex<HashMap<String, Value>>>,
    /// userIds looked up against the token collection
    lookups: Arc<Mutex<Vec<String>>>,
    /// collection -> listed documents (doc id, typed-value fields)
    collection_docs: Arc<Mutex<HashMap<String, Vec<(String, Value)>>>>,
    /// Message bodies accepted by the FCM endpoint
    sent: Arc<Mutex<Vec<Value>>>,
    /// Total send attempts, including rejected ones
    send_attempts: Arc<Mutex<u32>>,
    /// When true the FCM endpoint returns 500
    fail_sends: Arc<Mutex<bool>>,
}

impl MockBackend {
    fn set_token(&self, user_id: &str, token: &str) {
        self.tokens.lock().unwrap().insert(
            user_id.to_string(),
            json!({ "fcmToken": { "stringValue": token } }),
        );
    }

    fn insert_document(&self, collection: &str, doc_id: &str, fields: Value) {
        self.collection_docs
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push((doc_id.to_string(), fields));
    }

    fn set_credential_fields(&self, user_id: &str, fields: Value) {
        self.tokens
            .lock()
            .unwrap()
            .insert(user_id.to_string(), fields);
    }

    fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    fn send_attempts(&self) -> u32 {
        *self.send_attempts.lock().unwrap()
    }
}

/// Single fallback handler so the `messages:send` path (which carries a
/// colon inside a segment) needs no route-pattern support.
async fn route(State(backend): State<MockBackend>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if method == Method::GET {
        if let Some((_, doc_path)) = path.split_once("/documents/") {
            let mut parts = doc_path.splitn(2, '/');
            let collection = parts.next().unwrap_or_default().to_string();
            let doc_id = parts.next().unwrap_or_default().to_string();

            // Collection listing (documents.list)
            if doc_id.is_empty() {
                let docs = backend.collection_docs.lock().unwrap();
                let documents: Vec<Value> = docs
                    .get(&collection)
                    .map(|entries| {
                        entries
                            .iter()
                            .map(|(id, fields)| {
                                json!({
                                    "name": format!(
                                        "projects/test-project/databases/(default)/documents/{collection}/{id}"
                                    ),
                                    "fields": fields,
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                return (StatusCode::OK, Json(json!({ "documents": documents }))).into_response();
            }

            // Credential point lookup (documents.get)
            if collection == "user_tokens" {
                backend.lookups.lock().unwrap().push(doc_id.clone());
                let fields = backend.tokens.lock().unwrap().get(&doc_id).cloned();
                return match fields {
                    Some(fields) => (
                        StatusCode::OK,
                        Json(json!({
                            "name": format!(
                                "projects/test-project/databases/(default)/documents/user_tokens/{doc_id}"
                            ),
                            "fields": fields,
                        })),
                    )
                        .into_response(),
                    None => (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "error": { "code": 404, "status": "NOT_FOUND" } })),
                    )
                        .into_response(),
                };
            }
        }
        return StatusCode::NOT_FOUND.into_response();
    }

    if method == Method::POST && path.ends_with(":send") {
        let bytes = match axum::body::to_bytes(request.into_body(), 1 << 20).await {
            Ok(bytes) => bytes,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };
        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };

        *backend.send_attempts.lock().unwrap() += 1;
        if *backend.fail_sends.lock().unwrap() {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": { "code": 500, "status": "INTERNAL" } })),
            )
                .into_response();
        }

        let message_number = {
            let mut sent = backend.sent.lock().unwrap();
            sent.push(body["message"].clone());
            sent.len()
        };
        return (
            StatusCode::OK,
            Json(json!({
                "name": format!("projects/test-project/messages/{message_number}")
            })),
        )
            .into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

async fn start_mock() -> (MockBackend, String) {
    let backend = MockBackend::default();
    let app = Router::new()
        .fallback(route)
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    (backend, format!("http://{addr}"))
}

fn make_pipeline(base_url: &str) -> Pipeline<FirestoreTokenStore, FcmClient> {
    let timeout = Duration::from_secs(5);
    Pipeline::new(
        FirestoreTokenStore::new(base_url, "test-project", "user_tokens", None, timeout),
        FcmClient::new(base_url, "test-project", None, timeout),
    )
}

// ============================================================================
// Position pipeline
// ============================================================================

#[tokio::test]
async fn alert_record_dispatches_full_payload() {
    let (backend, base_url) = start_mock().await;
    backend.set_token("u1", "tok1");

    let outcome = make_pipeline(&base_url)
        .process(
            &PositionAlertRule,
            "doc-a",
            json!({
                "status": "ALERT",
                "userId": "u1",
                "distance": 150,
                "safeZoneRadius": 100,
            }),
        )
        .await;

    assert_eq!(outcome.message_id(), Some("projects/test-project/messages/1"));
    assert_eq!(backend.lookups(), vec!["u1".to_string()]);

    let sent = backend.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message["token"], "tok1");
    assert_eq!(message["notification"]["title"], "🚨 GPS Alert - Zone Breach!");
    assert_eq!(
        message["notification"]["body"],
        "Device keluar safe zone! Jarak: 150m | Radius: 100m"
    );
    assert_eq!(message["android"]["priority"], "HIGH");
    assert_eq!(
        message["android"]["notification"]["channelId"],
        "gps_alert_channel"
    );
    assert_eq!(
        message["android"]["notification"]["vibrateTimings"],
        json!(["0s", "0.500s", "0.200s", "0.500s", "0.200s", "0.500s"])
    );
    assert_eq!(message["apns"]["payload"]["aps"]["badge"], 1);
    assert_eq!(
        message["apns"]["payload"]["aps"]["sound"],
        "alert_ringtone.mp3"
    );
    assert_eq!(message["data"]["type"], "gps_alert");
    assert_eq!(message["data"]["distance"], "150");
    assert_eq!(message["data"]["radius"], "100");
}

#[tokio::test]
async fn absent_metrics_dispatch_with_placeholders() {
    let (backend, base_url) = start_mock().await;
    backend.set_token("u2", "tok2");

    let outcome = make_pipeline(&base_url)
        .process(
            &PositionAlertRule,
            "doc-b",
            json!({ "status": "ALERT", "userId": "u2" }),
        )
        .await;

    assert!(outcome.is_delivered());

    let sent = backend.sent();
    assert_eq!(
        sent[0]["notification"]["body"],
        "Device keluar safe zone! Jarak: ?m | Radius: ?m"
    );
    assert_eq!(sent[0]["data"]["distance"], "?");
    assert_eq!(sent[0]["data"]["radius"], "?");
}

#[tokio::test]
async fn non_alert_record_makes_no_backend_calls() {
    let (backend, base_url) = start_mock().await;
    backend.set_token("u3", "tok3");

    let outcome = make_pipeline(&base_url)
        .process(
            &PositionAlertRule,
            "doc-c",
            json!({ "status": "OK", "userId": "u3" }),
        )
        .await;

    assert!(matches!(
        outcome,
        DispatchOutcome::Skipped(SkipReason::NotActionable { .. })
    ));
    assert!(backend.lookups().is_empty());
    assert_eq!(backend.send_attempts(), 0);
}

#[tokio::test]
async fn missing_user_id_fails_without_backend_calls() {
    let (backend, base_url) = start_mock().await;

    let outcome = make_pipeline(&base_url)
        .process(&PositionAlertRule, "doc-d", json!({ "status": "ALERT" }))
        .await;

    assert_eq!(outcome, DispatchOutcome::Failed(FailureReason::MissingUserId));
    assert!(backend.lookups().is_empty());
    assert_eq!(backend.send_attempts(), 0);
}

// ============================================================================
// Vibration pipeline
// ============================================================================

#[tokio::test]
async fn vibration_record_dispatches_fixed_template() {
    let (backend, base_url) = start_mock().await;
    backend.set_token("u5", "tok5");

    let outcome = make_pipeline(&base_url)
        .process(&VibrationAlertRule, "doc-e", json!({ "userId": "u5" }))
        .await;

    assert!(outcome.is_delivered());

    let sent = backend.sent();
    let message = &sent[0];
    assert_eq!(message["token"], "tok5");
    assert_eq!(message["notification"]["title"], "⚠️ Vibration Detected!");
    assert_eq!(
        message["notification"]["body"],
        "Getaran terdeteksi pada motor Anda!"
    );
    assert_eq!(
        message["android"]["notification"]["channelId"],
        "vibration_alert_channel"
    );
    assert!(message.get("apns").is_none());
    assert_eq!(message["data"]["type"], "vibration_alert");
}

#[tokio::test]
async fn missing_credential_skips_without_dispatch() {
    let (backend, base_url) = start_mock().await;

    let outcome = make_pipeline(&base_url)
        .process(&VibrationAlertRule, "doc-f", json!({ "userId": "u4" }))
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Skipped(SkipReason::CredentialMissing)
    );
    assert_eq!(backend.lookups(), vec!["u4".to_string()]);
    assert_eq!(backend.send_attempts(), 0);
}

#[tokio::test]
async fn empty_token_skips_without_dispatch() {
    let (backend, base_url) = start_mock().await;
    backend.set_credential_fields("u6", json!({ "fcmToken": { "stringValue": "" } }));

    let outcome = make_pipeline(&base_url)
        .process(&VibrationAlertRule, "doc-g", json!({ "userId": "u6" }))
        .await;

    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::TokenEmpty));
    assert_eq!(backend.send_attempts(), 0);
}

// ============================================================================
// Shared contract
// ============================================================================

#[tokio::test]
async fn transport_failure_is_absorbed_after_one_attempt() {
    let (backend, base_url) = start_mock().await;
    backend.set_token("u7", "tok7");
    *backend.fail_sends.lock().unwrap() = true;

    let outcome = make_pipeline(&base_url)
        .process(&VibrationAlertRule, "doc-h", json!({ "userId": "u7" }))
        .await;

    assert!(matches!(
        outcome,
        DispatchOutcome::Failed(FailureReason::Delivery(_))
    ));
    assert_eq!(backend.send_attempts(), 1);
}

#[tokio::test]
async fn dispatch_timestamp_is_current_iso8601() {
    let (backend, base_url) = start_mock().await;
    backend.set_token("u8", "tok8");

    make_pipeline(&base_url)
        .process(&VibrationAlertRule, "doc-i", json!({ "userId": "u8" }))
        .await;

    let sent = backend.sent();
    let stamp = sent[0]["data"]["timestamp"].as_str().unwrap();
    let parsed = chrono::DateTime::parse_from_rfc3339(stamp).unwrap();
    let age = chrono::Utc::now().signed_duration_since(parsed.with_timezone(&chrono::Utc));
    assert!(age.num_seconds().abs() < 10, "timestamp not near now: {stamp}");
}

// ============================================================================
// Poll feed
// ============================================================================

#[tokio::test]
async fn poll_feed_emits_only_documents_inserted_after_priming() {
    let (backend, base_url) = start_mock().await;
    backend.insert_document(
        "gps_data",
        "doc-old",
        json!({
            "status": { "stringValue": "ALERT" },
            "userId": { "stringValue": "u1" },
        }),
    );

    let mut settings = Settings::default();
    settings.firebase.project_id = "test-project".to_string();
    settings.firebase.firestore_url = base_url.clone();
    settings.feed.poll_interval_secs = 0;
    settings.feed.poll_jitter_secs = 0;

    let mut feed = PollFeed::new(&settings);

    // Insert a fresh document shortly after the feed primes itself.
    let writer = backend.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        writer.insert_document(
            "gps_data",
            "doc-new",
            json!({
                "status": { "stringValue": "ALERT" },
                "userId": { "stringValue": "u2" },
                "distance": { "integerValue": "150" },
            }),
        );
    });

    let event = tokio::time::timeout(Duration::from_secs(5), feed.next_event())
        .await
        .expect("poll feed timed out")
        .unwrap();

    let FeedEvent::Inserted(insert) = event else {
        panic!("expected an insert event");
    };
    // doc-old predates startup and must never fire.
    assert_eq!(insert.doc_id, "doc-new");
    assert_eq!(insert.kind, RecordKind::Position);
    // Typed values arrive decoded to plain JSON.
    assert_eq!(insert.fields["userId"], "u2");
    assert_eq!(insert.fields["distance"], 150);
}

// ============================================================================
// Dispatch loop
// ============================================================================

/// Feed double that replays a fixed list of events, then EOF.
struct ReplayFeed {
    events: std::collections::VecDeque<InsertEvent>,
}

#[async_trait::async_trait]
impl ChangeFeed for ReplayFeed {
    async fn next_event(&mut self) -> anyhow::Result<FeedEvent> {
        Ok(match self.events.pop_front() {
            Some(event) => FeedEvent::Inserted(event),
            None => FeedEvent::Eof,
        })
    }

    fn feed_name(&self) -> &str {
        "replay"
    }
}

#[tokio::test]
async fn dispatch_loop_routes_by_kind_and_drains_in_flight_sends() {
    let (backend, base_url) = start_mock().await;
    backend.set_token("u1", "tok1");
    backend.set_token("u5", "tok5");

    let mut feed = ReplayFeed {
        events: [
            InsertEvent {
                kind: RecordKind::Position,
                doc_id: "doc-1".to_string(),
                fields: json!({ "status": "ALERT", "userId": "u1", "distance": 12, "safeZoneRadius": 10 }),
            },
            InsertEvent {
                kind: RecordKind::Position,
                doc_id: "doc-2".to_string(),
                fields: json!({ "status": "OK", "userId": "u1" }),
            },
            InsertEvent {
                kind: RecordKind::Vibration,
                doc_id: "doc-3".to_string(),
                fields: json!({ "userId": "u5" }),
            },
        ]
        .into_iter()
        .collect(),
    };

    let pipeline = Arc::new(make_pipeline(&base_url));
    let cancel_token = tokio_util::sync::CancellationToken::new();
    let events_seen = dispatch_loop::run(&mut feed, pipeline, cancel_token).await;

    assert_eq!(events_seen, 3);

    // Loop waited for in-flight dispatches: both actionable records landed.
    let sent = backend.sent();
    assert_eq!(sent.len(), 2);
    let types: Vec<&str> = sent
        .iter()
        .map(|m| m["data"]["type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"gps_alert"));
    assert!(types.contains(&"vibration_alert"));
}
