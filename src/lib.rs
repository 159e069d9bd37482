//! moto-sentinel: telemetry push-notification dispatch
//!
//! Reacts to newly inserted telemetry records (GPS position reports and
//! vibration-sensor reports) and delivers a push notification for each
//! actionable one.
//!
//! ## Architecture
//!
//! - **Alert rules**: per-kind classification predicate and payload template
//! - **Pipeline**: the shared classify → validate → resolve → dispatch state machine
//! - **Credential store**: read-only user-id → push-token lookups (Firestore)
//! - **Push transport**: FCM HTTP v1 delivery
//! - **Change feed**: insert-event sources (Firestore polling, stdin replay)

pub mod config;
pub mod credentials;
pub mod dispatch_loop;
pub mod feed;
pub mod pipeline;
pub mod push;
pub mod types;

// Re-export the dispatch core
pub use pipeline::{AlertRule, Classification, Pipeline, PositionAlertRule, VibrationAlertRule};

// Re-export commonly used types
pub use types::{
    DispatchOutcome, FailureReason, PositionReport, RecordKind, SkipReason, VibrationReport,
};

// Re-export the external-interface seams
pub use credentials::{CredentialError, CredentialStore, FirestoreTokenStore, UserCredential};
pub use push::{FcmClient, PushMessage, PushTransport, TransportError};
