//! Outbound push-notification model and delivery seam
//!
//! [`PushMessage`] and its sub-structs serialize to FCM HTTP v1 JSON (the
//! camelCase protobuf mapping). Messages are ephemeral — assembled for one
//! dispatch call and dropped; nothing here is persisted.

mod fcm;

pub use fcm::FcmClient;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Push transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("push transport returned status {status}: {body}")]
    ServerError {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// One outbound push message, addressed to a single device token.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    /// Destination device token resolved from the credential store.
    pub token: String,
    pub notification: Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
    /// Flat machine-readable block; FCM requires string values.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

/// Human-visible notification content.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Android delivery hints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    pub priority: AndroidPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<AndroidNotification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AndroidPriority {
    Normal,
    High,
}

/// Android notification channel/sound/vibration overrides.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sound: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_priority: Option<NotificationPriority>,
    /// Alternating pause/buzz segments as protobuf durations ("0.500s").
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vibrate_timings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationPriority {
    #[serde(rename = "PRIORITY_DEFAULT")]
    Default,
    #[serde(rename = "PRIORITY_HIGH")]
    High,
}

/// APNs delivery hints (nested `payload.aps` shape required by Apple).
#[derive(Debug, Clone, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, Serialize)]
pub struct Aps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<ApsAlert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApsAlert {
    pub title: String,
    pub body: String,
}

/// Convert a millisecond pause/buzz pattern into protobuf duration strings.
pub fn vibrate_timings_from_millis(millis: &[u64]) -> Vec<String> {
    millis
        .iter()
        .map(|ms| {
            if ms % 1000 == 0 {
                format!("{}s", ms / 1000)
            } else {
                format!("{}.{:03}s", ms / 1000, ms % 1000)
            }
        })
        .collect()
}

/// Delivery seam for assembled messages.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Send one message; returns the transport's acknowledgment id.
    async fn send(&self, message: &PushMessage) -> Result<String, TransportError>;
}
