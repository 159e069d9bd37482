//! Position-report alert rule (safe-zone breach)
//!
//! Only records the device flagged as `"ALERT"` fire; every other status is
//! a deliberate no-op. Distance and radius are display values — when absent
//! they render as `"?"` both in the body and in the outbound data block,
//! and the placeholder is never fed back into numeric logic.

use std::collections::BTreeMap;

use super::{AlertRule, Classification};
use crate::push::{
    vibrate_timings_from_millis, AndroidConfig, AndroidNotification, AndroidPriority, Aps,
    ApsAlert, ApnsConfig, ApnsPayload, Notification, NotificationPriority, PushMessage,
};
use crate::types::PositionReport;

/// Notification title for safe-zone breaches.
const TITLE: &str = "🚨 GPS Alert - Zone Breach!";

/// Android notification channel for GPS alerts.
const CHANNEL_ID: &str = "gps_alert_channel";

/// Sound asset, reused by the Android and APNs blocks.
const SOUND: &str = "alert_ringtone";
const APNS_SOUND: &str = "alert_ringtone.mp3";

/// Pause/buzz pattern (ms): immediate start, three 500 ms buzzes.
const VIBRATE_PATTERN_MS: [u64; 6] = [0, 500, 200, 500, 200, 500];

/// Rendered in place of an absent distance or radius.
const PLACEHOLDER: &str = "?";

/// Strategy variant for the `gps_data` collection.
pub struct PositionAlertRule;

impl PositionAlertRule {
    fn display(value: Option<f64>) -> String {
        value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
    }
}

impl AlertRule for PositionAlertRule {
    type Record = PositionReport;

    fn kind(&self) -> &'static str {
        "gps_alert"
    }

    fn classify(&self, record: &PositionReport) -> Classification {
        if record.is_alert() {
            Classification::Actionable
        } else {
            Classification::Ignore {
                status: record.status.clone(),
            }
        }
    }

    fn user_id<'r>(&self, record: &'r PositionReport) -> Option<&'r str> {
        record.user_id.as_deref().filter(|id| !id.is_empty())
    }

    fn build(&self, record: &PositionReport, token: &str) -> PushMessage {
        let distance = Self::display(record.distance);
        let radius = Self::display(record.safe_zone_radius);
        let body = format!("Device keluar safe zone! Jarak: {distance}m | Radius: {radius}m");

        let mut data = BTreeMap::new();
        data.insert("type".to_string(), self.kind().to_string());
        data.insert("distance".to_string(), distance);
        data.insert("radius".to_string(), radius);
        data.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        PushMessage {
            token: token.to_string(),
            notification: Notification {
                title: TITLE.to_string(),
                body: body.clone(),
            },
            android: Some(AndroidConfig {
                priority: AndroidPriority::High,
                notification: Some(AndroidNotification {
                    channel_id: Some(CHANNEL_ID.to_string()),
                    sound: Some(SOUND.to_string()),
                    default_sound: Some(false),
                    notification_priority: Some(NotificationPriority::High),
                    vibrate_timings: vibrate_timings_from_millis(&VIBRATE_PATTERN_MS),
                }),
            }),
            apns: Some(ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: Some(APNS_SOUND.to_string()),
                        badge: Some(1),
                        alert: Some(ApsAlert {
                            title: TITLE.to_string(),
                            body,
                        }),
                    },
                },
            }),
            data,
        }
    }
}
