//! Vibration-report alert rule
//!
//! Every inserted vibration record is actionable — there is no status field
//! to classify on. The payload is fixed apart from the send timestamp.

use std::collections::BTreeMap;

use super::{AlertRule, Classification};
use crate::push::{
    AndroidConfig, AndroidNotification, AndroidPriority, Notification, NotificationPriority,
    PushMessage,
};
use crate::types::VibrationReport;

const TITLE: &str = "⚠️ Vibration Detected!";
const BODY: &str = "Getaran terdeteksi pada motor Anda!";

/// Android notification channel for vibration alerts.
const CHANNEL_ID: &str = "vibration_alert_channel";

/// Strategy variant for the `vibration_data` collection.
pub struct VibrationAlertRule;

impl AlertRule for VibrationAlertRule {
    type Record = VibrationReport;

    fn kind(&self) -> &'static str {
        "vibration_alert"
    }

    fn classify(&self, _record: &VibrationReport) -> Classification {
        Classification::Actionable
    }

    fn user_id<'r>(&self, record: &'r VibrationReport) -> Option<&'r str> {
        record.user_id.as_deref().filter(|id| !id.is_empty())
    }

    fn build(&self, _record: &VibrationReport, token: &str) -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), self.kind().to_string());
        data.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        PushMessage {
            token: token.to_string(),
            notification: Notification {
                title: TITLE.to_string(),
                body: BODY.to_string(),
            },
            android: Some(AndroidConfig {
                priority: AndroidPriority::High,
                notification: Some(AndroidNotification {
                    channel_id: Some(CHANNEL_ID.to_string()),
                    notification_priority: Some(NotificationPriority::High),
                    ..Default::default()
                }),
            }),
            apns: None,
            data,
        }
    }
}
