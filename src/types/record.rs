//! Telemetry record wire types
//!
//! Snapshots of freshly inserted documents as the device ingest path wrote
//! them. Every field is optional on the wire; the pipeline decides what a
//! missing field means (skip, placeholder, or validation failure).

use serde::{Deserialize, Serialize};

/// Status value that marks a position report as actionable.
pub const ALERT_STATUS: &str = "ALERT";

/// Which telemetry collection a record was inserted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// GPS position report (`gps_data` collection)
    Position,
    /// Vibration-sensor report (`vibration_data` collection)
    Vibration,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Vibration => "vibration",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPS position report
///
/// `distance` and `safe_zone_radius` are metres from the configured safe-zone
/// centre; either may be absent when the device could not compute them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionReport {
    /// Device-reported zone state; only `"ALERT"` triggers a notification.
    pub status: Option<String>,
    /// Owning user. Required — a record without one is unprocessable.
    pub user_id: Option<String>,
    /// Distance from the safe-zone centre (m)
    pub distance: Option<f64>,
    /// Configured safe-zone radius (m)
    pub safe_zone_radius: Option<f64>,
}

impl PositionReport {
    /// `true` only for records flagged with the ALERT status.
    pub fn is_alert(&self) -> bool {
        self.status.as_deref() == Some(ALERT_STATUS)
    }
}

/// Vibration-sensor report
///
/// Carries no payload beyond the owning user — every inserted record is
/// actionable by definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VibrationReport {
    /// Owning user. Required — a record without one is unprocessable.
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_status_is_exact_match() {
        let mut report = PositionReport {
            status: Some("ALERT".to_string()),
            ..Default::default()
        };
        assert!(report.is_alert());

        report.status = Some("alert".to_string());
        assert!(!report.is_alert());

        report.status = None;
        assert!(!report.is_alert());
    }

    #[test]
    fn position_report_parses_camel_case_wire_names() {
        let report: PositionReport = serde_json::from_value(serde_json::json!({
            "status": "ALERT",
            "userId": "u1",
            "distance": 150,
            "safeZoneRadius": 100.5,
        }))
        .unwrap();

        assert_eq!(report.user_id.as_deref(), Some("u1"));
        assert_eq!(report.distance, Some(150.0));
        assert_eq!(report.safe_zone_radius, Some(100.5));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let report: VibrationReport = serde_json::from_value(serde_json::json!({
            "userId": "u4",
            "magnitude": 3.2,
            "deviceId": "moto-7",
        }))
        .unwrap();

        assert_eq!(report.user_id.as_deref(), Some("u4"));
    }
}
