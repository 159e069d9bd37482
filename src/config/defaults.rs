//! System-wide default constants.
//!
//! Centralises the dispatcher's magic numbers. Grouped by subsystem for easy
//! discovery; operator-tunable values live in [`Settings`](super::Settings).

// ============================================================================
// Firebase endpoints
// ============================================================================

/// Firestore REST API root.
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

/// FCM HTTP v1 API root.
pub const FCM_BASE_URL: &str = "https://fcm.googleapis.com";

// ============================================================================
// Collections
// ============================================================================

/// Collection holding GPS position reports.
pub const GPS_COLLECTION: &str = "gps_data";

/// Collection holding vibration-sensor reports.
pub const VIBRATION_COLLECTION: &str = "vibration_data";

/// Collection mapping user ids to push credentials.
pub const TOKEN_COLLECTION: &str = "user_tokens";

// ============================================================================
// Poll feed
// ============================================================================

/// Seconds between collection sweeps.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Upper bound of the random per-sweep jitter (seconds).
pub const POLL_JITTER_SECS: u64 = 2;

/// Documents fetched per list page.
pub const POLL_PAGE_SIZE: u32 = 300;

/// Cap on the exponential-backoff shift after consecutive sweep failures.
pub const POLL_MAX_BACKOFF_EXPONENT: u32 = 6;

/// Ceiling on the backoff delay (seconds).
pub const POLL_BACKOFF_CAP_SECS: u64 = 300;

// ============================================================================
// HTTP
// ============================================================================

/// Client-level timeout for Firestore and FCM calls (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;
