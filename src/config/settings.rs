//! Dispatcher settings loaded from TOML + environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Settings loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Top-level dispatcher settings.
///
/// Every section has working defaults; a TOML file only needs the keys it
/// overrides. The FCM bearer token is a secret and comes from the
/// environment (`SENTINEL_FCM_TOKEN`), never from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub firebase: FirebaseSettings,
    pub collections: CollectionSettings,
    pub feed: FeedSettings,
    pub http: HttpSettings,
}

/// Firebase project and endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseSettings {
    /// Google Cloud project owning the Firestore database and FCM sender.
    pub project_id: String,
    /// Firestore REST API root. Point at an emulator for local runs.
    pub firestore_url: String,
    /// FCM HTTP v1 API root. Point at a mock for local runs.
    pub fcm_url: String,
    /// OAuth bearer token for both APIs. `None` works against emulators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl Default for FirebaseSettings {
    fn default() -> Self {
        Self {
            project_id: "demo-project".to_string(),
            firestore_url: defaults::FIRESTORE_BASE_URL.to_string(),
            fcm_url: defaults::FCM_BASE_URL.to_string(),
            bearer_token: None,
        }
    }
}

/// Names of the watched collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub gps: String,
    pub vibration: String,
    pub tokens: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            gps: defaults::GPS_COLLECTION.to_string(),
            vibration: defaults::VIBRATION_COLLECTION.to_string(),
            tokens: defaults::TOKEN_COLLECTION.to_string(),
        }
    }
}

/// Poll-feed pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub poll_interval_secs: u64,
    pub poll_jitter_secs: u64,
    pub page_size: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            poll_jitter_secs: defaults::POLL_JITTER_SECS,
            page_size: defaults::POLL_PAGE_SIZE,
        }
    }
}

/// Outbound HTTP client tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings using the standard fallback chain.
    ///
    /// 1. `$SENTINEL_CONFIG` environment variable (path to TOML file)
    /// 2. `sentinel.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// Environment overrides are applied on top of whichever source won.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var("SENTINEL_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(settings) => {
                        info!(path = %p.display(), project = %settings.firebase.project_id, "Loaded settings from SENTINEL_CONFIG");
                        return settings.with_env_overrides();
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load settings from SENTINEL_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SENTINEL_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./sentinel.toml
        let local = PathBuf::from("sentinel.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(settings) => {
                    info!(project = %settings.firebase.project_id, "Loaded settings from ./sentinel.toml");
                    return settings.with_env_overrides();
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./sentinel.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No sentinel.toml found — using built-in defaults");
        Self::default().with_env_overrides()
    }

    /// Load from a specific TOML file path. No environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Apply secret/environment overrides on top of file or default values.
    ///
    /// `SENTINEL_FCM_TOKEN` carries the OAuth bearer token so it never has to
    /// live in a file on disk.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var("SENTINEL_FCM_TOKEN") {
            if !token.is_empty() {
                self.firebase.bearer_token = Some(token);
            }
        }
        self
    }
}
