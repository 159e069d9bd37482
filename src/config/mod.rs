//! Dispatcher Configuration Module
//!
//! Provides runtime settings loaded from TOML files, with environment
//! overrides for secrets.
//!
//! ## Loading Order
//!
//! 1. `SENTINEL_CONFIG` environment variable (path to TOML file)
//! 2. `sentinel.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(Settings::load());
//!
//! // Anywhere in the codebase:
//! let interval = config::get().feed.poll_interval_secs;
//! ```

mod settings;
pub mod defaults;

pub use settings::*;

use std::sync::OnceLock;

/// Global dispatcher settings, initialized once at startup.
static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Initialize the global settings.
///
/// Must be called exactly once, before the first trigger invocation.
pub fn init(settings: Settings) {
    if SETTINGS.set(settings).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global settings.
///
/// Panics if `init()` has not been called. This is by design — a missing
/// config is a fatal startup error, not a recoverable condition.
pub fn get() -> &'static Settings {
    SETTINGS
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether the settings have been initialized.
///
/// Useful for tests and optional config paths.
pub fn is_initialized() -> bool {
    SETTINGS.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_get_round_trips() {
        init(Settings::default());
        assert!(is_initialized());
        assert_eq!(get().collections.gps, "gps_data");
        // A second init is ignored, not a panic.
        init(Settings::default());
        assert!(is_initialized());
    }
}
