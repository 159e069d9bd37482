//! Push-credential resolution
//!
//! Maps a user id to that user's current push-delivery token. The credential
//! store is owned by an external registration flow — this module only reads
//! it, one exact-key lookup per pipeline invocation.

mod firestore;

pub use firestore::FirestoreTokenStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Credential store errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("credential store returned status {0}")]
    ServerError(reqwest::StatusCode),
}

/// Per-user push-delivery credential, keyed by user id in the store.
///
/// Both a missing document and an empty token are valid "no-op" states, not
/// errors — the registration flow may simply not have run for this user yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserCredential {
    pub fcm_token: Option<String>,
}

impl UserCredential {
    /// The delivery token, or `None` when absent or empty.
    pub fn token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Read-only point lookup from user id to push credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the credential for `user_id`.
    ///
    /// `Ok(None)` means no credential document exists — a normal skip state.
    /// `Err` is reserved for store I/O failures.
    async fn lookup(&self, user_id: &str) -> Result<Option<UserCredential>, CredentialError>;
}
