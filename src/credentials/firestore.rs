//! Firestore-backed credential store
//!
//! Point lookups against the token collection via the Firestore REST API.
//! A 404 means the user never registered a device — `Ok(None)`, not an
//! error. The bearer token is optional so the emulator works unauthenticated.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{CredentialError, CredentialStore, UserCredential};

/// Firestore document body, reduced to the value shape a credential uses.
#[derive(Debug, Deserialize)]
struct CredentialDocument {
    #[serde(default)]
    fields: HashMap<String, TypedValue>,
}

/// Firestore's typed-value wrapper (`{"stringValue": "..."}`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedValue {
    string_value: Option<String>,
}

impl CredentialDocument {
    fn into_credential(mut self) -> UserCredential {
        UserCredential {
            fcm_token: self
                .fields
                .remove("fcmToken")
                .and_then(|v| v.string_value),
        }
    }
}

/// HTTP client for credential lookups
#[derive(Clone)]
pub struct FirestoreTokenStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    collection: String,
    bearer_token: Option<String>,
}

impl FirestoreTokenStore {
    /// Create a new store client.
    ///
    /// `base_url` is the API root (production `https://firestore.googleapis.com`,
    /// or an emulator/mock address in tests).
    pub fn new(
        base_url: &str,
        project_id: &str,
        collection: &str,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            collection: collection.to_string(),
            bearer_token,
        }
    }

    fn document_url(&self, user_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url, self.project_id, self.collection, user_id
        )
    }
}

#[async_trait]
impl CredentialStore for FirestoreTokenStore {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserCredential>, CredentialError> {
        let mut req = self.http.get(self.document_url(user_id));
        if let Some(token) = &self.bearer_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let resp = req.send().await?;
        match resp.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            reqwest::StatusCode::OK => {
                let doc: CredentialDocument = resp.json().await?;
                Ok(Some(doc.into_credential()))
            }
            status => Err(CredentialError::ServerError(status)),
        }
    }
}
