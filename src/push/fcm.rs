//! FCM HTTP v1 client
//!
//! Sends one `messages:send` call per dispatch. The response `name` field
//! (`projects/*/messages/MSG_ID`) is the delivery acknowledgment returned to
//! the pipeline. Token minting for the `Authorization` header belongs to the
//! deployment environment, not this client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{PushMessage, PushTransport, TransportError};

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
}

/// Response body of `messages:send`.
#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

/// HTTP client for FCM delivery
#[derive(Clone)]
pub struct FcmClient {
    http: reqwest::Client,
    send_url: String,
    bearer_token: Option<String>,
}

impl FcmClient {
    /// Create a new FCM client.
    ///
    /// `base_url` is the API root (production `https://fcm.googleapis.com`,
    /// or a mock address in tests).
    pub fn new(
        base_url: &str,
        project_id: &str,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            base_url.trim_end_matches('/'),
            project_id
        );

        Self {
            http,
            send_url,
            bearer_token,
        }
    }
}

#[async_trait]
impl PushTransport for FcmClient {
    async fn send(&self, message: &PushMessage) -> Result<String, TransportError> {
        let mut req = self.http.post(&self.send_url).json(&SendRequest { message });
        if let Some(token) = &self.bearer_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            let body: SendResponse = resp.json().await?;
            Ok(body.name)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(TransportError::ServerError { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_url_shape() {
        let client = FcmClient::new(
            "https://fcm.googleapis.com/",
            "demo-project",
            None,
            Duration::from_secs(5),
        );
        assert_eq!(
            client.send_url,
            "https://fcm.googleapis.com/v1/projects/demo-project/messages:send"
        );
    }
}
