//! Event-to-notification dispatch pipeline
//!
//! Both telemetry kinds run the same state machine:
//!
//! `Received → Classified → Validated → CredentialResolved → PayloadBuilt → Dispatched`
//!
//! The machine lives once in [`Pipeline::process`]; everything kind-specific
//! (classification predicate, payload template, data block) is an
//! [`AlertRule`] with two concrete variants. Every branch short of a
//! delivered message terminates in a logged no-op, and `process` is
//! infallible by signature: the feed host must never see an error, because
//! the triggering infrastructure would treat one as a retry signal.

mod position;
mod vibration;

pub use position::PositionAlertRule;
pub use vibration::VibrationAlertRule;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info};

use crate::credentials::CredentialStore;
use crate::push::{PushMessage, PushTransport};
use crate::types::{DispatchOutcome, FailureReason, SkipReason};

/// Outcome of the classification step.
pub enum Classification {
    /// The record warrants a notification; continue down the pipeline.
    Actionable,
    /// Deliberate no-op. Carries the record's status for the skip log.
    Ignore { status: Option<String> },
}

/// Kind-specific strategy: how to read a record and what to send for it.
///
/// Classification runs before validation — a non-actionable record must
/// never touch the credential store.
pub trait AlertRule: Send + Sync {
    /// Parsed record type for this telemetry kind.
    type Record: DeserializeOwned + Send;

    /// Kind tag used in log lines and the outbound `data.type`.
    fn kind(&self) -> &'static str;

    /// Decide whether the record warrants a notification at all.
    fn classify(&self, record: &Self::Record) -> Classification;

    /// Owning user of the record, if the field is present and non-empty.
    fn user_id<'r>(&self, record: &'r Self::Record) -> Option<&'r str>;

    /// Assemble the outbound message for the resolved destination token.
    fn build(&self, record: &Self::Record, token: &str) -> PushMessage;
}

/// Shared dispatch pipeline over a credential store and a push transport.
///
/// Holds no per-invocation state; concurrent invocations for different
/// records are fully independent.
pub struct Pipeline<S, T> {
    credentials: S,
    transport: T,
}

impl<S: CredentialStore, T: PushTransport> Pipeline<S, T> {
    pub fn new(credentials: S, transport: T) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    /// Run one inserted record through the dispatch state machine.
    ///
    /// `event_id` identifies the inserted document and is used only for
    /// diagnostics. Skips log at info level; missing user id, store
    /// failures, and delivery failures log at error level. Nothing is
    /// retried and nothing propagates to the caller.
    pub async fn process<R: AlertRule>(
        &self,
        rule: &R,
        event_id: &str,
        fields: Value,
    ) -> DispatchOutcome {
        let record: R::Record = match serde_json::from_value(fields) {
            Ok(record) => record,
            Err(e) => {
                error!(
                    kind = rule.kind(),
                    event = event_id,
                    error = %e,
                    "Record fields do not match the expected shape"
                );
                return DispatchOutcome::Failed(FailureReason::Malformed(e.to_string()));
            }
        };

        if let Classification::Ignore { status } = rule.classify(&record) {
            info!(
                kind = rule.kind(),
                event = event_id,
                status = status.as_deref().unwrap_or("<none>"),
                "Record not actionable, skipping notification"
            );
            return DispatchOutcome::Skipped(SkipReason::NotActionable { status });
        }

        let Some(user_id) = rule.user_id(&record) else {
            error!(kind = rule.kind(), event = event_id, "Record has no userId");
            return DispatchOutcome::Failed(FailureReason::MissingUserId);
        };

        let credential = match self.credentials.lookup(user_id).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                info!(
                    kind = rule.kind(),
                    user = user_id,
                    "No push credential for user, skipping"
                );
                return DispatchOutcome::Skipped(SkipReason::CredentialMissing);
            }
            Err(e) => {
                error!(
                    kind = rule.kind(),
                    user = user_id,
                    error = %e,
                    "Credential lookup failed"
                );
                return DispatchOutcome::Failed(FailureReason::CredentialLookup(e.to_string()));
            }
        };

        let Some(token) = credential.token() else {
            info!(
                kind = rule.kind(),
                user = user_id,
                "Push token empty for user, skipping"
            );
            return DispatchOutcome::Skipped(SkipReason::TokenEmpty);
        };

        let message = rule.build(&record, token);

        match self.transport.send(&message).await {
            Ok(message_id) => {
                info!(
                    kind = rule.kind(),
                    user = user_id,
                    ack = %message_id,
                    "Notification delivered"
                );
                DispatchOutcome::Delivered { message_id }
            }
            Err(e) => {
                error!(
                    kind = rule.kind(),
                    user = user_id,
                    error = %e,
                    "Failed to deliver notification"
                );
                DispatchOutcome::Failed(FailureReason::Delivery(e.to_string()))
            }
        }
    }
}
