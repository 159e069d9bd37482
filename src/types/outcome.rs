//! Dispatch pipeline result model
//!
//! Every pipeline invocation resolves to a [`DispatchOutcome`]. The three
//! variants stay distinguishable for logging and tests, but all of them map
//! to the same "completed normally" signal at the trigger boundary: the feed
//! host never sees an error, because the triggering infrastructure would
//! treat one as a retry signal, and the no-op states here are intentional
//! skips rather than transient failures.

/// Terminal state of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The transport accepted the payload; carries its acknowledgment id.
    Delivered { message_id: String },
    /// Intentional no-op — nothing was sent and nothing is wrong.
    Skipped(SkipReason),
    /// Something went wrong; already logged at error level and absorbed.
    Failed(FailureReason),
}

/// Why a record was intentionally not dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Classification decided the record does not warrant a notification.
    /// Carries the record's status value for diagnostics.
    NotActionable { status: Option<String> },
    /// No credential document exists for the user.
    CredentialMissing,
    /// A credential document exists but holds no usable token.
    TokenEmpty,
}

/// Why a record could not be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The record carries no resolvable user id.
    MissingUserId,
    /// The record's fields did not match the expected shape.
    Malformed(String),
    /// The credential store lookup failed.
    CredentialLookup(String),
    /// The push transport rejected or failed the send.
    Delivery(String),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// The transport acknowledgment id, when one exists.
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Delivered { message_id } => Some(message_id),
            _ => None,
        }
    }
}
