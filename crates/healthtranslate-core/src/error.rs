//! Session-level error taxonomy.

use thiserror::Error;

use crate::domain::MessageId;
use crate::ports::{BackendError, PlaybackError, RecognitionError};

/// Errors surfaced by the session coordinator.
///
/// Every variant except `Cancelled` has already been reflected in the
/// message log as a system notice by the time a caller sees it — the
/// typed value exists so programmatic callers can branch without parsing
/// the log. `Cancelled` is not a failure and appends nothing.
#[derive(Debug, Error)]
pub enum SessionError {
    /// HTTP/transport failure talking to the backend.
    #[error("network failure: {0}")]
    Network(#[source] BackendError),

    /// The backend answered, but with a well-formed rejection (e.g. the
    /// translation-failed sentinel).
    #[error("backend rejected the request: {0}")]
    ServiceRejected(String),

    /// The platform lacks the required capability (speech recognition,
    /// audio output).
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The speech engine is present but refused to start a session —
    /// transient, unlike a missing capability.
    #[error("recognition start failed")]
    RecognitionStart(#[source] RecognitionError),

    /// The synthesis service returned an empty payload — quota exhausted,
    /// distinct from a generic failure.
    #[error("speech synthesis quota exhausted")]
    ResourceExhausted,

    /// The operation was abandoned: explicit user stop or session
    /// shutdown. Produces no system notice.
    #[error("operation cancelled")]
    Cancelled,

    /// The referenced message does not exist in this session.
    #[error("unknown message id {0}")]
    UnknownMessage(MessageId),

    /// Audio playback could not start.
    #[error("playback failed: {0}")]
    Playback(#[source] PlaybackError),
}

impl SessionError {
    /// Classify a backend transport error.
    pub(crate) fn from_backend(err: BackendError) -> Self {
        match err {
            BackendError::Http { .. } | BackendError::Network(_) => Self::Network(err),
            BackendError::InvalidResponse(msg) => Self::ServiceRejected(msg),
        }
    }

    /// Classify a recognition start error: a missing engine is a platform
    /// gap, a refused start is retryable.
    pub(crate) fn from_recognition(err: RecognitionError) -> Self {
        match err {
            RecognitionError::Unavailable => Self::CapabilityUnavailable(err.to_string()),
            RecognitionError::StartFailed(_) => Self::RecognitionStart(err),
        }
    }
}
