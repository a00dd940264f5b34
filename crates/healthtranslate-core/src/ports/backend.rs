//! Backend collaborator port.
//!
//! The backend performs the actual conversational, translation and
//! speech-synthesis work; the core only coordinates. Implementations live
//! outside this crate (`healthtranslate-backend` provides the HTTP one).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::LanguageCode;

/// Errors an adapter can report for a backend call.
///
/// These are transport-level classifications; domain-level policy (the
/// translation-failed sentinel, the empty synthesis payload) is applied by
/// the session coordinator so it stays testable with mock backends.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request reached the service but came back with an error status.
    #[error("backend request failed with status {status}")]
    Http { status: u16 },

    /// Transport failure: connect, timeout, TLS, DNS.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a body the adapter could not decode.
    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
}

/// Port for the three external calls the session makes.
///
/// Methods return raw service output; callers decide what counts as a
/// domain failure. No method retries — every retry is a new user action.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Request a conversational reply to `text` written in `lang`.
    async fn provider_response(
        &self,
        text: &str,
        lang: LanguageCode,
    ) -> Result<String, BackendError>;

    /// Translate `text` from `source` into `target`, returning the raw
    /// `translated_text` field (which may be the service's failure
    /// sentinel — the coordinator inspects it).
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, BackendError>;

    /// Synthesize `text` spoken in `lang`, returning the encoded audio
    /// payload. A zero-length payload is a valid response (quota
    /// exhaustion) and is *not* mapped to an error here.
    async fn synthesize_speech(
        &self,
        text: &str,
        lang: LanguageCode,
    ) -> Result<Vec<u8>, BackendError>;
}
