//! Session identity and preferences.
//!
//! These values are produced by the external auth collaborator and passed
//! into the core explicitly at construction time. Nothing in this crate
//! reads ambient global state.

use serde::{Deserialize, Serialize};

use super::language::LanguageCode;

/// The authenticated viewer, as handed over by the auth collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub username: String,
    pub email: String,
    /// Opaque bearer token; consumed read-only, never inspected here.
    pub token: String,
}

/// Per-session viewer preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPreferences {
    pub identity: SessionIdentity,
    /// Language used to tag the viewer's outgoing messages, to request
    /// translations of other messages, and as the hint for the *next*
    /// recognition session. Changing it never rewrites existing messages.
    pub viewer_language: LanguageCode,
}

impl SessionPreferences {
    pub fn new(identity: SessionIdentity, viewer_language: LanguageCode) -> Self {
        Self {
            identity,
            viewer_language,
        }
    }
}
