//! Session events — the re-render signal.
//!
//! The session broadcasts these after every observable state change; a
//! frontend re-reads whatever state it displays. Payloads are lightweight
//! and serializable so they can cross an IPC or SSE boundary unchanged.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, LanguageCode, MessageId};

/// An observable change in session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionEvent {
    /// A message was appended to the log.
    #[serde(rename_all = "camelCase")]
    MessageAppended { message: ChatMessage },

    /// A translation was cached for an existing message.
    #[serde(rename_all = "camelCase")]
    TranslationAdded {
        message_id: MessageId,
        language: LanguageCode,
    },

    /// The pending input buffer changed (typed or transcribed).
    #[serde(rename_all = "camelCase")]
    InputChanged { input: String },

    /// Speech recognition started or stopped listening.
    #[serde(rename_all = "camelCase")]
    ListeningChanged { listening: bool },

    /// Audio playback started or went quiet.
    #[serde(rename_all = "camelCase")]
    PlaybackChanged { playing: bool },

    /// The viewer switched display language.
    #[serde(rename_all = "camelCase")]
    ViewerLanguageChanged { language: LanguageCode },
}
