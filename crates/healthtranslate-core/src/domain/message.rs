//! Chat message domain types.
//!
//! Messages are append-only: once created, only the translation cache of a
//! message ever changes, and cache entries themselves are written at most
//! once per target language.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::LanguageCode;

/// Identifier of a message within one session.
///
/// Ids are handed out by the store in strictly increasing order, so id
/// order equals display order. Completion order of the network calls that
/// produce messages is *not* guaranteed to match dispatch order — always
/// key off the id, never off call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    /// The viewer's own outgoing message.
    User,
    /// A reply from the automated provider.
    Provider,
    /// A non-attributable notice (errors, status). Carries no sender
    /// label and offers no translation or playback affordance.
    System,
}

/// A single chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    /// Original content; immutable after creation.
    pub text: String,
    /// The language `text` is written in; immutable.
    pub language: LanguageCode,
    pub sender_kind: SenderKind,
    /// Display label; `None` for system messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Whether the message originated from speech input.
    pub is_voice_note: bool,
    pub created_at: DateTime<Utc>,
    /// Cached translations keyed by target language.
    ///
    /// Invariant: never contains an entry for `language` itself, and an
    /// entry, once present, is never overwritten or removed.
    pub translations: HashMap<LanguageCode, String>,
}

impl ChatMessage {
    /// The text to display when viewing this message through `lang`.
    ///
    /// Returns the original text when `lang` matches the message language
    /// (translating into one's own language is identity), the cached
    /// translation when one exists, and `None` when a translation would
    /// have to be fetched first.
    #[must_use]
    pub fn text_in(&self, lang: LanguageCode) -> Option<&str> {
        if lang == self.language {
            Some(&self.text)
        } else {
            self.translations.get(&lang).map(String::as_str)
        }
    }

    /// Whether translation/playback affordances apply to this message.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self.sender_kind, SenderKind::System)
    }
}

/// Data for creating a new message; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub text: String,
    pub language: LanguageCode,
    pub sender_kind: SenderKind,
    pub sender: Option<String>,
    pub is_voice_note: bool,
}

impl NewChatMessage {
    /// An outgoing message from the viewer.
    pub fn from_user(
        text: impl Into<String>,
        language: LanguageCode,
        sender: impl Into<String>,
        is_voice_note: bool,
    ) -> Self {
        Self {
            text: text.into(),
            language,
            sender_kind: SenderKind::User,
            sender: Some(sender.into()),
            is_voice_note,
        }
    }

    /// A reply from the automated provider.
    pub fn from_provider(
        text: impl Into<String>,
        language: LanguageCode,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            language,
            sender_kind: SenderKind::Provider,
            sender: Some(sender.into()),
            is_voice_note: false,
        }
    }

    /// A system notice. Always tagged English; notices are generated
    /// locally, not by the backend.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: LanguageCode::English,
            sender_kind: SenderKind::System,
            sender: None,
            is_voice_note: false,
        }
    }
}
