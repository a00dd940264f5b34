//! Append-only message log with the per-message translation cache.
//!
//! The store is deliberately not synchronized — the session service is the
//! single owner and guards it with its own mutex. Only two operations ever
//! mutate state: appending a message and inserting a cache entry.

use chrono::Utc;
use thiserror::Error;

use crate::domain::{ChatMessage, LanguageCode, MessageId, NewChatMessage};

/// Errors inserting a translation cache entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown message id {0}")]
    UnknownMessage(MessageId),

    /// A message never caches a translation into its own language —
    /// identity is computed, not materialized.
    #[error("refusing to cache a translation into the message's own language")]
    OwnLanguage,
}

/// Ordered, append-only log of messages for one session.
#[derive(Debug)]
pub struct ChatStore {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl ChatStore {
    /// Create an empty store. Most callers want [`Self::with_welcome`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a store seeded with the provider's welcome message.
    #[must_use]
    pub fn with_welcome(provider_name: &str, greeting: &str) -> Self {
        let mut store = Self::new();
        store.append(NewChatMessage::from_provider(
            greeting,
            LanguageCode::English,
            provider_name,
        ));
        store
    }

    /// Append a message, assigning the next id and the creation timestamp.
    pub fn append(&mut self, new: NewChatMessage) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            text: new.text,
            language: new.language,
            sender_kind: new.sender_kind,
            sender: new.sender,
            is_voice_note: new.is_voice_note,
            created_at: Utc::now(),
            translations: std::collections::HashMap::new(),
        });
        id
    }

    /// Append a system notice.
    pub fn append_system(&mut self, text: impl Into<String>) -> MessageId {
        let text = text.into();
        tracing::debug!(notice = %text, "appending system message");
        self.append(NewChatMessage::system(text))
    }

    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        // Ids are assigned sequentially from 1, so this is a direct index.
        self.messages.get((id.0 as usize).checked_sub(1)?)
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Insert a translation cache entry, first writer wins.
    ///
    /// Returns the cached text: the newly inserted value, or — when a
    /// concurrent writer got there first — the existing entry, unchanged.
    /// Caching under the message's own language is rejected outright.
    pub fn insert_translation(
        &mut self,
        id: MessageId,
        target: LanguageCode,
        text: String,
    ) -> Result<String, StoreError> {
        let index = (id.0 as usize)
            .checked_sub(1)
            .filter(|&i| i < self.messages.len())
            .ok_or(StoreError::UnknownMessage(id))?;
        let message = &mut self.messages[index];

        if target == message.language {
            return Err(StoreError::OwnLanguage);
        }
        if let Some(existing) = message.translations.get(&target) {
            tracing::trace!(%id, lang = %target, "translation already cached, keeping first write");
            return Ok(existing.clone());
        }
        message.translations.insert(target, text.clone());
        Ok(text)
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}
