//! In-flight translation registry.
//!
//! Guarantees at most one outstanding `/translate` request per
//! `(message, target language)` key: the first caller claims the key and
//! becomes the leader, later callers become followers attached to the
//! leader's broadcast outcome. The entry is removed when the leader
//! completes — or when the leader is dropped mid-flight (cancellation), in
//! which case followers observe `Abandoned` instead of hanging.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::domain::{LanguageCode, MessageId};

/// Key identifying one translation request.
pub type TranslationKey = (MessageId, LanguageCode);

/// Why a shared translation attempt failed.
///
/// Cloneable so one failure can fan out to every attached follower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationFailure {
    /// The service answered with its failure sentinel or an empty text.
    Rejected,
    /// Transport-level failure.
    Network(String),
    /// The leader was cancelled before an outcome arrived.
    Abandoned,
}

/// Shared outcome of one translation attempt.
pub type TranslationOutcome = Result<String, TranslationFailure>;

type PendingMap = Arc<Mutex<HashMap<TranslationKey, broadcast::Sender<TranslationOutcome>>>>;

/// Registry of translation requests currently on the wire.
#[derive(Debug, Default)]
pub struct InFlightTranslations {
    pending: PendingMap,
}

/// Result of claiming a key.
pub enum Claim {
    /// This caller issues the network request and must call
    /// [`TranslationTicket::complete`] with the outcome.
    Leader(TranslationTicket),
    /// Another caller already has the request on the wire; await the
    /// shared outcome instead of issuing a duplicate.
    Follower(broadcast::Receiver<TranslationOutcome>),
}

impl InFlightTranslations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, becoming the leader if nobody holds it yet.
    pub fn claim(&self, key: TranslationKey) -> Claim {
        let mut pending = self.pending.lock().expect("registry poisoned");
        if let Some(tx) = pending.get(&key) {
            tracing::debug!(id = %key.0, lang = %key.1, "attaching to in-flight translation");
            return Claim::Follower(tx.subscribe());
        }
        let (tx, _) = broadcast::channel(1);
        pending.insert(key, tx.clone());
        Claim::Leader(TranslationTicket {
            pending: Arc::clone(&self.pending),
            key,
            tx,
            settled: false,
        })
    }

    /// Number of requests currently on the wire (for tests/diagnostics).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().expect("registry poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The leader's obligation to settle a claimed key.
pub struct TranslationTicket {
    pending: PendingMap,
    key: TranslationKey,
    tx: broadcast::Sender<TranslationOutcome>,
    settled: bool,
}

impl TranslationTicket {
    /// Settle the key and fan the outcome out to followers.
    pub fn complete(mut self, outcome: TranslationOutcome) {
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: TranslationOutcome) {
        if self.settled {
            return;
        }
        self.settled = true;
        self.pending
            .lock()
            .expect("registry poisoned")
            .remove(&self.key);
        // No receivers is fine — nobody attached while we were in flight.
        let _ = self.tx.send(outcome);
    }
}

impl Drop for TranslationTicket {
    fn drop(&mut self) {
        // Leader cancelled before settling: release the key so a retry can
        // claim it, and unblock any followers.
        self.settle(Err(TranslationFailure::Abandoned));
    }
}
