//! Speech-input controller.
//!
//! Wraps at most one live recognition session. The controller is reusable:
//! errors return it to idle rather than a dead-end state, and the next
//! `start` re-reads the viewer language — the hint is pinned for the
//! duration of one session.
//!
//! Every session gets a fresh generation number and engine events echo it.
//! An engine still delivers its terminal event after `stop`, so without
//! the fence a late `Ended` from the previous session would tear down its
//! successor; fenced events are reported as [`SpeechOutcome::Ignored`].

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::domain::LanguageCode;
use crate::ports::{RecognitionError, RecognitionEvent, RecognitionHandle, SpeechRecognitionPort};

/// Recognition controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionState {
    Idle,
    Listening,
}

/// What the session should do with a recognition event.
#[derive(Debug, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Replace the pending input buffer with this cumulative transcript.
    ReplaceInput(String),
    /// The session ended without error; nothing is submitted.
    Stopped,
    /// The engine failed with this code; exactly one notice is due.
    Failed(String),
    /// Stale event from a session that was already stopped.
    Ignored,
}

struct Slot {
    state: RecognitionState,
    generation: u64,
    handle: Option<Box<dyn RecognitionHandle>>,
    /// Language the live session was started with.
    session_language: Option<LanguageCode>,
}

impl Slot {
    /// Terminal transition for the live session. The handle is stopped
    /// before being dropped so the engine never outlives the slot.
    fn terminate(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
        self.state = RecognitionState::Idle;
        self.session_language = None;
    }
}

/// Single-slot wrapper around the platform recognition engine.
pub struct SpeechInputController {
    port: Arc<dyn SpeechRecognitionPort>,
    slot: Mutex<Slot>,
}

impl SpeechInputController {
    pub fn new(port: Arc<dyn SpeechRecognitionPort>) -> Self {
        Self {
            port,
            slot: Mutex::new(Slot {
                state: RecognitionState::Idle,
                generation: 0,
                handle: None,
                session_language: None,
            }),
        }
    }

    /// Begin one recognition session hinted with `lang`.
    ///
    /// A no-op when already listening (the running session keeps its
    /// original hint). Fails with [`RecognitionError::Unavailable`] when
    /// the platform has no engine — the caller surfaces that as a notice,
    /// it never panics through.
    pub fn start(
        &self,
        lang: LanguageCode,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<(), RecognitionError> {
        let mut slot = self.slot.lock().expect("speech slot poisoned");
        if slot.state == RecognitionState::Listening {
            tracing::warn!("recognition already listening, ignoring start");
            return Ok(());
        }
        slot.generation += 1;
        let handle = self.port.start(lang.recognition_tag(), slot.generation, events)?;
        slot.state = RecognitionState::Listening;
        slot.handle = Some(handle);
        slot.session_language = Some(lang);
        tracing::info!(
            tag = lang.recognition_tag(),
            generation = slot.generation,
            "recognition session started"
        );
        Ok(())
    }

    /// Explicit user cancellation. Leaves the input buffer untouched —
    /// whatever was transcribed stays editable. Returns whether a session
    /// was actually listening, so callers can skip the state transition
    /// when it was already idle.
    pub fn stop(&self) -> bool {
        let mut slot = self.slot.lock().expect("speech slot poisoned");
        let was_listening = slot.state == RecognitionState::Listening;
        if let Some(handle) = slot.handle.take() {
            handle.stop();
        }
        slot.state = RecognitionState::Idle;
        slot.session_language = None;
        was_listening
    }

    /// Apply one engine event and report what the session should do.
    ///
    /// Events whose generation does not match the live session are stale:
    /// a stopped engine still delivers its terminal event, and that must
    /// not tear down whichever session is listening now.
    pub fn on_event(&self, event: RecognitionEvent) -> SpeechOutcome {
        let mut slot = self.slot.lock().expect("speech slot poisoned");
        let generation = match &event {
            RecognitionEvent::Transcript { generation, .. }
            | RecognitionEvent::Ended { generation }
            | RecognitionEvent::Error { generation, .. } => *generation,
        };
        if slot.state != RecognitionState::Listening || generation != slot.generation {
            return SpeechOutcome::Ignored;
        }
        match event {
            RecognitionEvent::Transcript { text, .. } => SpeechOutcome::ReplaceInput(text),
            RecognitionEvent::Ended { .. } => {
                slot.terminate();
                SpeechOutcome::Stopped
            }
            RecognitionEvent::Error { code, .. } => {
                slot.terminate();
                tracing::warn!(%code, "recognition engine error");
                SpeechOutcome::Failed(code)
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> RecognitionState {
        self.slot.lock().expect("speech slot poisoned").state
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state() == RecognitionState::Listening
    }

    /// Language the live session was started with, if any.
    #[must_use]
    pub fn session_language(&self) -> Option<LanguageCode> {
        self.slot.lock().expect("speech slot poisoned").session_language
    }
}
