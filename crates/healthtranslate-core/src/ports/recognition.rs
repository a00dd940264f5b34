//! Speech-recognition capability port.
//!
//! Platform engines (browser APIs, OS dictation services) differ wildly;
//! the session state machine depends only on this small surface. An engine
//! pushes typed events into the channel the controller hands it — no
//! ambient callback registration.

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors starting a recognition session.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The platform has no speech-recognition engine.
    #[error("speech recognition is not available on this platform")]
    Unavailable,

    /// The engine exists but refused to start a session.
    #[error("speech recognition failed to start: {0}")]
    StartFailed(String),
}

/// Events one recognition session emits, in order.
///
/// `Transcript` events carry the *cumulative* transcript so far — each one
/// replaces the previous, it is never appended. The stream ends with
/// exactly one terminal event: `Ended` (engine-driven, e.g. silence
/// timeout, or following an explicit stop) or `Error`.
///
/// Every event echoes the generation `start` was given, so events from a
/// session that was already stopped can be fenced off instead of mutating
/// state that now belongs to its successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Interim or final transcript; always the full text so far.
    Transcript { generation: u64, text: String },
    /// The session ended without error. Nothing is submitted — sending is
    /// always a distinct user action.
    Ended { generation: u64 },
    /// The engine failed; carries the engine's error code (e.g.
    /// `"no-speech"`, `"audio-capture"`).
    Error { generation: u64, code: String },
}

/// Handle to one live recognition session.
pub trait RecognitionHandle: Send {
    /// Ask the engine to stop listening. The engine still delivers its
    /// terminal event through the channel.
    fn stop(&self);
}

/// Port over a platform speech-recognition engine.
pub trait SpeechRecognitionPort: Send + Sync {
    /// Begin one recognition session with the given BCP 47 language hint.
    ///
    /// The hint is fixed for the lifetime of the session; the controller
    /// re-reads the viewer language on the next `start`. The engine must
    /// stamp `generation` onto every event it emits for this session.
    fn start(
        &self,
        language_tag: &str,
        generation: u64,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<Box<dyn RecognitionHandle>, RecognitionError>;
}
