//! Audio-output capability port.
//!
//! The playback controller owns at most one live handle; the port is only
//! asked to start a stream and to stop it. Completion and failure come
//! back over a channel, tagged with the generation the controller passed
//! in so events from a superseded playback can be fenced off.

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors starting audio playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No usable audio output device.
    #[error("no audio output device available")]
    NoOutputDevice,

    /// The payload could not be decoded as audio.
    #[error("could not decode audio payload: {0}")]
    Decode(String),

    /// The output device rejected the stream.
    #[error("audio playback failed to start: {0}")]
    StartFailed(String),
}

/// Events one playback emits. `generation` echoes the value passed to
/// [`AudioOutputPort::begin`]; the controller discards events whose
/// generation is not the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The stream drained naturally.
    Finished { generation: u64 },
    /// The engine failed mid-stream.
    Failed { generation: u64, reason: String },
}

/// Handle to one live audio stream; dropping it must also stop playback.
pub trait PlaybackHandle: Send {
    /// Stop the stream and release the underlying resource. After this
    /// returns, the stream is no longer audible; any event the engine
    /// still delivers is fenced by its generation.
    fn release(&self);
}

/// Port over an audio output device.
pub trait AudioOutputPort: Send + Sync {
    /// Start playing the encoded `audio` payload.
    ///
    /// Implementations must echo `generation` in every event they send.
    fn begin(
        &self,
        audio: Vec<u8>,
        generation: u64,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}
