//! Port definitions — the seams between the session core and the outside
//! world. Adapters implement these in `healthtranslate-backend` and
//! `healthtranslate-voice`.

pub mod backend;
pub mod playback;
pub mod recognition;

pub use backend::{BackendError, ProviderBackend};
pub use playback::{AudioOutputPort, PlaybackError, PlaybackEvent, PlaybackHandle};
pub use recognition::{
    RecognitionError, RecognitionEvent, RecognitionHandle, SpeechRecognitionPort,
};
