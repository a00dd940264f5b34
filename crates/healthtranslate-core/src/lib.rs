//! Core of the HealthTranslate chat session: domain types, port
//! definitions, and the session state machine that keeps the message log,
//! translation cache, speech input and audio playback consistent across
//! asynchronous, cancellable operations.
//!
//! Adapters live elsewhere: `healthtranslate-backend` implements the HTTP
//! collaborator port, `healthtranslate-voice` the audio/recognition ports.

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{
    ChatMessage, LanguageCode, MessageId, NewChatMessage, SenderKind, SessionIdentity,
    SessionPreferences,
};
pub use error::SessionError;
pub use events::SessionEvent;
pub use ports::{
    AudioOutputPort, BackendError, PlaybackError, PlaybackEvent, PlaybackHandle, ProviderBackend,
    RecognitionError, RecognitionEvent, RecognitionHandle, SpeechRecognitionPort,
};
pub use services::{
    AudioPlaybackController, ChatStore, InFlightTranslations, LoadingGauge, LoadingGuard,
    PROVIDER_DISPLAY_NAME, PlaybackState, RecognitionState, SessionService,
    SpeechInputController, StoreError, WELCOME_MESSAGE,
};
