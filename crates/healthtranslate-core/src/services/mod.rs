//! Session state machine: the store, the single-slot controllers, the
//! request coordinator and its supporting pieces.

pub mod audio;
pub mod loading;
pub mod session;
pub mod speech;
pub mod store;
pub mod translation;

pub use audio::{AudioPlaybackController, PlaybackOutcome, PlaybackState};
pub use loading::{LoadingGauge, LoadingGuard};
pub use session::{PROVIDER_DISPLAY_NAME, SessionService, WELCOME_MESSAGE};
pub use speech::{RecognitionState, SpeechInputController, SpeechOutcome};
pub use store::{ChatStore, StoreError};
pub use translation::{
    Claim, InFlightTranslations, TranslationFailure, TranslationKey, TranslationOutcome,
    TranslationTicket,
};
