//! Platform adapters for the HealthTranslate audio and speech ports.
//!
//! [`RodioOutput`] plays synthesized audio on the default output device;
//! [`NoopAudioOutput`] and [`UnavailableRecognizer`] keep sessions working
//! where no hardware or engine exists.

mod noop;
pub mod playback;

pub use noop::{NoopAudioOutput, UnavailableRecognizer};
pub use playback::RodioOutput;
