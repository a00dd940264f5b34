//! Null adapters for platforms (or test setups) without audio hardware or
//! a recognition engine.

use healthtranslate_core::{
    AudioOutputPort, PlaybackError, PlaybackEvent, PlaybackHandle, RecognitionError,
    RecognitionEvent, RecognitionHandle, SpeechRecognitionPort,
};
use tokio::sync::mpsc::UnboundedSender;

/// Audio output that plays nothing and completes immediately.
///
/// Keeps the session fully functional on headless machines: `speak` still
/// fetches synthesis audio and drives the playback state machine, it just
/// makes no sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAudioOutput;

struct NoopHandle;

impl PlaybackHandle for NoopHandle {
    fn release(&self) {}
}

impl AudioOutputPort for NoopAudioOutput {
    fn begin(
        &self,
        _audio: Vec<u8>,
        generation: u64,
        events: UnboundedSender<PlaybackEvent>,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        tracing::debug!(generation, "noop audio output, completing immediately");
        let _ = events.send(PlaybackEvent::Finished { generation });
        Ok(Box::new(NoopHandle))
    }
}

/// Recognition port for platforms without a speech engine.
///
/// Always reports [`RecognitionError::Unavailable`]; the session turns
/// that into a system notice instead of failing.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRecognizer;

impl SpeechRecognitionPort for UnavailableRecognizer {
    fn start(
        &self,
        _language_tag: &str,
        _generation: u64,
        _events: UnboundedSender<RecognitionEvent>,
    ) -> Result<Box<dyn RecognitionHandle>, RecognitionError> {
        Err(RecognitionError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn noop_output_reports_immediate_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = NoopAudioOutput.begin(vec![1, 2, 3], 7, tx).unwrap();
        assert_eq!(rx.recv().await, Some(PlaybackEvent::Finished { generation: 7 }));
        handle.release();
    }

    #[test]
    fn unavailable_recognizer_never_starts() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = UnavailableRecognizer.start("en", 1, tx);
        assert!(matches!(result, Err(RecognitionError::Unavailable)));
    }
}
