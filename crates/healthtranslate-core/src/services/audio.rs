//! Audio-playback controller.
//!
//! Owns at most one live playback handle. `play` preempts: the prior
//! stream is released before the new one starts, never queued behind it.
//! Every playback gets a fresh generation number and port events echo it,
//! so anything a released stream still emits is fenced off instead of
//! mutating state that now belongs to its successor.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::ports::{AudioOutputPort, PlaybackError, PlaybackEvent, PlaybackHandle};

/// Playback controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// What the session should do with a playback event.
#[derive(Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The current stream drained naturally; back to idle.
    Finished,
    /// The current stream failed; back to idle, one notice is due.
    Failed(String),
    /// Event from a preempted or already-released stream.
    Stale,
}

struct Slot {
    generation: u64,
    active: Option<Box<dyn PlaybackHandle>>,
}

/// Single-slot, preempting wrapper around the audio output device.
pub struct AudioPlaybackController {
    port: Arc<dyn AudioOutputPort>,
    slot: Mutex<Slot>,
}

impl AudioPlaybackController {
    pub fn new(port: Arc<dyn AudioOutputPort>) -> Self {
        Self {
            port,
            slot: Mutex::new(Slot {
                generation: 0,
                active: None,
            }),
        }
    }

    /// Start playing `audio`, preempting any stream currently sounding.
    pub fn play(
        &self,
        audio: Vec<u8>,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<(), PlaybackError> {
        let mut slot = self.slot.lock().expect("playback slot poisoned");

        // Preemption: the old stream must be silent before the new one
        // starts. Its generation is now stale, so late events are inert.
        if let Some(prior) = slot.active.take() {
            tracing::debug!(generation = slot.generation, "preempting active playback");
            prior.release();
        }

        slot.generation += 1;
        let handle = self.port.begin(audio, slot.generation, events)?;
        slot.active = Some(handle);
        tracing::debug!(generation = slot.generation, "playback started");
        Ok(())
    }

    /// Apply one engine event and report what the session should do.
    pub fn on_event(&self, event: PlaybackEvent) -> PlaybackOutcome {
        let mut slot = self.slot.lock().expect("playback slot poisoned");
        let (generation, result) = match event {
            PlaybackEvent::Finished { generation } => (generation, PlaybackOutcome::Finished),
            PlaybackEvent::Failed { generation, reason } => {
                (generation, PlaybackOutcome::Failed(reason))
            }
        };
        if generation != slot.generation || slot.active.is_none() {
            return PlaybackOutcome::Stale;
        }
        if let Some(handle) = slot.active.take() {
            handle.release();
        }
        result
    }

    /// Release any active stream (session teardown).
    pub fn shutdown(&self) {
        let mut slot = self.slot.lock().expect("playback slot poisoned");
        if let Some(handle) = slot.active.take() {
            handle.release();
        }
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        if self.slot.lock().expect("playback slot poisoned").active.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }
}

impl Drop for AudioPlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeOutput {
        begins: AtomicUsize,
        releases: Arc<AtomicUsize>,
    }

    struct FakeHandle {
        releases: Arc<AtomicUsize>,
    }

    impl PlaybackHandle for FakeHandle {
        fn release(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl AudioOutputPort for FakeOutput {
        fn begin(
            &self,
            _audio: Vec<u8>,
            _generation: u64,
            _events: mpsc::UnboundedSender<PlaybackEvent>,
        ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
            self.begins.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeHandle {
                releases: Arc::clone(&self.releases),
            }))
        }
    }

    fn channel() -> mpsc::UnboundedSender<PlaybackEvent> {
        mpsc::unbounded_channel().0
    }

    #[test]
    fn play_preempts_the_prior_stream() {
        let output = Arc::new(FakeOutput::default());
        let ctl = AudioPlaybackController::new(output.clone());

        ctl.play(vec![1], channel()).unwrap();
        assert!(ctl.is_playing());
        assert_eq!(output.releases.load(Ordering::SeqCst), 0);

        // Second play: prior handle released before the new one begins.
        ctl.play(vec![2], channel()).unwrap();
        assert_eq!(output.begins.load(Ordering::SeqCst), 2);
        assert_eq!(output.releases.load(Ordering::SeqCst), 1);
        assert!(ctl.is_playing());
    }

    #[test]
    fn events_from_a_preempted_stream_are_stale() {
        let output = Arc::new(FakeOutput::default());
        let ctl = AudioPlaybackController::new(output);

        ctl.play(vec![1], channel()).unwrap();
        ctl.play(vec![2], channel()).unwrap();

        // Generation 1 was preempted; its completion must not release or
        // transition the stream of generation 2.
        assert_eq!(
            ctl.on_event(PlaybackEvent::Finished { generation: 1 }),
            PlaybackOutcome::Stale
        );
        assert!(ctl.is_playing());

        assert_eq!(
            ctl.on_event(PlaybackEvent::Finished { generation: 2 }),
            PlaybackOutcome::Finished
        );
        assert!(!ctl.is_playing());
    }

    #[test]
    fn engine_failure_releases_and_reports() {
        let output = Arc::new(FakeOutput::default());
        let ctl = AudioPlaybackController::new(output.clone());

        ctl.play(vec![1], channel()).unwrap();
        assert_eq!(
            ctl.on_event(PlaybackEvent::Failed {
                generation: 1,
                reason: "device lost".into()
            }),
            PlaybackOutcome::Failed("device lost".into())
        );
        assert!(!ctl.is_playing());
        assert_eq!(output.releases.load(Ordering::SeqCst), 1);

        // Duplicate terminal event for the same generation is stale.
        assert_eq!(
            ctl.on_event(PlaybackEvent::Finished { generation: 1 }),
            PlaybackOutcome::Stale
        );
    }

    #[test]
    fn shutdown_releases_the_active_stream() {
        let output = Arc::new(FakeOutput::default());
        let ctl = AudioPlaybackController::new(output.clone());
        ctl.play(vec![1], channel()).unwrap();
        ctl.shutdown();
        assert_eq!(output.releases.load(Ordering::SeqCst), 1);
        assert!(!ctl.is_playing());
    }
}
