//! Audio playback adapter — speaks synthesized audio via `rodio`.
//!
//! `rodio::OutputStream` is `!Send` on some platforms (macOS CoreAudio,
//! etc.), so it is confined to a dedicated OS thread and every operation
//! is proxied through a command channel. The public [`RodioOutput`] is the
//! `Send + Sync` handle the session holds.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use healthtranslate_core::{AudioOutputPort, PlaybackError, PlaybackEvent, PlaybackHandle};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::mpsc::UnboundedSender;

enum AudioCommand {
    Begin {
        audio: Vec<u8>,
        generation: u64,
        events: UnboundedSender<PlaybackEvent>,
        reply: mpsc::Sender<Result<(), PlaybackError>>,
    },
    /// Stop playback if the given generation is still the one sounding.
    Stop { generation: u64 },
    Shutdown,
}

/// `Send + Sync` proxy to the audio thread.
pub struct RodioOutput {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioOutput {
    /// Spawn the audio thread on the default output device.
    pub fn new() -> Result<Self, PlaybackError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), PlaybackError>>();

        let thread = thread::Builder::new()
            .name("healthtranslate-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| PlaybackError::StartFailed(format!("failed to spawn audio thread: {e}")))?;

        init_rx
            .recv()
            .map_err(|_| PlaybackError::NoOutputDevice)??;

        tracing::info!("audio playback initialized on default output device");
        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    /// Audio thread body: owns the `!Send` output stream, executes
    /// commands until shutdown.
    fn run(cmd_rx: &mpsc::Receiver<AudioCommand>, init_tx: &mpsc::Sender<Result<(), PlaybackError>>) {
        let stream = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "no audio output device");
                let _ = init_tx.send(Err(PlaybackError::NoOutputDevice));
                return;
            }
        };
        let (_stream, stream_handle) = stream;
        let _ = init_tx.send(Ok(()));

        let mut current: Option<(u64, Arc<Sink>)> = None;

        while let Ok(command) = cmd_rx.recv() {
            match command {
                AudioCommand::Begin {
                    audio,
                    generation,
                    events,
                    reply,
                } => {
                    // Preemption already happened at the controller; the
                    // sink stop here is the resource-level half of it.
                    if let Some((_, sink)) = current.take() {
                        sink.stop();
                    }
                    let result = begin_playback(&stream_handle, audio, generation, &events);
                    match result {
                        Ok(sink) => {
                            current = Some((generation, sink));
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            let _ = reply.send(Err(e));
                        }
                    }
                }
                AudioCommand::Stop { generation } => {
                    if current.as_ref().is_some_and(|(g, _)| *g == generation) {
                        if let Some((_, sink)) = current.take() {
                            sink.stop();
                        }
                    }
                }
                AudioCommand::Shutdown => break,
            }
        }

        if let Some((_, sink)) = current.take() {
            sink.stop();
        }
    }
}

/// Decode the payload, start a sink, and watch for natural completion.
fn begin_playback(
    stream_handle: &OutputStreamHandle,
    audio: Vec<u8>,
    generation: u64,
    events: &UnboundedSender<PlaybackEvent>,
) -> Result<Arc<Sink>, PlaybackError> {
    let source =
        Decoder::new(Cursor::new(audio)).map_err(|e| PlaybackError::Decode(e.to_string()))?;
    let sink =
        Sink::try_new(stream_handle).map_err(|e| PlaybackError::StartFailed(e.to_string()))?;
    sink.append(source);

    let sink = Arc::new(sink);
    let watcher_sink = Arc::clone(&sink);
    let watcher_events = events.clone();

    // `Sink` is Send in rodio 0.20+, so the watcher can block on it from
    // its own thread. A stopped sink also drains, so the watcher always
    // terminates; the stale Finished it then sends is fenced by its
    // generation at the controller.
    thread::spawn(move || {
        watcher_sink.sleep_until_end();
        tracing::debug!(generation, "playback drained");
        let _ = watcher_events.send(PlaybackEvent::Finished { generation });
    });

    tracing::debug!(generation, "playback started");
    Ok(sink)
}

struct RodioHandle {
    cmd_tx: mpsc::Sender<AudioCommand>,
    generation: u64,
}

impl PlaybackHandle for RodioHandle {
    fn release(&self) {
        let _ = self.cmd_tx.send(AudioCommand::Stop {
            generation: self.generation,
        });
    }
}

impl AudioOutputPort for RodioOutput {
    fn begin(
        &self,
        audio: Vec<u8>,
        generation: u64,
        events: UnboundedSender<PlaybackEvent>,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(AudioCommand::Begin {
                audio,
                generation,
                events,
                reply: reply_tx,
            })
            .map_err(|_| PlaybackError::StartFailed("audio thread is gone".into()))?;
        reply_rx
            .recv()
            .map_err(|_| PlaybackError::StartFailed("audio thread is gone".into()))??;
        Ok(Box::new(RodioHandle {
            cmd_tx: self.cmd_tx.clone(),
            generation,
        }))
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
