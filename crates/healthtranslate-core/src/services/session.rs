//! Session service — the request coordinator.
//!
//! Owns the message log, the input buffer, the preferences and both
//! single-slot controllers, and issues the three backend calls. All
//! failures are normalized into system notices here; callers additionally
//! get a typed [`SessionError`] so they can branch without parsing the
//! log. Cancellation (user stop, session shutdown) is not a failure and
//! appends nothing.
//!
//! Locking discipline: the shared state sits behind one mutex that is only
//! held for synchronous sections — never across an await. The store is
//! mutated exclusively through this service (append) and the translation
//! cache insertion below, which is what makes lost updates impossible.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::domain::{
    ChatMessage, LanguageCode, MessageId, NewChatMessage, SessionPreferences,
};
use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::ports::{
    AudioOutputPort, PlaybackEvent, ProviderBackend, RecognitionError, RecognitionEvent,
    SpeechRecognitionPort,
};
use crate::services::audio::{AudioPlaybackController, PlaybackOutcome};
use crate::services::loading::LoadingGauge;
use crate::services::speech::{SpeechInputController, SpeechOutcome};
use crate::services::store::{ChatStore, StoreError};
use crate::services::translation::{Claim, InFlightTranslations, TranslationFailure};

/// Display name of the automated provider.
pub const PROVIDER_DISPLAY_NAME: &str = "Dr. Martinez";

/// Seeded greeting shown when a session opens.
pub const WELCOME_MESSAGE: &str = "Welcome to Healthcare Chat! I'm Dr. Martinez, \
your AI healthcare assistant. How can I help you today?";

/// A well-formed `/translate` response carrying this text is a rejection.
const TRANSLATION_FAILED_SENTINEL: &str = "Translation failed";

struct Shared {
    store: ChatStore,
    input: String,
    prefs: SessionPreferences,
}

struct EventPumps {
    recognition: mpsc::UnboundedReceiver<RecognitionEvent>,
    playback: mpsc::UnboundedReceiver<PlaybackEvent>,
}

/// Coordinates one chat session.
pub struct SessionService {
    backend: Arc<dyn ProviderBackend>,
    speech: SpeechInputController,
    playback: AudioPlaybackController,
    registry: InFlightTranslations,
    gauge: Arc<LoadingGauge>,
    cancel: CancellationToken,
    events: broadcast::Sender<SessionEvent>,
    shared: Mutex<Shared>,
    recognition_tx: mpsc::UnboundedSender<RecognitionEvent>,
    playback_tx: mpsc::UnboundedSender<PlaybackEvent>,
    pumps: Mutex<Option<EventPumps>>,
}

impl SessionService {
    /// Build a session for the given viewer, seeded with the welcome
    /// message. Ports are injected; the session never reaches for ambient
    /// state.
    pub fn new(
        prefs: SessionPreferences,
        backend: Arc<dyn ProviderBackend>,
        recognition: Arc<dyn SpeechRecognitionPort>,
        audio: Arc<dyn AudioOutputPort>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let (recognition_tx, recognition_rx) = mpsc::unbounded_channel();
        let (playback_tx, playback_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            speech: SpeechInputController::new(recognition),
            playback: AudioPlaybackController::new(audio),
            registry: InFlightTranslations::new(),
            gauge: LoadingGauge::new(),
            cancel: CancellationToken::new(),
            events,
            shared: Mutex::new(Shared {
                store: ChatStore::with_welcome(PROVIDER_DISPLAY_NAME, WELCOME_MESSAGE),
                input: String::new(),
                prefs,
            }),
            recognition_tx,
            playback_tx,
            pumps: Mutex::new(Some(EventPumps {
                recognition: recognition_rx,
                playback: playback_rx,
            })),
        }
    }

    // ── Messaging ──────────────────────────────────────────────────

    /// Send a message from the viewer.
    ///
    /// Whitespace-only input is a no-op: no message, no network call. The
    /// viewer's message is appended optimistically and never rolled back;
    /// a provider failure only prevents the reply and leaves a notice.
    pub async fn send_message(
        &self,
        raw_input: &str,
        is_voice_note: bool,
    ) -> Result<(), SessionError> {
        let text = raw_input.trim();
        if text.is_empty() {
            return Ok(());
        }

        let (lang, username) = {
            let mut shared = self.lock();
            shared.input.clear();
            (
                shared.prefs.viewer_language,
                shared.prefs.identity.username.clone(),
            )
        };
        self.emit(SessionEvent::InputChanged {
            input: String::new(),
        });
        self.append(NewChatMessage::from_user(text, lang, username, is_voice_note));

        let _guard = self.gauge.begin();
        let reply = tokio::select! {
            () = self.cancel.cancelled() => return Err(SessionError::Cancelled),
            reply = self.backend.provider_response(text, lang) => reply,
        };

        match reply {
            Ok(response) => {
                self.append(NewChatMessage::from_provider(
                    response,
                    lang,
                    PROVIDER_DISPLAY_NAME,
                ));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "provider response failed");
                self.notice("Error: Could not get provider response. Please try again.");
                Err(SessionError::from_backend(err))
            }
        }
    }

    // ── Translation ────────────────────────────────────────────────

    /// Translate a message into `target`, returning the translated text.
    ///
    /// Identity (target equals the message language) and cache hits return
    /// synchronously with no network call. Otherwise at most one request
    /// is on the wire per `(message, target)`: concurrent callers attach
    /// to the same outcome. Failures are never cached; the caller that
    /// issued the request appends the single notice.
    pub async fn translate(
        &self,
        id: MessageId,
        target: LanguageCode,
    ) -> Result<String, SessionError> {
        let (text, source) = {
            let shared = self.lock();
            let message = shared
                .store
                .get(id)
                .ok_or(SessionError::UnknownMessage(id))?;
            if target == message.language {
                return Ok(message.text.clone());
            }
            if let Some(cached) = message.translations.get(&target) {
                return Ok(cached.clone());
            }
            (message.text.clone(), message.language)
        };

        match self.registry.claim((id, target)) {
            Claim::Follower(mut outcome) => {
                let _guard = self.gauge.begin();
                let received = tokio::select! {
                    () = self.cancel.cancelled() => return Err(SessionError::Cancelled),
                    received = outcome.recv() => received,
                };
                match received {
                    Ok(Ok(translated)) => Ok(translated),
                    // The leader already appended the notice for this
                    // attempt; followers stay quiet.
                    Ok(Err(failure)) => Err(Self::map_shared_failure(failure)),
                    Err(_) => Err(SessionError::Cancelled),
                }
            }
            Claim::Leader(ticket) => {
                // The previous holder may have settled between our cache
                // check and the claim; a hit here means the work is done.
                if let Some(cached) = self
                    .lock()
                    .store
                    .get(id)
                    .and_then(|m| m.translations.get(&target).cloned())
                {
                    ticket.complete(Ok(cached.clone()));
                    return Ok(cached);
                }

                let _guard = self.gauge.begin();
                let result = tokio::select! {
                    () = self.cancel.cancelled() => {
                        // Dropping the ticket releases followers.
                        drop(ticket);
                        return Err(SessionError::Cancelled);
                    }
                    result = self.backend.translate(&text, source, target) => result,
                };
                match result {
                    Ok(translated)
                        if translated.is_empty() || translated == TRANSLATION_FAILED_SENTINEL =>
                    {
                        ticket.complete(Err(TranslationFailure::Rejected));
                        self.notice("Translation failed. Please try again.");
                        Err(SessionError::ServiceRejected(
                            TRANSLATION_FAILED_SENTINEL.to_string(),
                        ))
                    }
                    Ok(translated) => {
                        let cached = {
                            let mut shared = self.lock();
                            shared
                                .store
                                .insert_translation(id, target, translated)
                                .map_err(|err| match err {
                                    StoreError::UnknownMessage(id) => {
                                        SessionError::UnknownMessage(id)
                                    }
                                    StoreError::OwnLanguage => {
                                        // Unreachable: identity short-circuits above.
                                        SessionError::ServiceRejected(err.to_string())
                                    }
                                })?
                        };
                        self.emit(SessionEvent::TranslationAdded {
                            message_id: id,
                            language: target,
                        });
                        ticket.complete(Ok(cached.clone()));
                        Ok(cached)
                    }
                    Err(err) => {
                        ticket.complete(Err(TranslationFailure::Network(err.to_string())));
                        self.notice("Translation failed. Please try again.");
                        Err(SessionError::from_backend(err))
                    }
                }
            }
        }
    }

    fn map_shared_failure(failure: TranslationFailure) -> SessionError {
        match failure {
            TranslationFailure::Rejected => {
                SessionError::ServiceRejected(TRANSLATION_FAILED_SENTINEL.to_string())
            }
            TranslationFailure::Network(message) => {
                SessionError::Network(crate::ports::BackendError::Network(message))
            }
            TranslationFailure::Abandoned => SessionError::Cancelled,
        }
    }

    // ── Speech synthesis & playback ────────────────────────────────

    /// Fetch synthesis audio for `text` and play it, preempting any
    /// stream currently sounding. The loading gauge covers the fetch
    /// only — playback itself is not "loading".
    pub async fn speak(&self, text: &str, lang: LanguageCode) -> Result<(), SessionError> {
        let audio = {
            let _guard = self.gauge.begin();
            let fetched = tokio::select! {
                () = self.cancel.cancelled() => return Err(SessionError::Cancelled),
                fetched = self.backend.synthesize_speech(text, lang) => fetched,
            };
            match fetched {
                Ok(audio) => audio,
                Err(err) => {
                    tracing::warn!(error = %err, "speech synthesis failed");
                    self.notice("Text-to-speech service temporarily unavailable.");
                    return Err(SessionError::from_backend(err));
                }
            }
        };

        // Zero-length payload is the service's quota signal, not an
        // error; distinct notice, no playback attempt.
        if audio.is_empty() {
            self.notice("Text-to-speech not available (quota exceeded).");
            return Err(SessionError::ResourceExhausted);
        }

        self.playback
            .play(audio, self.playback_tx.clone())
            .map_err(|err| {
                self.notice("Audio playback failed.");
                SessionError::Playback(err)
            })?;
        self.emit(SessionEvent::PlaybackChanged { playing: true });
        Ok(())
    }

    /// Speak a message as the viewer sees it through `lang`: the cached
    /// translation when one exists, the original text otherwise.
    pub async fn speak_message(
        &self,
        id: MessageId,
        lang: LanguageCode,
    ) -> Result<(), SessionError> {
        let (text, spoken_lang) = {
            let shared = self.lock();
            let message = shared
                .store
                .get(id)
                .ok_or(SessionError::UnknownMessage(id))?;
            match message.text_in(lang) {
                Some(text) => (text.to_string(), lang),
                None => (message.text.clone(), message.language),
            }
        };
        self.speak(&text, spoken_lang).await
    }

    // ── Speech recognition ─────────────────────────────────────────

    /// Begin a recognition session hinted with the current viewer
    /// language. The hint stays pinned until the session ends; a
    /// viewer-language change applies from the next start.
    pub fn start_listening(&self) -> Result<(), SessionError> {
        let lang = self.lock().prefs.viewer_language;
        match self.speech.start(lang, self.recognition_tx.clone()) {
            Ok(()) => {
                self.emit(SessionEvent::ListeningChanged { listening: true });
                Ok(())
            }
            Err(err) => {
                let notice = match &err {
                    RecognitionError::Unavailable => {
                        "Speech recognition is not supported on this platform.".to_string()
                    }
                    RecognitionError::StartFailed(reason) => {
                        format!("Speech recognition error: {reason}. Please try again.")
                    }
                };
                self.notice(notice);
                Err(SessionError::from_recognition(err))
            }
        }
    }

    /// Explicit user cancellation; the transcribed input stays editable.
    /// A no-op when nothing is listening — subscribers never see a
    /// transition that did not happen.
    pub fn stop_listening(&self) {
        if self.speech.stop() {
            self.emit(SessionEvent::ListeningChanged { listening: false });
        }
    }

    /// Apply one recognition engine event.
    pub fn handle_recognition_event(&self, event: RecognitionEvent) {
        match self.speech.on_event(event) {
            SpeechOutcome::ReplaceInput(transcript) => {
                self.lock().input = transcript.clone();
                self.emit(SessionEvent::InputChanged { input: transcript });
            }
            SpeechOutcome::Stopped => {
                self.emit(SessionEvent::ListeningChanged { listening: false });
            }
            SpeechOutcome::Failed(code) => {
                self.emit(SessionEvent::ListeningChanged { listening: false });
                self.notice(format!("Speech recognition error: {code}. Please try again."));
            }
            SpeechOutcome::Ignored => {
                tracing::trace!("ignoring stale recognition event");
            }
        }
    }

    /// Apply one playback engine event.
    pub fn handle_playback_event(&self, event: PlaybackEvent) {
        match self.playback.on_event(event) {
            PlaybackOutcome::Finished => {
                self.emit(SessionEvent::PlaybackChanged { playing: false });
            }
            PlaybackOutcome::Failed(reason) => {
                tracing::warn!(%reason, "audio playback failed");
                self.emit(SessionEvent::PlaybackChanged { playing: false });
                self.notice("Audio playback failed.");
            }
            PlaybackOutcome::Stale => {
                tracing::trace!("ignoring stale playback event");
            }
        }
    }

    /// Pump engine events until the session shuts down.
    ///
    /// The composition root spawns this once; tests drive the handlers
    /// directly instead.
    pub async fn run(&self) {
        let Some(mut pumps) = self.pumps.lock().expect("pumps poisoned").take() else {
            tracing::warn!("session event pump already running");
            return;
        };
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                Some(event) = pumps.recognition.recv() => self.handle_recognition_event(event),
                Some(event) = pumps.playback.recv() => self.handle_playback_event(event),
                else => break,
            }
        }
    }

    // ── State access ───────────────────────────────────────────────

    /// Snapshot of the message log, in display order.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().store.messages().to_vec()
    }

    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<ChatMessage> {
        self.lock().store.get(id).cloned()
    }

    #[must_use]
    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    /// Replace the pending input buffer (typed edit).
    pub fn set_input(&self, input: impl Into<String>) {
        let input = input.into();
        self.lock().input.clone_from(&input);
        self.emit(SessionEvent::InputChanged { input });
    }

    #[must_use]
    pub fn viewer_language(&self) -> LanguageCode {
        self.lock().prefs.viewer_language
    }

    /// Change the viewer language. Existing messages keep their tags; a
    /// running recognition session keeps its pinned hint.
    pub fn set_viewer_language(&self, language: LanguageCode) {
        self.lock().prefs.viewer_language = language;
        self.emit(SessionEvent::ViewerLanguageChanged { language });
    }

    #[must_use]
    pub fn username(&self) -> String {
        self.lock().prefs.identity.username.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.gauge.is_loading()
    }

    /// Observe the in-flight operation count.
    #[must_use]
    pub fn watch_loading(&self) -> watch::Receiver<usize> {
        self.gauge.watch()
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.speech.is_listening()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Subscribe to the re-render signal.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// End the session: abandon in-flight calls, stop recognition and
    /// release any playback. Abandoned calls append nothing.
    pub fn shutdown(&self) {
        tracing::info!("session shutting down");
        self.cancel.cancel();
        self.speech.stop();
        self.playback.shutdown();
    }

    // ── Internals ──────────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().expect("session state poisoned")
    }

    fn append(&self, new: NewChatMessage) -> ChatMessage {
        let message = {
            let mut shared = self.lock();
            let id = shared.store.append(new);
            shared.store.get(id).expect("just appended").clone()
        };
        self.emit(SessionEvent::MessageAppended {
            message: message.clone(),
        });
        message
    }

    fn notice(&self, text: impl Into<String>) {
        self.append(NewChatMessage::system(text));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine — the log is the source of truth.
        let _ = self.events.send(event);
    }
}

impl Drop for SessionService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
