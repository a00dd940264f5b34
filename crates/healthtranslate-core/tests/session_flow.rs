//! Integration tests for the `SessionService` coordinator.
//!
//! These tests drive the session with mock backend/recognition/audio
//! ports. No network access or audio hardware is required — the mocks
//! return canned responses and count every call.
//!
//! # What is tested
//!
//! - Whitespace-only input: no message, no network call
//! - Optimistic send: the viewer message survives a provider failure
//! - Translation idempotence: repeat calls hit the cache, one wire call
//! - Exact `/translate` request shape
//! - The `"Translation failed"` sentinel: no cache write, one notice
//! - Concurrent duplicate translates coalesce to one wire call
//! - Playback preemption order and the empty-payload quota notice
//! - Recognition errors: idle state, one notice, buffer untouched
//! - Stale recognition events never reach a restarted session
//! - Shutdown abandons in-flight calls without appending messages

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use healthtranslate_core::{
    AudioOutputPort, BackendError, LanguageCode, MessageId, PlaybackError, PlaybackEvent,
    PlaybackHandle, ProviderBackend, RecognitionError, RecognitionEvent, RecognitionHandle,
    SenderKind, SessionError, SessionIdentity, SessionPreferences, SessionService,
    SpeechRecognitionPort,
};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{Notify, mpsc};

// ── Mock backend ───────────────────────────────────────────────────

/// How a mock endpoint should answer.
#[derive(Debug, Clone)]
enum Answer {
    Text(String),
    /// Transport failure.
    Fail,
    /// Block until [`MockBackend::release`] is called, then answer.
    HoldThenText(String),
    /// Block forever (for cancellation tests).
    Hang,
}

struct MockBackend {
    provider_calls: AtomicUsize,
    translate_calls: AtomicUsize,
    synthesize_calls: AtomicUsize,
    translate_requests: StdMutex<Vec<(String, LanguageCode, LanguageCode)>>,
    provider_answer: StdMutex<Answer>,
    translate_answer: StdMutex<Answer>,
    synthesize_payload: StdMutex<Vec<u8>>,
    gate: Notify,
}

impl MockBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            provider_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
            synthesize_calls: AtomicUsize::new(0),
            translate_requests: StdMutex::new(Vec::new()),
            provider_answer: StdMutex::new(Answer::Text("How long have you had it?".into())),
            translate_answer: StdMutex::new(Answer::Text("Me duele la cabeza".into())),
            synthesize_payload: StdMutex::new(vec![0u8; 64]),
            gate: Notify::new(),
        })
    }

    fn set_provider(&self, answer: Answer) {
        *self.provider_answer.lock().unwrap() = answer;
    }

    fn set_translate(&self, answer: Answer) {
        *self.translate_answer.lock().unwrap() = answer;
    }

    fn set_synthesize_payload(&self, payload: Vec<u8>) {
        *self.synthesize_payload.lock().unwrap() = payload;
    }

    fn release(&self) {
        self.gate.notify_one();
    }

    async fn answer(&self, answer: Answer) -> Result<String, BackendError> {
        match answer {
            Answer::Text(text) => Ok(text),
            Answer::Fail => Err(BackendError::Network("connection refused".into())),
            Answer::HoldThenText(text) => {
                self.gate.notified().await;
                Ok(text)
            }
            Answer::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[async_trait]
impl ProviderBackend for MockBackend {
    async fn provider_response(
        &self,
        _text: &str,
        _lang: LanguageCode,
    ) -> Result<String, BackendError> {
        self.provider_calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.provider_answer.lock().unwrap().clone();
        self.answer(answer).await
    }

    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, BackendError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        self.translate_requests
            .lock()
            .unwrap()
            .push((text.to_string(), source, target));
        let answer = self.translate_answer.lock().unwrap().clone();
        self.answer(answer).await
    }

    async fn synthesize_speech(
        &self,
        _text: &str,
        _lang: LanguageCode,
    ) -> Result<Vec<u8>, BackendError> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.synthesize_payload.lock().unwrap().clone())
    }
}

// ── Mock recognition engine ────────────────────────────────────────

struct MockEngine;

struct MockEngineHandle;

impl RecognitionHandle for MockEngineHandle {
    fn stop(&self) {}
}

impl SpeechRecognitionPort for MockEngine {
    fn start(
        &self,
        _language_tag: &str,
        _generation: u64,
        _events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<Box<dyn RecognitionHandle>, RecognitionError> {
        Ok(Box::new(MockEngineHandle))
    }
}

struct NoEngine;

impl SpeechRecognitionPort for NoEngine {
    fn start(
        &self,
        _language_tag: &str,
        _generation: u64,
        _events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<Box<dyn RecognitionHandle>, RecognitionError> {
        Err(RecognitionError::Unavailable)
    }
}

/// Engine that exists but refuses to open a session.
struct RefusingEngine;

impl SpeechRecognitionPort for RefusingEngine {
    fn start(
        &self,
        _language_tag: &str,
        _generation: u64,
        _events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<Box<dyn RecognitionHandle>, RecognitionError> {
        Err(RecognitionError::StartFailed("audio-capture".into()))
    }
}

// ── Mock audio output ──────────────────────────────────────────────

/// Records the interleaving of begins and releases so preemption order is
/// observable.
#[derive(Default)]
struct MockAudio {
    log: Arc<StdMutex<Vec<String>>>,
}

struct MockAudioHandle {
    generation: u64,
    log: Arc<StdMutex<Vec<String>>>,
}

impl PlaybackHandle for MockAudioHandle {
    fn release(&self) {
        self.log
            .lock()
            .unwrap()
            .push(format!("release {}", self.generation));
    }
}

impl AudioOutputPort for MockAudio {
    fn begin(
        &self,
        _audio: Vec<u8>,
        generation: u64,
        _events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        self.log.lock().unwrap().push(format!("begin {generation}"));
        Ok(Box::new(MockAudioHandle {
            generation,
            log: Arc::clone(&self.log),
        }))
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn preferences(lang: LanguageCode) -> SessionPreferences {
    SessionPreferences::new(
        SessionIdentity {
            username: "sam".into(),
            email: "sam@example.com".into(),
            token: "mock-token".into(),
        },
        lang,
    )
}

fn session_with(
    backend: Arc<MockBackend>,
    lang: LanguageCode,
) -> (Arc<SessionService>, Arc<StdMutex<Vec<String>>>) {
    let audio = Arc::new(MockAudio::default());
    let log = Arc::clone(&audio.log);
    let session = Arc::new(SessionService::new(
        preferences(lang),
        backend,
        Arc::new(MockEngine),
        audio,
    ));
    (session, log)
}

fn system_messages(session: &SessionService) -> Vec<String> {
    session
        .messages()
        .into_iter()
        .filter(|m| m.sender_kind == SenderKind::System)
        .map(|m| m.text)
        .collect()
}

// ── Sending ────────────────────────────────────────────────────────

#[tokio::test]
async fn whitespace_input_is_a_no_op() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend.clone(), LanguageCode::English);

    session.send_message("   \n\t ", false).await.unwrap();

    // Only the seeded welcome message; no network traffic.
    assert_eq!(session.messages().len(), 1);
    assert_eq!(backend.provider_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn send_appends_user_then_provider_reply() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend.clone(), LanguageCode::English);

    session.send_message("I have a headache", false).await.unwrap();

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender_kind, SenderKind::User);
    assert_eq!(messages[1].text, "I have a headache");
    assert_eq!(messages[1].language, LanguageCode::English);
    assert_eq!(messages[2].sender_kind, SenderKind::Provider);
    assert_eq!(messages[2].text, "How long have you had it?");
    assert!(messages[1].id < messages[2].id);
}

#[tokio::test]
async fn optimistic_user_message_survives_provider_failure() {
    let backend = MockBackend::new();
    backend.set_provider(Answer::Fail);
    let (session, _) = session_with(backend.clone(), LanguageCode::English);

    let result = session.send_message("hello?", false).await;
    assert!(result.is_err());

    let messages = session.messages();
    // welcome + optimistic user message + failure notice, no rollback
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender_kind, SenderKind::User);
    assert_eq!(messages[2].sender_kind, SenderKind::System);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn voice_notes_are_flagged_and_clear_the_buffer() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend, LanguageCode::English);

    session.set_input("I feel dizzy");
    session.send_message(&session.input(), true).await.unwrap();

    assert!(session.messages()[1].is_voice_note);
    assert_eq!(session.input(), "");
}

// ── Translation ────────────────────────────────────────────────────

#[tokio::test]
async fn translate_sends_the_exact_request_and_caches() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend.clone(), LanguageCode::English);
    session.send_message("I have a headache", false).await.unwrap();
    let id = session.messages()[1].id;

    let first = session.translate(id, LanguageCode::Spanish).await.unwrap();
    assert_eq!(first, "Me duele la cabeza");
    assert_eq!(
        backend.translate_requests.lock().unwrap().as_slice(),
        &[(
            "I have a headache".to_string(),
            LanguageCode::English,
            LanguageCode::Spanish
        )]
    );
    assert_eq!(
        session.message(id).unwrap().translations[&LanguageCode::Spanish],
        "Me duele la cabeza"
    );

    // Second call: cache hit, zero further network calls.
    let second = session.translate(id, LanguageCode::Spanish).await.unwrap();
    assert_eq!(second, "Me duele la cabeza");
    assert_eq!(backend.translate_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn translating_into_the_own_language_is_identity() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend.clone(), LanguageCode::English);
    session.send_message("I have a headache", false).await.unwrap();
    let id = session.messages()[1].id;

    let text = session.translate(id, LanguageCode::English).await.unwrap();
    assert_eq!(text, "I have a headache");
    // Identity is never materialized as a cache entry or a request.
    assert!(session.message(id).unwrap().translations.is_empty());
    assert_eq!(backend.translate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sentinel_response_is_a_failure_and_is_not_cached() {
    let backend = MockBackend::new();
    backend.set_translate(Answer::Text("Translation failed".into()));
    let (session, _) = session_with(backend.clone(), LanguageCode::English);
    session.send_message("I have a headache", false).await.unwrap();
    let id = session.messages()[1].id;

    let result = session.translate(id, LanguageCode::Spanish).await;
    assert!(result.is_err());
    assert!(session.message(id).unwrap().translations.is_empty());
    assert_eq!(
        system_messages(&session),
        vec!["Translation failed. Please try again.".to_string()]
    );

    // Failures are not cached: a retry issues a fresh request.
    backend.set_translate(Answer::Text("Me duele la cabeza".into()));
    let retried = session.translate(id, LanguageCode::Spanish).await.unwrap();
    assert_eq!(retried, "Me duele la cabeza");
    assert_eq!(backend.translate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_duplicate_translates_share_one_request() {
    let backend = MockBackend::new();
    backend.set_translate(Answer::HoldThenText("Me duele la cabeza".into()));
    let (session, _) = session_with(backend.clone(), LanguageCode::English);
    session.send_message("I have a headache", false).await.unwrap();
    let id = session.messages()[1].id;

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.translate(id, LanguageCode::Spanish).await }
    });
    let second = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.translate(id, LanguageCode::Spanish).await }
    });

    // Let both tasks reach the registry before the wire call resolves.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(session.is_loading());
    backend.release();

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first, "Me duele la cabeza");
    assert_eq!(second, "Me duele la cabeza");
    assert_eq!(backend.translate_calls.load(Ordering::SeqCst), 1);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn translating_an_unknown_message_fails_cleanly() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend.clone(), LanguageCode::English);

    let result = session.translate(MessageId(99), LanguageCode::Spanish).await;
    assert!(result.is_err());
    assert_eq!(backend.translate_calls.load(Ordering::SeqCst), 0);
}

// ── Speech synthesis & playback ────────────────────────────────────

#[tokio::test]
async fn speak_preempts_the_previous_playback() {
    let backend = MockBackend::new();
    let (session, log) = session_with(backend, LanguageCode::English);

    session.speak("Hello", LanguageCode::English).await.unwrap();
    session.speak("Hola", LanguageCode::Spanish).await.unwrap();

    // The first stream is released before the second begins.
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &["begin 1", "release 1", "begin 2"]
    );
    assert!(session.is_playing());
}

#[tokio::test]
async fn empty_synthesis_payload_is_a_quota_notice_not_playback() {
    let backend = MockBackend::new();
    backend.set_synthesize_payload(Vec::new());
    let (session, log) = session_with(backend, LanguageCode::English);

    let result = session.speak("Hello", LanguageCode::English).await;
    assert!(result.is_err());
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(
        system_messages(&session),
        vec!["Text-to-speech not available (quota exceeded).".to_string()]
    );
    assert!(!session.is_playing());
}

#[tokio::test]
async fn speak_message_prefers_the_cached_translation() {
    let backend = MockBackend::new();
    let (session, log) = session_with(backend, LanguageCode::English);
    session.send_message("I have a headache", false).await.unwrap();
    let id = session.messages()[1].id;
    session.translate(id, LanguageCode::Spanish).await.unwrap();

    session.speak_message(id, LanguageCode::Spanish).await.unwrap();
    assert_eq!(log.lock().unwrap().len(), 1);
}

// ── Speech recognition ─────────────────────────────────────────────

#[tokio::test]
async fn recognition_error_leaves_buffer_and_appends_one_notice() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend, LanguageCode::English);

    session.start_listening().unwrap();
    session.handle_recognition_event(RecognitionEvent::Transcript {
        generation: 1,
        text: "I have".into(),
    });
    assert_eq!(session.input(), "I have");

    session.handle_recognition_event(RecognitionEvent::Error {
        generation: 1,
        code: "no-speech".into(),
    });
    assert!(!session.is_listening());
    assert_eq!(session.input(), "I have");
    let notices = system_messages(&session);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("no-speech"));
}

#[tokio::test]
async fn transcripts_replace_the_input_buffer() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend, LanguageCode::English);

    session.start_listening().unwrap();
    session.handle_recognition_event(RecognitionEvent::Transcript {
        generation: 1,
        text: "I have".into(),
    });
    session.handle_recognition_event(RecognitionEvent::Transcript {
        generation: 1,
        text: "I have a headache".into(),
    });
    assert_eq!(session.input(), "I have a headache");

    // Engine end: back to idle, nothing submitted, buffer editable.
    session.handle_recognition_event(RecognitionEvent::Ended { generation: 1 });
    assert!(!session.is_listening());
    assert_eq!(session.input(), "I have a headache");
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test]
async fn late_terminal_event_does_not_end_a_restarted_session() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend, LanguageCode::English);

    // First session is stopped; the engine's terminal event is still in
    // flight when the second session starts.
    session.start_listening().unwrap();
    session.stop_listening();
    session.start_listening().unwrap();

    session.handle_recognition_event(RecognitionEvent::Ended { generation: 1 });
    assert!(session.is_listening());

    // A late engine error must not surface a notice for the live session
    // either.
    session.handle_recognition_event(RecognitionEvent::Error {
        generation: 1,
        code: "no-speech".into(),
    });
    assert!(session.is_listening());
    assert!(system_messages(&session).is_empty());

    // The live session still ends on its own terminal event.
    session.handle_recognition_event(RecognitionEvent::Ended { generation: 2 });
    assert!(!session.is_listening());
}

#[tokio::test]
async fn stop_while_idle_emits_no_listening_transition() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend, LanguageCode::English);
    let mut events = session.subscribe();

    session.stop_listening();
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // A real session still produces exactly one transition each way.
    session.start_listening().unwrap();
    session.stop_listening();
    session.stop_listening();
    let mut transitions = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, healthtranslate_core::SessionEvent::ListeningChanged { .. }) {
            transitions += 1;
        }
    }
    assert_eq!(transitions, 2);
}

#[tokio::test]
async fn refused_engine_start_is_retryable_not_a_platform_gap() {
    let backend = MockBackend::new();
    let session = SessionService::new(
        preferences(LanguageCode::English),
        backend,
        Arc::new(RefusingEngine),
        Arc::new(MockAudio::default()),
    );

    let err = session.start_listening().unwrap_err();
    assert!(matches!(err, SessionError::RecognitionStart(_)));
    assert!(!session.is_listening());
    let notices = system_messages(&session);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("Please try again"));
}

#[tokio::test]
async fn missing_recognition_engine_becomes_a_notice() {
    let backend = MockBackend::new();
    let session = SessionService::new(
        preferences(LanguageCode::English),
        backend,
        Arc::new(NoEngine),
        Arc::new(MockAudio::default()),
    );

    let result = session.start_listening();
    assert!(result.is_err());
    assert!(!session.is_listening());
    let notices = system_messages(&session);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("not supported"));
}

#[tokio::test]
async fn language_change_applies_to_the_next_session_only() {
    let backend = MockBackend::new();
    let (session, _) = session_with(backend, LanguageCode::Chinese);

    session.start_listening().unwrap();
    session.set_viewer_language(LanguageCode::Spanish);
    // The live session keeps its pinned hint.
    assert!(session.is_listening());

    session.stop_listening();
    session.start_listening().unwrap();
    assert_eq!(session.viewer_language(), LanguageCode::Spanish);
}

// ── Cancellation ───────────────────────────────────────────────────

#[tokio::test]
async fn shutdown_abandons_in_flight_sends_without_appending() {
    let backend = MockBackend::new();
    backend.set_provider(Answer::Hang);
    let (session, _) = session_with(backend, LanguageCode::English);

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.send_message("hello?", false).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(session.is_loading());

    session.shutdown();
    let result = pending.await.unwrap();
    assert!(result.is_err());

    // The optimistic message stays; no reply and no notice arrive after
    // the user has left, and the loading gauge is cleared.
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender_kind, SenderKind::User);
    assert!(!session.is_loading());
}
