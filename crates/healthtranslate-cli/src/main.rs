//! CLI entry point — the composition root.
//!
//! This is the only place where adapters are wired together: the HTTP
//! backend, the audio output (real device or noop fallback) and the
//! recognition port are constructed here and injected into the session.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use healthtranslate_backend::{BackendConfig, HttpProviderBackend};
use healthtranslate_core::{
    AudioOutputPort, LanguageCode, SessionIdentity, SessionPreferences, SessionService,
};
use healthtranslate_voice::{NoopAudioOutput, RodioOutput, UnavailableRecognizer};

mod repl;

/// Multilingual healthcare chat with translation and speech.
#[derive(Debug, Parser)]
#[command(name = "healthtranslate", version)]
struct Cli {
    /// Base URL of the backend service.
    #[arg(long, env = "HT_API_URL", default_value = healthtranslate_backend::DEFAULT_BASE_URL)]
    api_url: String,

    /// Viewer language (en, es, fr, ar, ur, zh, hi, pt).
    #[arg(long, short, default_value = "en")]
    language: String,

    /// Display name used on outgoing messages.
    #[arg(long, env = "HT_USERNAME", default_value = "guest")]
    username: String,

    /// Skip the audio device and discard playback.
    #[arg(long)]
    no_audio: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("healthtranslate=warn")),
        )
        .init();

    let cli = Cli::parse();
    let language = LanguageCode::parse(&cli.language)
        .with_context(|| format!("unsupported language code '{}'", cli.language))?;

    // Identity normally comes from the auth collaborator; the CLI runs
    // with a local stand-in.
    let prefs = SessionPreferences::new(
        SessionIdentity {
            username: cli.username.clone(),
            email: format!("{}@local", cli.username),
            token: "local-session".into(),
        },
        language,
    );

    let backend = Arc::new(
        HttpProviderBackend::new(BackendConfig::new().with_base_url(&cli.api_url))
            .context("building backend client")?,
    );

    let audio: Arc<dyn AudioOutputPort> = if cli.no_audio {
        Arc::new(NoopAudioOutput)
    } else {
        match RodioOutput::new() {
            Ok(output) => Arc::new(output),
            Err(err) => {
                tracing::warn!(error = %err, "audio unavailable, playback will be silent");
                Arc::new(NoopAudioOutput)
            }
        }
    };

    let session = Arc::new(SessionService::new(
        prefs,
        backend,
        Arc::new(UnavailableRecognizer),
        audio,
    ));

    // Pump engine events for the lifetime of the session.
    let pump = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.run().await }
    });

    let result = repl::run(&session).await;

    session.shutdown();
    pump.await.ok();
    result
}
