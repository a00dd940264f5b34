//! Interactive chat loop.
//!
//! Plain text sends a message; slash commands drive translation, speech
//! and preferences. The loop re-renders by printing every message that
//! appeared since the last prompt — the log itself is the source of truth.

use std::sync::Arc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use healthtranslate_core::{
    ChatMessage, LanguageCode, MessageId, SenderKind, SessionService,
};

const HELP: &str = "\
commands:
  /translate <id> <lang>   translate a message
  /speak <id> [lang]       read a message aloud
  /lang <lang>             switch viewer language
  /languages               list supported languages
  /messages                reprint the whole conversation
  /listen | /stop          voice input (where supported)
  /quit                    leave the chat";

pub async fn run(session: &Arc<SessionService>) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut last_seen = render_from(session, MessageId(0));
    println!("(type /help for commands)");

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(&line)?;

        if let Some(command) = line.strip_prefix('/') {
            if !dispatch(session, command).await {
                break;
            }
        } else if let Err(err) = session.send_message(&line, false).await {
            tracing::debug!(error = %err, "send failed");
        }

        last_seen = render_from(session, last_seen);
    }
    Ok(())
}

/// Handle one slash command; returns false to quit.
async fn dispatch(session: &Arc<SessionService>, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit" | "exit") => return false,
        Some("help") => println!("{HELP}"),
        Some("languages") => {
            for lang in LanguageCode::ALL {
                println!("  {} {}  {}", lang.flag(), lang.as_str(), lang.display_name());
            }
        }
        Some("lang") => match parts.next().and_then(LanguageCode::parse) {
            Some(lang) => {
                session.set_viewer_language(lang);
                println!("viewer language: {}", lang.display_name());
            }
            None => println!("usage: /lang <code>  (see /languages)"),
        },
        Some("translate") => {
            let id = parts.next().and_then(|s| s.parse::<u64>().ok()).map(MessageId);
            let lang = parts.next().and_then(LanguageCode::parse);
            match (id, lang) {
                (Some(id), Some(lang)) => match session.translate(id, lang).await {
                    Ok(text) => println!("[{id}→{lang}] {text}"),
                    Err(err) => tracing::debug!(error = %err, "translate failed"),
                },
                _ => println!("usage: /translate <id> <lang>"),
            }
        }
        Some("speak") => {
            let id = parts.next().and_then(|s| s.parse::<u64>().ok()).map(MessageId);
            let lang = parts
                .next()
                .and_then(LanguageCode::parse)
                .unwrap_or_else(|| session.viewer_language());
            match id {
                Some(id) => {
                    if let Err(err) = session.speak_message(id, lang).await {
                        tracing::debug!(error = %err, "speak failed");
                    }
                }
                None => println!("usage: /speak <id> [lang]"),
            }
        }
        Some("messages") => {
            render_from(session, MessageId(0));
        }
        Some("listen") => {
            if session.start_listening().is_ok() {
                println!("listening... (/stop to cancel)");
            }
        }
        Some("stop") => session.stop_listening(),
        _ => println!("unknown command (/help)"),
    }
    true
}

/// Print every message newer than `after`; returns the newest id printed.
fn render_from(session: &Arc<SessionService>, after: MessageId) -> MessageId {
    let viewer = session.viewer_language();
    let mut newest = after;
    for message in session.messages() {
        if message.id > after {
            println!("{}", format_message(&message, viewer));
            newest = message.id;
        }
    }
    newest
}

fn format_message(message: &ChatMessage, viewer: LanguageCode) -> String {
    match message.sender_kind {
        SenderKind::System => format!("  * {}", message.text),
        _ => {
            let sender = message.sender.as_deref().unwrap_or("?");
            let text = message.text_in(viewer).unwrap_or(&message.text);
            let voice = if message.is_voice_note { " [voice]" } else { "" };
            format!("[{}] {}{}: {}", message.id, sender, voice, text)
        }
    }
}
