//! Domain types for the chat session, independent of any infrastructure.

pub mod language;
pub mod message;
pub mod session;

pub use language::LanguageCode;
pub use message::{ChatMessage, MessageId, NewChatMessage, SenderKind};
pub use session::{SessionIdentity, SessionPreferences};
