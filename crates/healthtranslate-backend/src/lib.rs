//! HTTP adapter for the HealthTranslate backend collaborator.
//!
//! Implements the `ProviderBackend` port from `healthtranslate-core`
//! against the three JSON/binary endpoints the service exposes. No
//! retries: a failed call surfaces to the session, which turns it into a
//! notice; every retry is a new user action.

mod client;
mod config;
mod wire;

pub use client::HttpProviderBackend;
pub use config::{BackendConfig, DEFAULT_BASE_URL};
