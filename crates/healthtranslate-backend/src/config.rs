//! Public configuration for the backend HTTP client.

use std::time::Duration;

/// Default base URL of the backend collaborator.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for [`HttpProviderBackend`](crate::HttpProviderBackend).
///
/// Use the builder methods to customize the client.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use healthtranslate_backend::BackendConfig;
///
/// let config = BackendConfig::new()
///     .with_base_url("https://api.example.com")
///     .with_timeout(Duration::from_secs(15));
/// ```
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub(crate) base_url: String,
    pub(crate) user_agent: String,
    pub(crate) timeout: Duration,
    /// Optional bearer token forwarded on every request.
    pub(crate) token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("healthtranslate-backend/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            token: None,
        }
    }
}

impl BackendConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL of the backend collaborator.
    ///
    /// Defaults to [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the user agent string for HTTP requests.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout.
    ///
    /// Defaults to 30 seconds. There are no retries — a timed-out call
    /// surfaces as a network failure and the user decides whether to try
    /// again.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach the session bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = BackendConfig::new()
            .with_base_url("http://10.0.0.2:9000")
            .with_timeout(Duration::from_secs(5))
            .with_token("abc");
        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("abc"));
    }
}
