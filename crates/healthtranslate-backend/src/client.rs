//! Reqwest implementation of the `ProviderBackend` port.

use async_trait::async_trait;
use healthtranslate_core::{BackendError, LanguageCode, ProviderBackend};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::BackendConfig;
use crate::wire::{
    ProviderResponseBody, ProviderResponseRequest, SpeakRequest, TranslateBody, TranslateRequest,
};

/// HTTP client for the backend collaborator.
pub struct HttpProviderBackend {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpProviderBackend {
    /// Build a client from configuration.
    ///
    /// Fails only on an unparseable base URL or an unbuildable TLS stack.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::InvalidResponse(format!("invalid base URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token: config.token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidResponse(format!("invalid endpoint {path}: {e}")))
    }

    fn post<B: Serialize>(&self, url: Url, body: &B) -> reqwest::RequestBuilder {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "backend call failed");
            return Err(BackendError::Http {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path)?;
        let response = self.send(path, self.post(url, body)).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ProviderBackend for HttpProviderBackend {
    async fn provider_response(
        &self,
        text: &str,
        lang: LanguageCode,
    ) -> Result<String, BackendError> {
        tracing::debug!(%lang, "requesting provider response");
        let body: ProviderResponseBody = self
            .post_json("/provider-response", &ProviderResponseRequest { text, lang })
            .await?;
        Ok(body.response)
    }

    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, BackendError> {
        tracing::debug!(%source, %target, "requesting translation");
        let body: TranslateBody = self
            .post_json(
                "/translate",
                &TranslateRequest {
                    text,
                    source_lang: source,
                    target_lang: target,
                },
            )
            .await?;
        Ok(body.translated_text)
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        lang: LanguageCode,
    ) -> Result<Vec<u8>, BackendError> {
        tracing::debug!(%lang, "requesting speech synthesis");
        let url = self.endpoint("/text-to-speech")?;
        let response = self
            .send("/text-to-speech", self.post(url, &SpeakRequest { text, lang }))
            .await?;
        let payload = response
            .bytes()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        // Zero-length is a valid quota-exhausted answer; the session
        // decides what to tell the user.
        Ok(payload.to_vec())
    }
}

fn classify_transport(err: reqwest::Error) -> BackendError {
    if err.is_decode() {
        BackendError::InvalidResponse(err.to_string())
    } else {
        BackendError::Network(err.to_string())
    }
}
