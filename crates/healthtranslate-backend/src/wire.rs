//! Wire shapes for the backend collaborator's JSON endpoints.

use healthtranslate_core::LanguageCode;
use serde::{Deserialize, Serialize};

/// `POST /provider-response` request body.
#[derive(Debug, Serialize)]
pub struct ProviderResponseRequest<'a> {
    pub text: &'a str,
    pub lang: LanguageCode,
}

/// `POST /provider-response` response body.
#[derive(Debug, Deserialize)]
pub struct ProviderResponseBody {
    pub response: String,
}

/// `POST /translate` request body.
#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub text: &'a str,
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
}

/// `POST /translate` response body.
///
/// The service reports translation failure in-band: a well-formed body
/// whose `translated_text` is the `"Translation failed"` sentinel. The
/// adapter passes the raw text through — classifying the sentinel is
/// session policy, not transport.
#[derive(Debug, Deserialize)]
pub struct TranslateBody {
    pub translated_text: String,
}

/// `POST /text-to-speech` request body. The response is a binary audio
/// payload, not JSON; zero length means synthesis quota is exhausted.
#[derive(Debug, Serialize)]
pub struct SpeakRequest<'a> {
    pub text: &'a str,
    pub lang: LanguageCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_request_matches_the_wire_contract() {
        let body = TranslateRequest {
            text: "I have a headache",
            source_lang: LanguageCode::English,
            target_lang: LanguageCode::Spanish,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": "I have a headache",
                "source_lang": "en",
                "target_lang": "es",
            })
        );
    }

    #[test]
    fn provider_response_body_parses() {
        let body: ProviderResponseBody =
            serde_json::from_str(r#"{"response":"How long have you had it?"}"#).unwrap();
        assert_eq!(body.response, "How long have you had it?");
    }
}
