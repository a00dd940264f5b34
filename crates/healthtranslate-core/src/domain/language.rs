//! Supported languages.
//!
//! The set is closed: the backend collaborator only serves these eight
//! languages, so the rest of the crate can rely on exhaustive matching
//! instead of validating free-form strings.

use serde::{Deserialize, Serialize};

/// A supported language, identified by its ISO 639-1 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "ur")]
    Urdu,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "pt")]
    Portuguese,
}

impl LanguageCode {
    /// All supported languages, in display order.
    pub const ALL: [Self; 8] = [
        Self::English,
        Self::Spanish,
        Self::French,
        Self::Arabic,
        Self::Urdu,
        Self::Chinese,
        Self::Hindi,
        Self::Portuguese,
    ];

    /// Parse an ISO 639-1 code.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            "fr" => Some(Self::French),
            "ar" => Some(Self::Arabic),
            "ur" => Some(Self::Urdu),
            "zh" => Some(Self::Chinese),
            "hi" => Some(Self::Hindi),
            "pt" => Some(Self::Portuguese),
            _ => None,
        }
    }

    /// The ISO 639-1 code used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::Arabic => "ar",
            Self::Urdu => "ur",
            Self::Chinese => "zh",
            Self::Hindi => "hi",
            Self::Portuguese => "pt",
        }
    }

    /// Human-readable English name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::Arabic => "Arabic",
            Self::Urdu => "Urdu",
            Self::Chinese => "Chinese",
            Self::Hindi => "Hindi",
            Self::Portuguese => "Portuguese",
        }
    }

    /// Flag emoji shown next to the language in pickers.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::English => "\u{1f1fa}\u{1f1f8}",
            Self::Spanish => "\u{1f1ea}\u{1f1f8}",
            Self::French => "\u{1f1eb}\u{1f1f7}",
            Self::Arabic => "\u{1f1f8}\u{1f1e6}",
            Self::Urdu => "\u{1f1f5}\u{1f1f0}",
            Self::Chinese => "\u{1f1e8}\u{1f1f3}",
            Self::Hindi => "\u{1f1ee}\u{1f1f3}",
            Self::Portuguese => "\u{1f1f5}\u{1f1f9}",
        }
    }

    /// Language hint handed to a speech-recognition engine.
    ///
    /// Recognition engines want a BCP 47 tag; the bare ISO code works for
    /// every supported language except Chinese, which engines only accept
    /// in regioned form.
    #[must_use]
    pub const fn recognition_tag(self) -> &'static str {
        match self {
            Self::Chinese => "zh-CN",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_code() {
        for lang in LanguageCode::ALL {
            assert_eq!(LanguageCode::parse(lang.as_str()), Some(lang));
        }
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert_eq!(LanguageCode::parse("de"), None);
        assert_eq!(LanguageCode::parse(""), None);
        assert_eq!(LanguageCode::parse("EN"), None);
    }

    #[test]
    fn chinese_recognition_tag_is_regioned() {
        assert_eq!(LanguageCode::Chinese.recognition_tag(), "zh-CN");
        assert_eq!(LanguageCode::Spanish.recognition_tag(), "es");
    }

    #[test]
    fn serde_uses_wire_codes() {
        let json = serde_json::to_string(&LanguageCode::Urdu).unwrap();
        assert_eq!(json, "\"ur\"");
        let back: LanguageCode = serde_json::from_str("\"zh\"").unwrap();
        assert_eq!(back, LanguageCode::Chinese);
    }
}
