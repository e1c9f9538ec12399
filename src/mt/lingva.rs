//! Lingva Translate provider
//!
//! Lingva is an open-source front-end for Google Translate with a simple
//! REST API: `GET {base}/api/v1/{source}/{target}/{text}` answering
//! `{"translation": "..."}`. Public instances come and go, so the base URL
//! can be overridden with `LINGVA_BASE_URL`.

use crate::data::{DomainHint, Language};
use crate::mt::error::{MtResult, ProviderError};
use crate::mt::http::{build_client, read_json};
use crate::mt::translator::{TranslationProvider, non_empty};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Public instance used when `LINGVA_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "https://lingva.ml";

#[derive(Clone, Debug)]
pub struct LingvaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LingvaProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> MtResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ProviderError::config("Lingva base URL cannot be empty"));
        }
        Ok(Self {
            client: build_client(timeout)?,
            base_url,
        })
    }

    fn url(&self, text: &str, source: Language, target: Language) -> String {
        format!(
            "{}/api/v1/{}/{}/{}",
            self.base_url,
            source.code(),
            target.code(),
            urlencoding::encode(text)
        )
    }
}

/// Extract `translation` from a Lingva response
pub fn parse_response(json: &Value) -> MtResult<String> {
    if let Some(error) = json.get("error").and_then(Value::as_str) {
        return Err(ProviderError::parse(format!("Lingva error: {}", error)));
    }

    let translated = json
        .get("translation")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::parse("Invalid response: missing 'translation'"))?;

    non_empty(translated.to_string())
}

#[async_trait]
impl TranslationProvider for LingvaProvider {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        _domain: Option<DomainHint>,
    ) -> MtResult<String> {
        let response = self.client.get(self.url(text, source, target)).send().await?;
        let json = read_json(response).await?;
        parse_response(&json)
    }

    fn provider_name(&self) -> &str {
        "Lingva"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::error::ProviderErrorKind;
    use crate::mt::http::DEFAULT_HTTP_TIMEOUT;
    use serde_json::json;

    fn provider() -> LingvaProvider {
        LingvaProvider::new("https://lingva.example/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_uses_path_segments() {
        let url = provider().url("Guten Tag/Abend", Language::German, Language::English);
        assert_eq!(
            url,
            "https://lingva.example/api/v1/de/en/Guten%20Tag%2FAbend"
        );
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        assert!(LingvaProvider::new("", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_parse_response() {
        let json = json!({"translation": "Good day"});
        assert_eq!(parse_response(&json).unwrap(), "Good day");
    }

    #[test]
    fn test_parse_response_error_body() {
        let json = json!({"error": "Invalid target language"});
        let err = parse_response(&json).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ParseError);
        assert!(err.message.contains("Invalid target language"));
    }

    #[test]
    fn test_parse_response_missing_field() {
        let json = json!({"info": {}});
        assert_eq!(parse_response(&json).unwrap_err().kind, ProviderErrorKind::ParseError);
    }

    #[test]
    fn test_parse_response_blank_translation() {
        let json = json!({"translation": " "});
        assert_eq!(parse_response(&json).unwrap_err().kind, ProviderErrorKind::EmptyResult);
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider().provider_name(), "Lingva");
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_real_lingva_instance() {
        let provider = LingvaProvider::new(DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT).unwrap();
        let result = provider
            .translate("Guten Tag", Language::German, Language::English, None)
            .await
            .unwrap();
        assert!(!result.is_empty());
    }
}
