//! Google Translate provider
//!
//! Two endpoints are supported:
//!
//! - the keyless `translate_a/single` endpoint used by the browser widget
//!   (`client=gtx`), which answers with nested arrays of sentence segments
//! - the Cloud Translation API v2, authenticated with an API key
//!
//! [`build_providers`](crate::mt::build_providers) picks the keyed endpoint
//! when `GOOGLE_TRANSLATE_API_KEY` is set.
//!
//! # Example
//!
//! ```ignore
//! use chunked_translator::mt::{TranslationProvider, GoogleTranslateProvider};
//! use chunked_translator::Language;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::free()?;
//!     let result = provider
//!         .translate("Guten Tag", Language::German, Language::English, None)
//!         .await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use crate::data::{DomainHint, Language};
use crate::mt::error::{MtResult, ProviderError};
use crate::mt::http::{DEFAULT_HTTP_TIMEOUT, build_client, read_json};
use crate::mt::translator::{TranslationProvider, non_empty};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

const FREE_BASE_URL: &str = "https://translate.googleapis.com/translate_a/single";
const CLOUD_V2_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Which Google endpoint a provider talks to
#[derive(Clone, PartialEq, Eq)]
pub enum GoogleEndpoint {
    Free,
    CloudV2 { api_key: String },
}

impl std::fmt::Debug for GoogleEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoogleEndpoint::Free => f.write_str("Free"),
            GoogleEndpoint::CloudV2 { .. } => f.write_str("CloudV2 { api_key: *** }"),
        }
    }
}

#[derive(Clone)]
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    endpoint: GoogleEndpoint,
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Maximum characters per request (Cloud v2 limit is 30K per string)
    const MAX_CHARS_PER_STRING: usize = 30_000;

    /// Provider using the keyless endpoint
    pub fn free() -> MtResult<Self> {
        Self::free_with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    pub fn free_with_timeout(timeout: Duration) -> MtResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: GoogleEndpoint::Free,
            base_url: FREE_BASE_URL.to_string(),
        })
    }

    /// Provider using the Cloud Translation API v2 with an explicit API key
    pub fn new(api_key: String) -> MtResult<Self> {
        Self::with_key_and_timeout(api_key, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_key_and_timeout(api_key: String, timeout: Duration) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::config("API key cannot be empty"));
        }

        Ok(Self {
            client: build_client(timeout)?,
            endpoint: GoogleEndpoint::CloudV2 { api_key },
            base_url: CLOUD_V2_BASE_URL.to_string(),
        })
    }

    /// Point the provider at a different host (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn endpoint(&self) -> &GoogleEndpoint {
        &self.endpoint
    }

    fn free_url(&self, text: &str, source: Language, target: Language) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.base_url,
            source.code(),
            target.code(),
            urlencoding::encode(text)
        )
    }

    async fn translate_free(&self, text: &str, source: Language, target: Language) -> MtResult<String> {
        let response = self
            .client
            .get(self.free_url(text, source, target))
            .send()
            .await?;
        let json = read_json(response).await?;
        parse_free_response(&json)
    }

    async fn translate_v2(
        &self,
        api_key: &str,
        text: &str,
        source: Language,
        target: Language,
    ) -> MtResult<String> {
        let url = format!("{}?key={}", self.base_url, urlencoding::encode(api_key));
        let body = json!({
            "q": [text],
            "source": source.code(),
            "target": target.code(),
            "format": "text"
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let json = read_json(response).await?;
        parse_v2_response(&json)
    }
}

/// Join the sentence segments of a `translate_a/single` response
///
/// The payload looks like `[[["Good day.","Guten Tag.",null,null,10], ...], null, "de"]`.
pub fn parse_free_response(json: &Value) -> MtResult<String> {
    let segments = json
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::parse("Invalid response: missing segment array"))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    non_empty(translated)
}

/// Extract `data.translations[0].translatedText` from a Cloud v2 response
pub fn parse_v2_response(json: &Value) -> MtResult<String> {
    let translated = json["data"]["translations"]
        .as_array()
        .and_then(|translations| translations.first())
        .and_then(|t| t["translatedText"].as_str())
        .ok_or_else(|| {
            ProviderError::parse("Invalid response: missing 'data.translations[0].translatedText'")
        })?;

    non_empty(translated.to_string())
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("endpoint", &self.endpoint)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        _domain: Option<DomainHint>,
    ) -> MtResult<String> {
        if text.chars().count() > Self::MAX_CHARS_PER_STRING {
            return Err(ProviderError::config(format!(
                "Text exceeds maximum length of {} characters",
                Self::MAX_CHARS_PER_STRING
            )));
        }

        match &self.endpoint {
            GoogleEndpoint::Free => self.translate_free(text, source, target).await,
            GoogleEndpoint::CloudV2 { api_key } => {
                self.translate_v2(api_key, text, source, target).await
            }
        }
    }

    fn provider_name(&self) -> &str {
        match self.endpoint {
            GoogleEndpoint::Free => "Google Translate",
            GoogleEndpoint::CloudV2 { .. } => "Google Cloud Translate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::error::ProviderErrorKind;

    // ========== Initialization Tests ==========

    #[test]
    fn test_free_provider() {
        let provider = GoogleTranslateProvider::free().unwrap();
        assert_eq!(provider.endpoint(), &GoogleEndpoint::Free);
        assert_eq!(provider.provider_name(), "Google Translate");
    }

    #[test]
    fn test_new_with_valid_key() {
        let provider = GoogleTranslateProvider::new("test-api-key".to_string()).unwrap();
        assert_eq!(provider.provider_name(), "Google Cloud Translate");
    }

    #[test]
    fn test_new_with_empty_key() {
        let err = GoogleTranslateProvider::new("   ".to_string()).unwrap_err();
        assert!(err.message.contains("empty"));
        assert!(!err.retryable);
    }

    #[test]
    fn test_debug_output_masks_key() {
        let provider = GoogleTranslateProvider::new("secret-key".to_string()).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("secret-key"));
    }

    // ========== Request Building Tests ==========

    #[test]
    fn test_free_url_encodes_text() {
        let provider = GoogleTranslateProvider::free().unwrap();
        let url = provider.free_url("Wie geht's? 100% & mehr", Language::German, Language::English);
        assert!(url.starts_with(FREE_BASE_URL));
        assert!(url.contains("sl=de&tl=en"));
        assert!(url.contains("client=gtx"));
        assert!(url.ends_with("q=Wie%20geht%27s%3F%20100%25%20%26%20mehr"));
    }

    #[test]
    fn test_with_base_url() {
        let provider = GoogleTranslateProvider::free()
            .unwrap()
            .with_base_url("http://localhost:9000/single");
        let url = provider.free_url("a", Language::English, Language::German);
        assert!(url.starts_with("http://localhost:9000/single?"));
    }

    // ========== Response Parsing Tests ==========

    #[test]
    fn test_parse_free_response_joins_segments() {
        let json: Value = serde_json::from_str(
            r#"[[["Good day. ","Guten Tag. ",null,null,10],["How are you?","Wie geht es dir?",null,null,10]],null,"de"]"#,
        )
        .unwrap();
        assert_eq!(parse_free_response(&json).unwrap(), "Good day. How are you?");
    }

    #[test]
    fn test_parse_free_response_skips_null_segments() {
        let json: Value = serde_json::from_str(r#"[[["Hello",null],[null,"x"]]]"#).unwrap();
        assert_eq!(parse_free_response(&json).unwrap(), "Hello");
    }

    #[test]
    fn test_parse_free_response_malformed() {
        let json: Value = serde_json::from_str(r#"{"error": "nope"}"#).unwrap();
        let err = parse_free_response(&json).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ParseError);
        assert!(err.retryable);
    }

    #[test]
    fn test_parse_free_response_empty() {
        let json: Value = serde_json::from_str(r#"[[["  ","Hallo"]]]"#).unwrap();
        let err = parse_free_response(&json).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::EmptyResult);
    }

    #[test]
    fn test_parse_v2_response() {
        let json = json!({"data": {"translations": [{"translatedText": "Good day"}]}});
        assert_eq!(parse_v2_response(&json).unwrap(), "Good day");
    }

    #[test]
    fn test_parse_v2_response_missing_field() {
        let json = json!({"data": {"translations": []}});
        assert_eq!(
            parse_v2_response(&json).unwrap_err().kind,
            ProviderErrorKind::ParseError
        );
    }

    // ========== Validation Tests ==========

    #[tokio::test]
    async fn test_translate_text_too_long() {
        let provider = GoogleTranslateProvider::free().unwrap();
        let long_text = "x".repeat(GoogleTranslateProvider::MAX_CHARS_PER_STRING + 1);
        let err = provider
            .translate(&long_text, Language::German, Language::English, None)
            .await
            .unwrap_err();
        assert!(err.message.contains("exceeds maximum"));
    }

    // ========== Integration Tests (require network) ==========

    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_real_free_endpoint() {
        let provider = GoogleTranslateProvider::free().unwrap();
        let result = provider
            .translate("Guten Tag", Language::German, Language::English, None)
            .await
            .unwrap();
        println!("Translation: Guten Tag → {}", result);
        assert!(!result.is_empty());
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_real_api_invalid_key() {
        let provider = GoogleTranslateProvider::new("invalid-key-xyz".to_string()).unwrap();
        let result = provider
            .translate("hallo", Language::German, Language::English, None)
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::HttpError);
        assert!(!err.retryable);
    }
}
