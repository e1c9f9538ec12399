//! LLM-backed provider speaking the OpenAI-compatible chat completions API
//!
//! This is the only built-in provider that honours `DomainHint`: the hint is
//! turned into an instruction in the system prompt.
//!
//! Environment:
//! - `LLM_API_KEY` (required)
//! - `LLM_BASE_URL` (default `https://api.openai.com/v1`)
//! - `LLM_MODEL` (default `gpt-4o-mini`)

use crate::data::{DomainHint, Language};
use crate::mt::error::{MtResult, ProviderError};
use crate::mt::http::{build_client, read_json};
use crate::mt::translator::{TranslationProvider, non_empty};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Model used when `LLM_MODEL` is unset
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Clone)]
pub struct LlmProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmProvider {
    pub fn new(api_key: String, model: impl Into<String>, timeout: Duration) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::config("LLM API key cannot be empty"));
        }
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// System prompt for one chunk
pub fn system_prompt(source: Language, target: Language, domain: Option<DomainHint>) -> String {
    let mut prompt = format!(
        "You are a professional translator. Translate the user's text from {} to {}. \
         Reply with the translation only, without quotes, notes or explanations. \
         Preserve line breaks and punctuation.",
        source.name(),
        target.name()
    );
    if let Some(domain) = domain {
        prompt.push(' ');
        prompt.push_str(domain.instruction());
    }
    prompt
}

/// Extract `choices[0].message.content`
pub fn parse_response(json: &Value) -> MtResult<String> {
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return Err(ProviderError::parse(format!("LLM error: {}", message)));
    }

    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::parse("Invalid response: missing 'choices[0].message.content'"))?;

    non_empty(content.trim().to_string())
}

#[async_trait]
impl TranslationProvider for LlmProvider {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        domain: Option<DomainHint>,
    ) -> MtResult<String> {
        let prompt = system_prompt(source, target, domain);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let json = read_json(response).await?;
        parse_response(&json)
    }

    fn provider_name(&self) -> &str {
        "LLM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::build_providers;
    use crate::mt::error::ProviderErrorKind;
    use crate::pipeline::config::PipelineConfig;
    use serde_json::json;

    #[test]
    fn test_empty_key_is_rejected() {
        let err = LlmProvider::new("  ".to_string(), DEFAULT_MODEL, Duration::from_secs(1)).unwrap_err();
        assert!(!err.retryable);
    }

    #[test]
    fn test_debug_masks_key() {
        let provider = LlmProvider::new("sk-secret".to_string(), "m", Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:11434/v1/");
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("http://localhost:11434/v1\""));
    }

    #[test]
    fn test_prompt_names_languages() {
        let prompt = system_prompt(Language::German, Language::English, None);
        assert!(prompt.contains("from German to English"));
        assert!(!prompt.contains("legal"));
    }

    #[test]
    fn test_prompt_includes_domain_instruction() {
        let prompt = system_prompt(Language::English, Language::German, Some(DomainHint::Legal));
        assert!(prompt.ends_with(DomainHint::Legal.instruction()));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "Hallo",
            }],
            temperature: 0.2,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Hallo");
    }

    #[test]
    fn test_parse_response() {
        let json = json!({
            "choices": [{"message": {"role": "assistant", "content": "  Good day\n"}}]
        });
        assert_eq!(parse_response(&json).unwrap(), "Good day");
    }

    #[test]
    fn test_parse_response_error_object() {
        let json = json!({"error": {"message": "model not found"}});
        let err = parse_response(&json).unwrap_err();
        assert!(err.message.contains("model not found"));
    }

    #[test]
    fn test_parse_response_no_choices() {
        let json = json!({"choices": []});
        assert_eq!(parse_response(&json).unwrap_err().kind, ProviderErrorKind::ParseError);
    }

    #[tokio::test]
    #[ignore] // Requires LLM_API_KEY
    async fn test_real_llm() {
        let config = PipelineConfig {
            providers: vec!["llm".to_string()],
            ..PipelineConfig::default()
        };
        let provider = build_providers(&config).unwrap().remove(0);
        let result = provider
            .translate(
                "Guten Tag",
                Language::German,
                Language::English,
                Some(DomainHint::General),
            )
            .await
            .unwrap();
        assert!(!result.is_empty());
    }
}
