//! MyMemory translation provider
//!
//! `GET {base}/get?q={text}&langpair={source}|{target}`. Anonymous use is
//! limited per day; setting `MYMEMORY_EMAIL` raises the quota. MyMemory
//! reports most failures inside a 200 response via `responseStatus`, and
//! signals an exhausted quota with a warning in place of the translation.

use crate::data::{DomainHint, Language};
use crate::mt::error::{MtResult, ProviderError, ProviderErrorKind};
use crate::mt::http::{build_client, read_json};
use crate::mt::translator::{TranslationProvider, non_empty};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.mymemory.translated.net";
const QUOTA_WARNING: &str = "MYMEMORY WARNING";

#[derive(Clone, Debug)]
pub struct MyMemoryProvider {
    client: reqwest::Client,
    base_url: String,
    email: Option<String>,
}

impl MyMemoryProvider {
    pub fn new(email: Option<String>, timeout: Duration) -> MtResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            email: email.filter(|e| !e.trim().is_empty()),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, text: &str, source: Language, target: Language) -> String {
        let langpair = format!("{}|{}", source.code(), target.code());
        let mut url = format!(
            "{}/get?q={}&langpair={}",
            self.base_url,
            urlencoding::encode(text),
            urlencoding::encode(&langpair)
        );
        if let Some(email) = &self.email {
            url.push_str("&de=");
            url.push_str(&urlencoding::encode(email));
        }
        url
    }
}

/// Extract `responseData.translatedText`, honouring `responseStatus`
pub fn parse_response(json: &Value) -> MtResult<String> {
    // responseStatus is sometimes a number, sometimes a string
    let status = match json.get("responseStatus") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };

    if let Some(status) = status.filter(|s| *s != 200) {
        let details = json
            .get("responseDetails")
            .and_then(Value::as_str)
            .unwrap_or("no details");
        let code = u16::try_from(status)
            .ok()
            .and_then(|s| reqwest::StatusCode::from_u16(s).ok());
        return Err(match code {
            Some(code) => ProviderError::from_status(code, details),
            None => ProviderError::parse(format!("Unexpected responseStatus {}", status)),
        });
    }

    let translated = json
        .get("responseData")
        .and_then(|data| data.get("translatedText"))
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::parse("Invalid response: missing 'responseData.translatedText'"))?;

    if translated.starts_with(QUOTA_WARNING) {
        return Err(ProviderError::new(
            ProviderErrorKind::HttpError,
            "daily quota exhausted",
            false,
        ));
    }

    non_empty(translated.to_string())
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
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
        "MyMemory"
    }
}
