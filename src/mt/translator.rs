//! Translation provider trait and locale utilities
//!
//! This module defines the `TranslationProvider` trait for provider abstraction,
//! so the dispatcher and the pipeline are written once against the trait and
//! never against a specific service (Google, Lingva, MyMemory, an LLM, mock).
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
//!     println!("{}", result); // "Good day"
//!     Ok(())
//! }
//! ```

use crate::data::{DomainHint, Language};
use crate::mt::error::{MtResult, ProviderError};
use async_trait::async_trait;

/// Generic trait for remote translation providers
///
/// Implementations differ only in how they build the request and parse the
/// response. The contract is uniform:
///
/// - each call makes exactly one outbound request attempt, with no internal
///   retry (retries belong to the dispatcher)
/// - an empty or whitespace-only translation is an error
///   (`ProviderErrorKind::EmptyResult`), never `Ok("")`
/// - an unexpected response shape is `ProviderErrorKind::ParseError`
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` from `source` to `target`
    ///
    /// `domain` is a stylistic hint; providers without a way to express it
    /// ignore it.
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        domain: Option<DomainHint>,
    ) -> MtResult<String>;

    /// Name used in logs and in `ProviderResult::provider_name`
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code by stripping region information
///
/// - `de-DE` → `de`
/// - `en_US` → `en`
/// - `EN` → `en`
pub fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

/// Validate that a locale code only contains alphanumerics, hyphens and underscores
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(ProviderError::config("Locale code is empty"));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ProviderError::config(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

/// Turn a provider's raw translation into a result, rejecting blank output
///
/// Shared by every provider so that an empty answer can never silently
/// erase a chunk.
pub fn non_empty(translated: String) -> MtResult<String> {
    if translated.trim().is_empty() {
        Err(ProviderError::empty_result())
    } else {
        Ok(translated)
    }
}
