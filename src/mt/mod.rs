//! Translation providers
//!
//! Every remote service is wrapped behind the [`TranslationProvider`] trait so
//! the dispatcher can try them in priority order without knowing which one it
//! is talking to.
//!
//! | name           | service                                  | credential                  |
//! |----------------|------------------------------------------|-----------------------------|
//! | `google`       | Google Translate (Cloud v2 if keyed)     | `GOOGLE_TRANSLATE_API_KEY`? |
//! | `google-cloud` | Google Cloud Translation v2              | `GOOGLE_TRANSLATE_API_KEY`  |
//! | `lingva`       | Lingva Translate (`LINGVA_BASE_URL`)     | none                        |
//! | `mymemory`     | MyMemory                                 | `MYMEMORY_EMAIL`?           |
//! | `llm`          | OpenAI-compatible chat completions       | `LLM_API_KEY`               |
//! | `mock`         | offline uppercasing stand-in             | none                        |
//!
//! # Example
//!
//! ```ignore
//! use chunked_translator::mt::build_providers;
//! use chunked_translator::PipelineConfig;
//!
//! let providers = build_providers(&PipelineConfig::default())?;
//! assert_eq!(providers.len(), 3);
//! ```

pub mod error;
pub mod google_translate;
pub mod http;
pub mod lingva;
pub mod llm;
pub mod mock;
pub mod mymemory;
pub mod translator;

pub use error::{MtResult, ProviderError, ProviderErrorKind};
pub use google_translate::{GoogleEndpoint, GoogleTranslateProvider};
pub use lingva::LingvaProvider;
pub use llm::LlmProvider;
pub use mock::{MockMode, MockTranslator};
pub use mymemory::MyMemoryProvider;
pub use translator::TranslationProvider;

use crate::pipeline::config::{ConfigError, PipelineConfig};
use std::sync::Arc;
use std::time::Duration;

/// Instantiate the providers named in `config.providers`, in order
pub fn build_providers(
    config: &PipelineConfig,
) -> Result<Vec<Arc<dyn TranslationProvider>>, ConfigError> {
    build_providers_with(config, |key| std::env::var(key).ok())
}

/// Same as [`build_providers`], reading credentials through `lookup`
pub fn build_providers_with<F>(
    config: &PipelineConfig,
    lookup: F,
) -> Result<Vec<Arc<dyn TranslationProvider>>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let timeout = config.request_timeout();
    let credential = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    config
        .providers
        .iter()
        .map(|name| build_one(name, timeout, &credential))
        .collect()
}

fn build_one<F>(
    name: &str,
    timeout: Duration,
    credential: &F,
) -> Result<Arc<dyn TranslationProvider>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let wrap = |source: ProviderError| ConfigError::Provider {
        name: name.to_string(),
        source,
    };

    let provider: Arc<dyn TranslationProvider> = match name {
        "google" => Arc::new(
            match credential("GOOGLE_TRANSLATE_API_KEY") {
                Some(key) => GoogleTranslateProvider::with_key_and_timeout(key, timeout),
                None => GoogleTranslateProvider::free_with_timeout(timeout),
            }
            .map_err(wrap)?,
        ),
        "google-cloud" => {
            let key = credential("GOOGLE_TRANSLATE_API_KEY").ok_or_else(|| {
                ConfigError::MissingCredential("GOOGLE_TRANSLATE_API_KEY".to_string())
            })?;
            Arc::new(GoogleTranslateProvider::with_key_and_timeout(key, timeout).map_err(wrap)?)
        }
        "lingva" => {
            let base_url =
                credential("LINGVA_BASE_URL").unwrap_or_else(|| lingva::DEFAULT_BASE_URL.to_string());
            Arc::new(LingvaProvider::new(base_url, timeout).map_err(wrap)?)
        }
        "mymemory" => Arc::new(
            MyMemoryProvider::new(credential("MYMEMORY_EMAIL"), timeout).map_err(wrap)?,
        ),
        "llm" => {
            let key = credential("LLM_API_KEY")
                .ok_or_else(|| ConfigError::MissingCredential("LLM_API_KEY".to_string()))?;
            let model = credential("LLM_MODEL").unwrap_or_else(|| llm::DEFAULT_MODEL.to_string());
            let provider = LlmProvider::new(key, model, timeout).map_err(wrap)?;
            Arc::new(match credential("LLM_BASE_URL") {
                Some(base_url) => provider.with_base_url(base_url),
                None => provider,
            })
        }
        "mock" => Arc::new(MockTranslator::new(MockMode::Uppercase).named("mock")),
        other => return Err(ConfigError::UnknownProvider(other.to_string())),
    };

    Ok(provider)
}
