//! Mock translation provider for testing
//!
//! This module provides a deterministic, network-free provider for testing
//! the pipeline and for running the CLI offline with `--mock`.
//!
//! # Example
//!
//! ```ignore
//! use chunked_translator::mt::{TranslationProvider, MockTranslator, MockMode};
//! use chunked_translator::Language;
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock
//!         .translate("hallo", Language::German, Language::English, None)
//!         .await
//!         .unwrap();
//!     assert_eq!(result, "hallo_en");
//! }
//! ```

use crate::data::{DomainHint, Language};
use crate::mt::error::{MtResult, ProviderError, ProviderErrorKind};
use crate::mt::translator::{TranslationProvider, non_empty};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Uppercase the input: "hallo" → "HALLO"
    Uppercase,

    /// Append target code: "hallo" → "hallo_en"
    Suffix,

    /// Use predefined mappings (text, target code) → translation,
    /// falling back to suffix mode for unknown pairs
    Mappings(HashMap<(String, String), String>),

    /// Reverse word order, like a verb-final target language would
    Reorder,

    /// Always fail with a retryable error of the given kind
    Error(ProviderErrorKind),

    /// Always fail with a non-retryable error (e.g. rejected API key)
    Rejected,

    /// Answer with an empty translation
    Empty,

    /// Fail the first `n` calls with a retryable error, then uppercase
    FailTimes(usize),

    /// No-op: return input unchanged
    NoOp,
}

/// Computes a per-request latency from the request text
pub type LatencyFn = Arc<dyn Fn(&str) -> Duration + Send + Sync>;

/// Mock provider that simulates translation behaviour and latency
///
/// Clones share the call counter, so a test can keep a handle while the
/// pipeline owns another.
#[derive(Clone)]
pub struct MockTranslator {
    mode: MockMode,
    name: String,
    latency: Option<LatencyFn>,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            name: "Mock Translator".to_string(),
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a MockTranslator with a fixed simulated network delay
    ///
    /// ```ignore
    /// let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
    /// // Each translation will take ~50ms
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self::new(mode).with_latency(Arc::new(move |_| Duration::from_millis(delay_ms)))
    }

    /// Use a per-text latency, e.g. to make later chunks finish first
    pub fn with_latency(mut self, latency: LatencyFn) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Override the provider name reported in results
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Number of `translate` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn apply_delay(&self, text: &str) {
        if let Some(latency) = &self.latency {
            let delay = latency(text);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: Language, call: usize) -> MtResult<String> {
        match &self.mode {
            MockMode::Uppercase => non_empty(text.to_uppercase()),
            MockMode::Suffix => Ok(format!("{}_{}", text, target.code())),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.code().to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target.code())))
            }
            MockMode::Reorder => {
                let words: Vec<&str> = text.split_whitespace().collect();
                non_empty(words.into_iter().rev().collect::<Vec<_>>().join(" "))
            }
            MockMode::Error(kind) => Err(ProviderError::new(
                *kind,
                format!("{} unavailable", self.name),
                true,
            )),
            MockMode::Rejected => Err(ProviderError::config(format!(
                "{} rejected the request",
                self.name
            ))),
            MockMode::Empty => non_empty(String::new()),
            MockMode::FailTimes(n) => {
                if call < *n {
                    Err(ProviderError::new(
                        ProviderErrorKind::HttpError,
                        format!("simulated failure {} of {}", call + 1, n),
                        true,
                    ))
                } else {
                    non_empty(text.to_uppercase())
                }
            }
            MockMode::NoOp => non_empty(text.to_string()),
        }
    }
}

impl std::fmt::Debug for MockTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTranslator")
            .field("mode", &self.mode)
            .field("name", &self.name)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source: Language,
        target: Language,
        _domain: Option<DomainHint>,
    ) -> MtResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.apply_delay(text).await;
        self.apply_translation(text, target, call)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn translate(mock: &MockTranslator, text: &str) -> MtResult<String> {
        mock.translate(text, Language::German, Language::English, None)
            .await
    }

    // ========== Mode Tests ==========

    #[tokio::test]
    async fn test_uppercase() {
        let mock = MockTranslator::new(MockMode::Uppercase);
        assert_eq!(translate(&mock, "Guten Tag").await.unwrap(), "GUTEN TAG");
    }

    #[tokio::test]
    async fn test_suffix_uses_target_code() {
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(translate(&mock, "hallo").await.unwrap(), "hallo_en");
        let to_french = mock
            .translate("hallo", Language::German, Language::French, None)
            .await
            .unwrap();
        assert_eq!(to_french, "hallo_fr");
    }

    #[tokio::test]
    async fn test_mapping_and_fallback() {
        let mut map = HashMap::new();
        map.insert(
            ("Guten Tag".to_string(), "en".to_string()),
            "Good day".to_string(),
        );
        let mock = MockTranslator::new(MockMode::Mappings(map));
        assert_eq!(translate(&mock, "Guten Tag").await.unwrap(), "Good day");
        assert_eq!(translate(&mock, "Tschüss").await.unwrap(), "Tschüss_en");
    }

    #[tokio::test]
    async fn test_reorder() {
        let mock = MockTranslator::new(MockMode::Reorder);
        assert_eq!(translate(&mock, "eins zwei drei").await.unwrap(), "drei zwei eins");
    }

    #[tokio::test]
    async fn test_error_mode_is_retryable() {
        let mock = MockTranslator::new(MockMode::Error(ProviderErrorKind::Timeout));
        let err = translate(&mock, "hallo").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
        assert!(err.retryable);
    }

    #[tokio::test]
    async fn test_rejected_mode_is_not_retryable() {
        let mock = MockTranslator::new(MockMode::Rejected);
        assert!(!translate(&mock, "hallo").await.unwrap_err().retryable);
    }

    #[tokio::test]
    async fn test_empty_mode_reports_empty_result() {
        let mock = MockTranslator::new(MockMode::Empty);
        let err = translate(&mock, "hallo").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_fail_times_then_succeeds() {
        let mock = MockTranslator::new(MockMode::FailTimes(2));
        assert!(translate(&mock, "a").await.is_err());
        assert!(translate(&mock, "a").await.is_err());
        assert_eq!(translate(&mock, "a").await.unwrap(), "A");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_noop_returns_unchanged() {
        let mock = MockTranslator::new(MockMode::NoOp);
        assert_eq!(translate(&mock, "Hallo Welt").await.unwrap(), "Hallo Welt");
    }

    // ========== Delay Tests ==========

    #[tokio::test]
    async fn test_delay_adds_latency() {
        let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
        let start = std::time::Instant::now();
        let _ = translate(&mock, "hallo").await.unwrap();
        assert!(start.elapsed().as_millis() >= 50);
    }

    #[tokio::test]
    async fn test_latency_fn_per_text() {
        let mock = MockTranslator::new(MockMode::Suffix).with_latency(Arc::new(|text: &str| {
            Duration::from_millis(if text == "slow" { 40 } else { 0 })
        }));
        let start = std::time::Instant::now();
        let _ = translate(&mock, "fast").await.unwrap();
        assert!(start.elapsed().as_millis() < 40);
        let _ = translate(&mock, "slow").await.unwrap();
        assert!(start.elapsed().as_millis() >= 40);
    }

    // ========== Naming and Counting Tests ==========

    #[test]
    fn test_provider_name() {
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(mock.provider_name(), "Mock Translator");
        assert_eq!(mock.named("lingva").provider_name(), "lingva");
    }

    #[tokio::test]
    async fn test_clones_share_call_counter() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let handle = mock.clone();
        let _ = translate(&mock, "a").await;
        let _ = translate(&mock, "b").await;
        assert_eq!(handle.call_count(), 2);
    }
}
