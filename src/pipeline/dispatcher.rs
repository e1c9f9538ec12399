//! Fallback dispatch of single chunks across providers
//!
//! Providers are tried in the fixed priority order given by the caller. A
//! round that fails on every provider is followed by a backoff sleep and
//! another round, up to `max_retries` extra rounds. When nothing works the
//! chunk's original text is returned: a degraded result is always preferred
//! over dropping content or failing the whole document.
//!
//! Identical chunks translated at the same time share one request: the
//! first worker holds a per-key gate while it talks to the providers, and
//! the others wait on that gate and then read the cache.

use crate::data::{Chunk, DomainHint, ProviderResult, TranslationDirection};
use crate::mt::error::{MtResult, ProviderError};
use crate::mt::translator::{TranslationProvider, non_empty};
use crate::pipeline::cache::{CacheKey, TranslationCache};
use crate::pipeline::config::{Backoff, PipelineConfig};
use crate::pipeline::error::{PipelineError, PipelineResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry parameters applied to every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
    pub request_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.backoff,
            request_timeout: config.request_timeout(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

pub struct FallbackDispatcher {
    providers: Vec<Arc<dyn TranslationProvider>>,
    cache: Arc<TranslationCache>,
    policy: RetryPolicy,
    /// Gates for keys currently being translated; dead entries are pruned lazily
    in_flight: Mutex<HashMap<CacheKey, Weak<AsyncMutex<()>>>>,
}

/// How the provider rounds for one chunk ended
enum Attempt<'a> {
    Translated { text: String, provider: &'a str },
    Exhausted,
    Cancelled,
}

impl FallbackDispatcher {
    /// Build a dispatcher over `providers`, highest priority first
    pub fn new(
        providers: Vec<Arc<dyn TranslationProvider>>,
        cache: Arc<TranslationCache>,
        policy: RetryPolicy,
    ) -> PipelineResult<Self> {
        if providers.is_empty() {
            return Err(PipelineError::NoProvidersConfigured);
        }
        Ok(Self {
            providers,
            cache,
            policy,
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Translate one chunk; never fails
    pub async fn translate_chunk(
        &self,
        chunk: &Chunk,
        direction: TranslationDirection,
        domain: Option<DomainHint>,
    ) -> ProviderResult {
        self.translate_chunk_until(chunk, direction, domain, &CancellationToken::new())
            .await
    }

    /// Like [`translate_chunk`](Self::translate_chunk), but backoff sleeps end
    /// early once `cancel` fires, yielding the degraded result immediately.
    pub async fn translate_chunk_until(
        &self,
        chunk: &Chunk,
        direction: TranslationDirection,
        domain: Option<DomainHint>,
        cancel: &CancellationToken,
    ) -> ProviderResult {
        if chunk.text.trim().is_empty() {
            return ProviderResult::passthrough(chunk);
        }

        let key = CacheKey::new(&chunk.text, direction, domain);
        let _turn = self.claim(&key).await;
        if let Some(cached) = self.cache.get(&key).await {
            debug!(chunk = chunk.index, "served from cache");
            return ProviderResult::cached(chunk.index, with_chunk_edges(&chunk.text, &cached));
        }

        match self.attempt_rounds(chunk, direction, domain, cancel).await {
            Attempt::Translated { text, provider } => {
                let edged = with_chunk_edges(&chunk.text, &text);
                self.cache.put(key, text).await;
                ProviderResult::translated(chunk.index, edged, provider)
            }
            Attempt::Exhausted => {
                warn!(
                    chunk = chunk.index,
                    "all providers exhausted, keeping original text"
                );
                ProviderResult::degraded(chunk)
            }
            Attempt::Cancelled => {
                debug!(chunk = chunk.index, "cancelled during backoff, keeping original text");
                ProviderResult::degraded(chunk)
            }
        }
    }

    /// Wait until no other task is translating `key`
    ///
    /// The gate is held until the returned guard drops, which the caller
    /// does only after the cache has been filled.
    async fn claim(&self, key: &CacheKey) -> OwnedMutexGuard<()> {
        let gate = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            let existing = in_flight.get(key).and_then(Weak::upgrade);
            match existing {
                Some(gate) => gate,
                None => {
                    in_flight.retain(|_, gate| gate.strong_count() > 0);
                    let gate = Arc::new(AsyncMutex::new(()));
                    in_flight.insert(key.clone(), Arc::downgrade(&gate));
                    gate
                }
            }
        };
        gate.lock_owned().await
    }

    /// Priority-ordered provider rounds with backoff between them
    async fn attempt_rounds(
        &self,
        chunk: &Chunk,
        direction: TranslationDirection,
        domain: Option<DomainHint>,
        cancel: &CancellationToken,
    ) -> Attempt<'_> {
        for round in 0..=self.policy.max_retries {
            let mut any_retryable = false;

            for provider in &self.providers {
                match self.call_provider(provider.as_ref(), chunk, direction, domain).await {
                    Ok(translated) => {
                        debug!(
                            chunk = chunk.index,
                            provider = provider.provider_name(),
                            round,
                            "chunk translated"
                        );
                        return Attempt::Translated {
                            text: translated.trim().to_string(),
                            provider: provider.provider_name(),
                        };
                    }
                    Err(err) => {
                        warn!(
                            chunk = chunk.index,
                            provider = provider.provider_name(),
                            round,
                            retryable = err.retryable,
                            "provider failed: {}",
                            err
                        );
                        any_retryable |= err.retryable;
                    }
                }
            }

            if !any_retryable {
                debug!(chunk = chunk.index, "no retryable failures, giving up");
                return Attempt::Exhausted;
            }

            if round < self.policy.max_retries {
                let delay = self.policy.backoff.delay(round + 1);
                debug!(chunk = chunk.index, ?delay, "all providers failed, backing off");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Attempt::Cancelled,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Attempt::Exhausted
    }

    /// One request to one provider, bounded by the request timeout
    async fn call_provider(
        &self,
        provider: &dyn TranslationProvider,
        chunk: &Chunk,
        direction: TranslationDirection,
        domain: Option<DomainHint>,
    ) -> MtResult<String> {
        let request = provider.translate(&chunk.text, direction.source, direction.target, domain);
        match tokio::time::timeout(self.policy.request_timeout, request).await {
            Ok(result) => non_empty(result?),
            Err(_) => Err(ProviderError::timeout(format!(
                "no response within {:?}",
                self.policy.request_timeout
            ))),
        }
    }
}

/// Wrap a trimmed translation in the chunk's own leading and trailing
/// whitespace. Providers strip it, and cached entries are stored trimmed.
fn with_chunk_edges(original: &str, translated: &str) -> String {
    let body = original.trim();
    let start = original.len() - original.trim_start().len();
    let end = start + body.len();
    format!("{}{}{}", &original[..start], translated.trim(), &original[end..])
}

impl std::fmt::Debug for FallbackDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackDispatcher")
            .field("providers", &self.provider_names())
            .field("policy", &self.policy)
            .finish()
    }
}
