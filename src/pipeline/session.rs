//! Translation session: the document-level entry point
//!
//! A session owns the provider chain, the cache shared by all of its runs and
//! the current translation direction. At most one run is live per session:
//! starting a new run cancels the previous one, whose caller then gets
//! `PipelineError::Cancelled` instead of a stale document.

use crate::data::{Chunk, DomainHint, ProviderResult, TranslationDirection};
use crate::mt::translator::TranslationProvider;
use crate::pipeline::cache::TranslationCache;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::controller::{ChunkSlot, Progress, RunOptions, run_all};
use crate::pipeline::dispatcher::{FallbackDispatcher, RetryPolicy};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::segmenter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Output of one successful run
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedDocument {
    pub text: String,
    /// One result per chunk, in chunk order
    pub results: Vec<ProviderResult>,
    /// Indices of chunks left untranslated after every provider failed
    pub degraded: Vec<usize>,
    pub elapsed: Duration,
}

impl TranslatedDocument {
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }

    pub fn cache_hits(&self) -> usize {
        self.results.iter().filter(|r| r.from_cache).count()
    }
}

struct ActiveRun {
    id: u64,
    cancel: CancellationToken,
}

pub struct TranslationSession {
    dispatcher: Arc<FallbackDispatcher>,
    config: PipelineConfig,
    direction: Mutex<TranslationDirection>,
    active: Mutex<Option<ActiveRun>>,
    next_run: AtomicU64,
}

// The guarded values stay consistent even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TranslationSession {
    pub fn new(
        providers: Vec<Arc<dyn TranslationProvider>>,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        if providers.is_empty() {
            return Err(PipelineError::NoProvidersConfigured);
        }
        config.validate()?;

        let cache = Arc::new(TranslationCache::new(config.cache_capacity));
        let dispatcher =
            FallbackDispatcher::new(providers, cache, RetryPolicy::from_config(&config))?;

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            config,
            direction: Mutex::new(TranslationDirection::default()),
            active: Mutex::new(None),
            next_run: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        self.dispatcher.cache()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.dispatcher.provider_names()
    }

    pub fn direction(&self) -> TranslationDirection {
        *lock(&self.direction)
    }

    pub fn set_direction(&self, direction: TranslationDirection) -> PipelineResult<()> {
        direction.validate()?;
        *lock(&self.direction) = direction;
        Ok(())
    }

    /// Swap source and target, returning the new direction
    pub fn toggle_direction(&self) -> TranslationDirection {
        let mut direction = lock(&self.direction);
        *direction = direction.reversed();
        *direction
    }

    pub fn is_running(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Cancel the in-flight run, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match lock(&self.active).take() {
            Some(run) => {
                info!(run = run.id, "Cancelling translation run");
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Translate with the session's current direction, without progress
    pub async fn translate(
        &self,
        text: &str,
        domain: Option<DomainHint>,
    ) -> PipelineResult<TranslatedDocument> {
        self.translate_document(text, self.direction(), domain, |_| {})
            .await
    }

    /// Translate a whole document
    ///
    /// Fails only on unusable input or when the run is cancelled; provider
    /// outages degrade individual chunks to their original text instead.
    pub async fn translate_document<P>(
        &self,
        text: &str,
        direction: TranslationDirection,
        domain: Option<DomainHint>,
        on_progress: P,
    ) -> PipelineResult<TranslatedDocument>
    where
        P: FnMut(Progress) + Send,
    {
        if text.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "Nothing to translate: input is empty".to_string(),
            ));
        }
        direction.validate()?;

        let started = Instant::now();
        let chunks = segmenter::split(text, self.config.max_chunk_chars);
        let (run_id, cancel) = self.begin_run();
        info!(
            run = run_id,
            direction = %direction,
            chunks = chunks.len(),
            chars = text.chars().count(),
            "Translation run started"
        );

        let dispatcher = Arc::clone(&self.dispatcher);
        let worker_cancel = cancel.clone();
        let worker = move |chunk: Chunk| {
            let dispatcher = Arc::clone(&dispatcher);
            let cancel = worker_cancel.clone();
            async move {
                dispatcher
                    .translate_chunk_until(&chunk, direction, domain, &cancel)
                    .await
            }
        };

        let options = RunOptions {
            concurrency: self.config.concurrency,
            pacing: self.config.pacing(),
        };
        let outcome = run_all(chunks.clone(), options, worker, on_progress, &cancel).await;
        self.end_run(run_id);

        if outcome.cancelled {
            info!(run = run_id, completed = outcome.completed(), "Translation run cancelled");
            return Err(PipelineError::Cancelled);
        }
        let results: Vec<ProviderResult> = outcome
            .slots
            .into_iter()
            .zip(&chunks)
            .map(|(slot, chunk)| match slot {
                ChunkSlot::Done(result) => result,
                ChunkSlot::Cancelled | ChunkSlot::Lost => {
                    warn!(run = run_id, chunk = chunk.index, "No result for chunk, keeping original text");
                    ProviderResult::degraded(chunk)
                }
            })
            .collect();

        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        let joined = segmenter::join(&chunks, &texts);
        let degraded: Vec<usize> = results
            .iter()
            .filter(|r| r.is_degraded())
            .map(|r| r.chunk_index)
            .collect();

        let elapsed = started.elapsed();
        if degraded.is_empty() {
            info!(run = run_id, elapsed_ms = elapsed.as_millis() as u64, "Translation run finished");
        } else {
            warn!(
                run = run_id,
                degraded = degraded.len(),
                total = results.len(),
                "Translation run finished with untranslated chunks"
            );
        }

        Ok(TranslatedDocument {
            text: joined,
            results,
            degraded,
            elapsed,
        })
    }

    fn begin_run(&self) -> (u64, CancellationToken) {
        let id = self.next_run.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let previous = lock(&self.active).replace(ActiveRun {
            id,
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            info!(run = previous.id, superseded_by = id, "Superseding translation run");
            previous.cancel.cancel();
        }
        (id, cancel)
    }

    fn end_run(&self, id: u64) {
        let mut active = lock(&self.active);
        if active.as_ref().is_some_and(|run| run.id == id) {
            *active = None;
        }
    }
}

impl std::fmt::Debug for TranslationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationSession")
            .field("providers", &self.provider_names())
            .field("direction", &self.direction())
            .field("running", &self.is_running())
            .finish()
    }
}
