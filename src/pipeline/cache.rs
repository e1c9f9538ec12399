//! Session-scoped translation cache
//!
//! Memoizes chunk translations keyed by normalized text, language pair and
//! domain hint. Bounded by an LRU policy so a long-lived session translating
//! many large documents cannot grow without limit. Nothing is persisted.

use crate::data::{DomainHint, Language, TranslationDirection};
use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Default number of cached chunk translations
pub const DEFAULT_CACHE_CAPACITY: usize = 500;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Cache key for one chunk translation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub normalized_text: String,
    pub source: Language,
    pub target: Language,
    pub domain: Option<DomainHint>,
}

impl CacheKey {
    pub fn new(text: &str, direction: TranslationDirection, domain: Option<DomainHint>) -> Self {
        Self {
            normalized_text: normalize_text(text),
            source: direction.source,
            target: direction.target,
            domain,
        }
    }
}

/// Trim and collapse inner whitespace runs to a single space
pub fn normalize_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
}

/// LRU cache shared by all workers of a session
///
/// Entries are write-once in practice. When two workers race on the same
/// key the last writer wins.
pub struct TranslationCache {
    entries: Mutex<LruCache<CacheKey, String>>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl TranslationCache {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn put(&self, key: CacheKey, value: String) {
        let mut entries = self.entries.lock().await;
        entries.put(key, value);
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
        }
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("stats", &self.stats())
            .finish()
    }
}
