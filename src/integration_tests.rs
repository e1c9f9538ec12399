//! End-to-end tests for the chunked translation pipeline
//!
//! Everything here runs offline against `MockTranslator`. The live provider
//! chain is exercised by the `#[ignore]`d test at the bottom:
//!
//! ```bash
//! cargo test --lib integration_tests -- --ignored --nocapture
//! ```

#[cfg(test)]
mod tests {
    use crate::data::{Chunk, TranslationDirection};
    use crate::mt::build_providers;
    use crate::mt::error::ProviderErrorKind;
    use crate::mt::mock::{MockMode, MockTranslator};
    use crate::mt::translator::TranslationProvider;
    use crate::pipeline::config::{Backoff, PipelineConfig};
    use crate::pipeline::controller::{ChunkSlot, RunOptions, run_all};
    use crate::pipeline::dispatcher::{FallbackDispatcher, RetryPolicy};
    use crate::pipeline::error::PipelineError;
    use crate::pipeline::segmenter;
    use crate::pipeline::session::TranslationSession;
    use crate::pipeline::cache::TranslationCache;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    fn config(max_chunk_chars: usize, concurrency: usize) -> PipelineConfig {
        PipelineConfig {
            max_chunk_chars,
            concurrency,
            pacing_ms: 0,
            backoff: Backoff::Fixed { delay_ms: 1 },
            ..PipelineConfig::default()
        }
    }

    fn session(providers: Vec<Arc<dyn TranslationProvider>>, config: PipelineConfig) -> TranslationSession {
        TranslationSession::new(providers, config).unwrap()
    }

    /// Distinct words separated by a rotating mix of whitespace
    fn sample_document(words: usize) -> String {
        let separators = [" ", "\n", "  ", "\t", " \n", "\n\n"];
        let mut text = String::new();
        for i in 0..words {
            if i > 0 {
                text.push_str(separators[i % separators.len()]);
            }
            text.push_str(&format!("w{}", i));
        }
        text
    }

    // ============================================================================
    // Worked example
    // ============================================================================

    #[tokio::test]
    async fn test_guten_tag_example() {
        let chunks = segmenter::split("Guten Tag. Wie geht es dir?", 15);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Guten Tag. Wie", "geht es dir?"]);

        let s = session(
            vec![Arc::new(MockTranslator::new(MockMode::Uppercase))],
            config(15, 2),
        );
        let doc = s.translate("Guten Tag. Wie geht es dir?", None).await.unwrap();
        assert_eq!(doc.text, "GUTEN TAG. WIE GEHT ES DIR?");
    }

    // ============================================================================
    // Round trip: an identity provider reproduces the input exactly
    // ============================================================================

    #[tokio::test]
    async fn test_identity_translation_reconstructs_input() {
        let text = sample_document(120);
        for max_len in [5, 8, 13, 40, 1000] {
            let s = session(
                vec![Arc::new(MockTranslator::new(MockMode::NoOp))],
                config(max_len, 3),
            );
            let doc = s.translate(&text, None).await.unwrap();
            assert_eq!(doc.text, text, "max_len {}", max_len);
            assert!(doc.is_complete());
        }
    }

    // ============================================================================
    // Chunk size bound
    // ============================================================================

    #[test]
    fn test_no_chunk_exceeds_limit() {
        let text = format!("{} {}", sample_document(200), "x".repeat(90));
        for max_len in [1, 7, 30, 64] {
            let chunks = segmenter::split(&text, max_len);
            assert!(chunks.iter().all(|c| c.char_len() <= max_len));
            assert_eq!(segmenter::reconstruct(&chunks), text);
        }
    }

    // ============================================================================
    // Order preservation under concurrency and skewed latency
    // ============================================================================

    #[tokio::test]
    async fn test_order_preserved_for_any_concurrency() {
        let text = sample_document(40);
        // Earlier words are slower, so later chunks tend to finish first
        let latency = Arc::new(|text: &str| {
            let n: u64 = text
                .split_whitespace()
                .next()
                .and_then(|w| w.trim_start_matches('w').parse().ok())
                .unwrap_or(0);
            Duration::from_millis(40u64.saturating_sub(n))
        });

        for concurrency in [1, 2, 4, 8] {
            let mock = MockTranslator::new(MockMode::Uppercase).with_latency(latency.clone());
            let s = session(vec![Arc::new(mock)], config(12, concurrency));
            let doc = s.translate(&text, None).await.unwrap();
            assert_eq!(doc.text, text.to_uppercase(), "concurrency {}", concurrency);
            let indices: Vec<usize> = doc.results.iter().map(|r| r.chunk_index).collect();
            assert_eq!(indices, (0..doc.results.len()).collect::<Vec<_>>());
        }
    }

    // ============================================================================
    // Fallback exhaustion
    // ============================================================================

    #[tokio::test]
    async fn test_total_outage_returns_original_within_retry_budget() {
        let a = MockTranslator::new(MockMode::Error(ProviderErrorKind::Timeout)).named("a");
        let b = MockTranslator::new(MockMode::Error(ProviderErrorKind::HttpError)).named("b");
        let cfg = PipelineConfig {
            max_retries: 3,
            ..config(1000, 2)
        };
        let s = session(vec![Arc::new(a.clone()), Arc::new(b.clone())], cfg);

        let doc = s.translate("Sehr geehrte Damen und Herren", None).await.unwrap();
        assert_eq!(doc.text, "Sehr geehrte Damen und Herren");
        assert_eq!(doc.degraded, vec![0]);
        assert_eq!(a.call_count(), 4);
        assert_eq!(b.call_count(), 4);
    }

    #[tokio::test]
    async fn test_partial_outage_interleaves_degraded_chunks() {
        // The provider rejects chunks containing "w3", everything else works
        let mut map = std::collections::HashMap::new();
        map.insert(("w3".to_string(), "en".to_string()), String::new());
        let primary = MockTranslator::new(MockMode::Mappings(map));
        let s = session(vec![Arc::new(primary)], config(3, 2));

        let doc = s.translate("w1 w2 w3 w4", None).await.unwrap();
        assert_eq!(doc.text, "w1_en w2_en w3 w4_en");
        assert_eq!(doc.degraded, vec![2]);
    }

    // ============================================================================
    // Cache avoids the network for repeated chunks
    // ============================================================================

    #[tokio::test]
    async fn test_identical_chunks_hit_provider_once() {
        let mock = MockTranslator::new(MockMode::Uppercase);
        let s = session(vec![Arc::new(mock.clone())], config(5, 1));

        let doc = s.translate("hallo hallo", None).await.unwrap();
        assert_eq!(doc.text, "HALLO HALLO");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(doc.cache_hits(), 1);
        assert_eq!(s.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_identical_chunks_in_parallel_hit_provider_once() {
        let mock = MockTranslator::with_delay(MockMode::Uppercase, 20);
        let s = session(vec![Arc::new(mock.clone())], config(5, 2));

        let doc = s.translate("hallo hallo", None).await.unwrap();
        assert_eq!(doc.text, "HALLO HALLO");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(doc.cache_hits(), 1);
    }

    #[tokio::test]
    async fn test_repeated_paragraphs_at_high_concurrency() {
        let mock = MockTranslator::with_delay(MockMode::Suffix, 10);
        let s = session(vec![Arc::new(mock.clone())], config(12, 8));
        let text = ["Guten Morgen", "Gute Nacht"].repeat(6).join("\n");

        let doc = s.translate(&text, None).await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(doc.cache_hits(), 10);
        assert!(doc.text.starts_with("Guten Morgen_en\nGute Nacht_en\n"));
    }

    // ============================================================================
    // Cancellation settles promptly with exactly the collected results
    // ============================================================================

    #[tokio::test]
    async fn test_cancel_after_three_of_ten() {
        let mock = MockTranslator::with_delay(MockMode::Uppercase, 20);
        let dispatcher = Arc::new(
            FallbackDispatcher::new(
                vec![Arc::new(mock)],
                Arc::new(TranslationCache::new(64)),
                RetryPolicy::default(),
            )
            .unwrap(),
        );
        let chunks: Vec<Chunk> = (0..10).map(|i| Chunk::new(i, format!("c{}", i), Some(' '))).collect();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let worker_cancel = cancel.clone();
        let start = Instant::now();

        let outcome = run_all(
            chunks,
            RunOptions {
                concurrency: 2,
                pacing: Duration::ZERO,
            },
            move |chunk: Chunk| {
                let dispatcher = Arc::clone(&dispatcher);
                let cancel = worker_cancel.clone();
                async move {
                    dispatcher
                        .translate_chunk_until(&chunk, TranslationDirection::DE_EN, None, &cancel)
                        .await
                }
            },
            move |progress| {
                if progress.completed == 3 {
                    trigger.cancel();
                }
            },
            &cancel,
        )
        .await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.completed(), 3);
        let cancelled = outcome
            .slots
            .iter()
            .filter(|slot| matches!(slot, ChunkSlot::Cancelled))
            .count();
        assert_eq!(cancelled, 7);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_superseded_run_never_leaks_output() {
        let mock = MockTranslator::new(MockMode::Suffix).with_latency(Arc::new(|text: &str| {
            Duration::from_millis(if text.starts_with("alt") { 1_000 } else { 5 })
        }));
        let s = Arc::new(session(vec![Arc::new(mock)], config(20, 2)));

        let old = {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.translate("alt alt alt", None).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        let new = s.translate("neu", None).await.unwrap();

        assert_eq!(new.text, "neu_en");
        assert_eq!(old.await.unwrap().unwrap_err(), PipelineError::Cancelled);
    }

    // ============================================================================
    // Live providers
    // ============================================================================

    #[tokio::test]
    #[ignore]
    async fn test_e2e_default_provider_chain() {
        let cfg = PipelineConfig::default();
        let providers = build_providers(&cfg).unwrap();
        let s = session(providers, cfg);

        let start = Instant::now();
        let doc = s
            .translate("Guten Tag. Wie geht es dir? Das Wetter ist heute schön.", None)
            .await
            .unwrap();
        println!("🌍 {} ({:?})", doc.text, start.elapsed());
        for result in &doc.results {
            println!("   [{}] {} via {}", result.chunk_index, result.text, result.provider_name);
        }
        assert!(!doc.text.is_empty());
    }
}
