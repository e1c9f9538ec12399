//! Chunked translation pipeline
//!
//! A document goes through the stages in this order:
//!
//! 1. [`segmenter`] splits it into bounded chunks at whitespace
//! 2. [`controller`] hands the chunks to a bounded pool of workers
//! 3. each worker runs the [`dispatcher`], which consults the [`cache`] and
//!    then tries the providers in priority order with retries
//! 4. [`session`] joins the results in chunk order with the original
//!    separators
//!
//! ```ignore
//! use chunked_translator::{PipelineConfig, TranslationSession, TranslationDirection};
//! use chunked_translator::mt::build_providers;
//!
//! let config = PipelineConfig::default();
//! let session = TranslationSession::new(build_providers(&config)?, config)?;
//! let doc = session
//!     .translate_document("Guten Tag.", TranslationDirection::DE_EN, None, |p| {
//!         eprintln!("{}/{}", p.completed, p.total);
//!     })
//!     .await?;
//! println!("{}", doc.text);
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod segmenter;
pub mod session;

pub use cache::{CacheKey, CacheStats, TranslationCache};
pub use config::{Backoff, ConfigError, PipelineConfig};
pub use controller::{ChunkSlot, Progress, RunOptions, RunOutcome, run_all};
pub use dispatcher::{FallbackDispatcher, RetryPolicy};
pub use error::{PipelineError, PipelineResult};
pub use session::{TranslatedDocument, TranslationSession};
