pub mod data;
pub mod document;
pub mod mt;
pub mod pipeline;

#[cfg(test)]
mod integration_tests;

// Re-export the types most callers need
pub use data::{Chunk, DomainHint, Language, ProviderResult, TranslationDirection};
pub use document::{DocumentError, char_count, estimate_seconds, export_text, import_text};
pub use mt::{TranslationProvider, build_providers};
pub use pipeline::{
    ConfigError, PipelineConfig, PipelineError, PipelineResult, Progress, TranslatedDocument,
    TranslationSession,
};
