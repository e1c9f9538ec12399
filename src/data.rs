//! Core data structures shared by the providers and the pipeline
//!
//! Languages, translation direction and domain hints are what a user picks;
//! chunks and provider results are what flows through a pipeline run.

use crate::mt::translator::{normalize_locale, validate_locale};
use crate::pipeline::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the translator offers, identified by ISO 639-1 code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "de")]
    German,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "nl")]
    Dutch,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "pl")]
    Polish,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::German,
        Language::English,
        Language::French,
        Language::Spanish,
        Language::Italian,
        Language::Dutch,
        Language::Portuguese,
        Language::Polish,
    ];

    /// ISO 639-1 code sent to providers
    pub fn code(self) -> &'static str {
        match self {
            Language::German => "de",
            Language::English => "en",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Dutch => "nl",
            Language::Portuguese => "pt",
            Language::Polish => "pl",
        }
    }

    /// English display name, also used in LLM prompts
    pub fn name(self) -> &'static str {
        match self {
            Language::German => "German",
            Language::English => "English",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::Italian => "Italian",
            Language::Dutch => "Dutch",
            Language::Portuguese => "Portuguese",
            Language::Polish => "Polish",
        }
    }

    /// Parse a locale tag such as `de`, `de-DE` or `EN_us`
    pub fn from_code(locale: &str) -> Result<Self, PipelineError> {
        let locale = locale.trim();
        validate_locale(locale).map_err(|e| PipelineError::InvalidInput(e.message))?;
        let code = normalize_locale(locale);
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| PipelineError::InvalidInput(format!("Unsupported language: {}", locale)))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s)
    }
}

/// A (source, target) language pair
///
/// Affects provider request parameters only; chunk boundaries never depend
/// on the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TranslationDirection {
    pub source: Language,
    pub target: Language,
}

impl TranslationDirection {
    pub const DE_EN: TranslationDirection = TranslationDirection {
        source: Language::German,
        target: Language::English,
    };

    pub const EN_DE: TranslationDirection = TranslationDirection {
        source: Language::English,
        target: Language::German,
    };

    pub fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    /// The direction the toggle switches to
    pub fn reversed(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }

    /// A direction is usable only when the two languages differ
    pub fn validate(self) -> Result<(), PipelineError> {
        if self.source == self.target {
            return Err(PipelineError::InvalidInput(format!(
                "Source and target language are both '{}'",
                self.source
            )));
        }
        Ok(())
    }
}

impl Default for TranslationDirection {
    fn default() -> Self {
        TranslationDirection::DE_EN
    }
}

impl fmt::Display for TranslationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

impl FromStr for TranslationDirection {
    type Err = PipelineError;

    /// Accepts `de-en`, `de→en`, `de:en` and `de>en`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, target) = s
            .split_once("→")
            .or_else(|| s.split_once(':'))
            .or_else(|| s.split_once('>'))
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "Direction must look like 'de-en', got '{}'",
                    s
                ))
            })?;
        let direction = TranslationDirection::new(source.parse()?, target.parse()?);
        direction.validate()?;
        Ok(direction)
    }
}

impl TryFrom<String> for TranslationDirection {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TranslationDirection> for String {
    fn from(direction: TranslationDirection) -> Self {
        direction.to_string()
    }
}

/// Stylistic hint passed to providers that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainHint {
    General,
    Technical,
    Legal,
}

impl DomainHint {
    pub fn as_str(self) -> &'static str {
        match self {
            DomainHint::General => "general",
            DomainHint::Technical => "technical",
            DomainHint::Legal => "legal",
        }
    }

    /// Instruction appended to prompt-based providers
    pub fn instruction(self) -> &'static str {
        match self {
            DomainHint::General => "Use natural, everyday language.",
            DomainHint::Technical => {
                "The text is technical documentation. Keep terminology precise and consistent, and leave code, identifiers and units untouched."
            }
            DomainHint::Legal => {
                "The text is a legal document. Translate faithfully and formally, preserving the exact legal meaning and clause structure."
            }
        }
    }
}

impl fmt::Display for DomainHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainHint {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(DomainHint::General),
            "technical" | "tech" => Ok(DomainHint::Technical),
            "legal" => Ok(DomainHint::Legal),
            other => Err(PipelineError::InvalidInput(format!(
                "Unknown domain hint: {}",
                other
            ))),
        }
    }
}

/// A bounded-size contiguous slice of the input document
///
/// `separator` is the whitespace character consumed at the cut after this
/// chunk (`None` for a hard mid-word cut or the end of input). Concatenating
/// `text` followed by `separator` for every chunk in index order yields the
/// original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub separator: Option<char>,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>, separator: Option<char>) -> Self {
        Self {
            index,
            text: text.into(),
            separator,
        }
    }

    /// Length in characters, the unit the segmenter bounds
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Outcome of dispatching one chunk
///
/// A degraded result has `succeeded == false` and carries the original chunk
/// text, so a total provider outage still yields the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResult {
    pub chunk_index: usize,
    pub text: String,
    pub provider_name: String,
    pub succeeded: bool,
    pub from_cache: bool,
}

impl ProviderResult {
    pub fn translated(chunk_index: usize, text: String, provider_name: &str) -> Self {
        Self {
            chunk_index,
            text,
            provider_name: provider_name.to_string(),
            succeeded: true,
            from_cache: false,
        }
    }

    pub fn cached(chunk_index: usize, text: String) -> Self {
        Self {
            chunk_index,
            text,
            provider_name: "cache".to_string(),
            succeeded: true,
            from_cache: true,
        }
    }

    /// Whitespace-only chunks are passed through without asking anyone
    pub fn passthrough(chunk: &Chunk) -> Self {
        Self {
            chunk_index: chunk.index,
            text: chunk.text.clone(),
            provider_name: "passthrough".to_string(),
            succeeded: true,
            from_cache: false,
        }
    }

    pub fn degraded(chunk: &Chunk) -> Self {
        Self {
            chunk_index: chunk.index,
            text: chunk.text.clone(),
            provider_name: "original".to_string(),
            succeeded: false,
            from_cache: false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.succeeded
    }
}
