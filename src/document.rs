//! Document import and export
//!
//! Only plain text is handled here. PDF and Word files are recognised by
//! extension so callers get a clear "unsupported" error instead of garbage.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} files are not supported; convert '{}' to plain text first", .path.display())]
    Unsupported { path: PathBuf, format: DocumentFormat },

    #[error("Unrecognised file type: '{}'", .0.display())]
    UnknownFormat(PathBuf),

    #[error("'{}' contains no text", .0.display())]
    EmptyContent(PathBuf),

    #[error("Nothing to export: the translation is empty")]
    EmptyTranslation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect by extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" | "md" => Some(DocumentFormat::Text),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" | "doc" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentFormat::Text => "Plain text",
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "Word",
        })
    }
}

fn require_text(path: &Path) -> Result<(), DocumentError> {
    match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Text) => Ok(()),
        Some(format) => Err(DocumentError::Unsupported {
            path: path.to_path_buf(),
            format,
        }),
        None => Err(DocumentError::UnknownFormat(path.to_path_buf())),
    }
}

/// Read a plain-text document for translation
pub async fn import_text(path: &Path) -> Result<String, DocumentError> {
    require_text(path)?;
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if text.trim().is_empty() {
        return Err(DocumentError::EmptyContent(path.to_path_buf()));
    }
    debug!(path = %path.display(), chars = char_count(&text), "Imported document");
    Ok(text)
}

/// Write a translation to a plain-text file
pub async fn export_text(path: &Path, text: &str) -> Result<(), DocumentError> {
    if text.trim().is_empty() {
        return Err(DocumentError::EmptyTranslation);
    }
    require_text(path)?;
    tokio::fs::write(path, text)
        .await
        .map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "Exported translation");
    Ok(())
}

/// Length in characters as shown to the user
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Rough wall-clock estimate: half a second per started thousand characters
pub fn estimate_seconds(chars: usize) -> f64 {
    chars.div_ceil(1000) as f64 * 0.5
}
