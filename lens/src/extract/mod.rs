//! Text extraction
//!
//! Turns an uploaded file into plain text. Supported formats are PDF, DOCX
//! and UTF-8 plain text; everything else is rejected up front.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

mod docx;
mod pdf;

/// Declared type of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

impl DocumentKind {
    /// Resolve the kind from a file extension (case-insensitive, no dot)
    pub fn from_extension(ext: &str) -> Result<Self, ExtractionError> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::PlainText),
            other => Err(ExtractionError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        debug!(?path, "DocumentKind::from_path: called");
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExtractionError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    /// Resolve the kind from a MIME type, ignoring parameters such as `charset`
    pub fn from_mime(mime: &str) -> Result<Self, ExtractionError> {
        let essence = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
        match essence.as_str() {
            MIME_PDF => Ok(Self::Pdf),
            MIME_DOCX => Ok(Self::Docx),
            MIME_TEXT => Ok(Self::PlainText),
            _ => Err(ExtractionError::UnsupportedFormat(mime.to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => MIME_PDF,
            Self::Docx => MIME_DOCX,
            Self::PlainText => MIME_TEXT,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str("PDF"),
            Self::Docx => f.write_str("DOCX"),
            Self::PlainText => f.write_str("plain text"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read {kind} file: {message}")]
    Parse { kind: DocumentKind, message: String },
}

impl ExtractionError {
    pub(crate) fn parse(kind: DocumentKind, message: impl fmt::Display) -> Self {
        Self::Parse {
            kind,
            message: message.to_string(),
        }
    }
}

/// Page-level progress of a PDF extraction
///
/// Cosmetic only; other formats report nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionProgress {
    pub pages_done: usize,
    pub total_pages: usize,
}

impl ExtractionProgress {
    /// Completion in whole percent, 0 to 100
    pub fn percent(&self) -> u8 {
        if self.total_pages == 0 {
            return 0;
        }
        ((self.pages_done.min(self.total_pages) * 100) / self.total_pages) as u8
    }
}

pub type ProgressSender = watch::Sender<ExtractionProgress>;

/// Produces plain text from file bytes
///
/// Implementations are synchronous; callers run them on the blocking pool.
pub trait TextExtractor: Send + Sync {
    fn extract(
        &self,
        bytes: &[u8],
        kind: DocumentKind,
        progress: Option<&ProgressSender>,
    ) -> Result<String, ExtractionError>;
}

/// PDF via lopdf, DOCX via zip + quick-xml, plain text as UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

impl TextExtractor for DefaultExtractor {
    fn extract(
        &self,
        bytes: &[u8],
        kind: DocumentKind,
        progress: Option<&ProgressSender>,
    ) -> Result<String, ExtractionError> {
        debug!(%kind, len = bytes.len(), "DefaultExtractor::extract: called");
        let text = match kind {
            DocumentKind::Pdf => pdf::extract(bytes, progress)?,
            DocumentKind::Docx => docx::extract(bytes)?,
            DocumentKind::PlainText => String::from_utf8(bytes.to_vec()).map_err(|e| ExtractionError::parse(kind, e))?,
        };
        info!(%kind, chars = text.len(), "Extracted document text");
        Ok(text)
    }
}
