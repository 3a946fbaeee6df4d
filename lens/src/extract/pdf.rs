//! PDF text extraction with lopdf

use lopdf::Document;
use tracing::{debug, warn};

use super::{DocumentKind, ExtractionError, ExtractionProgress, ProgressSender};

/// Extract text page by page, one line per page
///
/// A page whose content stream cannot be decoded contributes nothing rather
/// than failing the whole document.
pub(super) fn extract(bytes: &[u8], progress: Option<&ProgressSender>) -> Result<String, ExtractionError> {
    debug!(len = bytes.len(), "pdf::extract: called");
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::parse(DocumentKind::Pdf, e))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let total_pages = pages.len();
    debug!(total_pages, "pdf::extract: loaded");

    let mut parts = Vec::with_capacity(total_pages);
    for (i, page) in pages.iter().enumerate() {
        match doc.extract_text(&[*page]) {
            Ok(text) => parts.push(normalize_whitespace(&text)),
            Err(e) => warn!(page, error = %e, "pdf::extract: page skipped"),
        }

        if let Some(tx) = progress {
            // Nobody listening is fine
            let _ = tx.send(ExtractionProgress {
                pages_done: i + 1,
                total_pages,
            });
        }
    }

    Ok(parts.into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join("\n"))
}

/// Collapse runs of whitespace to single spaces
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_parse_error() {
        let err = extract(b"definitely not a pdf", None).unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { kind: DocumentKind::Pdf, .. }));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Tenant\nshall   pay\t$500 "), "Tenant shall pay $500");
    }
}
