//! DOCX text extraction
//!
//! Reads `word/document.xml` out of the zip container and keeps the text of
//! `w:t` runs. Paragraph ends and `w:br` become newlines, `w:tab` a tab.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;
use zip::ZipArchive;

use super::{DocumentKind, ExtractionError};

const DOCUMENT_PART: &str = "word/document.xml";

pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
    debug!(len = bytes.len(), "docx::extract: called");
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::parse(DocumentKind::Docx, e))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::parse(DocumentKind::Docx, format!("{}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::parse(DocumentKind::Docx, e))?;

    document_text(&xml)
}

fn document_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    // Leading and trailing spaces inside runs are significant
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = true;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" | b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| ExtractionError::parse(DocumentKind::Docx, e))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::parse(
                    DocumentKind::Docx,
                    format!("XML error at position {}: {}", reader.buffer_position(), e),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}
