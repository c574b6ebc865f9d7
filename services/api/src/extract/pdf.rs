//! services/api/src/extract/pdf.rs
//!
//! Structured PDF text extraction using lopdf. Callers fall back to a
//! printable-byte heuristic when this path fails.

use super::ExtractError;
use tracing::debug;

/// Extracts the text of every page of an in-memory PDF.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|_| ExtractError::Pdf)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let text = doc.extract_text(&pages).map_err(|_| ExtractError::Pdf)?;
    let cleaned = clean_text(&text);
    if cleaned.trim().is_empty() {
        return Err(ExtractError::Pdf);
    }
    Ok(cleaned)
}

/// Normalizes whitespace runs the PDF content stream tends to produce.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
