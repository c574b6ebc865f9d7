//! services/api/src/extract/mod.rs
//!
//! Converts an uploaded binary payload into plain text, branching on the
//! declared media type (or, failing that, the filename extension).
//!
//! Dispatch order, first match wins: PDF, DOCX, JPEG/PNG (OCR), plain text,
//! otherwise unsupported.

pub mod docx;
pub mod ocr;
pub mod pdf;

/// Errors produced while turning a payload into text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    #[error("Failed to parse PDF file.")]
    Pdf,

    #[error("Failed to parse DOCX file.")]
    Docx,

    #[error("OCR processing failed: {0}")]
    Ocr(String),
}

/// Minimum cleaned-up length for the raw-bytes PDF fallback to be accepted.
const PDF_FALLBACK_MIN_CHARS: usize = 50;

const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json", "log"];

/// Extracts plain text from a file payload.
///
/// `mime` is the client-declared content type (may be empty) and `file_name`
/// supplies the extension hint. Literal `text`/`url` submissions never reach
/// this function; they are used as-is by the ingestion handler.
pub fn extract_file_text(
    bytes: &[u8],
    mime: &str,
    file_name: &str,
) -> Result<String, ExtractError> {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    if mime == "application/pdf" || extension == "pdf" {
        return match pdf::extract_text(bytes) {
            Ok(text) => Ok(text),
            Err(_) => pdf_fallback(bytes),
        };
    }

    if mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        || extension == "docx"
    {
        return docx::extract_text(bytes);
    }

    if matches!(mime, "image/jpeg" | "image/png")
        || matches!(extension.as_str(), "jpg" | "jpeg" | "png")
    {
        return ocr::recognize(bytes);
    }

    if mime.starts_with("text/") || PLAIN_TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let offender = if mime.is_empty() { &extension } else { mime };
    Err(ExtractError::UnsupportedMediaType(offender.to_string()))
}

/// Heuristic recovery pass for PDFs the structured parser rejects: keep the
/// printable ASCII subset, collapse whitespace, and accept the result only
/// if enough readable text survives.
fn pdf_fallback(bytes: &[u8]) -> Result<String, ExtractError> {
    let raw = String::from_utf8_lossy(bytes);
    let printable: String = raw
        .chars()
        .map(|c| {
            if ('\x20'..='\x7e').contains(&c) || matches!(c, '\n' | '\r' | '\t') {
                c
            } else {
                ' '
            }
        })
        .collect();
    let cleaned = printable.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.len() < PDF_FALLBACK_MIN_CHARS {
        return Err(ExtractError::Pdf);
    }
    Ok(cleaned)
}
