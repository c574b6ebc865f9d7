//! services/api/src/extract/ocr.rs
//!
//! Optical character recognition for JPEG/PNG uploads.
//!
//! Each call spawns its own tesseract invocation scoped to this function:
//! nothing is shared across requests, and the recognizer is gone by the time
//! this returns, on success or failure alike.

use super::ExtractError;
use rusty_tesseract::{Args, Image};
use tracing::debug;

/// Runs OCR over an in-memory image and returns the recognized text.
pub fn recognize(bytes: &[u8]) -> Result<String, ExtractError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| ExtractError::Ocr(e.to_string()))?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        "Running OCR over uploaded image"
    );

    let picture =
        Image::from_dynamic_image(&decoded).map_err(|e| ExtractError::Ocr(e.to_string()))?;
    let args = Args::default();
    rusty_tesseract::image_to_string(&picture, &args)
        .map_err(|e| ExtractError::Ocr(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_image_bytes_fail_before_recognition() {
        let err = recognize(b"not an image").unwrap_err();
        assert!(matches!(err, ExtractError::Ocr(_)));
    }
}
