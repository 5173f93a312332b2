//! PDF text-layer extraction via the pdf-extract crate.

use std::path::Path;

use tracing::debug;

use super::TextExtractor;
use crate::error::InputError;

/// Extracts the embedded text layer of a PDF.
///
/// Scanned PDFs without a text layer yield empty or near-empty text; OCR
/// is out of scope here.
pub struct PdfText;

impl TextExtractor for PdfText {
    fn extract_text(&self, path: &Path) -> Result<String, InputError> {
        let text = pdf_extract::extract_text(path).map_err(|e| InputError::Pdf(e.to_string()))?;
        debug!("extracted {} characters from {}", text.len(), path.display());
        Ok(text)
    }
}
