//! Text acquisition boundary.
//!
//! The resolution engine only consumes raw text; where that text comes
//! from is a capability behind [`TextExtractor`]. The built-in extractors
//! cover text-layer PDFs and plain text files.

mod pdf;
mod plain;

pub use pdf::PdfText;
pub use plain::PlainText;

use std::path::Path;

use crate::error::InputError;

type Result<T> = std::result::Result<T, InputError>;

/// Capability that turns an input file into raw text.
pub trait TextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Pick an extractor for a file by its extension.
pub fn for_path(path: &Path) -> Result<Box<dyn TextExtractor>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfText)),
        "txt" | "text" => Ok(Box::new(PlainText)),
        _ => Err(InputError::Unsupported { extension }),
    }
}
