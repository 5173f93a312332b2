//! Plain text input.

use std::fs;
use std::path::Path;

use super::TextExtractor;
use crate::encoding;
use crate::error::InputError;

/// Reads a text file, sniffing its encoding like the template loader does.
pub struct PlainText;

impl TextExtractor for PlainText {
    fn extract_text(&self, path: &Path) -> Result<String, InputError> {
        let bytes = fs::read(path)?;
        encoding::detect_and_decode(&bytes).ok_or_else(|| InputError::Encoding {
            path: path.to_path_buf(),
        })
    }
}
