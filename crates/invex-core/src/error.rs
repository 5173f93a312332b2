//! Error types for the invex-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// Template loading or parsing error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Text input error.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Post-extraction action error.
    #[error("action error: {0}")]
    Action(#[from] ActionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading the template library.
///
/// Any of these fails the whole load attempt: shipping a silently
/// incomplete template set would make resolution order-dependent on which
/// files happened to parse.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template file or directory could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template file content is not decodable text in any detected encoding.
    #[error("template {} is not decodable text", path.display())]
    Encoding { path: PathBuf },

    /// Template record is malformed (bad YAML, bad regex, wrong shape).
    #[error("failed to parse template {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// Template location does not exist.
    #[error("template location not found: {}", path.display())]
    NotFound { path: PathBuf },
}

/// Errors raised while acquiring text from an input file.
#[derive(Error, Debug)]
pub enum InputError {
    /// No extractor is registered for this file extension.
    #[error("unsupported input format: {extension}")]
    Unsupported { extension: String },

    /// PDF text extraction failed.
    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),

    /// Input file content is not decodable text.
    #[error("input {} is not decodable text", path.display())]
    Encoding { path: PathBuf },

    /// Input file could not be read.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the post-extraction action pipeline.
#[derive(Error, Debug)]
pub enum ActionError {
    /// Filename pattern references a field the extraction did not produce.
    #[error("filename pattern references missing field: {field}")]
    MissingField { field: String },

    /// Field value has no filename rendering (e.g. line-item rows).
    #[error("field {field} cannot be rendered into a filename")]
    Unrenderable { field: String },

    /// Filename pattern is malformed (unbalanced braces).
    #[error("malformed filename pattern: {pattern}")]
    BadPattern { pattern: String },

    /// Filesystem failure during copy or move.
    #[error("file action failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
