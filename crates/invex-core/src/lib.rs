//! Core library for template-driven invoice data extraction.
//!
//! This crate provides:
//! - Template library loading from YAML files (single file or directory tree)
//! - First-match-wins template resolution against extracted document text
//! - Regex field extraction with typed coercion (amounts, dates, integers)
//! - Post-extraction file actions (rename-by-pattern, copy, move)

pub mod actions;
pub mod config;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod input;
pub mod template;
pub mod value;

pub use config::Config;
pub use error::{ActionError, InputError, InvexError, Result, TemplateError};
pub use extract::{Extraction, Resolution, resolve};
pub use input::TextExtractor;
pub use template::{Options, Template, loader};
pub use value::{ExtractedFields, FieldValue};
