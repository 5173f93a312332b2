//! Declarative extraction templates.
//!
//! A template describes one class of document: the keywords that identify
//! it, the regex rules that pull fields out of it, and the normalization
//! options applied to the raw text before both steps. Templates are loaded
//! from YAML files by [`loader`] and are immutable afterwards; reloading
//! produces a fresh list, never an in-place update.

mod fields;
pub mod loader;

pub use fields::{FieldKind, FieldRule, LineFieldType, LinesRule};

use lazy_static::lazy_static;
use regex::Regex;
use serde_yaml::Value;

use crate::extract::Extraction;

lazy_static! {
    static ref SPACE_RUNS: Regex = Regex::new(" +").unwrap();
}

/// Normalization and coercion options of one template.
///
/// Unrecognized keys from the record are kept in `extra` but have no effect
/// on the engine.
#[derive(Debug, Clone)]
pub struct Options {
    /// ISO currency code injected into every extraction result when set.
    pub currency: Option<String>,
    /// Decimal separator used by amounts in this document class.
    pub decimal_separator: char,
    /// Strip runs of spaces from the text before matching.
    pub remove_whitespace: bool,
    /// Fold accented characters to ASCII before matching.
    pub remove_accents: bool,
    /// Lowercase the text before matching.
    pub lowercase: bool,
    /// Date format strings tried before the built-in ones.
    pub date_formats: Vec<String>,
    /// Literal `(from, to)` replacements applied in order.
    pub replace: Vec<(String, String)>,
    /// Unrecognized option keys, preserved in record order.
    pub extra: Vec<(String, Value)>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            currency: None,
            decimal_separator: '.',
            remove_whitespace: false,
            remove_accents: false,
            lowercase: false,
            date_formats: Vec::new(),
            replace: Vec::new(),
            extra: Vec::new(),
        }
    }
}

/// A single loaded template.
#[derive(Debug, Clone)]
pub struct Template {
    /// Identifier, derived from the source file name.
    pub name: String,
    /// Informational issuer label; defaults to the first keyword.
    pub issuer: String,
    /// Substrings that must all occur in the normalized text for a match.
    pub keywords: Vec<String>,
    /// Extraction rules in record order.
    pub fields: Vec<FieldRule>,
    /// Fields that must extract for the result to count as complete.
    pub required_fields: Vec<String>,
    /// Optional line-item rule.
    pub lines: Option<LinesRule>,
    pub options: Options,
}

/// Required fields assumed when a template does not declare its own.
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &["date", "amount", "invoice_number", "issuer"];

impl Template {
    /// Apply this template's normalization options to raw text.
    ///
    /// Each template produces its own view of the same input, so two
    /// templates with different options see different text.
    pub fn prepare_input(&self, raw_text: &str) -> String {
        let mut text = if self.options.remove_whitespace {
            SPACE_RUNS.replace_all(raw_text, "").into_owned()
        } else {
            raw_text.to_string()
        };

        if self.options.remove_accents {
            text = deunicode::deunicode(&text);
        }

        if self.options.lowercase {
            text = text.to_lowercase();
        }

        for (from, to) in &self.options.replace {
            text = text.replace(from.as_str(), to);
        }

        text
    }

    /// Test whether all keywords occur as substrings of the normalized text.
    ///
    /// A template without keywords never matches; it can still be used as a
    /// forced template.
    pub fn matches_input(&self, text: &str) -> bool {
        !self.keywords.is_empty() && self.keywords.iter().all(|keyword| text.contains(keyword))
    }

    /// Run this template's field rules against normalized text.
    pub fn extract(&self, text: &str) -> Extraction {
        crate::extract::engine::extract_fields(self, text)
    }
}
