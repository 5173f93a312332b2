//! Loading of template libraries from the filesystem.
//!
//! A location is either a single template file or a directory tree. A
//! directory is walked recursively and its template files are loaded in
//! alphabetical path order; that order is part of the matching contract,
//! because resolution stops at the first matching template. Every call
//! reads the filesystem fresh — callers reload by calling [`load`] again
//! and swapping the returned list.

use std::fs;
use std::path::Path;

use serde_yaml::Value;
use tracing::{debug, warn};

use super::fields::{FieldRule, LinesRule};
use super::{DEFAULT_REQUIRED_FIELDS, Options, Template};
use crate::encoding;
use crate::error::TemplateError;

type Result<T> = std::result::Result<T, TemplateError>;

/// File extension recognized as a template file.
const TEMPLATE_EXTENSION: &str = "yml";

/// Load an ordered template list from a file or directory.
///
/// A malformed template fails the whole load and names the offending file;
/// silently dropping it would ship an incomplete template set and change
/// first-match resolution for every document.
pub fn load(location: &Path) -> Result<Vec<Template>> {
    if location.is_file() {
        return Ok(vec![load_file(location)?]);
    }
    if !location.is_dir() {
        return Err(TemplateError::NotFound {
            path: location.to_path_buf(),
        });
    }

    // glob yields paths in alphabetical order at every directory level, so
    // the resolution order is stable across platforms and filesystems.
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&location.to_string_lossy()),
        TEMPLATE_EXTENSION
    );
    let paths = glob::glob(&pattern).map_err(|e| TemplateError::Load {
        path: location.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;

    let mut templates = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => templates.push(load_file(&path)?),
            Ok(_) => {}
            Err(e) => {
                return Err(TemplateError::Load {
                    path: e.path().to_path_buf(),
                    source: e.into_error(),
                });
            }
        }
    }

    debug!("loaded {} templates from {}", templates.len(), location.display());
    Ok(templates)
}

/// Load a single template file; its name is the file's base name.
pub fn load_file(path: &Path) -> Result<Template> {
    let bytes = fs::read(path).map_err(|source| TemplateError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    // Template files may be in legacy single-byte encodings; sniff instead
    // of assuming UTF-8.
    let text = encoding::detect_and_decode(&bytes).ok_or_else(|| TemplateError::Encoding {
        path: path.to_path_buf(),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    parse_str(&text, &name).map_err(|reason| TemplateError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parse a template record from YAML text.
///
/// Record keys are read in document order; `fields` ordering is preserved
/// into the rule list. A bare-string `keywords` value is coerced into a
/// one-element list.
pub fn parse_str(text: &str, name: &str) -> std::result::Result<Template, String> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    let Value::Mapping(record) = value else {
        return Err("template record must be a mapping".to_string());
    };

    let mut issuer = None;
    let mut keywords = Vec::new();
    let mut fields = Vec::new();
    let mut required_fields = None;
    let mut lines = None;
    let mut options = Options::default();

    for (key, value) in &record {
        let Some(key) = key.as_str() else {
            return Err("template record keys must be strings".to_string());
        };
        match key {
            "issuer" => {
                issuer = Some(
                    value
                        .as_str()
                        .ok_or_else(|| "issuer must be a string".to_string())?
                        .to_string(),
                );
            }
            "keywords" => keywords = parse_keywords(value)?,
            "fields" => {
                let Value::Mapping(mapping) = value else {
                    return Err("fields must be a mapping".to_string());
                };
                for (field_key, field_value) in mapping {
                    let Some(field_key) = field_key.as_str() else {
                        return Err("field names must be strings".to_string());
                    };
                    fields.push(FieldRule::from_record(field_key, field_value)?);
                }
            }
            "required_fields" => {
                let Value::Sequence(items) = value else {
                    return Err("required_fields must be a list".to_string());
                };
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    names.push(
                        item.as_str()
                            .ok_or_else(|| "required_fields entries must be strings".to_string())?
                            .to_string(),
                    );
                }
                required_fields = Some(names);
            }
            "lines" => lines = Some(LinesRule::from_record(value)?),
            "options" => options = parse_options(value)?,
            // Unknown top-level keys are tolerated; templates are authored
            // by hand and carry commentary keys.
            _ => {}
        }
    }

    if keywords.is_empty() {
        warn!("template {name} has no keywords and can never match");
    }

    let issuer = issuer
        .or_else(|| keywords.first().cloned())
        .unwrap_or_default();

    Ok(Template {
        name: name.to_string(),
        issuer,
        keywords,
        fields,
        required_fields: required_fields.unwrap_or_else(|| {
            DEFAULT_REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect()
        }),
        lines,
        options,
    })
}

fn parse_keywords(value: &Value) -> std::result::Result<Vec<String>, String> {
    match value {
        // A single keyword may be authored as a bare string.
        Value::String(keyword) => Ok(vec![keyword.clone()]),
        Value::Sequence(items) => {
            let mut keywords = Vec::with_capacity(items.len());
            for item in items {
                keywords.push(
                    item.as_str()
                        .ok_or_else(|| "keywords must be strings".to_string())?
                        .to_string(),
                );
            }
            Ok(keywords)
        }
        _ => Err("keywords must be a string or a list of strings".to_string()),
    }
}

fn parse_options(value: &Value) -> std::result::Result<Options, String> {
    let Value::Mapping(mapping) = value else {
        return Err("options must be a mapping".to_string());
    };

    let mut options = Options::default();
    for (key, value) in mapping {
        let Some(key) = key.as_str() else {
            return Err("option keys must be strings".to_string());
        };
        match key {
            "currency" => {
                options.currency = Some(
                    value
                        .as_str()
                        .ok_or_else(|| "currency must be a string".to_string())?
                        .to_string(),
                );
            }
            "decimal_separator" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| "decimal_separator must be a string".to_string())?;
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => options.decimal_separator = c,
                    _ => return Err("decimal_separator must be a single character".to_string()),
                }
            }
            "remove_whitespace" => options.remove_whitespace = parse_bool(key, value)?,
            "remove_accents" => options.remove_accents = parse_bool(key, value)?,
            "lowercase" => options.lowercase = parse_bool(key, value)?,
            "date_formats" => {
                let Value::Sequence(items) = value else {
                    return Err("date_formats must be a list".to_string());
                };
                for item in items {
                    options.date_formats.push(
                        item.as_str()
                            .ok_or_else(|| "date_formats entries must be strings".to_string())?
                            .to_string(),
                    );
                }
            }
            "replace" => {
                let Value::Sequence(pairs) = value else {
                    return Err("replace must be a list of [from, to] pairs".to_string());
                };
                for pair in pairs {
                    match pair.as_sequence().map(|p| p.as_slice()) {
                        Some([from, to]) => {
                            let (Some(from), Some(to)) = (from.as_str(), to.as_str()) else {
                                return Err("replace entries must be strings".to_string());
                            };
                            options.replace.push((from.to_string(), to.to_string()));
                        }
                        _ => return Err("a replace entry must be a list of 2 items".to_string()),
                    }
                }
            }
            // Recognized keys only drive the engine; anything else is
            // preserved for callers that inspect templates.
            _ => options.extra.push((key.to_string(), value.clone())),
        }
    }

    Ok(options)
}

fn parse_bool(key: &str, value: &Value) -> std::result::Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("{key} must be a boolean"))
}
