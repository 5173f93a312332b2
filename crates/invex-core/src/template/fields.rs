//! Field rules declared by a template record.

use regex::Regex;
use serde_yaml::Value;

/// How a field's raw regex matches are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string; several distinct matches become a list.
    Text,
    /// Decimal amount honoring the template's decimal separator.
    Amount,
    /// Calendar date.
    Date,
    /// Literal value taken from the template record, no regex.
    Static,
}

/// One extraction rule: a field name plus the patterns that produce it.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Output field name, with any `static_`/`sum_` prefix stripped.
    pub name: String,
    pub kind: FieldKind,
    /// Sum the numeric values of all matches instead of taking the first.
    pub sum: bool,
    /// Patterns tried in declaration order; all matches are collected.
    pub patterns: Vec<Regex>,
    /// Literal value for `static_` fields.
    pub literal: Option<String>,
}

impl FieldRule {
    /// Build a rule from one `fields` record entry.
    ///
    /// The field kind is derived from the name, as templates author it:
    /// `static_` prefixed fields carry a literal, `sum_` prefixed fields
    /// with a pattern list accumulate, names starting or ending with `date`
    /// parse as dates and names starting with `amount` as decimals.
    pub fn from_record(key: &str, value: &Value) -> Result<Self, String> {
        if let Some(name) = key.strip_prefix("static_") {
            let literal = scalar_to_string(value)
                .ok_or_else(|| format!("static field {key} must be a scalar value"))?;
            return Ok(Self {
                name: name.to_string(),
                kind: FieldKind::Static,
                sum: false,
                patterns: Vec::new(),
                literal: Some(literal),
            });
        }

        let sum = key.starts_with("sum_") && value.is_sequence();
        let name = if sum { &key[4..] } else { key };

        let patterns = match value {
            Value::String(pattern) => vec![compile(name, pattern)?],
            Value::Sequence(items) => {
                let mut patterns = Vec::with_capacity(items.len());
                for item in items {
                    let pattern = item
                        .as_str()
                        .ok_or_else(|| format!("field {key} has a non-string pattern"))?;
                    patterns.push(compile(name, pattern)?);
                }
                patterns
            }
            _ => return Err(format!("field {key} must be a pattern or a list of patterns")),
        };

        Ok(Self {
            name: name.to_string(),
            kind: infer_kind(name),
            sum,
            patterns,
            literal: None,
        })
    }
}

fn infer_kind(name: &str) -> FieldKind {
    if name.starts_with("date") || name.ends_with("date") {
        FieldKind::Date
    } else if name.starts_with("amount") {
        FieldKind::Amount
    } else {
        FieldKind::Text
    }
}

fn compile(field: &str, pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("invalid regex for field {field}: {e}"))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Type coercion for one named capture group of a line-item rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFieldType {
    Int,
    Float,
    Date,
}

/// Line-item extraction rule: a delimited region scanned line by line.
#[derive(Debug, Clone)]
pub struct LinesRule {
    /// Start of the line-item region.
    pub start: Regex,
    /// End of the line-item region, searched after `start`.
    pub end: Regex,
    /// Per-line pattern; named capture groups become row fields.
    pub line: Regex,
    /// Coercions for named groups; unlisted groups stay strings.
    pub types: Vec<(String, LineFieldType)>,
}

impl LinesRule {
    pub fn from_record(value: &Value) -> Result<Self, String> {
        let Value::Mapping(record) = value else {
            return Err("lines rule must be a mapping".to_string());
        };

        let pattern = |key: &str| -> Result<Regex, String> {
            let raw = record
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| format!("lines rule is missing a {key} pattern"))?;
            Regex::new(raw).map_err(|e| format!("invalid lines {key} regex: {e}"))
        };

        let mut types = Vec::new();
        if let Some(Value::Mapping(mapping)) = record.get("types") {
            for (key, value) in mapping {
                let name = key
                    .as_str()
                    .ok_or_else(|| "lines types keys must be strings".to_string())?;
                let kind = match value.as_str() {
                    Some("int") => LineFieldType::Int,
                    Some("float") => LineFieldType::Float,
                    Some("date") => LineFieldType::Date,
                    _ => return Err(format!("unknown lines type for group {name}")),
                };
                types.push((name.to_string(), kind));
            }
        }

        Ok(Self {
            start: pattern("start")?,
            end: pattern("end")?,
            line: pattern("line")?,
            types,
        })
    }
}
