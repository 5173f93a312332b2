//! Typed field values produced by extraction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single extracted field value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain string value.
    Text(String),
    /// Monetary or other decimal amount.
    Amount(Decimal),
    /// Integer value.
    Int(i64),
    /// Calendar date.
    Date(NaiveDate),
    /// Several distinct string matches for one field.
    List(Vec<String>),
    /// Repeated line-item rows.
    Rows(Vec<ExtractedFields>),
}

impl FieldValue {
    /// Render the value as a single string, dates using `date_format`.
    ///
    /// Returns `None` for row groups, which have no scalar rendering.
    pub fn render(&self, date_format: &str) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Amount(d) => Some(d.to_string()),
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Date(d) => Some(d.format(date_format).to_string()),
            FieldValue::List(items) => Some(items.join(", ")),
            FieldValue::Rows(_) => None,
        }
    }

    /// The date inside, if this is a date value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The text inside, if this is a plain string value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The amount inside, if this is a decimal value.
    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(d) => Some(*d),
            _ => None,
        }
    }
}

/// Ordered mapping from field name to extracted value.
///
/// Insertion order is preserved; re-inserting an existing name replaces the
/// value in place without moving the key. This mirrors the ordered records
/// templates are authored as, so output columns follow template order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    entries: Vec<(String, FieldValue)>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing in place if the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtractedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
