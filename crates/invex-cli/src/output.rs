//! Output writers for accumulated extraction results.
//!
//! All writers receive the full batch at once and render dates with the
//! configured output date format, not the format the template extracted
//! them from.

use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use invex_core::{ExtractedFields, FieldValue};

/// Supported output file formats.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values, one row per input file
    Csv,
    /// JSON array of objects
    Json,
    /// XML document with one element per input file
    Xml,
    /// No output file
    None,
}

/// Write the batch to `<base_name>.<ext>`; returns the path written.
pub fn write_records(
    records: &[ExtractedFields],
    format: OutputFormat,
    base_name: &str,
    date_format: &str,
) -> anyhow::Result<Option<PathBuf>> {
    match format {
        OutputFormat::None => Ok(None),
        OutputFormat::Csv => write_csv(records, base_name, date_format).map(Some),
        OutputFormat::Json => write_json(records, base_name, date_format).map(Some),
        OutputFormat::Xml => write_xml(records, base_name, date_format).map(Some),
    }
}

/// Union of field names across all records, in first-seen order.
fn column_order(records: &[ExtractedFields]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.keys() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

fn write_csv(
    records: &[ExtractedFields],
    base_name: &str,
    date_format: &str,
) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(format!("{base_name}.csv"));
    let mut wtr = csv::Writer::from_path(&path)?;

    let columns = column_order(records);
    wtr.write_record(&columns)?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                record
                    .get(column)
                    .and_then(|value| value.render(date_format))
                    .unwrap_or_default()
            })
            .collect();
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(path)
}

fn write_json(
    records: &[ExtractedFields],
    base_name: &str,
    date_format: &str,
) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(format!("{base_name}.json"));
    let array = serde_json::Value::Array(
        records
            .iter()
            .map(|record| fields_to_json(record, date_format))
            .collect(),
    );
    std::fs::write(&path, serde_json::to_string_pretty(&array)?)?;
    Ok(path)
}

fn fields_to_json(fields: &ExtractedFields, date_format: &str) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, value) in fields.iter() {
        map.insert(name.to_string(), value_to_json(value, date_format));
    }
    serde_json::Value::Object(map)
}

fn value_to_json(value: &FieldValue, date_format: &str) -> serde_json::Value {
    match value {
        FieldValue::Text(s) => serde_json::Value::String(s.clone()),
        FieldValue::Amount(d) => serde_json::Number::from_str(&d.to_string())
            .map(serde_json::Value::Number)
            .unwrap_or_else(|_| serde_json::Value::String(d.to_string())),
        FieldValue::Int(i) => serde_json::Value::from(*i),
        FieldValue::Date(d) => serde_json::Value::String(d.format(date_format).to_string()),
        FieldValue::List(items) => serde_json::Value::from(items.clone()),
        FieldValue::Rows(rows) => serde_json::Value::Array(
            rows.iter()
                .map(|row| fields_to_json(row, date_format))
                .collect(),
        ),
    }
}

fn write_xml(
    records: &[ExtractedFields],
    base_name: &str,
    date_format: &str,
) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(format!("{base_name}.xml"));
    let file = File::create(&path)?;
    let mut writer = Writer::new_with_indent(file, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("invoices")))?;

    for (i, record) in records.iter().enumerate() {
        let mut start = BytesStart::new("invoice");
        start.push_attribute(("id", (i + 1).to_string().as_str()));
        writer.write_event(Event::Start(start))?;
        write_xml_fields(&mut writer, record, date_format)?;
        writer.write_event(Event::End(BytesEnd::new("invoice")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("invoices")))?;
    Ok(path)
}

fn write_xml_fields<W: std::io::Write>(
    writer: &mut Writer<W>,
    fields: &ExtractedFields,
    date_format: &str,
) -> anyhow::Result<()> {
    for (name, value) in fields.iter() {
        match value {
            FieldValue::Rows(rows) => {
                writer.write_event(Event::Start(BytesStart::new(name)))?;
                for row in rows {
                    writer.write_event(Event::Start(BytesStart::new("row")))?;
                    write_xml_fields(writer, row, date_format)?;
                    writer.write_event(Event::End(BytesEnd::new("row")))?;
                }
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            other => {
                let text = other.render(date_format).unwrap_or_default();
                writer.write_event(Event::Start(BytesStart::new(name)))?;
                writer.write_event(Event::Text(BytesText::new(&text)))?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
        }
    }
    Ok(())
}
