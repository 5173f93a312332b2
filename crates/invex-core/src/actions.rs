//! Post-extraction side effects: destination naming, copy and move.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ActionError;
use crate::value::ExtractedFields;

type Result<T> = std::result::Result<T, ActionError>;

/// Format a destination filename from a `{field}` pattern.
///
/// Every placeholder is substituted with the extracted field's rendering;
/// dates use `date_format`. A referenced field the extraction did not
/// produce is an error — emitting a filename with a silent hole would be
/// worse than failing the file. `{{` and `}}` escape literal braces.
pub fn format_filename(
    pattern: &str,
    fields: &ExtractedFields,
    date_format: &str,
) -> Result<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(ActionError::BadPattern {
                                pattern: pattern.to_string(),
                            });
                        }
                    }
                }
                let value = fields
                    .get(&name)
                    .ok_or_else(|| ActionError::MissingField {
                        field: name.clone(),
                    })?;
                let rendered = value
                    .render(date_format)
                    .ok_or_else(|| ActionError::Unrenderable { field: name })?;
                out.push_str(&rendered);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(ActionError::BadPattern {
                    pattern: pattern.to_string(),
                });
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

/// Copy the source file into `dest_dir` under `file_name`.
///
/// The source file stays untouched at its original path.
pub fn copy_renamed(source: &Path, dest_dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(file_name);
    fs::copy(source, &dest)?;
    info!("copied {} to {}", source.display(), dest.display());
    Ok(dest)
}

/// Move the source file into `dest_dir` under `file_name`.
pub fn move_renamed(source: &Path, dest_dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(file_name);
    if fs::rename(source, &dest).is_err() {
        // rename cannot cross filesystems
        fs::copy(source, &dest)?;
        fs::remove_file(source)?;
    }
    info!("moved {} to {}", source.display(), dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn fields() -> ExtractedFields {
        let mut fields = ExtractedFields::new();
        fields.insert(
            "date",
            FieldValue::Date(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()),
        );
        fields.insert("invoice_number", FieldValue::Text("INV-9".into()));
        fields.insert("desc", FieldValue::Text("Acme".into()));
        fields
    }

    #[test]
    fn test_format_filename() {
        let name =
            format_filename("{date} {invoice_number} {desc}.pdf", &fields(), "%Y-%m-%d").unwrap();
        assert_eq!(name, "2021-03-04 INV-9 Acme.pdf");
    }

    #[test]
    fn test_format_filename_uses_output_date_format() {
        let name = format_filename("{date}.pdf", &fields(), "%d.%m.%Y").unwrap();
        assert_eq!(name, "04.03.2021.pdf");
    }

    #[test]
    fn test_missing_field_fails_formatting() {
        let mut fields = ExtractedFields::new();
        fields.insert(
            "date",
            FieldValue::Date(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()),
        );
        fields.insert("invoice_number", FieldValue::Text("INV-9".into()));

        let err =
            format_filename("{date} {invoice_number} {desc}.pdf", &fields, "%Y-%m-%d").unwrap_err();
        assert!(matches!(err, ActionError::MissingField { field } if field == "desc"));
    }

    #[test]
    fn test_unbalanced_pattern_is_rejected() {
        assert!(matches!(
            format_filename("{date", &fields(), "%Y-%m-%d"),
            Err(ActionError::BadPattern { .. })
        ));
        assert!(matches!(
            format_filename("date}", &fields(), "%Y-%m-%d"),
            Err(ActionError::BadPattern { .. })
        ));
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let name = format_filename("{{x}} {invoice_number}", &fields(), "%Y-%m-%d").unwrap();
        assert_eq!(name, "{x} INV-9");
    }

    #[test]
    fn test_copy_leaves_source_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.pdf");
        fs::write(&source, b"content").unwrap();
        let dest_dir = dir.path().join("out");

        let dest = copy_renamed(&source, &dest_dir, "renamed.pdf").unwrap();

        assert!(source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"content");
    }

    #[test]
    fn test_move_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.pdf");
        fs::write(&source, b"content").unwrap();
        let dest_dir = dir.path().join("out");

        let dest = move_renamed(&source, &dest_dir, "renamed.pdf").unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"content");
    }
}
