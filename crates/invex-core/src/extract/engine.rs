//! Regex application and field assembly for a selected template.
//!
//! The keyword match and the extraction are independent steps: a template
//! can match on keywords yet fail to extract every declared field. Failures
//! become warnings on the result, never hard errors, so partial data still
//! reaches the caller.

use tracing::debug;

use super::Extraction;
use super::coerce;
use crate::template::{FieldKind, FieldRule, LineFieldType, LinesRule, Template};
use crate::value::{ExtractedFields, FieldValue};

pub(crate) fn extract_fields(template: &Template, text: &str) -> Extraction {
    let mut output = ExtractedFields::new();
    let mut warnings = Vec::new();

    output.insert("issuer", FieldValue::Text(template.issuer.clone()));

    for rule in &template.fields {
        debug!(field = %rule.name, "applying field rule");
        match apply_rule(rule, text, template) {
            Ok(Some(value)) => output.insert(rule.name.clone(), value),
            Ok(None) => warnings.push(format!("regexp for field {} didn't match", rule.name)),
            Err(reason) => warnings.push(format!("field {}: {reason}", rule.name)),
        }
    }

    if let Some(currency) = &template.options.currency {
        output.insert("currency", FieldValue::Text(currency.clone()));
    }

    if let Some(lines) = &template.lines {
        match extract_lines(lines, text, template) {
            Ok(Some(rows)) => output.insert("lines", rows),
            Ok(None) => warnings.push("no line items matched".to_string()),
            Err(reason) => warnings.push(format!("lines: {reason}")),
        }
    }

    let missing: Vec<&str> = template
        .required_fields
        .iter()
        .map(String::as_str)
        .filter(|field| !output.contains(field))
        .collect();
    if missing.is_empty() {
        output.insert(
            "desc",
            FieldValue::Text(format!("Invoice from {}", template.issuer)),
        );
    } else {
        warnings.push(format!(
            "unable to match all required fields, missing: {}",
            missing.join(", ")
        ));
    }

    Extraction {
        fields: output,
        warnings,
    }
}

fn apply_rule(
    rule: &FieldRule,
    text: &str,
    template: &Template,
) -> Result<Option<FieldValue>, String> {
    if rule.kind == FieldKind::Static {
        return Ok(rule.literal.clone().map(FieldValue::Text));
    }

    let matches = collect_matches(rule, text);
    if matches.is_empty() {
        return Ok(None);
    }

    let separator = template.options.decimal_separator;
    let value = match rule.kind {
        FieldKind::Date => {
            let date = coerce::parse_date(&matches[0], &template.options.date_formats)
                .ok_or_else(|| format!("date parsing failed on {:?}", matches[0]))?;
            FieldValue::Date(date)
        }
        FieldKind::Amount if rule.sum => {
            let mut total = rust_decimal::Decimal::ZERO;
            for raw in &matches {
                total += coerce::parse_number(raw, separator)?;
            }
            FieldValue::Amount(total)
        }
        FieldKind::Amount => FieldValue::Amount(coerce::parse_number(&matches[0], separator)?),
        FieldKind::Text | FieldKind::Static => {
            // Duplicate matches collapse; first-seen order is kept so the
            // result is deterministic.
            let mut unique: Vec<String> = Vec::new();
            for m in matches {
                if !unique.contains(&m) {
                    unique.push(m);
                }
            }
            if unique.len() == 1 {
                FieldValue::Text(unique.remove(0))
            } else {
                FieldValue::List(unique)
            }
        }
    };

    Ok(Some(value))
}

/// Collect every match of every pattern, in pattern then match order.
///
/// A pattern's first capture group is the extracted value; a pattern
/// without groups contributes its whole match.
fn collect_matches(rule: &FieldRule, text: &str) -> Vec<String> {
    let mut matches = Vec::new();
    for pattern in &rule.patterns {
        for caps in pattern.captures_iter(text) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                matches.push(m.as_str().to_string());
            }
        }
    }
    matches
}

fn extract_lines(
    rule: &LinesRule,
    text: &str,
    template: &Template,
) -> Result<Option<FieldValue>, String> {
    let start = rule
        .start
        .find(text)
        .ok_or_else(|| "start pattern not found".to_string())?;
    let body = &text[start.end()..];
    let end = rule
        .end
        .find(body)
        .ok_or_else(|| "end pattern not found".to_string())?;
    let body = &body[..end.start()];

    let mut rows = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(caps) = rule.line.captures(line) else {
            continue;
        };

        let mut row = ExtractedFields::new();
        for group in rule.line.capture_names().flatten() {
            let Some(m) = caps.name(group) else { continue };
            let raw = m.as_str().trim();
            let declared = rule
                .types
                .iter()
                .find(|(name, _)| name == group)
                .map(|(_, t)| *t);
            let value = match declared {
                Some(LineFieldType::Int) => {
                    FieldValue::Int(coerce::parse_int(raw, template.options.decimal_separator)?)
                }
                Some(LineFieldType::Float) => FieldValue::Amount(coerce::parse_number(
                    raw,
                    template.options.decimal_separator,
                )?),
                Some(LineFieldType::Date) => FieldValue::Date(
                    coerce::parse_date(raw, &template.options.date_formats)
                        .ok_or_else(|| format!("date parsing failed on {raw:?}"))?,
                ),
                None => FieldValue::Text(raw.to_string()),
            };
            row.insert(group, value);
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        Ok(None)
    } else {
        Ok(Some(FieldValue::Rows(rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::loader::parse_str;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const OYO: &str = r#"
issuer: OYO
fields:
  amount: GrandTotalRs(\d+)
  date: Date:(\d{1,2}/\d{1,2}/\d{1,4})
  invoice_number: ([A-Z0-9]+)CashatHotel
keywords:
  - OYO
  - Oravel
  - Stays
options:
  currency: INR
  remove_whitespace: true
"#;

    const OYO_TEXT: &str = "OYO Oravel Stays\nGrand Total Rs 1939\nDate: 31/12/2017\nIBZY2087 Cash at Hotel\n";

    #[test]
    fn test_extract_typed_fields() {
        let template = parse_str(OYO, "com.oyo.invoice.yml").unwrap();
        let text = template.prepare_input(OYO_TEXT);
        let result = template.extract(&text);

        assert_eq!(result.fields.get("issuer"), Some(&FieldValue::Text("OYO".into())));
        assert_eq!(result.fields.get("amount"), Some(&FieldValue::Amount(dec!(1939))));
        assert_eq!(
            result.fields.get("date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2017, 12, 31).unwrap()))
        );
        assert_eq!(
            result.fields.get("invoice_number"),
            Some(&FieldValue::Text("IBZY2087".into()))
        );
        assert_eq!(result.fields.get("currency"), Some(&FieldValue::Text("INR".into())));
        assert_eq!(
            result.fields.get("desc"),
            Some(&FieldValue::Text("Invoice from OYO".into()))
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_field_is_a_warning_not_an_error() {
        let template = parse_str(OYO, "com.oyo.invoice.yml").unwrap();
        let text = template.prepare_input("OYO Oravel Stays\nGrand Total Rs 1939\n");
        let result = template.extract(&text);

        // amount still extracted, date and invoice_number missing
        assert_eq!(result.fields.get("amount"), Some(&FieldValue::Amount(dec!(1939))));
        assert!(result.fields.get("date").is_none());
        assert!(result.fields.get("desc").is_none());
        assert!(result.warnings.iter().any(|w| w.contains("date")));
        assert!(result.warnings.iter().any(|w| w.contains("required")));
    }

    #[test]
    fn test_multiple_patterns_per_field() {
        let template = parse_str(
            "keywords: [X]\nfields:\n  invoice_number:\n    - 'Invoice (INV-\\d+)'\n    - 'Credit Note (CN-\\d+)'\nrequired_fields: [invoice_number]\n",
            "t.yml",
        )
        .unwrap();

        let result = template.extract("X Credit Note CN-42");
        assert_eq!(
            result.fields.get("invoice_number"),
            Some(&FieldValue::Text("CN-42".into()))
        );
    }

    #[test]
    fn test_repeated_distinct_matches_become_a_list() {
        let template = parse_str(
            "keywords: [X]\nfields:\n  order: 'order (\\d+)'\nrequired_fields: [order]\n",
            "t.yml",
        )
        .unwrap();

        let result = template.extract("order 1 order 2 order 1");
        assert_eq!(
            result.fields.get("order"),
            Some(&FieldValue::List(vec!["1".into(), "2".into()]))
        );
    }

    #[test]
    fn test_static_and_sum_fields() {
        let template = parse_str(
            "keywords: [X]\nfields:\n  static_vat_id: 'GB 123'\n  sum_amount:\n    - 'net (\\d+\\.\\d{2})'\n    - 'tax (\\d+\\.\\d{2})'\nrequired_fields: [vat_id, amount]\n",
            "t.yml",
        )
        .unwrap();

        let result = template.extract("X net 100.00 tax 19.00");
        assert_eq!(result.fields.get("vat_id"), Some(&FieldValue::Text("GB 123".into())));
        assert_eq!(result.fields.get("amount"), Some(&FieldValue::Amount(dec!(119.00))));
    }

    #[test]
    fn test_line_items() {
        let template = parse_str(
            r#"
keywords: [Grocer]
fields:
  invoice_number: 'No (\d+)'
required_fields: [invoice_number]
lines:
  start: 'Item\s+Qty\s+Price'
  end: 'Total'
  line: '(?P<item>\w+)\s+(?P<qty>\d+)\s+(?P<price>\d+\.\d{2})'
  types:
    qty: int
    price: float
"#,
            "grocer.yml",
        )
        .unwrap();

        let text = "Grocer No 7\nItem  Qty  Price\napples  2  3.50\npears  1  2.00\nTotal 5.50\n";
        let result = template.extract(text);

        let Some(FieldValue::Rows(rows)) = result.fields.get("lines") else {
            panic!("expected line-item rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("item"), Some(&FieldValue::Text("apples".into())));
        assert_eq!(rows[0].get("qty"), Some(&FieldValue::Int(2)));
        assert_eq!(rows[0].get("price"), Some(&FieldValue::Amount(dec!(3.50))));
        assert_eq!(rows[1].get("item"), Some(&FieldValue::Text("pears".into())));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let template = parse_str(OYO, "com.oyo.invoice.yml").unwrap();
        let text = template.prepare_input(OYO_TEXT);

        let first = template.extract(&text);
        let second = template.extract(&text);
        assert_eq!(first.fields, second.fields);
    }
}
