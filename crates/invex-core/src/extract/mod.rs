//! Resolution orchestration: trial-and-match template selection.

mod coerce;
pub(crate) mod engine;

pub use coerce::{parse_date, parse_int, parse_number};

use tracing::{debug, warn};

use crate::template::Template;
use crate::value::ExtractedFields;

/// Fields plus per-field failure notes from one extraction run.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub fields: ExtractedFields,
    pub warnings: Vec<String>,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution<'t> {
    /// Template that produced this result.
    pub template: &'t Template,
    /// Extracted field values, in template order.
    pub fields: ExtractedFields,
    /// The normalized text the template matched against.
    pub text: String,
    /// Per-field extraction failures; a matched template may still miss
    /// some of its declared fields.
    pub warnings: Vec<String>,
}

impl Resolution<'_> {
    /// True when every declared field extracted cleanly.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Try templates in order against raw text and extract with the first match.
///
/// Each candidate normalizes the raw text with its own options before the
/// keyword test, so two templates may see different views of the same
/// input. The first template whose keywords all occur wins — later
/// templates are not tried even if they would also match. Template authors
/// order the library (file naming, directory placement) to disambiguate;
/// there is no scoring step.
///
/// A `forced` template skips the keyword test entirely and extracts
/// unconditionally. `None` means no template matched, which is a normal
/// negative outcome, not an error.
///
/// For a fixed template list and fixed text the outcome is deterministic:
/// same selected template, same extracted mapping.
pub fn resolve<'t>(
    raw_text: &str,
    templates: &'t [Template],
    forced: Option<&'t Template>,
) -> Option<Resolution<'t>> {
    if let Some(template) = forced {
        debug!("forced template {}, skipping keyword test", template.name);
        let text = template.prepare_input(raw_text);
        return Some(finish(template, text));
    }

    for template in templates {
        let text = template.prepare_input(raw_text);
        if template.matches_input(&text) {
            debug!("matched template {}", template.name);
            return Some(finish(template, text));
        }
    }

    warn!("no template matched");
    None
}

fn finish(template: &Template, text: String) -> Resolution<'_> {
    let Extraction { fields, warnings } = template.extract(&text);
    for warning in &warnings {
        warn!(template = %template.name, "{warning}");
    }
    Resolution {
        template,
        fields,
        text,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::loader::parse_str;
    use crate::value::FieldValue;
    use pretty_assertions::assert_eq;

    fn template(name: &str, yaml: &str) -> Template {
        parse_str(yaml, name).unwrap()
    }

    fn oyo() -> Template {
        template(
            "com.oyo.invoice.yml",
            "keywords: [OYO, Oravel, Stays]\nfields:\n  invoice_number: 'No (\\d+)'\nrequired_fields: [invoice_number]\n",
        )
    }

    #[test]
    fn test_selects_template_with_all_keywords_present() {
        let templates = vec![oyo()];
        let result = resolve("OYO Oravel Stays No 12", &templates, None).unwrap();
        assert_eq!(result.template.name, "com.oyo.invoice.yml");
        assert_eq!(
            result.fields.get("invoice_number"),
            Some(&FieldValue::Text("12".into()))
        );
    }

    #[test]
    fn test_rejects_template_missing_one_keyword() {
        let templates = vec![oyo()];
        assert!(resolve("OYO Stays No 12", &templates, None).is_none());
    }

    #[test]
    fn test_first_fit_wins_over_later_match() {
        let first = template(
            "a.yml",
            "issuer: First\nkeywords: [Acme]\nfields:\n  invoice_number: 'No (\\d+)'\nrequired_fields: [invoice_number]\n",
        );
        let second = template(
            "b.yml",
            "issuer: Second\nkeywords: [Acme]\nfields:\n  invoice_number: 'No (\\d+)'\n  order: '(Order \\w+)'\nrequired_fields: [invoice_number]\n",
        );
        let templates = vec![first, second];

        // both match; the later template would extract more, but the first
        // one in list order is selected
        let result = resolve("Acme No 9 Order X1", &templates, None).unwrap();
        assert_eq!(result.template.name, "a.yml");
        assert_eq!(result.fields.get("issuer"), Some(&FieldValue::Text("First".into())));
    }

    #[test]
    fn test_rejected_template_falls_through_to_next_candidate() {
        let fallback = template(
            "z-fallback.yml",
            "issuer: Generic\nkeywords: [No]\nfields:\n  invoice_number: 'No (\\d+)'\nrequired_fields: [invoice_number]\n",
        );
        let templates = vec![oyo(), fallback];

        // "Oravel" is missing, so the OYO template is rejected and the
        // next candidate is tried
        let result = resolve("OYO Stays No 12", &templates, None).unwrap();
        assert_eq!(result.template.name, "z-fallback.yml");
    }

    #[test]
    fn test_forced_template_bypasses_keyword_test() {
        let templates = vec![oyo()];

        // keywords nowhere in the text, still extracts when forced
        let result = resolve("No 77", &templates, Some(&templates[0])).unwrap();
        assert_eq!(result.template.name, "com.oyo.invoice.yml");
        assert_eq!(
            result.fields.get("invoice_number"),
            Some(&FieldValue::Text("77".into()))
        );
    }

    #[test]
    fn test_resolve_is_pure() {
        let templates = vec![oyo()];
        let text = "OYO Oravel Stays No 12";

        let first = resolve(text, &templates, None).unwrap();
        let second = resolve(text, &templates, None).unwrap();
        assert_eq!(first.template.name, second.template.name);
        assert_eq!(first.fields, second.fields);
    }

    #[test]
    fn test_per_template_normalization() {
        // the same raw text is seen differently by each candidate: this
        // template only matches once whitespace is stripped
        let squashed = template(
            "squash.yml",
            "keywords: [GrandTotal]\nfields:\n  amount: 'GrandTotalRs(\\d+)'\nrequired_fields: [amount]\noptions:\n  remove_whitespace: true\n",
        );
        let templates = vec![squashed];

        let result = resolve("Grand Total Rs 1939", &templates, None).unwrap();
        assert_eq!(result.template.name, "squash.yml");
        assert_eq!(result.text, "GrandTotalRs1939");
    }
}
