//! Coercion of raw regex matches into typed values.

use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

lazy_static! {
    // Everything that can act as a thousands separator once the decimal
    // separator has been replaced by a pipe.
    static ref THOUSANDS_SEPARATORS: Regex = Regex::new(r"[.,\s\u{00a0}]").unwrap();
}

/// Formats tried after the template's own `date_formats` hints.
///
/// Day-first formats come before month-first: the template corpus is
/// predominantly European, and a template can always pin the order with a
/// `date_formats` hint.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d %B %Y",
    "%B %d, %Y",
    "%d.%m.%y",
    "%d/%m/%y",
];

/// Parse a number the way the template declares it.
///
/// The declared decimal separator is protected, every other separator
/// character is treated as a thousands separator and stripped.
pub fn parse_number(value: &str, decimal_separator: char) -> Result<Decimal, String> {
    let value = value.trim();
    if value.matches(decimal_separator).count() > 1 {
        return Err(format!(
            "decimal separator occurs more than once in {value:?}"
        ));
    }

    let piped = value.replace(decimal_separator, "|");
    let stripped = THOUSANDS_SEPARATORS.replace_all(&piped, "");
    let normalized = stripped.replace('|', ".");

    Decimal::from_str(&normalized).map_err(|e| format!("cannot parse {value:?} as a number: {e}"))
}

/// Parse a number and truncate it to an integer.
pub fn parse_int(value: &str, decimal_separator: char) -> Result<i64, String> {
    let number = parse_number(value, decimal_separator)?;
    number
        .trunc()
        .to_i64()
        .ok_or_else(|| format!("{value:?} does not fit an integer"))
}

/// Parse a date, trying the template's format hints before the built-ins.
pub fn parse_date(value: &str, date_formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    let hints = date_formats.iter().map(String::as_str);
    for format in hints.chain(DATE_FORMATS.iter().copied()) {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_number_dot_separator() {
        assert_eq!(parse_number("1939", '.').unwrap(), dec!(1939));
        assert_eq!(parse_number("1,939.00", '.').unwrap(), dec!(1939.00));
        assert_eq!(parse_number("12.50", '.').unwrap(), dec!(12.50));
    }

    #[test]
    fn test_parse_number_comma_separator() {
        assert_eq!(parse_number("1 234,56", ',').unwrap(), dec!(1234.56));
        assert_eq!(parse_number("1.234,56", ',').unwrap(), dec!(1234.56));
    }

    #[test]
    fn test_parse_number_rejects_repeated_separator() {
        assert!(parse_number("1.2.3", '.').is_err());
    }

    #[test]
    fn test_parse_int_truncates() {
        assert_eq!(parse_int("3,7", ',').unwrap(), 3);
        assert_eq!(parse_int("12", '.').unwrap(), 12);
    }

    #[test]
    fn test_parse_date_builtin_formats() {
        let expected = NaiveDate::from_ymd_opt(2017, 12, 31).unwrap();
        assert_eq!(parse_date("2017-12-31", &[]), Some(expected));
        assert_eq!(parse_date("31.12.2017", &[]), Some(expected));
        assert_eq!(parse_date("31/12/2017", &[]), Some(expected));
    }

    #[test]
    fn test_parse_date_hints_take_precedence() {
        // month-first hint beats the day-first built-in
        let hints = vec!["%m/%d/%Y".to_string()];
        assert_eq!(
            parse_date("03/04/2021", &hints),
            NaiveDate::from_ymd_opt(2021, 3, 4)
        );
        assert_eq!(
            parse_date("03/04/2021", &[]),
            NaiveDate::from_ymd_opt(2021, 4, 3)
        );
    }

    #[test]
    fn test_parse_date_garbage_is_none() {
        assert_eq!(parse_date("not a date", &[]), None);
    }
}
