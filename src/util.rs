// Parsing and small-math helpers.
//
// All the "dirty" value handling lives here so the aggregators can assume
// clean, typed inputs: appointment exports mix numbers, numeric strings,
// several date formats and plain garbage in the same fields.
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Deserializer};

/// Parse a string-like value into `f64`, forgiving the formatting noise that
/// shows up in exported data (whitespace, thousands separators, stray text).
///
/// Returns `None` for anything that cannot be parsed to a finite number.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date string into a `NaiveDate`.
///
/// Accepts plain `YYYY-MM-DD`, RFC 3339 timestamps, and the zone-less
/// `YYYY-MM-DDTHH:MM:SS` variant some ingestion paths produce. Anything else
/// is `None`; callers treat that as "no date" rather than an error.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    None
}

/// Serde helper for amount-like fields that arrive as JSON numbers in some
/// records and as numeric strings in others. Unparseable values become
/// `None` instead of failing the whole record.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => parse_f64_safe(Some(&s)),
            _ => None,
        })
        .filter(|v| v.is_finite()))
}

/// Arithmetic mean; 0 for an empty slice to avoid NaNs downstream.
pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Round to cents.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// True when both dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// `2023-05` style month bucket key. Sorts chronologically as a string.
pub fn month_key(d: NaiveDate) -> String {
    d.format("%Y-%m").to_string()
}

/// `May 2023` style month label for chart axes and tables.
pub fn month_label(d: NaiveDate) -> String {
    d.format("%b %Y").to_string()
}

/// First day of the month `months` before the month containing `d`.
pub fn months_back(d: NaiveDate, months: u32) -> Option<NaiveDate> {
    d.with_day(1)?.checked_sub_months(Months::new(months))
}

/// Parse a `YYYY-MM` bucket key back into the first day of that month.
pub fn parse_month_key(key: &str) -> Option<NaiveDate> {
    let (year, month) = key.split_once('-')?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => return 30,
    };
    let next = first.checked_add_months(Months::new(1)).unwrap_or(first);
    (next - first).num_days().max(1) as u32
}

/// Number of week slots a month spans when sliced into 7-day chunks (4 or 5).
pub fn weeks_in_month(year: i32, month: u32) -> u32 {
    days_in_month(year, month).div_ceil(7)
}

/// Format a floating-point value with fixed decimals and locale-aware
/// thousands separators (e.g. `1,234,567.89`).
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if decimals > 0 {
        res.push('.');
        res.push_str(frac_part.unwrap_or("0"));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Thousands-separated integer, used for counts in console messages.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_separated_numbers() {
        assert_eq!(parse_f64_safe(Some("42.5")), Some(42.5));
        assert_eq!(parse_f64_safe(Some("1,250")), Some(1250.0));
        assert_eq!(parse_f64_safe(Some("  7 ")), Some(7.0));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn parses_the_date_formats_seen_in_exports() {
        let d = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(parse_date_safe(Some("2023-05-01")), Some(d));
        assert_eq!(parse_date_safe(Some("2023-05-01T09:30:00Z")), Some(d));
        assert_eq!(parse_date_safe(Some("2023-05-01T09:30:00.123")), Some(d));
        assert_eq!(parse_date_safe(Some("yesterday")), None);
    }

    #[test]
    fn month_helpers() {
        let d = NaiveDate::from_ymd_opt(2023, 5, 14).unwrap();
        assert_eq!(month_key(d), "2023-05");
        assert_eq!(month_label(d), "May 2023");
        assert_eq!(parse_month_key("2023-05"), d.with_day(1));
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(weeks_in_month(2023, 2), 4);
        assert_eq!(weeks_in_month(2023, 5), 5);
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(-42.5, 2), "-42.50");
        assert_eq!(format_int(9855u64), "9,855");
    }
}
