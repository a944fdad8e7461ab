//! Locale-tolerant coercion of exported text into numbers, durations and dates.
//!
//! Nothing in here fails. Every helper substitutes a default (0 or the Unix
//! epoch) when the input cannot be read, and the `*_checked` variants report
//! whether that happened so an import can account for it.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// A coerced value plus whether it was substituted by a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Coerced<T> {
    fn parsed(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

/// Running count of defaulted fields over one import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionStats {
    /// Field looked up but no candidate column was present.
    pub missing: usize,
    /// Column present but its text could not be read.
    pub unparseable: usize,
}

impl CoercionStats {
    /// Unwraps a coerced value, counting it when it was defaulted.
    pub fn record<T>(&mut self, coerced: Coerced<T>) -> T {
        if coerced.defaulted {
            self.unparseable += 1;
        }
        coerced.value
    }

    pub fn record_missing(&mut self) {
        self.missing += 1;
    }

    pub fn total(&self) -> usize {
        self.missing + self.unparseable
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// Parses a number written with either `.` or `,` as the decimal separator.
/// Returns 0 for absent or unreadable input.
pub fn parse_number(raw: Option<&str>) -> f64 {
    parse_number_checked(raw).value
}

/// Only the first comma is taken as a decimal separator, and the longest
/// numeric prefix is read (`"15%"` is 15, `"1.234,5"` is 1.234).
pub fn parse_number_checked(raw: Option<&str>) -> Coerced<f64> {
    let Some(raw) = raw else {
        return Coerced::fallback(0.0);
    };

    let cleaned = raw.trim().trim_matches('"').trim().replacen(',', ".", 1);
    match numeric_prefix(&cleaned) {
        Some(value) if value.is_finite() => Coerced::parsed(value),
        _ => Coerced::fallback(0.0),
    }
}

fn numeric_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - end - 1;
        if digits > 0 || frac_digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

// =============================================================================
// Durations
// =============================================================================

/// Converts `H:MM:SS` into seconds. Any other shape, including `MM:SS`, is 0.
pub fn parse_duration(raw: &str) -> f64 {
    parse_duration_checked(raw).value
}

pub fn parse_duration_checked(raw: &str) -> Coerced<f64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() != 3 {
        return Coerced::fallback(0.0);
    }

    let mut seconds = 0.0;
    for (part, weight) in parts.iter().zip([3600.0, 60.0, 1.0]) {
        match numeric_prefix(part.trim()) {
            Some(value) => seconds += value * weight,
            None => return Coerced::fallback(0.0),
        }
    }
    Coerced::parsed(seconds)
}

// =============================================================================
// Text folding
// =============================================================================

/// Lowercases and removes diacritics: `"Título"` becomes `"titulo"`.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Header key used by the normalized tabular path: trimmed, one pair of
/// surrounding double quotes removed, then folded.
pub fn normalize_header(header: &str) -> String {
    let trimmed = header.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed);
    fold(unquoted.trim())
}

// =============================================================================
// Dates
// =============================================================================

/// Sentinel for dates that could not be read. Sorts before any real export date.
pub fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Reads an exported date string relative to the current UTC day.
pub fn parse_date(raw: &str) -> NaiveDate {
    parse_date_checked(raw, Utc::now().date_naive()).value
}

/// Tries, in order: ISO, US `MM/DD/YYYY` and English textual forms,
/// `DD/MM/YYYY` for slash dates that cannot be month-first, then a
/// `day month [year]` form with Portuguese (or English) month names. A date
/// without a year is placed in `today`'s year, or the year before when that
/// would land in the future. Anything else resolves to [`epoch`].
pub fn parse_date_checked(raw: &str, today: NaiveDate) -> Coerced<NaiveDate> {
    let text = raw.trim().trim_matches('"').trim();
    if text.is_empty() {
        return Coerced::fallback(epoch());
    }

    parse_native(text)
        .or_else(|| parse_slash_date(text, SlashOrder::DayFirst))
        .or_else(|| parse_textual(text, today))
        .map_or_else(|| Coerced::fallback(epoch()), Coerced::parsed)
}

fn parse_native(text: &str) -> Option<NaiveDate> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }

    // ISO date, optionally followed by a time part.
    let head = text.get(..10).unwrap_or(text);
    let rest = text.get(10..).unwrap_or("");
    if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
        for format in ["%Y-%m-%d", "%Y/%m/%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(head, format) {
                return Some(date);
            }
        }
    }

    // Meta post timestamps: `01/15/2024 10:00`.
    if let Some(date) = parse_slash_date(text, SlashOrder::MonthFirst) {
        return Some(date);
    }

    ["%b %d, %Y", "%d %b %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

#[derive(Clone, Copy)]
enum SlashOrder {
    MonthFirst,
    DayFirst,
}

/// `a/b/YYYY`, optionally followed by a time part.
fn parse_slash_date(text: &str, order: SlashOrder) -> Option<NaiveDate> {
    let date_part = text.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split('/').collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return None;
    }
    let first: u32 = parts[0].parse().ok()?;
    let second: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    match order {
        SlashOrder::MonthFirst => NaiveDate::from_ymd_opt(year, first, second),
        SlashOrder::DayFirst => NaiveDate::from_ymd_opt(year, second, first),
    }
}

const MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("fev", 2),
    ("feb", 2),
    ("mar", 3),
    ("abr", 4),
    ("apr", 4),
    ("mai", 5),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("ago", 8),
    ("aug", 8),
    ("set", 9),
    ("sep", 9),
    ("out", 10),
    ("oct", 10),
    ("nov", 11),
    ("dez", 12),
    ("dec", 12),
];

fn month_from_name(token: &str) -> Option<u32> {
    let prefix: String = token.chars().take(3).collect();
    if prefix.chars().count() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .find(|(name, _)| *name == prefix)
        .map(|(_, month)| *month)
}

fn parse_textual(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let folded = fold(text).replace(['.', ','], " ");

    let mut day = None;
    let mut month = None;
    let mut year = None;

    for token in folded.split_whitespace() {
        if token == "de" || token == "of" {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            let value: i32 = token.parse().ok()?;
            if token.len() == 4 {
                year.get_or_insert(value);
            } else if day.is_none() && (1..=31).contains(&value) {
                day = Some(value as u32);
            }
        } else if month.is_none() {
            month = month_from_name(token);
        }
    }

    let (day, month) = (day?, month?);
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year > today {
                NaiveDate::from_ymd_opt(today.year() - 1, month, day)
            } else {
                Some(this_year)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // -------------------------------------------------------------------------
    // NUMBER TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_number_plain() {
        assert_eq!(parse_number(Some("1234")), 1234.0);
        assert_eq!(parse_number(Some("12.5")), 12.5);
        assert_eq!(parse_number(Some("-3")), -3.0);
    }

    #[test]
    fn test_parse_number_comma_decimal_matches_dot_form() {
        for s in ["1,5", "0,25", "12,75", "-4,5", "100,0"] {
            let dotted: f64 = s.replace(',', ".").parse().unwrap();
            assert_eq!(parse_number(Some(s)), dotted, "input {s}");
        }
    }

    #[test]
    fn test_parse_number_absent_is_zero() {
        assert_eq!(parse_number(None), 0.0);
        assert!(parse_number_checked(None).defaulted);
    }

    #[test]
    fn test_parse_number_unparseable_is_zero() {
        let coerced = parse_number_checked(Some("n/a"));
        assert_eq!(coerced.value, 0.0);
        assert!(coerced.defaulted);
        assert_eq!(parse_number(Some("")), 0.0);
    }

    #[test]
    fn test_parse_number_reads_numeric_prefix() {
        assert_eq!(parse_number(Some("15%")), 15.0);
        assert_eq!(parse_number(Some(" 7 ")), 7.0);
        assert_eq!(parse_number(Some("\"42\"")), 42.0);
        // Only the first comma is a decimal separator.
        assert_eq!(parse_number(Some("1.234,5")), 1.234);
    }

    // -------------------------------------------------------------------------
    // DURATION TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_duration_three_parts() {
        assert_eq!(parse_duration("1:02:03"), 3723.0);
        assert_eq!(parse_duration("0:00:45"), 45.0);
    }

    #[test]
    fn test_parse_duration_empty_is_zero() {
        assert_eq!(parse_duration(""), 0.0);
        assert!(parse_duration_checked("").defaulted);
    }

    #[test]
    fn test_parse_duration_two_parts_unsupported() {
        assert_eq!(parse_duration("02:03"), 0.0);
        assert!(parse_duration_checked("02:03").defaulted);
    }

    // -------------------------------------------------------------------------
    // HEADER TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_header_strips_accents() {
        assert_eq!(normalize_header("Título"), "titulo");
        assert_eq!(normalize_header("  \"Visualizações\" "), "visualizacoes");
        assert_eq!(
            normalize_header("Tempo de exibição (horas)"),
            "tempo de exibicao (horas)"
        );
        assert_eq!(normalize_header("Marcações \"Gostei\""), "marcacoes \"gostei\"");
    }

    #[test]
    fn test_normalize_header_idempotent() {
        for header in ["Título", "Não gostei", " \"País\" ", "Origem do tráfego", "views"] {
            let once = normalize_header(header);
            assert_eq!(normalize_header(&once), once, "header {header}");
        }
    }

    // -------------------------------------------------------------------------
    // DATE TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_date_iso_forms() {
        let today = ymd(2024, 6, 1);
        assert_eq!(parse_date_checked("2024-01-02", today).value, ymd(2024, 1, 2));
        assert_eq!(
            parse_date_checked("2024-01-02T10:00:00", today).value,
            ymd(2024, 1, 2)
        );
        assert_eq!(
            parse_date_checked("2024-01-02T10:00:00-03:00", today).value,
            ymd(2024, 1, 2)
        );
    }

    #[test]
    fn test_parse_date_english_text() {
        let today = ymd(2024, 6, 1);
        assert_eq!(parse_date_checked("Jan 5, 2024", today).value, ymd(2024, 1, 5));
    }

    #[test]
    fn test_parse_date_slash_dates_are_month_first() {
        let today = ymd(2024, 6, 1);
        assert_eq!(
            parse_date_checked("01/15/2024 10:00", today),
            Coerced::parsed(ymd(2024, 1, 15))
        );
        assert_eq!(
            parse_date_checked("03/02/2024 14:00", today).value,
            ymd(2024, 3, 2)
        );
        assert_eq!(parse_date_checked("12/31/2023", today).value, ymd(2023, 12, 31));
    }

    #[test]
    fn test_parse_date_day_first_when_month_first_impossible() {
        let today = ymd(2024, 6, 1);
        assert_eq!(parse_date_checked("13/02/2024", today).value, ymd(2024, 2, 13));
        assert_eq!(
            parse_date_checked("31/12/2023 08:30", today).value,
            ymd(2023, 12, 31)
        );
        assert!(parse_date_checked("32/13/2024", today).defaulted);
    }

    #[test]
    fn test_parse_date_portuguese_text() {
        let today = ymd(2024, 6, 1);
        assert_eq!(
            parse_date_checked("5 de fev. de 2024", today).value,
            ymd(2024, 2, 5)
        );
        assert_eq!(
            parse_date_checked("12 de março de 2023", today).value,
            ymd(2023, 3, 12)
        );
    }

    #[test]
    fn test_parse_date_without_year_uses_current_year() {
        let today = ymd(2024, 6, 1);
        assert_eq!(parse_date_checked("15 de maio", today).value, ymd(2024, 5, 15));
    }

    #[test]
    fn test_parse_date_without_year_rolls_back_future_dates() {
        let today = ymd(2024, 6, 1);
        assert_eq!(
            parse_date_checked("20 de dezembro", today).value,
            ymd(2023, 12, 20)
        );
    }

    #[test]
    fn test_parse_date_unparseable_is_epoch() {
        let today = ymd(2024, 6, 1);
        let coerced = parse_date_checked("sem data", today);
        assert_eq!(coerced.value, epoch());
        assert!(coerced.defaulted);
        assert!(parse_date_checked("", today).defaulted);
    }

    #[test]
    fn test_coercion_stats_counts_defaults() {
        let mut stats = CoercionStats::default();
        let a = stats.record(parse_number_checked(Some("3")));
        let b = stats.record(parse_number_checked(Some("x")));
        stats.record_missing();
        assert_eq!((a, b), (3.0, 0.0));
        assert_eq!(stats.unparseable, 1);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.total(), 2);
    }
}
