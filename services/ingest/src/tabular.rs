//! Delimited-text parsing into header-keyed rows.
//!
//! Built on the `csv` crate with a flexible reader: ragged rows are kept,
//! malformed records are skipped and logged, blank lines are ignored.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::coerce::{self, CoercionStats};

/// One field value. `number` is filled when type inference is on and the
/// raw text is a plain number.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub raw: String,
    pub number: Option<f64>,
}

impl Cell {
    fn new(raw: &str, infer_types: bool) -> Self {
        let raw = raw.trim().to_string();
        let number = if infer_types && !raw.is_empty() {
            raw.parse::<f64>().ok().filter(|n| n.is_finite())
        } else {
            None
        };
        Self { raw, number }
    }

    pub fn text(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// A header-keyed record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: HashMap<String, Cell>,
}

impl Row {
    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.get(key)
    }

    /// First candidate column that is present with a non-empty value.
    pub fn first_present(&self, keys: &[&str]) -> Option<&Cell> {
        keys.iter()
            .filter_map(|key| self.cells.get(*key))
            .find(|cell| !cell.is_empty())
    }

    /// Text of the first present candidate, or an empty string.
    pub fn text(&self, keys: &[&str]) -> String {
        self.first_present(keys)
            .map(|cell| cell.raw.clone())
            .unwrap_or_default()
    }

    /// Numeric value of the first present candidate, or 0.
    pub fn number(&self, keys: &[&str], stats: &mut CoercionStats) -> f64 {
        match self.first_present(keys) {
            Some(Cell {
                number: Some(value),
                ..
            }) => *value,
            Some(cell) => stats.record(coerce::parse_number_checked(Some(&cell.raw))),
            None => {
                stats.record_missing();
                0.0
            }
        }
    }

    /// Seconds from either a plain number or an `H:MM:SS` value.
    pub fn seconds(&self, keys: &[&str], stats: &mut CoercionStats) -> f64 {
        match self.first_present(keys) {
            Some(cell) if cell.number.is_none() && cell.raw.contains(':') => {
                stats.record(coerce::parse_duration_checked(&cell.raw))
            }
            _ => self.number(keys, stats),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Cell::new(v.as_ref(), true)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabularOptions {
    /// Fold headers (`"Título"` -> `"titulo"`). When off, headers are only
    /// trimmed and stripped of stray quotes.
    pub normalize_headers: bool,
    pub infer_types: bool,
}

impl TabularOptions {
    /// Header spellings are kept as exported (Instagram and TikTok paths).
    pub const RAW: Self = Self {
        normalize_headers: false,
        infer_types: true,
    };

    /// Headers folded to lowercase ASCII-ish keys (YouTube path).
    pub const NORMALIZED: Self = Self {
        normalize_headers: true,
        infer_types: true,
    };
}

/// Parsed table: headers in column order plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub skipped: usize,
}

impl Table {
    pub fn has_any(&self, keys: &[&str]) -> bool {
        self.headers.iter().any(|h| keys.contains(&h.as_str()))
    }

    /// First header (in column order) that is not one of `excluded`.
    pub fn first_header_except(&self, excluded: &[&str]) -> Option<&str> {
        self.headers
            .iter()
            .map(String::as_str)
            .find(|h| !h.is_empty() && !excluded.contains(h))
    }
}

/// Removes a UTF-8 BOM and a leading `sep=X` directive line, returning the
/// directive's delimiter when present.
pub fn strip_directives(text: &str) -> (Option<u8>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first, rest) = match text.find('\n') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    };
    let directive = first.trim().trim_matches('"');
    match directive.strip_prefix("sep=") {
        Some(sep) => (sep.bytes().next(), rest),
        None => (None, text),
    }
}

/// Most frequent of `,`, `;` and tab outside quotes; ties go in that order.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut counts = [(b',', 0usize), (b';', 0), (b'\t', 0)];
    let mut in_quotes = false;
    for byte in header_line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        for (delimiter, count) in counts.iter_mut() {
            if byte == *delimiter {
                *count += 1;
            }
        }
    }

    let mut best = counts[0];
    for candidate in &counts[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    best.0
}

/// Splits one line into trimmed fields, honoring CSV quoting.
pub fn split_line(line: &str) -> Vec<String> {
    let delimiter = detect_delimiter(line);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|f| f.trim().to_string()).collect(),
        Some(Err(e)) => {
            debug!("falling back to plain split for line: {e}");
            line.split(delimiter as char)
                .map(|f| f.trim().trim_matches('"').trim().to_string())
                .collect()
        }
        None => Vec::new(),
    }
}

/// Parses CSV text into a [`Table`].
pub fn parse_table(text: &str, options: TabularOptions) -> Table {
    let (directive, body) = strip_directives(text);
    let header_line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let delimiter = directive.unwrap_or_else(|| detect_delimiter(header_line));

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(record) => record
            .iter()
            .map(|h| {
                if options.normalize_headers {
                    coerce::normalize_header(h)
                } else {
                    h.trim().trim_matches('"').trim().to_string()
                }
            })
            .collect(),
        Err(e) => {
            warn!("could not read CSV header: {e}");
            return Table::default();
        }
    };

    let mut table = Table {
        headers,
        ..Table::default()
    };

    for (line_idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping line {} due to error: {}", line_idx + 2, e);
                table.skipped += 1;
                continue;
            }
        };

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut cells = HashMap::with_capacity(table.headers.len());
        for (header, field) in table.headers.iter().zip(record.iter()) {
            if header.is_empty() || cells.contains_key(header) {
                continue;
            }
            cells.insert(header.clone(), Cell::new(field, options.infer_types));
        }
        table.rows.push(Row { cells });
    }

    table
}

/// Drops the one-field title line Meta puts above the real header
/// (`"Visualizações"` then `"Data","Primary"`).
pub fn strip_title_line(text: &str) -> &str {
    let (_, body) = strip_directives(text);
    let mut offset = 0;
    let mut lines = body.split_inclusive('\n');

    let Some(first) = lines.by_ref().find(|l| {
        let blank = l.trim().is_empty();
        if blank {
            offset += l.len();
        }
        !blank
    }) else {
        return body;
    };
    let Some(second) = lines.find(|l| !l.trim().is_empty()) else {
        return body;
    };

    if split_line(first.trim()).len() == 1 && split_line(second.trim()).len() > 1 {
        &body[offset + first.len()..]
    } else {
        body
    }
}
