//! File parser for bulk loader uploads
//!
//! Turns a delimited-text or spreadsheet file into a header list and an
//! ordered sequence of loosely typed rows. Values are not coerced to target
//! types here; the backend dry run does that.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Number, Value};
use tracing::{debug, info, warn};

use crate::error::ParseError;
use crate::types::{ParsedFile, RawRow};

/// Header name given to blank header cells in spreadsheets
const EMPTY_HEADER: &str = "__EMPTY";

/// Input formats the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-delimited text
    Csv,
    /// Binary spreadsheet (xlsx, xls, ...), first worksheet only
    Spreadsheet,
}

impl FileFormat {
    /// Pick the format from the file extension. Does not touch the file.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Spreadsheet),
            _ => Err(ParseError::UnsupportedFormat),
        }
    }
}

/// Parse the file at `path`, choosing the format from its extension
pub fn parse_file(path: &Path) -> Result<ParsedFile, ParseError> {
    let format = FileFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let parsed = parse_bytes(format, &bytes)?;

    info!(
        "Parsed {}: {} columns, {} rows",
        path.display(),
        parsed.headers.len(),
        parsed.rows.len()
    );
    Ok(parsed)
}

/// Parse in-memory file content
pub fn parse_bytes(format: FileFormat, bytes: &[u8]) -> Result<ParsedFile, ParseError> {
    match format {
        FileFormat::Csv => parse_csv(bytes),
        FileFormat::Spreadsheet => parse_spreadsheet(bytes),
    }
}

// =============================================================================
// DELIMITED TEXT
// =============================================================================

fn parse_csv(bytes: &[u8]) -> Result<ParsedFile, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    // Fields are decoded one by one so a stray Latin-1 byte does not reject the file
    let raw_headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = decode_field(h);
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h
            }
        })
        .collect();

    if raw_headers.is_empty() || raw_headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::MissingHeaders);
    }
    let headers = dedupe_headers(raw_headers);

    let mut rows = Vec::new();
    let mut surplus_rows = 0usize;
    let mut lossy_rows = 0usize;

    for record in reader.byte_records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() > headers.len() {
            surplus_rows += 1;
        }

        if record.iter().any(|field| std::str::from_utf8(field).is_err()) {
            lossy_rows += 1;
        }

        let mut row = RawRow::new(rows.len() + 1);
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), Value::String(decode_field(field)));
        }
        rows.push(row);
    }

    if lossy_rows > 0 {
        warn!(
            "{} row(s) contained bytes that are not valid UTF-8; they were replaced with U+FFFD",
            lossy_rows
        );
    }

    if surplus_rows > 0 {
        warn!(
            "{} row(s) had more fields than the {} headers; extra fields dropped",
            surplus_rows,
            headers.len()
        );
    }

    Ok(ParsedFile { headers, rows })
}

fn decode_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

// =============================================================================
// SPREADSHEETS
// =============================================================================

fn parse_spreadsheet(bytes: &[u8]) -> Result<ParsedFile, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    if let Some(name) = workbook.sheet_names().first() {
        debug!("Reading worksheet '{}'", name);
    }

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::EmptySpreadsheet)?
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let header_cells = sheet_rows.next().ok_or(ParseError::EmptySpreadsheet)?;

    let headers = dedupe_headers(
        header_cells
            .iter()
            .map(|cell| match cell_value(cell) {
                None | Some(Value::Null) => EMPTY_HEADER.to_string(),
                Some(Value::String(s)) if s.trim().is_empty() => EMPTY_HEADER.to_string(),
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
            })
            .collect(),
    );

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let mut row = RawRow::new(rows.len() + 1);
        for (header, cell) in headers.iter().zip(cells.iter()) {
            if let Some(value) = cell_value(cell) {
                row.insert(header.clone(), value);
            }
        }
        if row.fields.is_empty() {
            continue;
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ParseError::EmptySpreadsheet);
    }

    Ok(ParsedFile { headers, rows })
}

/// Convert a spreadsheet cell to a loose scalar; `None` for empty cells
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::Number((*i).into())),
        Data::Float(f) => Some(float_value(*f)),
        Data::Bool(b) => Some(Value::String(b.to_string())),
        Data::DateTime(dt) => Some(float_value(dt.as_f64())),
        Data::DateTimeIso(s) => Some(Value::String(s.clone())),
        Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::Error(_) => Some(Value::Null),
    }
}

fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Value::Number((f as i64).into());
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Make header names unique by suffixing repeats with `_1`, `_2`, ...
fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut headers = Vec::with_capacity(raw.len());

    for name in raw {
        let mut candidate = name.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", name, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}
