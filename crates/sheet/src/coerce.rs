//! Cell coercion rules: how each format family maps [`CellValue`]s to and
//! from its codec's native cell types.

use crate::cell::{trim_trailing_nulls, CellValue, Grid, Row};
use calamine::{Data, Range};
use regex::Regex;
use std::sync::OnceLock;

/// Largest magnitude at which every integer is exactly representable in an f64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Numeric text as recognised by the zip-based writer (no leading zeros, optional exponent).
static NUMERIC_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Strict decimal text as recognised by the open-document writer.
static DECIMAL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn numeric_regex() -> &'static Regex {
    NUMERIC_PATTERN.get_or_init(|| {
        Regex::new(r"^-?(\d|\d+\.\d*|\.\d+|[1-9]\d+\.?\d*)([Ee]-?\d+)?$").expect("valid regex")
    })
}

fn decimal_regex() -> &'static Regex {
    DECIMAL_PATTERN.get_or_init(|| Regex::new(r"^\s*[-+]?\d+(\.\d+)?\s*$").expect("valid regex"))
}

/// Convert a calamine cell to a `CellValue`.
#[must_use]
pub fn from_calamine(data: &Data, whole_numbers_as_int: bool) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::from(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => from_float(*f, whole_numbers_as_int),
        Data::String(s) => CellValue::String(s.clone()),
        // Spreadsheet dates are serial day numbers since 1899-12-30
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

/// Walk a codec range from A1 to its reported end, one row at a time.
/// Missing cells become nulls; trailing nulls are trimmed from every row.
pub(crate) fn grid_from_range(range: &Range<Data>, whole_numbers_as_int: bool) -> Grid {
    let Some((max_row, max_col)) = range.end() else {
        return Grid::new();
    };

    (0..=max_row)
        .map(|r| {
            let mut row: Row = (0..=max_col)
                .map(|c| {
                    range
                        .get_value((r, c))
                        .map_or(CellValue::Null, |data| from_calamine(data, whole_numbers_as_int))
                })
                .collect();
            trim_trailing_nulls(&mut row);
            row
        })
        .collect()
}

/// Spreadsheet codecs store every number as a float; optionally give back
/// integral values as integers.
#[must_use]
pub fn from_float(value: f64, whole_numbers_as_int: bool) -> CellValue {
    if whole_numbers_as_int && value.fract() == 0.0 && value.abs() < MAX_EXACT_INT {
        CellValue::Int(value as i64)
    } else {
        CellValue::Float(value)
    }
}

/// Type inference for delimited text fields: empty -> null, numeric text ->
/// int or float, anything else stays text. A leading `=` never makes a formula.
#[must_use]
pub fn infer_from_text(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }

    if numeric_regex().is_match(trimmed) {
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        // out-of-range exponents overflow to infinity; keep those as text
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
    }

    CellValue::String(field.to_string())
}

/// What the zip-based writer assigns to a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum XlsxValue {
    /// Null cells are left untouched
    Skip,
    /// A live formula, including its leading `=`
    Formula(String),
    Number(f64),
    Text(String),
}

/// Every non-null value is first reduced to its text (a formula to its bare
/// body). With `infer` the text is then classified: a leading `=` makes a live
/// formula, numeric text a number, anything else stays text.
#[must_use]
pub fn xlsx_value_for(value: &CellValue, infer: bool) -> XlsxValue {
    if value.is_null() {
        return XlsxValue::Skip;
    }

    let text = value.to_string();
    if !infer {
        return XlsxValue::Text(text);
    }

    if text.len() > 1 && text.starts_with('=') {
        return XlsxValue::Formula(text);
    }
    if numeric_regex().is_match(&text) {
        if let Ok(number) = text.parse::<f64>() {
            if number.is_finite() {
                return XlsxValue::Number(number);
            }
        }
    }
    XlsxValue::Text(text)
}

/// How the open-document writer classifies a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum OdsCell {
    /// Float-typed cell carrying the formula attribute
    Formula(String),
    /// Float-typed cell; `value` is the trimmed literal, `text` the displayed paragraph
    Float { value: String, text: String },
    Text(String),
    /// Empty string-typed cell without a paragraph
    Empty,
}

#[must_use]
pub fn ods_cell_for(value: &CellValue) -> OdsCell {
    match value {
        CellValue::Null => OdsCell::Empty,
        CellValue::Formula(formula) => OdsCell::Formula(formula.body().to_string()),
        CellValue::Int(_) | CellValue::Float(_) => {
            let text = value.to_string();
            OdsCell::Float {
                value: text.trim().to_string(),
                text,
            }
        }
        CellValue::String(s) if decimal_regex().is_match(s) => OdsCell::Float {
            value: s.trim().to_string(),
            text: s.clone(),
        },
        CellValue::String(s) => OdsCell::Text(s.clone()),
    }
}

/// What the legacy-binary writer hands to its record encoder. Values pass
/// through unchanged; the container decides numeric vs. string storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BiffCell<'a> {
    Blank,
    Number(f64),
    Text(&'a str),
    /// Formula body with any stray leading `=` removed
    Formula(&'a str),
}

#[must_use]
pub fn biff_cell_for(value: &CellValue) -> BiffCell<'_> {
    match value {
        CellValue::Null => BiffCell::Blank,
        CellValue::Int(i) => BiffCell::Number(*i as f64),
        CellValue::Float(f) => BiffCell::Number(*f),
        CellValue::String(s) => BiffCell::Text(s),
        CellValue::Formula(formula) => BiffCell::Formula(formula.without_marker()),
    }
}
