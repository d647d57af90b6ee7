use crate::error::{Result, SheetError};
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A row of cell values. Rows in a grid need not share a width.
pub type Row = Vec<CellValue>;

/// The uniform in-memory spreadsheet: ordered rows of ordered cells.
pub type Grid = Vec<Row>;

/// A formula to be written as a live computation rather than literal text.
///
/// The body is stored verbatim and should not include the leading `=` that
/// most spreadsheet programs display. Each format adapter decides how (and
/// whether) to re-express it in its target format; no cross-format
/// translation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Formula {
    #[serde(rename = "formula")]
    body: String,
}

impl Formula {
    /// Create a formula from its body, e.g. `Formula::new("SUM(A1:A3)")`.
    #[must_use]
    pub fn new<S: Into<String>>(body: S) -> Self {
        Formula { body: body.into() }
    }

    /// The formula body exactly as given.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The body with at most one stray leading `=` removed.
    #[must_use]
    pub fn without_marker(&self) -> &str {
        self.body.strip_prefix('=').unwrap_or(&self.body)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

/// Represents the value held by a single spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Formula(Formula),
}

impl CellValue {
    /// Create a formula cell value.
    #[must_use]
    pub fn formula<S: Into<String>>(body: S) -> Self {
        CellValue::Formula(Formula::new(body))
    }

    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Try to get the value as an integer
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) => Some(*f as i64),
            CellValue::String(s) => s.trim().parse().ok(),
            CellValue::Null | CellValue::Formula(_) => None,
        }
    }

    /// Try to get the value as a float
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            CellValue::Null | CellValue::Formula(_) => None,
        }
    }

    /// Get the textual form of the value. Null is the empty string and a
    /// formula is its bare body.
    #[must_use]
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Borrow the formula, if this is a formula cell.
    #[must_use]
    pub fn as_formula(&self) -> Option<&Formula> {
        match self {
            CellValue::Formula(formula) => Some(formula),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) => write!(f, "{fl}"),
            CellValue::String(s) => f.write_str(s),
            CellValue::Formula(formula) => write!(f, "{formula}"),
        }
    }
}

/// Pop null cells off the end of a row. A row made only of nulls ends up empty.
pub fn trim_trailing_nulls(row: &mut Row) {
    while row.last().is_some_and(CellValue::is_null) {
        row.pop();
    }
}

/// Fail with `CellOutOfRange` naming the first cell past a container's limits.
pub(crate) fn check_extent(
    grid: &[Row],
    max_rows: usize,
    max_cols: usize,
    format: Format,
) -> Result<()> {
    if grid.len() > max_rows {
        return Err(SheetError::CellOutOfRange {
            row: max_rows,
            col: 0,
            format,
        });
    }
    if let Some(row) = grid.iter().position(|cells| cells.len() > max_cols) {
        return Err(SheetError::CellOutOfRange {
            row,
            col: max_cols,
            format,
        });
    }
    Ok(())
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Int(i64::from(b))
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<f32> for CellValue {
    fn from(f: f32) -> Self {
        CellValue::Float(f64::from(f))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<Formula> for CellValue {
    fn from(formula: Formula) -> Self {
        CellValue::Formula(formula)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::approx_constant)]
    use super::*;

    #[test]
    fn test_check_extent() {
        let grid = vec![vec![CellValue::Null; 3], vec![CellValue::Int(1); 5]];
        assert!(check_extent(&grid, 2, 5, Format::Xls).is_ok());
        assert!(matches!(
            check_extent(&grid, 1, 5, Format::Xls),
            Err(SheetError::CellOutOfRange { row: 1, col: 0, .. })
        ));
        assert!(matches!(
            check_extent(&grid, 2, 4, Format::Xlsx),
            Err(SheetError::CellOutOfRange { row: 1, col: 4, format: Format::Xlsx })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Int(42).to_string(), "42");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::from("hi").to_string(), "hi");
        assert_eq!(CellValue::formula("A1+A2").to_string(), "A1+A2");
    }

    #[test]
    fn test_formula_marker() {
        assert_eq!(Formula::new("=SUM(A1:A3)").without_marker(), "SUM(A1:A3)");
        assert_eq!(Formula::new("SUM(A1:A3)").without_marker(), "SUM(A1:A3)");
        assert_eq!(Formula::new("==A1").without_marker(), "=A1");
        assert_eq!(Formula::new("=A1").body(), "=A1");
    }

    #[test]
    fn test_trim_trailing_nulls() {
        let mut row: Row = vec!["x".into(), "y".into(), CellValue::Null, CellValue::Null];
        trim_trailing_nulls(&mut row);
        assert_eq!(row, vec![CellValue::from("x"), CellValue::from("y")]);

        let mut middle: Row = vec!["x".into(), CellValue::Null, "z".into()];
        trim_trailing_nulls(&mut middle);
        assert_eq!(middle.len(), 3);
    }

    #[test]
    fn test_trim_all_null_row() {
        let mut row: Row = vec![CellValue::Null, CellValue::Null];
        trim_trailing_nulls(&mut row);
        assert!(row.is_empty());

        let mut empty: Row = Vec::new();
        trim_trailing_nulls(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(CellValue::from(true), CellValue::Int(1));
        assert_eq!(CellValue::from(None::<i64>), CellValue::Null);
        assert_eq!(CellValue::Int(42).as_float(), Some(42.0));
        assert_eq!(CellValue::Float(3.14).as_int(), Some(3));
        assert_eq!(CellValue::from(" 42 ").as_int(), Some(42));
        assert_eq!(CellValue::formula("1").as_int(), None);
    }

    #[test]
    fn test_serde_untagged() {
        let row: Row = vec![
            CellValue::Null,
            CellValue::Int(1),
            CellValue::Float(1.5),
            CellValue::from("a"),
            CellValue::formula("A1*2"),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,1,1.5,"a",{"formula":"A1*2"}]"#);

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
