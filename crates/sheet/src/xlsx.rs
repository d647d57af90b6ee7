//! Zip-based workbook adapter (`xlsx`, `xlsm`).

use crate::cell::{check_extent, Grid, Row};
use crate::coerce::{grid_from_range, xlsx_value_for, XlsxValue};
use crate::error::Result;
use crate::format::Format;
use crate::source::{Input, SeekableInput};
use calamine::{Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::{debug, warn};

/// Row limit of an Office Open XML worksheet
pub const MAX_ROWS: usize = 1_048_576;
/// Column limit of an Office Open XML worksheet
pub const MAX_COLS: usize = 16_384;

/// Options for reading Excel workbooks
#[derive(Debug, Clone)]
pub struct XlsxReadOptions {
    /// Return integral numbers as `Int` instead of `Float`
    pub whole_numbers_as_int: bool,
}

impl Default for XlsxReadOptions {
    fn default() -> Self {
        XlsxReadOptions {
            whole_numbers_as_int: true,
        }
    }
}

impl XlsxReadOptions {
    #[must_use]
    pub fn with_whole_numbers_as_int(mut self, whole_numbers_as_int: bool) -> Self {
        self.whole_numbers_as_int = whole_numbers_as_int;
        self
    }
}

/// Options for writing Excel workbooks
#[derive(Debug, Clone)]
pub struct XlsxWriteOptions {
    /// Title of the single worksheet
    pub sheet_name: String,
    /// Classify cell text so `=...` becomes a formula and numeric text a number
    pub infer_types: bool,
}

impl Default for XlsxWriteOptions {
    fn default() -> Self {
        XlsxWriteOptions {
            sheet_name: "Sheet 1".to_string(),
            infer_types: true,
        }
    }
}

impl XlsxWriteOptions {
    #[must_use]
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }

    /// Set whether to infer types from cell text
    #[must_use]
    pub fn with_type_inference(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }
}

/// Read the first worksheet of an Excel workbook
pub fn read(input: Input<'_>, options: &XlsxReadOptions) -> Result<Grid> {
    let mut workbook = Xlsx::new(SeekableInput::open(input)?).map_err(calamine::Error::from)?;

    let sheet_names = workbook.sheet_names();
    let Some(first) = sheet_names.first() else {
        warn!("workbook has no worksheets");
        return Ok(Grid::new());
    };

    let range = workbook
        .worksheet_range(first)
        .map_err(calamine::Error::from)?;
    debug!(sheet = %first, extent = ?range.end(), "reading worksheet");

    Ok(grid_from_range(&range, options.whole_numbers_as_int))
}

/// Write a grid as a single-sheet Excel workbook
pub fn write(grid: &[Row], options: &XlsxWriteOptions) -> Result<Vec<u8>> {
    check_extent(grid, MAX_ROWS, MAX_COLS, Format::Xlsx)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&options.sheet_name)?;

    for (row_idx, row) in grid.iter().enumerate() {
        // Bounds checked above
        let row_num = row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match xlsx_value_for(cell, options.infer_types) {
                XlsxValue::Skip => {}
                XlsxValue::Formula(formula) => {
                    worksheet.write_formula(row_num, col_num, formula.as_str())?;
                }
                XlsxValue::Number(number) => {
                    worksheet.write_number(row_num, col_num, number)?;
                }
                XlsxValue::Text(text) => {
                    worksheet.write_string(row_num, col_num, text)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::error::SheetError;

    fn roundtrip(grid: &[Row], options: &XlsxWriteOptions) -> Grid {
        let bytes = write(grid, options).unwrap();
        read(Input::Bytes(&bytes), &XlsxReadOptions::default()).unwrap()
    }

    #[test]
    fn test_roundtrip_values() {
        let grid = vec![
            vec![CellValue::from("name"), CellValue::from("age")],
            vec![CellValue::from("Alice"), CellValue::Int(30)],
            vec![CellValue::from("Bob"), CellValue::Null, CellValue::Float(1.5)],
        ];
        assert_eq!(roundtrip(&grid, &XlsxWriteOptions::default()), grid);
    }

    #[test]
    fn test_numeric_text_is_inferred() {
        let grid = vec![vec![CellValue::from("42"), CellValue::from("0042")]];
        assert_eq!(
            roundtrip(&grid, &XlsxWriteOptions::default()),
            vec![vec![CellValue::Int(42), CellValue::from("0042")]]
        );
    }

    #[test]
    fn test_overflowing_number_text_is_kept() {
        let grid = vec![vec![CellValue::from("1e400"), CellValue::from("1e3")]];
        assert_eq!(
            roundtrip(&grid, &XlsxWriteOptions::default()),
            vec![vec![CellValue::from("1e400"), CellValue::Int(1000)]]
        );
    }

    #[test]
    fn test_no_inference_keeps_text() {
        let grid = vec![vec![CellValue::Int(42), CellValue::from("=1+1")]];
        let options = XlsxWriteOptions::default().with_type_inference(false);
        assert_eq!(
            roundtrip(&grid, &options),
            vec![vec![CellValue::from("42"), CellValue::from("=1+1")]]
        );
    }

    #[test]
    fn test_formula_read_back_is_not_null() {
        let grid = vec![
            vec![CellValue::Int(1), CellValue::Int(2)],
            vec![CellValue::formula("A1+A2"), CellValue::from("=A1+B1")],
        ];
        let restored = roundtrip(&grid, &XlsxWriteOptions::default());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[1].len(), 2);
        assert!(restored[1].iter().all(|cell| !cell.is_null()));
        // bare body is plain text; only a leading '=' makes a live formula
        assert_eq!(restored[1][0], CellValue::from("A1+A2"));
    }

    #[test]
    fn test_floats_stay_floats_when_asked() {
        let bytes = write(&[vec![CellValue::Int(7)]], &XlsxWriteOptions::default()).unwrap();
        let options = XlsxReadOptions::default().with_whole_numbers_as_int(false);
        let grid = read(Input::Bytes(&bytes), &options).unwrap();
        assert_eq!(grid, vec![vec![CellValue::Float(7.0)]]);
    }

    #[test]
    fn test_leading_empty_cells_become_nulls() {
        let grid = vec![vec![], vec![CellValue::Null, CellValue::from("x")]];
        assert_eq!(roundtrip(&grid, &XlsxWriteOptions::default()), grid);
    }

    #[test]
    fn test_bad_sheet_name() {
        let options = XlsxWriteOptions::default().with_sheet_name("a[b]");
        let err = write(&[vec![CellValue::Int(1)]], &options).unwrap_err();
        assert!(matches!(err, SheetError::XlsxWriter(_)));
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let err = read(Input::Bytes(b"not a zip"), &XlsxReadOptions::default()).unwrap_err();
        assert!(err.is_codec_failure());
    }

    #[test]
    fn test_too_many_columns() {
        let grid = vec![vec![CellValue::Int(1); MAX_COLS + 1]];
        let err = write(&grid, &XlsxWriteOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SheetError::CellOutOfRange { row: 0, col, format: Format::Xlsx } if col == MAX_COLS
        ));
    }
}
