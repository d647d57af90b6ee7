//! Legacy binary workbook adapter (`xls`).
//!
//! Reading goes through calamine. Writing produces a single-sheet BIFF8
//! workbook stream inside an OLE compound file:
//!
//! ```text
//! globals: BOF CODEPAGE WINDOW1 FONT XF*17 BOUNDSHEET SST [CONTINUE...] EOF
//! sheet:   BOF DIMENSIONS ROW* cells* WINDOW2 EOF
//! ```

mod formula;
mod records;

use crate::cell::{check_extent, Grid, Row};
use crate::coerce::{biff_cell_for, grid_from_range, BiffCell};
use crate::error::{Result, SheetError};
use crate::format::Format;
use crate::source::{Input, SeekableInput};
use calamine::{Reader, Xls};
use records::*;
use tracing::{debug, warn};

/// Row limit of a BIFF8 worksheet
pub const MAX_ROWS: usize = 65_536;
/// Column limit of a BIFF8 worksheet
pub const MAX_COLS: usize = 256;
/// Longest sheet name the container accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Options for reading legacy workbooks
#[derive(Debug, Clone)]
pub struct XlsReadOptions {
    /// Return integral numbers as `Int` instead of `Float`
    pub whole_numbers_as_int: bool,
}

impl Default for XlsReadOptions {
    fn default() -> Self {
        XlsReadOptions {
            whole_numbers_as_int: true,
        }
    }
}

impl XlsReadOptions {
    #[must_use]
    pub fn with_whole_numbers_as_int(mut self, whole_numbers_as_int: bool) -> Self {
        self.whole_numbers_as_int = whole_numbers_as_int;
        self
    }
}

/// Options for writing legacy workbooks
#[derive(Debug, Clone)]
pub struct XlsWriteOptions {
    pub sheet_name: String,
}

impl Default for XlsWriteOptions {
    fn default() -> Self {
        XlsWriteOptions {
            sheet_name: "Sheet 1".to_string(),
        }
    }
}

impl XlsWriteOptions {
    #[must_use]
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }
}

/// Read the first worksheet of a legacy workbook. Formula cells yield their
/// cached results.
pub fn read(input: Input<'_>, options: &XlsReadOptions) -> Result<Grid> {
    let mut workbook = Xls::new(SeekableInput::open(input)?).map_err(calamine::Error::from)?;

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

/// Write a grid as a single-sheet BIFF8 workbook
pub fn write(grid: &[Row], options: &XlsWriteOptions) -> Result<Vec<u8>> {
    validate_sheet_name(&options.sheet_name)?;
    check_extent(grid, MAX_ROWS, MAX_COLS, Format::Xls)?;

    let mut strings = SharedStrings::default();
    let sheet = sheet_stream(grid, &mut strings)?;

    let mut workbook = Vec::new();
    push_record(&mut workbook, RECORD_BOF, &bof(BOF_DT_WORKBOOK_GLOBALS));
    push_record(&mut workbook, RECORD_CODEPAGE, &CODEPAGE_UTF16.to_le_bytes());
    push_record(&mut workbook, RECORD_WINDOW1, &window1());
    push_record(&mut workbook, RECORD_FONT, &font("Arial"));
    for _ in 0..XF_CELL {
        push_record(&mut workbook, RECORD_XF, &xf_record(0, 0, true));
    }
    push_record(&mut workbook, RECORD_XF, &xf_record(0, 0, false));

    // record header is 4 bytes, the offset field leads the payload
    let sheet_offset_pos = workbook.len() + 4;
    push_record(&mut workbook, RECORD_BOUNDSHEET, &boundsheet(&options.sheet_name));
    strings.write(&mut workbook);
    push_record(&mut workbook, RECORD_EOF, &[]);

    let sheet_offset = workbook.len() as u32;
    workbook[sheet_offset_pos..sheet_offset_pos + 4].copy_from_slice(&sheet_offset.to_le_bytes());
    workbook.extend_from_slice(&sheet);

    debug!(
        bytes = workbook.len(),
        shared_strings = strings.len(),
        "encoded BIFF8 workbook stream"
    );
    compound_file(&workbook)
}

/// Sheet names must be 1 to 31 characters without `[ ] : * ? / \`.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(SheetError::InvalidSheetName(format!(
            "'{name}' must be 1 to {MAX_SHEET_NAME_LEN} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_NAME_CHARS.contains(c)) {
        return Err(SheetError::InvalidSheetName(format!(
            "'{name}' contains '{c}'"
        )));
    }
    Ok(())
}

fn sheet_stream(grid: &[Row], strings: &mut SharedStrings) -> Result<Vec<u8>> {
    let cols = grid.iter().map(Vec::len).max().unwrap_or(0);

    let mut sheet = Vec::new();
    push_record(&mut sheet, RECORD_BOF, &bof(BOF_DT_WORKSHEET));
    push_record(&mut sheet, RECORD_DIMENSIONS, &dimensions(grid.len(), cols));

    // Extent checked by the caller, so indices fit in u16
    for (r, row) in grid.iter().enumerate() {
        if !row.is_empty() {
            push_record(&mut sheet, RECORD_ROW, &row_record(r as u16, row.len() as u16));
        }
    }

    for (r, row) in grid.iter().enumerate() {
        let r = r as u16;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match biff_cell_for(cell) {
                BiffCell::Blank => push_record(&mut sheet, RECORD_BLANK, &blank_cell(r, c)),
                BiffCell::Number(n) => push_record(&mut sheet, RECORD_NUMBER, &number_cell(r, c, n)),
                BiffCell::Text(s) => {
                    let index = strings.intern(s)?;
                    push_record(&mut sheet, RECORD_LABELSST, &label_sst_cell(r, c, index));
                }
                BiffCell::Formula(body) => {
                    let rgce = formula::compile(body)?;
                    push_record(&mut sheet, RECORD_FORMULA, &formula_cell(r, c, &rgce));
                }
            }
        }
    }

    push_record(&mut sheet, RECORD_WINDOW2, &window2());
    push_record(&mut sheet, RECORD_EOF, &[]);
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn roundtrip(grid: &[Row]) -> Grid {
        let bytes = write(grid, &XlsWriteOptions::default()).unwrap();
        read(Input::Bytes(&bytes), &XlsReadOptions::default()).unwrap()
    }

    #[test]
    fn test_roundtrip_values() {
        let grid = vec![
            vec![CellValue::from("name"), CellValue::from("score")],
            vec![CellValue::from("Ann"), CellValue::Int(90)],
            vec![CellValue::from("Bo"), CellValue::Float(72.5), CellValue::from("late")],
            vec![],
            vec![CellValue::Null, CellValue::from("naïve 日本")],
        ];
        assert_eq!(roundtrip(&grid), grid);
    }

    #[test]
    fn test_numeric_text_stays_text() {
        let grid = vec![vec![CellValue::from("12"), CellValue::Int(12)]];
        assert_eq!(roundtrip(&grid), grid);
    }

    #[test]
    fn test_formula_cells_read_back_cached_result() {
        let grid = vec![
            vec![CellValue::Int(1), CellValue::Int(2)],
            vec![CellValue::formula("=SUM(A1:B1)"), CellValue::formula("A1*2")],
        ];
        let restored = roundtrip(&grid);
        assert_eq!(restored[0], grid[0]);
        assert_eq!(restored[1].len(), 2);
        assert!(restored[1].iter().all(|cell| !cell.is_null()));
    }

    #[test]
    fn test_floats_stay_floats_when_asked() {
        let bytes = write(&[vec![CellValue::Int(3)]], &XlsWriteOptions::default()).unwrap();
        let options = XlsReadOptions::default().with_whole_numbers_as_int(false);
        let grid = read(Input::Bytes(&bytes), &options).unwrap();
        assert_eq!(grid, vec![vec![CellValue::Float(3.0)]]);
    }

    #[test]
    fn test_many_strings_spill_into_continue_records() {
        let grid: Grid = (0..2000)
            .map(|i| vec![CellValue::String(format!("row number {i}"))])
            .collect();
        assert_eq!(roundtrip(&grid), grid);
    }

    #[test]
    fn test_roundtrip_across_stream_sizes() {
        for rows in [10, 50, 100, 300, 1000, 5000] {
            let grid: Grid = (0..rows)
                .map(|i| vec![CellValue::Int(i as i64), CellValue::Float(i as f64 + 0.5)])
                .collect();
            assert_eq!(roundtrip(&grid), grid, "{rows} rows");
        }
    }

    #[test]
    fn test_empty_grid() {
        assert!(roundtrip(&[]).is_empty());
    }

    #[test]
    fn test_custom_sheet_name() {
        let options = XlsWriteOptions::default().with_sheet_name("Données");
        let bytes = write(&[vec![CellValue::Int(1)]], &options).unwrap();
        let workbook = Xls::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Données".to_string()]);
    }

    #[test]
    fn test_invalid_sheet_names() {
        let too_long = "n".repeat(32);
        for name in ["", "a/b", "what?", "[x]", too_long.as_str()] {
            let options = XlsWriteOptions::default().with_sheet_name(name);
            let err = write(&[], &options).unwrap_err();
            assert!(
                matches!(err, SheetError::InvalidSheetName(_)),
                "{name:?} should be rejected"
            );
        }
        assert!(validate_sheet_name(&"n".repeat(31)).is_ok());
    }

    #[test]
    fn test_out_of_range() {
        let wide = vec![vec![CellValue::Int(1); MAX_COLS + 1]];
        assert!(matches!(
            write(&wide, &XlsWriteOptions::default()),
            Err(SheetError::CellOutOfRange { row: 0, col: 256, format: Format::Xls })
        ));

        let tall = vec![vec![]; MAX_ROWS + 1];
        assert!(matches!(
            write(&tall, &XlsWriteOptions::default()),
            Err(SheetError::CellOutOfRange { row: 65_536, col: 0, .. })
        ));
    }

    #[test]
    fn test_unencodable_formula() {
        let grid = vec![vec![CellValue::formula("Other!A1")]];
        let err = write(&grid, &XlsWriteOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::InvalidFormula { .. }));
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let err = read(Input::Bytes(&[0u8; 64]), &XlsReadOptions::default()).unwrap_err();
        assert!(err.is_codec_failure());
    }
}
