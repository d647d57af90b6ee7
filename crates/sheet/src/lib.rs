//! Uniform reading and writing of tabular spreadsheet data.
//!
//! Every supported format is read into and written from the same in-memory
//! [`Grid`]: a list of rows, each a list of [`CellValue`]s. Only the first
//! sheet of a workbook is read or written.
//!
//! | Family | Tags | Read | Write |
//! |---|---|---|---|
//! | Delimited text | `csv`, `txt` | `csv` crate | `csv` crate |
//! | Legacy binary | `xls` | `calamine` | BIFF8 over `cfb` |
//! | Office Open XML | `xlsx`, `xlsm` | `calamine` | `rust_xlsxwriter` |
//! | OpenDocument | `ods`, `odf` | `zip` + `quick-xml` | `zip` |
//!
//! # Examples
//!
//! ## Reading in-memory text
//!
//! ```
//! use tabula_sheet::{CellValue, SheetReader};
//!
//! let grid = SheetReader::new()
//!     .text("name,qty\nbolt,12\n")
//!     .format("csv")
//!     .read()
//!     .unwrap();
//!
//! assert_eq!(grid.len(), 2);
//! assert_eq!(grid[1][1], CellValue::from("12"));
//! ```
//!
//! ## Converting between formats
//!
//! ```
//! use tabula_sheet::{write, CellValue, ReadOptions, SheetReader, WriteOptions};
//!
//! let grid = vec![
//!     vec![CellValue::from("name"), CellValue::from("score")],
//!     vec![CellValue::from("Ann"), CellValue::Int(90)],
//! ];
//!
//! let bytes = write(&grid, "xlsx", &WriteOptions::default()).unwrap();
//! let restored = SheetReader::new()
//!     .bytes(&bytes)
//!     .format("xlsx")
//!     .options(ReadOptions::default())
//!     .read()
//!     .unwrap();
//!
//! assert_eq!(restored, grid);
//! ```
//!
//! ## Files on disk
//!
//! ```no_run
//! use tabula_sheet::{read_path, save, ReadOptions, WriteOptions};
//!
//! let grid = read_path("report.ods", &ReadOptions::default()).unwrap();
//! save(&grid, "report.xls", &WriteOptions::default()).unwrap();
//! ```
//!
//! # Formulas
//!
//! Formulas are opaque. [`Formula`] holds the body without its leading `=`;
//! each writer stores it the way its container expects, and readers return
//! the cached result where the container has one.

mod cell;
mod coerce;
mod coord;
mod csv;
mod dispatch;
mod error;
mod format;
mod ods;
mod source;
mod xls;
mod xlsx;

/// Re-export the grid model.
pub use cell::{trim_trailing_nulls, CellValue, Formula, Grid, Row};
/// Re-export coordinate helpers.
pub use coord::{
    column_index, column_letters, coord_to_rowcol, parse_reference, rowcol_to_coord,
    CellReference, Coordinate,
};
/// Re-export delimited text options.
pub use csv::{
    detect_delimiter, CsvReadOptions, CsvWriteOptions, LineTerminator, QuoteStyle, UTF8_BOM,
};
/// Re-export the dispatcher.
pub use dispatch::{
    read_format, read_path, save, write, write_format, ReadOptions, SheetReader, WriteOptions,
};
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export format tags.
pub use format::{Format, FormatFamily, SUPPORTED_FORMATS};
/// Re-export OpenDocument options.
pub use ods::{OdsReadOptions, OdsWriteOptions};
/// Re-export input sources.
pub use source::Input;
/// Re-export legacy binary workbook options.
pub use xls::{XlsReadOptions, XlsWriteOptions};
/// Re-export XLSX options.
pub use xlsx::{XlsxReadOptions, XlsxWriteOptions};
