use crate::format::Format;
use thiserror::Error;

/// Errors that can occur while reading or writing a grid
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("No input given: specify a path or an in-memory/stream source")]
    MissingSource,

    #[error("No format given and none can be inferred: specify a format or a path with an extension")]
    MissingFormat,

    #[error("The format '{0}' is not supported. Supported: csv, txt, xls, xlsx, xlsm, odf, ods")]
    UnsupportedFormat(String),

    #[error("Invalid cell coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Cannot encode formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    #[error("Cell ({row}, {col}) is outside the limits of the {format} format")]
    CellOutOfRange {
        row: usize,
        col: usize,
        format: Format,
    },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Malformed OpenDocument spreadsheet: {0}")]
    Ods(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Calamine(#[from] calamine::Error),

    #[error("XLSX write error: {0}")]
    XlsxWriter(#[from] rust_xlsxwriter::XlsxError),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Whether the error came from an underlying format codec rejecting its input.
    #[must_use]
    pub fn is_codec_failure(&self) -> bool {
        matches!(
            self,
            SheetError::Csv(_)
                | SheetError::Calamine(_)
                | SheetError::XlsxWriter(_)
                | SheetError::Zip(_)
                | SheetError::Xml(_)
                | SheetError::Ods(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
