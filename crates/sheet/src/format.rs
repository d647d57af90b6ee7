use crate::error::{Result, SheetError};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A supported file format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Txt,
    Xls,
    Xlsx,
    Xlsm,
    Odf,
    Ods,
}

/// The adapter family a format tag belongs to. Tags in one family share an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    /// Comma/tab/semicolon separated text
    Delimited,
    /// BIFF8 workbook in an OLE compound file
    LegacyBinary,
    /// Office Open XML zip package
    OfficeOpenXml,
    /// OpenDocument spreadsheet zip package
    OpenDocument,
}

/// Every format tag understood by the dispatcher.
pub const SUPPORTED_FORMATS: [Format; 7] = [
    Format::Csv,
    Format::Txt,
    Format::Xls,
    Format::Xlsx,
    Format::Xlsm,
    Format::Odf,
    Format::Ods,
];

impl Format {
    /// The tag as written in file extensions, e.g. `"xlsx"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Txt => "txt",
            Format::Xls => "xls",
            Format::Xlsx => "xlsx",
            Format::Xlsm => "xlsm",
            Format::Odf => "odf",
            Format::Ods => "ods",
        }
    }

    #[must_use]
    pub fn family(self) -> FormatFamily {
        match self {
            Format::Csv | Format::Txt => FormatFamily::Delimited,
            Format::Xls => FormatFamily::LegacyBinary,
            Format::Xlsx | Format::Xlsm => FormatFamily::OfficeOpenXml,
            Format::Odf | Format::Ods => FormatFamily::OpenDocument,
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .ok_or(SheetError::MissingFormat)?;
        ext.parse()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = SheetError;

    fn from_str(tag: &str) -> Result<Self> {
        let lower = tag.trim_start_matches('.').to_ascii_lowercase();
        SUPPORTED_FORMATS
            .iter()
            .copied()
            .find(|format| format.as_str() == lower)
            .ok_or_else(|| SheetError::UnsupportedFormat(tag.to_string()))
    }
}
