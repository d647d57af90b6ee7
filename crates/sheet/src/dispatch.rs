//! Routes reads and writes to the adapter of a format family.

use crate::cell::{Grid, Row};
use crate::csv::{self, CsvReadOptions, CsvWriteOptions};
use crate::error::{Result, SheetError};
use crate::format::{Format, FormatFamily};
use crate::ods::{self, OdsReadOptions, OdsWriteOptions};
use crate::source::Input;
use crate::xls::{self, XlsReadOptions, XlsWriteOptions};
use crate::xlsx::{self, XlsxReadOptions, XlsxWriteOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-adapter read options. Only the one matching the resolved format is used.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub csv: CsvReadOptions,
    pub xls: XlsReadOptions,
    pub xlsx: XlsxReadOptions,
    pub ods: OdsReadOptions,
}

impl ReadOptions {
    #[must_use]
    pub fn with_csv(mut self, csv: CsvReadOptions) -> Self {
        self.csv = csv;
        self
    }

    #[must_use]
    pub fn with_xls(mut self, xls: XlsReadOptions) -> Self {
        self.xls = xls;
        self
    }

    #[must_use]
    pub fn with_xlsx(mut self, xlsx: XlsxReadOptions) -> Self {
        self.xlsx = xlsx;
        self
    }

    #[must_use]
    pub fn with_ods(mut self, ods: OdsReadOptions) -> Self {
        self.ods = ods;
        self
    }
}

/// Per-adapter write options. Only the one matching the resolved format is used.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub csv: CsvWriteOptions,
    pub xls: XlsWriteOptions,
    pub xlsx: XlsxWriteOptions,
    pub ods: OdsWriteOptions,
}

impl WriteOptions {
    #[must_use]
    pub fn with_csv(mut self, csv: CsvWriteOptions) -> Self {
        self.csv = csv;
        self
    }

    #[must_use]
    pub fn with_xls(mut self, xls: XlsWriteOptions) -> Self {
        self.xls = xls;
        self
    }

    #[must_use]
    pub fn with_xlsx(mut self, xlsx: XlsxWriteOptions) -> Self {
        self.xlsx = xlsx;
        self
    }

    #[must_use]
    pub fn with_ods(mut self, ods: OdsWriteOptions) -> Self {
        self.ods = ods;
        self
    }
}

/// Builder for a single read.
///
/// An in-memory or stream source wins over the path; the path then only
/// serves to infer the format.
///
/// # Example
/// ```
/// use tabula_sheet::{CellValue, SheetReader};
///
/// let grid = SheetReader::new()
///     .text("a;b\n1;2\n")
///     .format("csv")
///     .read()
///     .unwrap();
/// assert_eq!(grid[1], vec![CellValue::from("1"), CellValue::from("2")]);
/// ```
#[derive(Debug, Default)]
pub struct SheetReader<'a> {
    path: Option<PathBuf>,
    source: Option<Input<'a>>,
    format: Option<String>,
    options: ReadOptions,
}

impl<'a> SheetReader<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn bytes(mut self, bytes: &'a [u8]) -> Self {
        self.source = Some(Input::Bytes(bytes));
        self
    }

    #[must_use]
    pub fn text(mut self, text: &'a str) -> Self {
        self.source = Some(Input::Text(text));
        self
    }

    #[must_use]
    pub fn stream(mut self, reader: &'a mut dyn Read) -> Self {
        self.source = Some(Input::Stream(reader));
        self
    }

    /// Explicit format tag such as `"csv"` or `"xlsx"`
    #[must_use]
    pub fn format(mut self, tag: &str) -> Self {
        self.format = Some(tag.to_string());
        self
    }

    #[must_use]
    pub fn options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve the source and format, then read the first sheet.
    ///
    /// Fails with `MissingSource`, `MissingFormat` or `UnsupportedFormat`
    /// (in that order) before touching any file or stream.
    pub fn read(self) -> Result<Grid> {
        let SheetReader {
            path,
            source,
            format,
            options,
        } = self;

        if path.is_none() && source.is_none() {
            return Err(SheetError::MissingSource);
        }

        let format = match (format, path.as_deref()) {
            (Some(tag), _) => tag.parse::<Format>()?,
            (None, Some(path)) => Format::from_path(path)?,
            (None, None) => return Err(SheetError::MissingFormat),
        };

        // a path source is borrowed from this frame, so each arm reads directly
        match (source, path.as_deref()) {
            (Some(input), _) => read_format(input, format, &options),
            (None, Some(path)) => read_format(Input::Path(path), format, &options),
            (None, None) => Err(SheetError::MissingSource),
        }
    }
}

/// Read a file, taking the format from its extension.
pub fn read_path<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Grid> {
    SheetReader::new()
        .path(path)
        .options(options.clone())
        .read()
}

/// Read from an already resolved source and format.
pub fn read_format(input: Input<'_>, format: Format, options: &ReadOptions) -> Result<Grid> {
    debug!(%format, family = ?format.family(), source = ?input, "dispatching read");
    match format.family() {
        FormatFamily::Delimited => csv::read(input, &options.csv),
        FormatFamily::LegacyBinary => xls::read(input, &options.xls),
        FormatFamily::OfficeOpenXml => xlsx::read(input, &options.xlsx),
        FormatFamily::OpenDocument => ods::read(input, &options.ods),
    }
}

/// Encode a grid in the format named by `tag`.
pub fn write(grid: &[Row], tag: &str, options: &WriteOptions) -> Result<Vec<u8>> {
    let format = tag.parse::<Format>()?;
    write_format(grid, format, options)
}

pub fn write_format(grid: &[Row], format: Format, options: &WriteOptions) -> Result<Vec<u8>> {
    debug!(%format, rows = grid.len(), "dispatching write");
    match format.family() {
        FormatFamily::Delimited => csv::write(grid, &options.csv),
        FormatFamily::LegacyBinary => xls::write(grid, &options.xls),
        FormatFamily::OfficeOpenXml => xlsx::write(grid, &options.xlsx),
        FormatFamily::OpenDocument => ods::write(grid, &options.ods),
    }
}

/// Write a grid to a file, taking the format from its extension.
pub fn save<P: AsRef<Path>>(grid: &[Row], path: P, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let bytes = write_format(grid, format, options)?;
    std::fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved grid");
    Ok(())
}
