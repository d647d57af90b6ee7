//! Delimited-text adapter (`csv`, `txt`).

use crate::cell::{CellValue, Grid, Row};
use crate::coerce::infer_from_text;
use crate::error::{Result, SheetError};
use crate::source::Input;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

/// Byte-order mark prepended to every file this adapter writes.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Candidate delimiters, in tie-breaking order.
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

/// Options for reading delimited text
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter; autodetected when `None`
    pub delimiter: Option<u8>,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Keep blank lines as empty rows instead of dropping them
    pub keep_blank_lines: bool,
    /// Turn numeric fields into numbers and empty fields into nulls
    pub infer_types: bool,
    /// Encoding label for byte input (default: UTF-8)
    pub encoding: Option<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        CsvReadOptions {
            delimiter: None,
            quote: b'"',
            keep_blank_lines: false,
            infer_types: false,
            encoding: None,
        }
    }
}

impl CsvReadOptions {
    /// Set the delimiter instead of detecting it
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Set whether blank lines become empty rows
    #[must_use]
    pub fn with_blank_lines(mut self, keep_blank_lines: bool) -> Self {
        self.keep_blank_lines = keep_blank_lines;
        self
    }

    /// Set whether to infer types
    #[must_use]
    pub fn with_type_inference(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }

    /// Decode byte input with the named encoding (e.g. "windows-1252")
    #[must_use]
    pub fn with_encoding(mut self, label: &str) -> Self {
        self.encoding = Some(label.to_string());
        self
    }
}

/// Line terminator used when writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    #[default]
    Crlf,
    Lf,
}

impl LineTerminator {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            LineTerminator::Crlf => b"\r\n",
            LineTerminator::Lf => b"\n",
        }
    }
}

impl From<LineTerminator> for csv::Terminator {
    fn from(terminator: LineTerminator) -> Self {
        match terminator {
            LineTerminator::Crlf => csv::Terminator::CRLF,
            LineTerminator::Lf => csv::Terminator::Any(b'\n'),
        }
    }
}

/// When fields are quoted on write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    #[default]
    Necessary,
    Always,
    NonNumeric,
    Never,
}

impl From<QuoteStyle> for csv::QuoteStyle {
    fn from(style: QuoteStyle) -> Self {
        match style {
            QuoteStyle::Necessary => csv::QuoteStyle::Necessary,
            QuoteStyle::Always => csv::QuoteStyle::Always,
            QuoteStyle::NonNumeric => csv::QuoteStyle::NonNumeric,
            QuoteStyle::Never => csv::QuoteStyle::Never,
        }
    }
}

/// Options for writing delimited text
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    pub terminator: LineTerminator,
    pub quote_style: QuoteStyle,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        CsvWriteOptions {
            delimiter: b',',
            quote: b'"',
            terminator: LineTerminator::default(),
            quote_style: QuoteStyle::default(),
        }
    }
}

impl CsvWriteOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvWriteOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    #[must_use]
    pub fn with_quote_style(mut self, quote_style: QuoteStyle) -> Self {
        self.quote_style = quote_style;
        self
    }
}

/// Pick the delimiter with the strictly highest count among comma, tab and
/// semicolon. Ties go to the earlier candidate; no candidates at all means comma.
#[must_use]
pub fn detect_delimiter(text: &str) -> u8 {
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    for b in text.bytes() {
        if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|&d| d == b) {
            counts[i] += 1;
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    CANDIDATE_DELIMITERS[best]
}

/// Read delimited text into a grid
pub fn read(input: Input<'_>, options: &CsvReadOptions) -> Result<Grid> {
    let text = decode(input, options.encoding.as_deref())?;
    let text = normalize_line_endings(&text);

    let delimiter = match options.delimiter {
        Some(delimiter) => delimiter,
        None => {
            let detected = detect_delimiter(&text);
            debug!(delimiter = ?char::from(detected), "detected delimiter");
            detected
        }
    };

    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .quote(options.quote)
        .has_headers(false)
        .flexible(true);

    // the codec skips blank lines itself; they are counted from the text
    // between the end of one record and the content of the next
    let mut reader = builder.from_reader(text.as_bytes());
    let mut record = csv::StringRecord::new();
    let mut grid = Grid::new();
    let mut record_end = 0;

    loop {
        if options.keep_blank_lines {
            let blanks = leading_newlines(&text[record_end..]);
            grid.extend(std::iter::repeat_with(Row::new).take(blanks));
        }
        if !reader.read_record(&mut record)? {
            break;
        }
        record_end = (reader.position().byte() as usize).min(text.len());

        let row: Row = record
            .iter()
            .map(|field| {
                if options.infer_types {
                    infer_from_text(field)
                } else {
                    CellValue::String(field.to_string())
                }
            })
            .collect();
        grid.push(row);
    }

    Ok(grid)
}

/// Write a grid as UTF-8 delimited text with a leading byte-order mark
pub fn write(grid: &[Row], options: &CsvWriteOptions) -> Result<Vec<u8>> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(options.delimiter)
        .quote(options.quote)
        .terminator(options.terminator.into())
        .quote_style(options.quote_style.into())
        .flexible(true);

    let mut buffer = UTF8_BOM.to_vec();
    for row in grid {
        if row.is_empty() {
            buffer.extend_from_slice(options.terminator.as_bytes());
            continue;
        }
        let mut writer = builder.from_writer(&mut buffer);
        writer.write_record(row.iter().map(CellValue::to_string))?;
        writer.flush()?;
    }

    Ok(buffer)
}

/// Decode input to text. Invalid sequences are replaced, never rejected.
fn decode(input: Input<'_>, encoding: Option<&str>) -> Result<String> {
    if let Input::Text(text) = input {
        return Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string());
    }

    let encoding = match encoding {
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| SheetError::Encoding(format!("unknown encoding label '{label}'")))?,
        None => UTF_8,
    };

    let bytes = input.into_bytes()?;
    // decode() sniffs and strips a byte-order mark
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            encoding = used.name(),
            "input contained invalid byte sequences; replaced"
        );
    }
    Ok(text.into_owned())
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn leading_newlines(segment: &str) -> usize {
    segment.bytes().take_while(|&b| b == b'\n').count()
}
