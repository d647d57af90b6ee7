//! BIFF8 record encoding and the OLE compound-file wrapper.

use crate::error::{Result, SheetError};
use indexmap::IndexSet;
use std::io::{Cursor, Write};

pub(crate) const RECORD_FORMULA: u16 = 0x0006;
pub(crate) const RECORD_EOF: u16 = 0x000A;
pub(crate) const RECORD_CONTINUE: u16 = 0x003C;
pub(crate) const RECORD_WINDOW1: u16 = 0x003D;
pub(crate) const RECORD_CODEPAGE: u16 = 0x0042;
pub(crate) const RECORD_FONT: u16 = 0x0031;
pub(crate) const RECORD_BOUNDSHEET: u16 = 0x0085;
pub(crate) const RECORD_XF: u16 = 0x00E0;
pub(crate) const RECORD_SST: u16 = 0x00FC;
pub(crate) const RECORD_LABELSST: u16 = 0x00FD;
pub(crate) const RECORD_DIMENSIONS: u16 = 0x0200;
pub(crate) const RECORD_BLANK: u16 = 0x0201;
pub(crate) const RECORD_NUMBER: u16 = 0x0203;
pub(crate) const RECORD_ROW: u16 = 0x0208;
pub(crate) const RECORD_WINDOW2: u16 = 0x023E;
pub(crate) const RECORD_BOF: u16 = 0x0809;

const BOF_VERSION_BIFF8: u16 = 0x0600;
pub(crate) const BOF_DT_WORKBOOK_GLOBALS: u16 = 0x0005;
pub(crate) const BOF_DT_WORKSHEET: u16 = 0x0010;

/// Strings are stored as UTF-16 (or its 8-bit compressed form)
pub(crate) const CODEPAGE_UTF16: u16 = 1200;

/// Largest payload a single record may carry; longer data continues in CONTINUE records.
pub(crate) const MAX_RECORD_DATA: usize = 8224;

/// Longest text a cell can hold
pub(crate) const MAX_CELL_TEXT: usize = 32_767;

const XF_FLAG_LOCKED: u16 = 0x0001;
const XF_FLAG_STYLE: u16 = 0x0004;
const XF_PARENT_NONE: u16 = 0xFFF0;
const COLOR_AUTOMATIC: u16 = 0x7FFF;

/// Index of the one cell XF, after the 16 style XFs.
pub(crate) const XF_CELL: u16 = 16;
const XF_DEFAULT_ROW: u16 = 0x000F;

const FORMULA_ALWAYS_CALC: u16 = 0x0001;

pub(crate) fn push_record(out: &mut Vec<u8>, id: u16, data: &[u8]) {
    debug_assert!(data.len() <= MAX_RECORD_DATA);
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
}

pub(crate) fn bof(dt: u16) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..2].copy_from_slice(&BOF_VERSION_BIFF8.to_le_bytes());
    out[2..4].copy_from_slice(&dt.to_le_bytes());
    out[4..6].copy_from_slice(&0x0DBBu16.to_le_bytes()); // build
    out[6..8].copy_from_slice(&0x07CCu16.to_le_bytes()); // year
    out
}

pub(crate) fn window1() -> [u8; 18] {
    let mut out = [0u8; 18];
    // one selected tab, default tab bar ratio
    out[14..16].copy_from_slice(&1u16.to_le_bytes());
    out[16..18].copy_from_slice(&600u16.to_le_bytes());
    out
}

pub(crate) fn window2() -> [u8; 18] {
    let mut out = [0u8; 18];
    // gridlines, headers, zeros, default colours, outline symbols, selected
    out[0..2].copy_from_slice(&0x02B6u16.to_le_bytes());
    out
}

/// A 10pt regular font
pub(crate) fn font(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&200u16.to_le_bytes()); // height in twips
    out.extend_from_slice(&0u16.to_le_bytes()); // option flags
    out.extend_from_slice(&COLOR_AUTOMATIC.to_le_bytes());
    out.extend_from_slice(&400u16.to_le_bytes()); // weight
    out.extend_from_slice(&0u16.to_le_bytes()); // escapement
    out.extend_from_slice(&[0, 0, 0, 0]); // underline, family, charset, reserved
    write_short_string(&mut out, name);
    out
}

pub(crate) fn xf_record(font_idx: u16, fmt_idx: u16, is_style_xf: bool) -> [u8; 20] {
    let mut out = [0u8; 20];
    out[0..2].copy_from_slice(&font_idx.to_le_bytes());
    out[2..4].copy_from_slice(&fmt_idx.to_le_bytes());
    let flags = if is_style_xf {
        XF_FLAG_LOCKED | XF_FLAG_STYLE | XF_PARENT_NONE
    } else {
        XF_FLAG_LOCKED
    };
    out[4..6].copy_from_slice(&flags.to_le_bytes());
    // general alignment, bottom
    out[6] = 0x20;
    if !is_style_xf {
        // cell XF applies all of its own attributes
        out[9] = 0xFC;
    }
    out
}

/// BOUNDSHEET payload. The leading stream offset is zero and must be patched
/// once the size of the globals is known.
pub(crate) fn boundsheet(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_le_bytes()); // stream position, patched later
    out.extend_from_slice(&0u16.to_le_bytes()); // visible worksheet
    write_short_string(&mut out, name);
    out
}

pub(crate) fn dimensions(rows: usize, cols: usize) -> [u8; 14] {
    let mut out = [0u8; 14];
    // first row and first column stay 0; last values are exclusive
    out[4..8].copy_from_slice(&(rows as u32).to_le_bytes());
    out[10..12].copy_from_slice(&(cols as u16).to_le_bytes());
    out
}

pub(crate) fn row_record(row: u16, cols: u16) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[4..6].copy_from_slice(&cols.to_le_bytes()); // last column + 1
    out[6..8].copy_from_slice(&0x00FFu16.to_le_bytes()); // default height
    out[12..14].copy_from_slice(&0x0100u16.to_le_bytes());
    out[14..16].copy_from_slice(&XF_DEFAULT_ROW.to_le_bytes());
    out
}

fn cell_header(out: &mut [u8], row: u16, col: u16) {
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&XF_CELL.to_le_bytes());
}

pub(crate) fn blank_cell(row: u16, col: u16) -> [u8; 6] {
    let mut out = [0u8; 6];
    cell_header(&mut out, row, col);
    out
}

pub(crate) fn number_cell(row: u16, col: u16, value: f64) -> [u8; 14] {
    let mut out = [0u8; 14];
    cell_header(&mut out, row, col);
    out[6..14].copy_from_slice(&value.to_le_bytes());
    out
}

pub(crate) fn label_sst_cell(row: u16, col: u16, sst_index: u32) -> [u8; 10] {
    let mut out = [0u8; 10];
    cell_header(&mut out, row, col);
    out[6..10].copy_from_slice(&sst_index.to_le_bytes());
    out
}

/// FORMULA payload with a cached result of 0 and the recalculate-always flag
pub(crate) fn formula_cell(row: u16, col: u16, rgce: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 6];
    cell_header(&mut out, row, col);
    out.extend_from_slice(&0f64.to_le_bytes()); // cached result
    out.extend_from_slice(&FORMULA_ALWAYS_CALC.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // chn
    out.extend_from_slice(&(rgce.len() as u16).to_le_bytes());
    out.extend_from_slice(rgce);
    out
}

/// Characters of a BIFF8 string, 8-bit compressed when every character fits.
struct BiffChars {
    wide: bool,
    cch: usize,
    data: Vec<u8>,
}

impl BiffChars {
    fn new(s: &str) -> Self {
        if s.chars().all(|c| u32::from(c) <= 0xFF) {
            let data: Vec<u8> = s.chars().map(|c| u32::from(c) as u8).collect();
            BiffChars {
                wide: false,
                cch: data.len(),
                data,
            }
        } else {
            let units: Vec<u16> = s.encode_utf16().collect();
            BiffChars {
                wide: true,
                cch: units.len(),
                data: units.iter().flat_map(|u| u.to_le_bytes()).collect(),
            }
        }
    }

    fn flags(&self) -> u8 {
        u8::from(self.wide)
    }

    fn unit_size(&self) -> usize {
        if self.wide {
            2
        } else {
            1
        }
    }
}

/// ShortXLUnicodeString: 8-bit length, flags, characters
fn write_short_string(out: &mut Vec<u8>, s: &str) {
    let chars = BiffChars::new(s);
    out.push(chars.cch as u8);
    out.push(chars.flags());
    out.extend_from_slice(&chars.data);
}

/// The workbook's shared string table.
#[derive(Debug, Default)]
pub(crate) struct SharedStrings {
    strings: IndexSet<String>,
    /// Number of LABELSST cells referring into the table
    references: u32,
}

impl SharedStrings {
    /// Index of `s` in the table, adding it on first use.
    pub(crate) fn intern(&mut self, s: &str) -> Result<u32> {
        let units = s.encode_utf16().count();
        if units > MAX_CELL_TEXT {
            return Err(SheetError::Encoding(format!(
                "text of {units} characters exceeds the {MAX_CELL_TEXT} character cell limit"
            )));
        }

        self.references += 1;
        let index = match self.strings.get_index_of(s) {
            Some(index) => index,
            None => self.strings.insert_full(s.to_string()).0,
        };
        Ok(index as u32)
    }

    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }

    /// Append the SST record, spilling into CONTINUE records as needed. A
    /// string's header is never split from its first character; a string
    /// split across records resumes with a fresh flags byte.
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        let mut records: Vec<Vec<u8>> = Vec::new();
        let mut current = Vec::with_capacity(MAX_RECORD_DATA);
        current.extend_from_slice(&self.references.to_le_bytes());
        current.extend_from_slice(&(self.strings.len() as u32).to_le_bytes());

        for s in &self.strings {
            let chars = BiffChars::new(s);
            let unit = chars.unit_size();
            let first = unit.min(chars.data.len());
            if current.len() + 3 + first > MAX_RECORD_DATA {
                records.push(std::mem::take(&mut current));
            }
            current.extend_from_slice(&(chars.cch as u16).to_le_bytes());
            current.push(chars.flags());

            let mut rest = chars.data.as_slice();
            loop {
                let room = (MAX_RECORD_DATA - current.len()) / unit * unit;
                let (now, later) = rest.split_at(room.min(rest.len()));
                current.extend_from_slice(now);
                rest = later;
                if rest.is_empty() {
                    break;
                }
                records.push(std::mem::take(&mut current));
                current.push(chars.flags());
            }
        }
        records.push(current);

        for (i, data) in records.iter().enumerate() {
            let id = if i == 0 { RECORD_SST } else { RECORD_CONTINUE };
            push_record(out, id, data);
        }
    }
}

/// Wrap a workbook stream in a version 3 (512-byte sector) OLE compound
/// file, the layout spreadsheet readers expect of BIFF8 workbooks.
pub(crate) fn compound_file(workbook: &[u8]) -> Result<Vec<u8>> {
    let mut ole =
        cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))?;
    {
        let mut stream = ole.create_stream("Workbook")?;
        stream.write_all(workbook)?;
        stream.flush()?;
    }
    ole.flush()?;
    Ok(ole.into_inner().into_inner())
}
