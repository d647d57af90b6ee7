//! Conversion between zero-based (row, column) indices and A1-style coordinates.

use crate::error::{Result, SheetError};
use std::fmt;
use std::str::FromStr;

/// A zero-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    #[must_use]
    pub fn new(row: usize, col: usize) -> Self {
        Coordinate { row, col }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the 1-based row of `usize::MAX` needs a wider integer
        write!(f, "{}{}", column_letters(self.col), self.row as u128 + 1)
    }
}

impl FromStr for Coordinate {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        let (row, col) = coord_to_rowcol(s)?;
        Ok(Coordinate { row, col })
    }
}

/// An A1 reference together with its `$` absolute markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReference {
    pub row: usize,
    pub col: usize,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

/// Transform a 0-based row/column index into a spreadsheet coordinate
/// (0, 0) = "A1", (2, 13) = "N3"
#[must_use]
pub fn rowcol_to_coord(row: usize, col: usize) -> String {
    Coordinate::new(row, col).to_string()
}

/// Transform a spreadsheet coordinate into a 0-based (row, column) pair.
/// Lowercase letters and `$` markers are accepted.
pub fn coord_to_rowcol(coord: &str) -> Result<(usize, usize)> {
    let reference = parse_reference(coord)?;
    Ok((reference.row, reference.col))
}

/// Parse an A1 reference, keeping track of `$` markers (e.g. "$B$3", "c7")
pub fn parse_reference(notation: &str) -> Result<CellReference> {
    let invalid = || SheetError::InvalidCoordinate(notation.to_string());

    let mut rest = notation;
    let col_absolute = rest.starts_with('$');
    if col_absolute {
        rest = &rest[1..];
    }

    let split_pos = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (col_part, mut row_part) = rest.split_at(split_pos);
    if col_part.is_empty() {
        return Err(invalid());
    }

    let row_absolute = row_part.starts_with('$');
    if row_absolute {
        row_part = &row_part[1..];
    }
    if row_part.is_empty() || !row_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let col = column_index(col_part)?;
    let row = row_part.parse::<usize>().map_err(|_| invalid())?;

    // Rows are 1-based in A1 notation
    if row == 0 {
        return Err(invalid());
    }

    Ok(CellReference {
        row: row - 1,
        col,
        row_absolute,
        col_absolute,
    })
}

/// Convert column letters to a 0-based column index
/// A=0, B=1, ... Z=25, AA=26, AB=27, ...
pub fn column_index(letters: &str) -> Result<usize> {
    if letters.is_empty() {
        return Err(SheetError::InvalidCoordinate(letters.to_string()));
    }

    let mut col: usize = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(SheetError::InvalidCoordinate(letters.to_string()));
        }
        let digit = (b.to_ascii_uppercase() - b'A') as usize + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or_else(|| SheetError::InvalidCoordinate(letters.to_string()))?;
    }

    Ok(col - 1)
}

/// Convert a 0-based column index to column letters
/// 0=A, 1=B, ... 25=Z, 26=AA, 27=AB, ...
#[must_use]
pub fn column_letters(col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col;

    loop {
        letters.push((n % 26) as u8 + b'A');
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }

    letters.iter().rev().map(|&b| char::from(b)).collect()
}
