//! Cell address and range types

use crate::column_label;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "C14", "$J$8")
///
/// Column letters run A-XFD and row numbers 1-1048576. The optional `$` prefix marks a
/// reference as absolute so it survives being copied down a column of formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Create an absolute cell address ($A$1 style)
    pub fn absolute(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: true,
            col_absolute: true,
        }
    }

    /// Build an address from column letters and a 1-based row number
    ///
    /// # Examples
    /// ```
    /// use earthwork_core::CellAddress;
    ///
    /// let addr = CellAddress::from_column_and_row("C", 14).unwrap();
    /// assert_eq!(addr.to_string(), "C14");
    /// ```
    pub fn from_column_and_row(letters: &str, row_number: u32) -> Result<Self> {
        let col = Self::letters_to_column(letters)?;
        if row_number == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 for column '{}'",
                letters
            )));
        }
        let row = row_number - 1;
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        Ok(Self::new(row, col))
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use earthwork_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("C14").unwrap();
    /// assert_eq!(addr.row, 13);
    /// assert_eq!(addr.col, 2);
    ///
    /// let addr = CellAddress::parse("$J$8").unwrap();
    /// assert!(addr.row_absolute);
    /// assert!(addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        // Addresses copied out of a host application may carry a sheet prefix.
        let s = match s.rfind('!') {
            Some(pos) => &s[pos + 1..],
            None => s,
        };

        let bytes = s.as_bytes();
        let mut pos = 0;

        let col_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&s[col_start..pos])?;

        let row_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        let row = row - 1;

        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }

        Ok(Self {
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        column_label::encode(u64::from(col))
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        let col = column_label::label_to_index(letters)?;
        if col >= u64::from(MAX_COLS) {
            return Err(Error::InvalidAddress(format!(
                "column '{}' is beyond the last worksheet column",
                letters
            )));
        }
        Ok(col as u16)
    }

    /// 1-based row number as shown in the host application
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }

    /// Column letters of this address, without any `$` marker
    pub fn column_letters(&self) -> String {
        Self::column_to_letters(self.col)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&Self::column_to_letters(self.col));

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&self.row_number().to_string());

        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A range of cells (e.g., "D14:G14")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalized so `start` is top-left
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self {
            start: CellAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// A single-column window of `rows` rows starting at `start`.
    ///
    /// The window is clipped at the last worksheet row; `rows` of zero is treated as one.
    pub fn column_window(start: CellAddress, rows: u32) -> Self {
        let last = start
            .row
            .saturating_add(rows.max(1) - 1)
            .min(MAX_ROWS - 1);
        Self::from_indices(start.row, start.col, last, start.col)
    }

    /// Parse a range from C14:C20 notation
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(colon_pos) = s.find(':') {
            let start = CellAddress::parse(&s[..colon_pos])?;
            let end = CellAddress::parse(&s[colon_pos + 1..])?;
            Ok(Self::new(start, end))
        } else {
            let addr = CellAddress::parse(s)?;
            Ok(Self::single(addr))
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            remaining: self.cell_count() as usize,
        }
    }

    /// Format as C14:C20 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u16,
    remaining: usize,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let addr = CellAddress::new(self.current_row, self.current_col);
        self.remaining -= 1;

        if self.current_col == self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        } else {
            self.current_col += 1;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("C").unwrap(), 2);
        assert_eq!(CellAddress::letters_to_column("aa").unwrap(), 26);
        assert!(CellAddress::letters_to_column("XFE").is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = CellAddress::parse("C14").unwrap();
        assert_eq!(addr.row, 13);
        assert_eq!(addr.col, 2);
        assert!(!addr.row_absolute);
        assert!(!addr.col_absolute);

        let addr = CellAddress::parse("$J$9").unwrap();
        assert_eq!(addr.row, 8);
        assert_eq!(addr.col, 9);
        assert!(addr.row_absolute);
        assert!(addr.col_absolute);

        let addr = CellAddress::parse("Sheet1!E8").unwrap();
        assert_eq!(addr, CellAddress::new(7, 4));

        let addr = CellAddress::parse("XFD1048576").unwrap();
        assert_eq!(addr.row, 1048575);
        assert_eq!(addr.col, 16383);
    }

    #[test]
    fn test_cell_address_parse_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("C").is_err());
        assert!(CellAddress::parse("14").is_err());
        assert!(CellAddress::parse("C0").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
        assert!(CellAddress::parse("XFE1").is_err());
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(CellAddress::new(13, 2).to_string(), "C14");
        assert_eq!(CellAddress::absolute(7, 9).to_string(), "$J$8");
    }

    #[test]
    fn test_from_column_and_row() {
        let addr = CellAddress::from_column_and_row("M", 20).unwrap();
        assert_eq!(addr.to_string(), "M20");
        assert!(CellAddress::from_column_and_row("M", 0).is_err());
        assert!(CellAddress::from_column_and_row("1", 3).is_err());
    }

    #[test]
    fn test_column_window() {
        let start = CellAddress::parse("C14").unwrap();
        let window = CellRange::column_window(start, 1000);
        assert_eq!(window.to_string(), "C14:C1013");
        assert_eq!(window.row_count(), 1000);

        let near_end = CellAddress::new(MAX_ROWS - 2, 0);
        assert_eq!(CellRange::column_window(near_end, 10).row_count(), 2);
    }

    #[test]
    fn test_cell_range_parse() {
        let range = CellRange::parse("D14:G14").unwrap();
        assert_eq!(range.start, CellAddress::new(13, 3));
        assert_eq!(range.end, CellAddress::new(13, 6));
        assert_eq!(range.col_count(), 4);

        let range = CellRange::parse("C3").unwrap();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_cell_range_iterator() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<_> = range.cells().collect();

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], CellAddress::new(0, 0));
        assert_eq!(cells[1], CellAddress::new(0, 1));
        assert_eq!(cells[2], CellAddress::new(1, 0));
        assert_eq!(cells[3], CellAddress::new(1, 1));
    }
}
