//! Worksheet type

use crate::cell::{CellAddress, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
#[derive(Debug)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell storage
    cells: CellStorage,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell value by address string (e.g., "E8")
    ///
    /// Missing cells read as [`CellValue::Empty`].
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells.get(row, col).cloned().unwrap_or_default()
    }

    /// Borrow a stored cell value by indices
    pub fn value_ref_at(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(row, col)
    }

    /// Get the formula text of a cell, if it holds one
    pub fn get_formula(&self, address: &str) -> Result<Option<String>> {
        let addr = CellAddress::parse(address)?;
        Ok(self
            .cells
            .get(addr.row, addr.col)
            .and_then(|v| v.formula_text())
            .map(str::to_string))
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.set(row, col, value.into());
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula)
    }

    /// Set a cell formula by row and column indices
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.set(row, col, CellValue::formula(formula));
        Ok(())
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cells.remove(addr.row, addr.col);
        Ok(())
    }

    // === Block Operations ===

    /// Read a rectangular block of values, row by row
    pub fn block_values(&self, range: &CellRange) -> Vec<Vec<CellValue>> {
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.get_value_at(row, col))
                    .collect()
            })
            .collect()
    }

    /// Write a rectangular block of values whose top-left corner is `origin`
    ///
    /// The block's extent is checked against the worksheet limits before any cell is
    /// touched, so an oversized block leaves the sheet unchanged. Returns the range written.
    pub fn set_block_values(
        &mut self,
        origin: CellAddress,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<CellRange> {
        let height = u32::try_from(rows.len())
            .map_err(|_| Error::InvalidRange(format!("block at {} is too tall", origin)))?;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let width = u16::try_from(width)
            .map_err(|_| Error::InvalidRange(format!("block at {} is too wide", origin)))?;

        if height == 0 || width == 0 {
            return Err(Error::InvalidRange(format!("empty block at {}", origin)));
        }

        let end_row = origin.row.saturating_add(height - 1);
        let end_col = origin.col.saturating_add(width - 1);
        self.validate_cell_position(end_row, end_col)?;

        for (r, row_values) in rows.into_iter().enumerate() {
            for (c, value) in row_values.into_iter().enumerate() {
                self.cells
                    .set(origin.row + r as u32, origin.col + c as u16, value);
            }
        }

        Ok(CellRange::from_indices(origin.row, origin.col, end_row, end_col))
    }

    /// Write values down a single column starting at `start`, one per row
    pub fn set_column_values<I, V>(&mut self, start: CellAddress, values: I) -> Result<CellRange>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let rows = values.into_iter().map(|v| vec![v.into()]).collect();
        self.set_block_values(start, rows)
    }

    /// Write formulas down a single column starting at `start`, one per row
    pub fn set_column_formulas<I, S>(&mut self, start: CellAddress, formulas: I) -> Result<CellRange>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = formulas
            .into_iter()
            .map(|f| vec![CellValue::formula(f)])
            .collect();
        self.set_block_values(start, rows)
    }

    /// Get the used range (bounds of all non-empty cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    /// Get the bounding box of non-empty cells inside `window`
    pub fn used_range_within(&self, window: &CellRange) -> Option<CellRange> {
        self.cells
            .used_bounds_within(
                window.start.row,
                window.start.col,
                window.end.row,
                window.end.col,
            )
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    // === Internal ===

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check if the worksheet has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all non-empty cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellValue)> {
        self.cells.iter()
    }

    /// Iterate over formula cells: (row, col, formula text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> {
        self.cells
            .iter()
            .filter_map(|(row, col, value)| value.formula_text().map(|f| (row, col, f)))
    }
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}
