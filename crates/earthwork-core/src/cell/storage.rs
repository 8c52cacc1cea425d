//! Cell storage implementation
//!
//! Sparse storage for worksheet cells. Only non-empty cells are stored, in a row-based
//! `BTreeMap` so bounding-box queries over a window can use range scans.

use std::collections::BTreeMap;

use super::CellValue;

/// Sparse row-based storage for worksheet cells
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellValue>>`
#[derive(Debug, Default)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellValue>>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell value
    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Set a cell value
    ///
    /// Setting [`CellValue::Empty`] or an empty string removes the cell, the same way
    /// clearing a cell's text does in a host application.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        let clears = match &value {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        };
        if clears {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, value);
        }
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellValue> {
        let row_map = self.rows.get_mut(&row)?;
        let result = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        result
    }

    /// Clear all cells
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the bounds of used cells
    ///
    /// Returns (min_row, min_col, max_row, max_col) or None if empty
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        self.used_bounds_within(0, 0, u32::MAX, u16::MAX)
    }

    /// Get the bounds of used cells inside an inclusive window
    ///
    /// Returns (min_row, min_col, max_row, max_col) or None if the window holds no cell
    pub fn used_bounds_within(
        &self,
        min_row: u32,
        min_col: u16,
        max_row: u32,
        max_col: u16,
    ) -> Option<(u32, u16, u32, u16)> {
        let mut bounds: Option<(u32, u16, u32, u16)> = None;

        for (&row, cols) in self.rows.range(min_row..=max_row) {
            let mut in_window = cols.range(min_col..=max_col).map(|(&col, _)| col);
            let Some(first) = in_window.next() else {
                continue;
            };
            let last = in_window.next_back().unwrap_or(first);

            bounds = Some(match bounds {
                None => (row, first, row, last),
                Some((r0, c0, _, c1)) => (r0, c0.min(first), row, c1.max(last)),
            });
        }

        bounds
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellValue)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, value)| (row, col, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_remove() {
        let mut storage = CellStorage::new();
        storage.set(0, 0, CellValue::Number(1.0));
        storage.set(0, 1, CellValue::string("x"));
        assert_eq!(storage.cell_count(), 2);

        storage.set(0, 0, CellValue::Empty);
        assert_eq!(storage.cell_count(), 1);
        assert!(storage.get(0, 0).is_none());

        storage.set(0, 1, CellValue::string(""));
        assert!(storage.is_empty());
        storage.set(0, 1, CellValue::string("x"));

        storage.remove(0, 1);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_used_bounds() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.used_bounds(), None);

        storage.set(13, 2, CellValue::string("A1"));
        storage.set(16, 2, CellValue::string("A4"));
        storage.set(20, 5, CellValue::Number(1.0));

        assert_eq!(storage.used_bounds(), Some((13, 2, 20, 5)));
    }

    #[test]
    fn test_used_bounds_within_window() {
        let mut storage = CellStorage::new();
        storage.set(13, 2, CellValue::string("A1"));
        storage.set(14, 2, CellValue::string("A2"));
        storage.set(16, 2, CellValue::string("A4"));
        // Neighbouring columns stay outside a single-column window
        storage.set(30, 3, CellValue::Number(9.0));

        assert_eq!(
            storage.used_bounds_within(13, 2, 1012, 2),
            Some((13, 2, 16, 2))
        );
        assert_eq!(storage.used_bounds_within(17, 2, 100, 2), None);
        assert_eq!(
            storage.used_bounds_within(13, 2, 14, 2),
            Some((13, 2, 14, 2))
        );
    }
}
