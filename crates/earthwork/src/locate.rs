//! Row-range locator
//!
//! Finds how far a column of data runs below a start cell. Gaps inside the column do not end
//! the scan: only the last populated cell inside the search window matters.

use std::ops::RangeInclusive;

use earthwork_core::{CellAddress, CellRange, Worksheet};

use crate::error::{GridError, GridResult};
use crate::layout::DEFAULT_SEARCH_LIMIT;

/// Inclusive span of 1-based worksheet rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// First row (the start cell's row)
    pub start_row: u32,
    /// Last row holding data
    pub end_row: u32,
    /// Rows from `start_row` to `end_row`, gaps included
    pub row_count: u32,
}

impl RowRange {
    /// Iterate the row numbers of the span
    pub fn rows(&self) -> RangeInclusive<u32> {
        self.start_row..=self.end_row
    }
}

/// Options for [`locate_row_range`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateOptions {
    /// Number of rows scanned, starting at (and including) the start cell
    pub search_limit: u32,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Locate the rows from `start_address` down to the last populated cell of its column.
///
/// The scan covers `search_limit` rows beginning at the start cell; data further down is
/// silently ignored. The row count is that of the used range inside the window, and because
/// the start cell must hold a value the used range always begins at the start row.
///
/// # Errors
/// - [`GridError::EmptyStartCell`] when the start cell is blank
/// - [`GridError::NoDataFound`] when the window holds no value
/// - [`GridError::InvalidArgument`] for a zero `search_limit`
///
/// # Examples
/// ```
/// use earthwork::{locate_row_range, LocateOptions, Worksheet};
///
/// let mut sheet = Worksheet::new("Grid");
/// sheet.set_cell_value("C14", "A1").unwrap();
/// sheet.set_cell_value("C15", "A2").unwrap();
/// sheet.set_cell_value("C17", "A4").unwrap();
///
/// let range = locate_row_range(&sheet, "C14", &LocateOptions::default()).unwrap();
/// assert_eq!((range.start_row, range.end_row, range.row_count), (14, 17, 4));
/// ```
pub fn locate_row_range(
    sheet: &Worksheet,
    start_address: &str,
    options: &LocateOptions,
) -> GridResult<RowRange> {
    if options.search_limit == 0 {
        return Err(GridError::InvalidArgument(
            "search limit must be at least one row".into(),
        ));
    }

    let start = CellAddress::parse(start_address)?;
    let start_label = CellAddress::new(start.row, start.col);

    let start_blank = sheet
        .value_ref_at(start.row, start.col)
        .map_or(true, |v| v.is_blank());
    if start_blank {
        return Err(GridError::EmptyStartCell(start_label.to_string()));
    }

    let row_count = populated_row_count(sheet, start, options.search_limit)?;
    let end = CellAddress::new(start.row + row_count - 1, start.col);

    tracing::info!(
        "Data row count complete: From {} to {}, found {} row(s).",
        start_label,
        end,
        row_count
    );

    Ok(RowRange {
        start_row: start.row_number(),
        end_row: end.row_number(),
        row_count,
    })
}

/// Rows from `start` down to the last populated cell of the `search_limit`-row window.
///
/// Unlike [`locate_row_range`] the start cell itself may be blank; the count still begins
/// at the top of the used range inside the window.
///
/// # Errors
/// [`GridError::NoDataFound`] when the window holds no value.
pub fn populated_row_count(
    sheet: &Worksheet,
    start: CellAddress,
    search_limit: u32,
) -> GridResult<u32> {
    let window = CellRange::column_window(start, search_limit);
    let used = sheet
        .used_range_within(&window)
        .ok_or_else(|| GridError::NoDataFound(window.to_string()))?;

    tracing::debug!("Used range of {} is {}", window, used);
    Ok(used.row_count())
}
