//! Worksheet processing steps
//!
//! Each step reads its positions from a [`SheetLayout`] and fails fast. Nothing is rolled
//! back: columns written before a failing step stay written.

use earthwork_core::{CellRange, Worksheet};

use crate::error::{GridError, GridResult};
use crate::insert::insert_formula_column_over;
use crate::labels::{write_grid_labels, GridLabels};
use crate::layout::SheetLayout;
use crate::locate::{locate_row_range, LocateOptions, RowRange};
use crate::templates::{continuity_columns, earthwork_columns, ColumnTemplate};
use crate::validate::{ensure_valid, validate_positive_integer_cells};

/// Formula columns written by one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedColumns {
    /// Rows the formulas cover
    pub rows: RowRange,
    /// One range per column, in write order
    pub ranges: Vec<CellRange>,
}

/// Summary of [`run_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub labels: GridLabels,
    pub rows: RowRange,
    pub columns_written: Vec<CellRange>,
}

/// Read a resolution cell as a number.
///
/// Range checks are left to the label writer; this only rejects blank and non-numeric cells.
pub fn read_resolution(sheet: &Worksheet, address: &str) -> GridResult<f64> {
    let value = sheet.get_value(address)?;
    if value.is_blank() {
        return Err(GridError::EmptyCell(address.to_string()));
    }
    value.as_number().ok_or_else(|| {
        GridError::InvalidArgument(format!("{} must be a positive integer.", address))
    })
}

/// Validate the resolution cells and write the grid labels below the first data row.
pub fn setup_grid(sheet: &mut Worksheet, layout: &SheetLayout) -> GridResult<GridLabels> {
    let cells = layout.resolution_cells();
    ensure_valid(validate_positive_integer_cells(sheet, &cells)?)?;

    let horizontal = read_resolution(sheet, cells[0])?;
    let vertical = read_resolution(sheet, cells[1])?;
    let start = layout.data_start()?;

    write_grid_labels(sheet, horizontal, vertical, &start.to_string())
}

/// Insert the level averages and cut/fill volumes for every labelled row.
pub fn apply_earthwork_calculation_formulas(
    sheet: &mut Worksheet,
    layout: &SheetLayout,
) -> GridResult<InsertedColumns> {
    let inserted = insert_columns(sheet, layout, earthwork_columns(layout))?;
    tracing::info!("Formula(s) insertion for earthwork calculation completed.");
    Ok(inserted)
}

/// Insert the vertical and horizontal continuity checks for every labelled row.
pub fn apply_continuity_validation_formulas(
    sheet: &mut Worksheet,
    layout: &SheetLayout,
) -> GridResult<InsertedColumns> {
    let inserted = insert_columns(sheet, layout, continuity_columns(layout))?;
    tracing::info!("Formula insertion for topographic continuity validation completed.");
    Ok(inserted)
}

/// Set up the grid, then insert the earthwork and continuity formulas.
///
/// # Examples
/// ```
/// use earthwork::{run_all, SheetLayout, Worksheet};
///
/// let mut sheet = Worksheet::new("Grid");
/// sheet.set_cell_value("E8", 2).unwrap();
/// sheet.set_cell_value("E9", 3).unwrap();
///
/// let report = run_all(&mut sheet, &SheetLayout::default()).unwrap();
/// assert_eq!(report.labels.row_count, 6);
/// assert_eq!((report.rows.start_row, report.rows.end_row), (14, 19));
/// assert_eq!(report.columns_written.len(), 8);
/// ```
pub fn run_all(sheet: &mut Worksheet, layout: &SheetLayout) -> GridResult<RunReport> {
    let labels = setup_grid(sheet, layout)?;
    let earthwork = apply_earthwork_calculation_formulas(sheet, layout)?;
    let continuity = apply_continuity_validation_formulas(sheet, layout)?;

    let mut columns_written = earthwork.ranges;
    columns_written.extend(continuity.ranges);

    Ok(RunReport {
        labels,
        rows: earthwork.rows,
        columns_written,
    })
}

fn insert_columns(
    sheet: &mut Worksheet,
    layout: &SheetLayout,
    columns: Vec<ColumnTemplate<'_>>,
) -> GridResult<InsertedColumns> {
    let start = layout.data_start()?;
    let options = LocateOptions {
        search_limit: layout.search_limit,
    };
    let rows = locate_row_range(sheet, &start.to_string(), &options)?;

    let mut ranges = Vec::with_capacity(columns.len());
    for column in &columns {
        ranges.push(insert_formula_column_over(
            sheet,
            &*column.template,
            column.column,
            &rows,
        )?);
    }

    Ok(InsertedColumns { rows, ranges })
}
