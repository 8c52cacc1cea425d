//! Formula column inserter

use earthwork_core::{CellAddress, CellRange, Worksheet};

use crate::error::{GridError, GridResult};
use crate::locate::RowRange;
use crate::templates::FormulaTemplate;

/// Render `template` for every row in `start_row..=end_row` and write the formulas into
/// `target_column` as one block.
///
/// Rows are 1-based. The inserter does not look at what the template computes.
///
/// # Examples
/// ```
/// use earthwork::{insert_formula_column, Worksheet};
///
/// let mut sheet = Worksheet::new("Grid");
/// let written = insert_formula_column(&mut sheet, &|row: u32| format!("=D{row}*2"), "M", 14, 16)
///     .unwrap();
///
/// assert_eq!(written.to_string(), "M14:M16");
/// assert_eq!(sheet.get_formula("M15").unwrap().as_deref(), Some("=D15*2"));
/// ```
pub fn insert_formula_column<T>(
    sheet: &mut Worksheet,
    template: &T,
    target_column: &str,
    start_row: u32,
    end_row: u32,
) -> GridResult<CellRange>
where
    T: FormulaTemplate + ?Sized,
{
    if start_row > end_row {
        return Err(GridError::InvalidArgument(format!(
            "start row {} is below end row {}",
            start_row, end_row
        )));
    }

    let start = CellAddress::from_column_and_row(target_column, start_row)?;
    let end = CellAddress::from_column_and_row(target_column, end_row)?;

    let formulas: Vec<String> = (start_row..=end_row).map(|row| template.render(row)).collect();
    let written = sheet.set_column_formulas(start, formulas)?;

    tracing::info!("Formulas inserted: From {} to {}", start, end);

    Ok(written)
}

/// [`insert_formula_column`] over a located [`RowRange`]
pub fn insert_formula_column_over<T>(
    sheet: &mut Worksheet,
    template: &T,
    target_column: &str,
    rows: &RowRange,
) -> GridResult<CellRange>
where
    T: FormulaTemplate + ?Sized,
{
    insert_formula_column(sheet, template, target_column, rows.start_row, rows.end_row)
}
