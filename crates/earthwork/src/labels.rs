//! Grid label writer

use earthwork_core::{index_to_label, CellAddress, CellValue, Worksheet, MAX_ROWS};

use crate::error::{GridError, GridResult};

/// Labels generated for a survey grid, in column-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLabels {
    /// `<column letters><row number>` labels: `A1, A2, ..., B1, ...`
    pub labels: Vec<String>,
    /// Column letters of each label, index-aligned with `labels`
    pub column_letters: Vec<String>,
    /// Number of grid cells (horizontal × vertical resolution)
    pub row_count: usize,
}

/// Check that a resolution is a positive integer and narrow it to `u32`.
///
/// Worksheet numbers arrive as `f64`, so fractional and non-finite values are rejected here
/// rather than truncated.
pub fn resolution_from_number(value: f64, axis: &str) -> GridResult<u32> {
    let valid = value.is_finite() && value.fract() == 0.0 && value > 0.0;
    if !valid || value > f64::from(u32::MAX) {
        return Err(GridError::InvalidArgument(format!(
            "{} resolution must be a positive integer.",
            axis
        )));
    }
    Ok(value as u32)
}

/// Generate the column-major labels of a `horizontal × vertical` grid.
///
/// # Examples
/// ```
/// use earthwork::grid_labels;
///
/// let grid = grid_labels(2, 3).unwrap();
/// assert_eq!(grid.labels, ["A1", "A2", "A3", "B1", "B2", "B3"]);
/// assert_eq!(grid.column_letters, ["A", "A", "A", "B", "B", "B"]);
/// assert_eq!(grid.row_count, 6);
/// ```
pub fn grid_labels(horizontal_res: u32, vertical_res: u32) -> GridResult<GridLabels> {
    if horizontal_res == 0 || vertical_res == 0 {
        return Err(GridError::InvalidArgument(format!(
            "resolution {}x{} must be positive",
            horizontal_res, vertical_res
        )));
    }

    let row_count = (horizontal_res as usize) * (vertical_res as usize);
    let mut labels = Vec::with_capacity(row_count);
    let mut column_letters = Vec::with_capacity(row_count);

    for col in 0..horizontal_res {
        let letter = index_to_label(i64::from(col))?;
        for row in 1..=vertical_res {
            labels.push(format!("{}{}", letter, row));
            column_letters.push(letter.clone());
        }
    }

    Ok(GridLabels {
        labels,
        column_letters,
        row_count,
    })
}

/// Generate grid labels and write them down one column starting at `start_address`.
///
/// Resolutions are taken as worksheet numbers; anything that is not a positive integer is
/// rejected with [`GridError::InvalidArgument`] before the sheet is touched. All labels are
/// written in a single block, and a grid that would run past the last worksheet row is
/// rejected before any cell changes.
pub fn write_grid_labels<H, V>(
    sheet: &mut Worksheet,
    horizontal_res: H,
    vertical_res: V,
    start_address: &str,
) -> GridResult<GridLabels>
where
    H: Into<f64>,
    V: Into<f64>,
{
    let horizontal = resolution_from_number(horizontal_res.into(), "Horizontal")?;
    let vertical = resolution_from_number(vertical_res.into(), "Vertical")?;
    let start = CellAddress::parse(start_address)?;

    // Reject oversized grids before allocating their labels
    let available = u64::from(MAX_ROWS - start.row);
    let needed = u64::from(horizontal) * u64::from(vertical);
    if needed > available {
        return Err(GridError::InvalidArgument(format!(
            "a {}x{} grid needs {} rows but only {} fit below {}",
            horizontal, vertical, needed, available, start
        )));
    }

    let grid = grid_labels(horizontal, vertical)?;
    let written = sheet.set_column_values(
        start,
        grid.labels.iter().map(|l| CellValue::string(l.as_str())),
    )?;

    tracing::info!(
        "Grid labels written: {} label(s) from {} to {}",
        grid.row_count,
        written.start,
        written.end
    );

    Ok(grid)
}
