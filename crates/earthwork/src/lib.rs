//! # earthwork
//!
//! Grid labelling and earthwork formula generation for survey worksheets.
//!
//! A survey sheet splits a site into a grid of cells. For each cell the sheet holds four
//! existing and four proposed level readings plus a coverage fraction. This crate:
//!
//! - writes the grid cell identifiers (`A1, A2, ..., B1, ...`) down the identifier column
//! - inserts per-row formulas averaging the levels and computing cut and fill volumes
//! - inserts per-row checks that adjacent cells agree on their shared corner levels
//!
//! Every position comes from a [`SheetLayout`]; its default matches the standard sheet.
//!
//! ## Example
//!
//! ```rust
//! use earthwork::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! // Grid resolution: 2 columns by 3 rows
//! sheet.set_cell_value("E8", 2).unwrap();
//! sheet.set_cell_value("E9", 3).unwrap();
//!
//! let report = run_all(sheet, &SheetLayout::default()).unwrap();
//! assert_eq!(report.labels.labels[3], "B1");
//! assert!(sheet.get_formula("O19").unwrap().is_some());
//!
//! // Save to file
//! // workbook.save("survey.xlsx").unwrap();
//! ```

pub mod error;
pub mod insert;
pub mod labels;
pub mod layout;
pub mod locate;
pub mod outcome;
pub mod pipeline;
pub mod prelude;
pub mod templates;
pub mod validate;

pub use error::{GridError, GridResult};
pub use insert::{insert_formula_column, insert_formula_column_over};
pub use labels::{grid_labels, resolution_from_number, write_grid_labels, GridLabels};
pub use layout::{OutputColumns, SheetLayout, DEFAULT_SEARCH_LIMIT};
pub use locate::{locate_row_range, populated_row_count, LocateOptions, RowRange};
pub use outcome::{FormulaOutcome, VolumeKind, BLANK_TEXT, NOT_APPLICABLE_TEXT};
pub use pipeline::{
    apply_continuity_validation_formulas, apply_earthwork_calculation_formulas,
    read_resolution, run_all, setup_grid, InsertedColumns, RunReport,
};
pub use templates::{
    AverageTemplate, ColumnTemplate, ContinuityTemplate, FormulaTemplate, Neighbour, ReadingSet,
    VolumeTemplate,
};
pub use validate::{
    ensure_valid, is_positive_integer, validate_cells, validate_positive_integer_cells,
};

// Re-export core types
pub use earthwork_core::{
    index_to_label, label_to_index, number_to_label, CellAddress, CellError, CellRange,
    CellValue, Workbook, Worksheet, MAX_COLS, MAX_ROWS,
};

// Re-export I/O types
pub use earthwork_xlsx::{UnsupportedContent, XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from an `.xlsx` or `.xlsm` file
    fn open<P: AsRef<Path>>(path: P) -> GridResult<Workbook>;

    /// Open a workbook along with the content [`save`](WorkbookExt::save) would not keep
    fn open_with_report<P: AsRef<Path>>(path: P) -> GridResult<(Workbook, UnsupportedContent)>;

    /// Save the workbook to an `.xlsx` file
    fn save<P: AsRef<Path>>(&self, path: P) -> GridResult<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> GridResult<Workbook> {
        let (workbook, _) = Self::open_with_report(path)?;
        Ok(workbook)
    }

    fn open_with_report<P: AsRef<Path>>(path: P) -> GridResult<(Workbook, UnsupportedContent)> {
        let path = path.as_ref();

        match extension(path).as_deref() {
            Some("xlsx") | Some("xlsm") => Ok(XlsxReader::read_file_with_report(path)?),
            _ => Err(GridError::InvalidArgument(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> GridResult<()> {
        let path = path.as_ref();

        match extension(path).as_deref() {
            Some("xlsx") => Ok(XlsxWriter::write_file(self, path)?),
            _ => Err(GridError::InvalidArgument(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Survey.XLSX");

        let mut workbook = Workbook::new();
        workbook
            .worksheet_mut(0)
            .unwrap()
            .set_cell_value("C14", "A1")
            .unwrap();
        workbook.save(&path).unwrap();

        let reopened = Workbook::open(&path).unwrap();
        let value = reopened.worksheet(0).unwrap().get_value("C14").unwrap();
        assert_eq!(value.as_string(), Some("A1"));
    }

    #[test]
    fn test_saved_workbook_loses_nothing_on_resave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.xlsx");

        let mut workbook = Workbook::new();
        workbook
            .worksheet_mut(0)
            .unwrap()
            .set_cell_formula("M14", "=IF(SUM(D14:G14)=0, \"\", AVERAGE(D14:G14))")
            .unwrap();
        workbook.save(&path).unwrap();

        let (reopened, unsupported) = Workbook::open_with_report(&path).unwrap();
        assert!(unsupported.is_empty(), "{}", unsupported);
        assert!(reopened.worksheet(0).unwrap().get_formula("M14").unwrap().is_some());
    }

    #[test]
    fn test_unsupported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = Workbook::new();

        let err = workbook.save(dir.path().join("survey.csv")).unwrap_err();
        assert!(matches!(err, GridError::InvalidArgument(_)));

        let err = Workbook::open(dir.path().join("survey.xls")).unwrap_err();
        assert!(matches!(err, GridError::InvalidArgument(_)));

        let err = Workbook::open_with_report(dir.path().join("survey.ods")).unwrap_err();
        assert!(matches!(err, GridError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Workbook::open(dir.path().join("missing.xlsx")).unwrap_err();
        assert!(matches!(err, GridError::Xlsx(_)));
    }
}
