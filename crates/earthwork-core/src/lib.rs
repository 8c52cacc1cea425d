//! # earthwork-core
//!
//! Core data structures for the earthwork-sheets workspace.
//!
//! This crate provides the worksheet model the grid tooling writes into:
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans, errors, formulas)
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`column_label`] - The bijective base-26 column-label codec
//! - [`Workbook`], [`Worksheet`] - The document structures
//!
//! ## Example
//!
//! ```rust
//! use earthwork_core::{CellRange, CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("C14", "A1").unwrap();
//! sheet.set_cell_value("C17", "A4").unwrap();
//!
//! let window = CellRange::parse("C14:C1013").unwrap();
//! let used = sheet.used_range_within(&window).unwrap();
//! assert_eq!(used.row_count(), 4);
//! ```

pub mod cell;
pub mod column_label;
pub mod error;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellError, CellRange, CellValue, SharedString};
pub use column_label::{index_to_label, label_to_index, number_to_label};
pub use error::{Error, Result};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
