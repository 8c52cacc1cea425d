//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "C14")
//! - [`CellRange`] - A range of cells (e.g., "C14:C1013")
//! - [`CellStorage`] - Sparse row-major storage backing a worksheet

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use storage::CellStorage;
pub use value::{CellError, CellValue, SharedString};
