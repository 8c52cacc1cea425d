//! # earthwork-xlsx
//!
//! XLSX (Office Open XML) reader and writer for earthwork-sheets.
//!
//! Only cell content travels through these types: numbers, strings, booleans, errors and
//! formulas with their cached results. Formulas that use functions newer than the 2007 file
//! format (`LET`, `IFS`, `XMATCH`, ...) are stored with the `_xlfn.`/`_xlpm.` markers the host
//! application expects, and those markers are removed again on read. Shared formulas are
//! expanded into one formula per cell.
//!
//! Styles, layout and any other part the writer does not produce are lost on save;
//! [`XlsxReader::read_with_report`] lists them so callers can avoid overwriting a richer file.

pub mod error;
pub mod future_functions;
pub mod reader;
pub mod shared_formula;
pub mod writer;

pub use error::{XlsxError, XlsxResult};
pub use reader::{UnsupportedContent, XlsxReader};
pub use writer::XlsxWriter;
