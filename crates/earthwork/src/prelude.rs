//! Prelude module - common imports for earthwork users
//!
//! ```rust
//! use earthwork::prelude::*;
//! ```

pub use crate::{
    // Steps
    apply_continuity_validation_formulas,
    apply_earthwork_calculation_formulas,
    run_all,
    setup_grid,

    CellAddress,
    CellRange,
    // Cell types
    CellValue,

    // Templates
    FormulaOutcome,
    FormulaTemplate,

    // Error types
    GridError,
    GridResult,

    // Configuration
    LocateOptions,
    SheetLayout,

    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,

    // I/O types
    XlsxReader,
    XlsxWriter,
};
