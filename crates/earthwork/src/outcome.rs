//! Formula result conventions
//!
//! The generated formulas produce one of three results: a blank cell, the `"-"` marker for
//! "not applicable", or a number. [`FormulaOutcome`] names those results so every template
//! spells them the same way. The formulas are evaluated by the spreadsheet, never here.

use std::fmt;

/// Spreadsheet text of a blank result
pub const BLANK_TEXT: &str = "";

/// Spreadsheet text of a "not applicable" result
pub const NOT_APPLICABLE_TEXT: &str = "-";

/// Result of a generated formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaOutcome {
    /// Nothing to report; the cell renders empty
    Blank,
    /// The calculation does not apply to this row
    NotApplicable,
    /// A computed value
    Numeric(f64),
}

impl FormulaOutcome {
    /// The value as a formula literal: `""`, `"-"` or the number
    pub fn formula_literal(&self) -> String {
        match self {
            FormulaOutcome::Blank => format!("\"{}\"", BLANK_TEXT),
            FormulaOutcome::NotApplicable => format!("\"{}\"", NOT_APPLICABLE_TEXT),
            FormulaOutcome::Numeric(n) => n.to_string(),
        }
    }
}

impl fmt::Display for FormulaOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaOutcome::Blank => write!(f, "{}", BLANK_TEXT),
            FormulaOutcome::NotApplicable => write!(f, "{}", NOT_APPLICABLE_TEXT),
            FormulaOutcome::Numeric(n) => write!(f, "{}", n),
        }
    }
}

/// Direction of earth movement for a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    /// Existing ground above the proposed level; material is removed
    Cut,
    /// Proposed level above existing ground; material is added
    Fill,
}

impl VolumeKind {
    /// Comparison operands as they appear in the formula: `(higher, lower)` level names
    pub(crate) fn operands(self) -> (&'static str, &'static str) {
        match self {
            VolumeKind::Cut => ("existing", "proposed"),
            VolumeKind::Fill => ("proposed", "existing"),
        }
    }
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeKind::Cut => write!(f, "cut"),
            VolumeKind::Fill => write!(f, "fill"),
        }
    }
}
