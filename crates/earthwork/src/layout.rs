//! Worksheet layout configuration
//!
//! Every component reads row and column positions from a [`SheetLayout`] instead of fixed
//! constants. [`SheetLayout::default`] describes the standard survey sheet:
//!
//! | cells | content |
//! |---|---|
//! | `E8`, `E9` | horizontal / vertical grid resolution |
//! | `J8`, `J9` | horizontal / vertical cell size |
//! | `C14:C…` | grid cell identifiers |
//! | `D:G`, `H:K` | existing / proposed level readings |
//! | `L` | coverage fraction |
//! | `M`, `N`, `O`, `P` | average existing, average proposed, cut, fill |
//! | `S`, `T`, `U`, `V` | continuity checks |

use std::fs;
use std::path::Path;

use earthwork_core::CellAddress;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Default number of rows scanned below a start cell
pub const DEFAULT_SEARCH_LIMIT: u32 = 1000;

/// Positions of every input and output on the worksheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// First row (1-based) holding grid data
    pub first_data_row: u32,
    /// Column holding the grid cell identifiers
    pub identifier_column: String,
    /// Columns of the four existing level readings, in corner order
    pub existing_columns: [String; 4],
    /// Columns of the four proposed level readings, in corner order
    pub proposed_columns: [String; 4],
    /// Column holding the coverage fraction
    pub coverage_column: String,
    /// Cell holding the horizontal cell size (absolute reference)
    pub horizontal_cell_size: String,
    /// Cell holding the vertical cell size (absolute reference)
    pub vertical_cell_size: String,
    /// Cell holding the horizontal grid resolution
    pub horizontal_resolution: String,
    /// Cell holding the vertical grid resolution
    pub vertical_resolution: String,
    /// Formula output columns
    pub outputs: OutputColumns,
    /// Zero-padded width of the row number inside a grid identifier
    pub identifier_row_digits: usize,
    /// Rows scanned below the first data row when locating data
    pub search_limit: u32,
}

/// Target columns for generated formulas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputColumns {
    pub average_existing: String,
    pub average_proposed: String,
    pub cut_volume: String,
    pub fill_volume: String,
    pub existing_vertical_continuity: String,
    pub proposed_vertical_continuity: String,
    pub existing_horizontal_continuity: String,
    pub proposed_horizontal_continuity: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            first_data_row: 14,
            identifier_column: "C".into(),
            existing_columns: ["D".into(), "E".into(), "F".into(), "G".into()],
            proposed_columns: ["H".into(), "I".into(), "J".into(), "K".into()],
            coverage_column: "L".into(),
            horizontal_cell_size: "$J$8".into(),
            vertical_cell_size: "$J$9".into(),
            horizontal_resolution: "E8".into(),
            vertical_resolution: "E9".into(),
            outputs: OutputColumns::default(),
            identifier_row_digits: 2,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self {
            average_existing: "M".into(),
            average_proposed: "N".into(),
            cut_volume: "O".into(),
            fill_volume: "P".into(),
            existing_vertical_continuity: "S".into(),
            proposed_vertical_continuity: "T".into(),
            existing_horizontal_continuity: "U".into(),
            proposed_horizontal_continuity: "V".into(),
        }
    }
}

impl OutputColumns {
    /// The four earthwork calculation columns, in write order
    pub fn earthwork(&self) -> [&str; 4] {
        [
            &self.average_existing,
            &self.average_proposed,
            &self.cut_volume,
            &self.fill_volume,
        ]
    }

    /// The four continuity check columns, in write order
    pub fn continuity(&self) -> [&str; 4] {
        [
            &self.existing_vertical_continuity,
            &self.proposed_vertical_continuity,
            &self.existing_horizontal_continuity,
            &self.proposed_horizontal_continuity,
        ]
    }
}

impl SheetLayout {
    /// Load a layout from a JSON file; missing fields take their default values.
    ///
    /// The loaded layout is validated before it is returned.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> GridResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a layout from JSON text
    pub fn from_json_str(json: &str) -> GridResult<Self> {
        let layout: SheetLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Serialize the layout as pretty-printed JSON
    pub fn to_json_pretty(&self) -> GridResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Address of the first grid identifier (e.g. `C14`)
    pub fn data_start(&self) -> GridResult<CellAddress> {
        Ok(CellAddress::from_column_and_row(
            &self.identifier_column,
            self.first_data_row,
        )?)
    }

    /// The two resolution cells, horizontal first
    pub fn resolution_cells(&self) -> [&str; 2] {
        [&self.horizontal_resolution, &self.vertical_resolution]
    }

    /// Check that every column and cell reference resolves and the numbers are usable
    pub fn validate(&self) -> GridResult<()> {
        if self.first_data_row == 0 {
            return Err(GridError::Layout("first_data_row must be >= 1".into()));
        }
        if self.search_limit == 0 {
            return Err(GridError::Layout("search_limit must be >= 1".into()));
        }
        if self.identifier_row_digits == 0 {
            return Err(GridError::Layout(
                "identifier_row_digits must be >= 1".into(),
            ));
        }

        let columns = [&self.identifier_column, &self.coverage_column]
            .into_iter()
            .chain(self.existing_columns.iter())
            .chain(self.proposed_columns.iter())
            .map(String::as_str)
            .chain(self.outputs.earthwork())
            .chain(self.outputs.continuity());
        for column in columns {
            column_index(column)?;
        }

        for cell in [
            &self.horizontal_cell_size,
            &self.vertical_cell_size,
            &self.horizontal_resolution,
            &self.vertical_resolution,
        ] {
            CellAddress::parse(cell)
                .map_err(|e| GridError::Layout(format!("cell '{}': {}", cell, e)))?;
        }

        // Averages are written as one contiguous range per reading set
        for (name, readings) in [
            ("existing_columns", &self.existing_columns),
            ("proposed_columns", &self.proposed_columns),
        ] {
            let indices = readings
                .iter()
                .map(|c| column_index(c))
                .collect::<GridResult<Vec<_>>>()?;
            if indices.windows(2).any(|w| w[1] != w[0] + 1) {
                return Err(GridError::Layout(format!(
                    "{} must be four adjacent columns, got {}",
                    name,
                    readings.join(",")
                )));
            }
        }

        self.data_start()?;
        Ok(())
    }
}

fn column_index(letters: &str) -> GridResult<u16> {
    CellAddress::letters_to_column(letters)
        .map_err(|e| GridError::Layout(format!("column '{}': {}", letters, e)))
}
