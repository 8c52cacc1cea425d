//! Error types for grid setup and formula generation

use thiserror::Error;

/// Result type alias using [`GridError`]
pub type GridResult<T> = std::result::Result<T, GridError>;

/// Errors raised while labelling a grid or writing formula columns
///
/// Every failure is raised synchronously and never retried. Columns written before a failing
/// step stay written.
#[derive(Debug, Error)]
pub enum GridError {
    /// Argument outside the accepted domain (non-positive resolution, negative index, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The cell a row range is anchored at holds no value
    #[error("Start cell {0} is empty.")]
    EmptyStartCell(String),

    /// A cell that must hold a value is empty
    #[error("{0} is empty.")]
    EmptyCell(String),

    /// The search window below a start cell holds no value
    #[error("No data found in {0}.")]
    NoDataFound(String),

    /// One or more cells failed validation; each entry is one human-readable error
    #[error("Validation error(s):\n{}", .0.join("\n"))]
    AggregatedValidationFailure(Vec<String>),

    /// Layout configuration could not be read or is inconsistent
    #[error("Invalid layout: {0}")]
    Layout(String),

    /// Worksheet model error
    #[error(transparent)]
    Core(earthwork_core::Error),

    /// XLSX read/write error
    #[error(transparent)]
    Xlsx(#[from] earthwork_xlsx::XlsxError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<earthwork_core::Error> for GridError {
    fn from(err: earthwork_core::Error) -> Self {
        match err {
            earthwork_core::Error::InvalidArgument(msg) => GridError::InvalidArgument(msg),
            other => GridError::Core(other),
        }
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Layout(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregated_message() {
        let err = GridError::AggregatedValidationFailure(vec![
            "E8 is empty.".into(),
            "E9 must be a positive integer.".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation error(s):\nE8 is empty.\nE9 must be a positive integer."
        );
    }

    #[test]
    fn test_core_invalid_argument_is_lifted() {
        let err: GridError = earthwork_core::index_to_label(-1).unwrap_err().into();
        assert!(matches!(err, GridError::InvalidArgument(_)));

        let err: GridError = earthwork_core::CellAddress::parse("").unwrap_err().into();
        assert!(matches!(err, GridError::Core(_)));
    }
}
