//! Cell validators
//!
//! Validators collect every failure instead of stopping at the first one, so a user sees all
//! broken inputs in one report. [`ensure_valid`] turns the collected messages into a single
//! [`GridError::AggregatedValidationFailure`].

use earthwork_core::{CellValue, Worksheet};

use crate::error::{GridError, GridResult};

/// Check each cell in `addresses`, in order, and collect one message per failing cell.
///
/// A blank cell fails with `"<addr> is empty."` without consulting `predicate`; a non-blank
/// cell for which `predicate` returns `false` fails with `error_message(addr)`.
///
/// Only malformed addresses are returned as `Err`.
pub fn validate_cells<P, M>(
    sheet: &Worksheet,
    addresses: &[&str],
    predicate: P,
    error_message: M,
) -> GridResult<Vec<String>>
where
    P: Fn(&CellValue) -> bool,
    M: Fn(&str) -> String,
{
    let mut errors = Vec::new();

    for &address in addresses {
        let value = sheet.get_value(address)?;
        if value.is_blank() {
            errors.push(format!("{} is empty.", address));
        } else if !predicate(&value) {
            errors.push(error_message(address));
        }
    }

    tracing::debug!(
        "Validated {} cell(s), {} error(s)",
        addresses.len(),
        errors.len()
    );
    Ok(errors)
}

/// `true` for an integer-valued number strictly greater than zero
///
/// Numeric text does not qualify; formulas are judged by their cached result.
pub fn is_positive_integer(value: &CellValue) -> bool {
    value
        .as_number()
        .is_some_and(|n| n.is_finite() && n.fract() == 0.0 && n > 0.0)
}

/// [`validate_cells`] requiring positive integers
///
/// # Examples
/// ```
/// use earthwork::{validate_positive_integer_cells, Worksheet};
///
/// let mut sheet = Worksheet::new("Grid");
/// sheet.set_cell_value("E9", -3.0).unwrap();
///
/// let errors = validate_positive_integer_cells(&sheet, &["E8", "E9"]).unwrap();
/// assert_eq!(errors, ["E8 is empty.", "E9 must be a positive integer."]);
/// ```
pub fn validate_positive_integer_cells(
    sheet: &Worksheet,
    addresses: &[&str],
) -> GridResult<Vec<String>> {
    validate_cells(sheet, addresses, is_positive_integer, |address| {
        format!("{} must be a positive integer.", address)
    })
}

/// Fail with every collected message, or log success when there are none
pub fn ensure_valid(errors: Vec<String>) -> GridResult<()> {
    if errors.is_empty() {
        tracing::info!("Validation successful - no errors found...");
        Ok(())
    } else {
        Err(GridError::AggregatedValidationFailure(errors))
    }
}
