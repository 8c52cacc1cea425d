//! Column-label codec
//!
//! Spreadsheet columns are lettered in bijective base-26: there is no zero digit, so every
//! extra letter position is reached by decrementing before dividing again. That carry is
//! what makes index 26 encode as `AA` instead of colliding with a two-digit `BA`.

use crate::error::{Error, Result};

const RADIX: u64 = 26;

/// Convert a zero-based column index to its letter label (0 = A, 25 = Z, 26 = AA).
///
/// No upper bound is enforced; worksheet limits are checked where addresses are built.
///
/// # Examples
/// ```
/// use earthwork_core::column_label::index_to_label;
///
/// assert_eq!(index_to_label(0).unwrap(), "A");
/// assert_eq!(index_to_label(701).unwrap(), "ZZ");
/// assert_eq!(index_to_label(702).unwrap(), "AAA");
/// assert!(index_to_label(-1).is_err());
/// ```
pub fn index_to_label(index: i64) -> Result<String> {
    let index = u64::try_from(index).map_err(|_| {
        Error::InvalidArgument(format!(
            "column index {} is not a valid non-negative integer",
            index
        ))
    })?;
    Ok(encode(index))
}

/// Convert a numeric cell value to a column label.
///
/// Worksheet numbers arrive as `f64`; anything fractional, negative or non-finite is rejected
/// with [`Error::InvalidArgument`].
pub fn number_to_label(value: f64) -> Result<String> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(Error::InvalidArgument(format!(
            "column index {} is not an integer",
            value
        )));
    }
    if value < 0.0 || value > u64::MAX as f64 {
        return Err(Error::InvalidArgument(format!(
            "column index {} is not a valid non-negative integer",
            value
        )));
    }
    Ok(encode(value as u64))
}

/// Convert column letters back to a zero-based index (A = 0, Z = 25, AA = 26).
///
/// Letters are matched case-insensitively.
pub fn label_to_index(label: &str) -> Result<u64> {
    if label.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut acc: u64 = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        let digit = u64::from(c.to_ascii_uppercase() as u8 - b'A') + 1;
        acc = acc
            .checked_mul(RADIX)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| Error::InvalidAddress(format!("column label '{}' is too long", label)))?;
    }

    Ok(acc - 1)
}

pub(crate) fn encode(mut index: u64) -> String {
    let mut letters = String::new();

    loop {
        let c = (b'A' + (index % RADIX) as u8) as char;
        letters.insert(0, c);
        if index < RADIX {
            break;
        }
        index = index / RADIX - 1;
    }

    letters
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_index_to_label() {
        assert_eq!(index_to_label(0).unwrap(), "A");
        assert_eq!(index_to_label(1).unwrap(), "B");
        assert_eq!(index_to_label(25).unwrap(), "Z");
        assert_eq!(index_to_label(26).unwrap(), "AA");
        assert_eq!(index_to_label(27).unwrap(), "AB");
        assert_eq!(index_to_label(701).unwrap(), "ZZ");
        assert_eq!(index_to_label(702).unwrap(), "AAA");
        assert_eq!(index_to_label(16383).unwrap(), "XFD");
    }

    #[test]
    fn test_index_to_label_rejects_negative() {
        assert!(matches!(index_to_label(-1), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            index_to_label(i64::MIN),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_number_to_label() {
        assert_eq!(number_to_label(0.0).unwrap(), "A");
        assert_eq!(number_to_label(26.0).unwrap(), "AA");
        assert!(matches!(number_to_label(1.5), Err(Error::InvalidArgument(_))));
        assert!(matches!(number_to_label(-3.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            number_to_label(f64::NAN),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            number_to_label(f64::INFINITY),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_label_to_index() {
        assert_eq!(label_to_index("A").unwrap(), 0);
        assert_eq!(label_to_index("Z").unwrap(), 25);
        assert_eq!(label_to_index("AA").unwrap(), 26);
        assert_eq!(label_to_index("ZZ").unwrap(), 701);
        assert_eq!(label_to_index("AAA").unwrap(), 702);
        assert_eq!(label_to_index("xfd").unwrap(), 16383);

        assert!(label_to_index("").is_err());
        assert!(label_to_index("A1").is_err());
        assert!(label_to_index(&"Z".repeat(40)).is_err());
    }

    #[test]
    fn test_label_length_grows_at_boundaries() {
        // 26, 26 + 26^2, 26 + 26^2 + 26^3
        for (boundary, len) in [(26i64, 2usize), (702, 3), (18_278, 4)] {
            assert_eq!(index_to_label(boundary - 1).unwrap().len(), len - 1);
            assert_eq!(index_to_label(boundary).unwrap().len(), len);
        }
    }

    proptest! {
        #[test]
        fn prop_label_roundtrip(index in 0i64..5_000_000) {
            let label = index_to_label(index).unwrap();
            prop_assert!(label.chars().all(|c| c.is_ascii_uppercase()));
            prop_assert_eq!(label_to_index(&label).unwrap(), index as u64);
        }

        #[test]
        fn prop_labels_are_ordered(index in 0i64..5_000_000) {
            let a = index_to_label(index).unwrap();
            let b = index_to_label(index + 1).unwrap();
            // Shorter labels sort first; equal lengths sort lexicographically.
            prop_assert!((a.len(), a) < (b.len(), b));
        }
    }
}
