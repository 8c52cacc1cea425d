//! Shared formula expansion
//!
//! A worksheet may store one formula for a whole block of cells. The anchor cell carries
//! `<f t="shared" ref="L14:L16" si="0">K14/100</f>` and every other cell of the block only
//! `<f t="shared" si="0"/>`. A follower's formula is the anchor's with each relative
//! reference moved by the follower's offset from the anchor: `K15/100` for `L15`.

use earthwork_core::{CellAddress, MAX_COLS, MAX_ROWS};

const REF_ERROR: &str = "#REF!";

/// Move every relative reference in `formula` by `rows` rows and `cols` columns.
///
/// `$`-anchored parts stay put. String literals, quoted sheet names, structured references
/// and function names are copied unchanged. A reference pushed off the sheet becomes `#REF!`.
///
/// # Examples
/// ```
/// use earthwork_xlsx::shared_formula::shift_formula;
///
/// assert_eq!(shift_formula("K14/100", 1, 0), "K15/100");
/// assert_eq!(shift_formula("SUM(D14:G14)*$J$8", 2, 0), "SUM(D16:G16)*$J$8");
/// assert_eq!(shift_formula("XMATCH(C14, C:C, 0)", 3, 1), "XMATCH(D17, D:D, 0)");
/// ```
pub fn shift_formula(formula: &str, rows: i64, cols: i64) -> String {
    let bytes = formula.as_bytes();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'"' || b == b'\'' {
            let end = quoted_end(bytes, i);
            out.push_str(&formula[i..end]);
            i = end;
            continue;
        }
        if b == b'[' {
            let end = bracket_end(bytes, i);
            out.push_str(&formula[i..end]);
            i = end;
            continue;
        }
        if !is_word_byte(b) || (i > 0 && is_word_byte(bytes[i - 1])) {
            let len = formula[i..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&formula[i..i + len]);
            i += len;
            continue;
        }

        let end = word_end(bytes, i);
        let word = &formula[i..end];

        if is_call(bytes, end) {
            out.push_str(word);
            i = end;
            continue;
        }

        let Some(part) = RefPart::parse(word) else {
            out.push_str(word);
            i = end;
            continue;
        };

        if part.col.is_some() && part.row.is_some() {
            match part.shift(rows, cols) {
                Some(moved) => moved.write(&mut out),
                None => out.push_str(REF_ERROR),
            }
            i = end;
            continue;
        }

        // Whole-column (`C:C`) or whole-row (`14:16`) range
        if let Some((second, second_end)) = range_tail(formula, end, &part) {
            match (part.shift(rows, cols), second.shift(rows, cols)) {
                (Some(first), Some(second)) => {
                    first.write(&mut out);
                    out.push(':');
                    second.write(&mut out);
                }
                _ => out.push_str(REF_ERROR),
            }
            i = second_end;
            continue;
        }

        out.push_str(word);
        i = end;
    }

    out
}

/// One side of a reference: a column, a row, or both, each with its `$` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RefPart {
    col: Option<(u16, bool)>,
    row: Option<(u32, bool)>,
}

impl RefPart {
    /// Parse `$A$1`, `A`, `$14` and the like; anything else is not a reference
    fn parse(word: &str) -> Option<Self> {
        let mut rest = word;
        let first_dollar = take_dollar(&mut rest);
        let letters = take_while(&mut rest, |b| b.is_ascii_alphabetic());
        let second_dollar = !letters.is_empty() && take_dollar(&mut rest);
        let digits = take_while(&mut rest, |b| b.is_ascii_digit());

        if !rest.is_empty() || letters.len() > 3 || (letters.is_empty() && digits.is_empty()) {
            return None;
        }
        if second_dollar && digits.is_empty() {
            return None;
        }

        let col = if letters.is_empty() {
            None
        } else {
            let col = CellAddress::letters_to_column(letters).ok()?;
            Some((col, first_dollar))
        };
        let row = if digits.is_empty() {
            None
        } else {
            let number: u32 = digits.parse().ok()?;
            if number == 0 || number > MAX_ROWS {
                return None;
            }
            let absolute = if letters.is_empty() {
                first_dollar
            } else {
                second_dollar
            };
            Some((number - 1, absolute))
        };

        Some(Self { col, row })
    }

    fn shift(self, rows: i64, cols: i64) -> Option<Self> {
        let col = match self.col {
            Some((col, false)) => {
                let moved = offset(i64::from(col), cols, i64::from(MAX_COLS))?;
                Some((u16::try_from(moved).ok()?, false))
            }
            other => other,
        };
        let row = match self.row {
            Some((row, false)) => {
                let moved = offset(i64::from(row), rows, i64::from(MAX_ROWS))?;
                Some((u32::try_from(moved).ok()?, false))
            }
            other => other,
        };
        Some(Self { col, row })
    }

    fn write(&self, out: &mut String) {
        if let Some((col, absolute)) = self.col {
            if absolute {
                out.push('$');
            }
            out.push_str(&CellAddress::column_to_letters(col));
        }
        if let Some((row, absolute)) = self.row {
            if absolute {
                out.push('$');
            }
            out.push_str(&(row + 1).to_string());
        }
    }

    fn same_kind(&self, other: &Self) -> bool {
        self.col.is_some() == other.col.is_some() && self.row.is_some() == other.row.is_some()
    }
}

/// The second half of a whole-column or whole-row range starting at `colon`
fn range_tail(formula: &str, colon: usize, first: &RefPart) -> Option<(RefPart, usize)> {
    let bytes = formula.as_bytes();
    if bytes.get(colon) != Some(&b':') {
        return None;
    }
    let start = colon + 1;
    if !bytes.get(start).copied().is_some_and(is_word_byte) {
        return None;
    }
    let end = word_end(bytes, start);
    let second = RefPart::parse(&formula[start..end])?;
    first.same_kind(&second).then_some((second, end))
}

fn offset(index: i64, by: i64, limit: i64) -> Option<i64> {
    let moved = index.checked_add(by)?;
    (0..limit).contains(&moved).then_some(moved)
}

fn take_dollar(rest: &mut &str) -> bool {
    let text = *rest;
    match text.strip_prefix('$') {
        Some(tail) => {
            *rest = tail;
            true
        }
        None => false,
    }
}

fn take_while<'a>(rest: &mut &'a str, pred: impl Fn(u8) -> bool) -> &'a str {
    let text: &'a str = *rest;
    let len = text.bytes().take_while(|b| pred(*b)).count();
    let (head, tail) = text.split_at(len);
    *rest = tail;
    head
}

/// Whether the word ending at `end` names a function
fn is_call(bytes: &[u8], end: usize) -> bool {
    bytes[end..]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'(')
}

fn word_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_word_byte(bytes[end]) {
        end += 1;
    }
    end
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'$')
}

/// End (exclusive) of the quoted run starting at `start`; a doubled quote is an escape.
fn quoted_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn bracket_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    bytes.len()
}
