//! Forward-compatibility markers for newer worksheet functions
//!
//! The file format predates functions such as `LET`, `IFS` and `XMATCH`. The host application
//! stores calls to them as `_xlfn.NAME(...)` and every `LET` or `LAMBDA` parameter name as
//! `_xlpm.name`; a file without those markers opens with `#NAME?` in every affected cell.
//!
//! [`add_future_prefixes`] is applied to formula text on write and [`strip_future_prefixes`]
//! on read, so worksheet formulas carry the plain display form. A marked name missing from
//! the known function list keeps its marker, so it is written back exactly as read.

use std::collections::HashSet;

const XL_FN_PREFIX: &str = "_xlfn.";
const XL_PM_PREFIX: &str = "_xlpm.";

// Keep this list sorted (ASCII).
const FUTURE_FUNCTIONS: &[&str] = &[
    "ACOT", "ACOTH", "AGGREGATE", "ARABIC", "BASE", "BETA.DIST", "BETA.INV", "BINOM.DIST",
    "BINOM.DIST.RANGE", "BINOM.INV", "BITAND", "BITLSHIFT", "BITOR", "BITRSHIFT", "BITXOR", "BYCOL",
    "BYROW", "CEILING.MATH", "CEILING.PRECISE", "CHISQ.DIST", "CHISQ.DIST.RT", "CHISQ.INV",
    "CHISQ.INV.RT", "CHISQ.TEST", "CHOOSECOLS", "CHOOSEROWS", "COMBINA", "CONCAT",
    "CONFIDENCE.NORM", "CONFIDENCE.T", "COT", "COTH", "COVARIANCE.P", "COVARIANCE.S", "CSC", "CSCH",
    "DAYS", "DECIMAL", "DROP", "EXPAND", "EXPON.DIST", "F.DIST", "F.DIST.RT", "F.INV", "F.INV.RT",
    "F.TEST", "FILTER", "FLOOR.MATH", "FLOOR.PRECISE", "FORECAST.ETS", "FORECAST.ETS.CONFINT",
    "FORECAST.ETS.SEASONALITY", "FORECAST.ETS.STAT", "FORECAST.LINEAR", "FORMULATEXT", "GAMMA",
    "GAMMA.DIST", "GAMMA.INV", "GAMMALN.PRECISE", "GAUSS", "HSTACK", "HYPGEOM.DIST", "IFNA", "IFS",
    "IMAGE", "ISFORMULA", "ISO.CEILING", "ISO.WEEKNUM", "ISOMITTED", "ISOWEEKNUM", "LAMBDA", "LET",
    "LOGNORM.DIST", "LOGNORM.INV", "MAKEARRAY", "MAP", "MAXIFS", "MINIFS", "MODE.MULT", "MODE.SNGL",
    "MUNIT", "NEGBINOM.DIST", "NETWORKDAYS.INTL", "NORM.DIST", "NORM.INV", "NORM.S.DIST",
    "NORM.S.INV", "NUMBERVALUE", "PDURATION", "PERCENTILE.EXC", "PERCENTILE.INC", "PERCENTRANK.EXC",
    "PERCENTRANK.INC", "PERMUTATIONA", "PHI", "POISSON.DIST", "QUARTILE.EXC", "QUARTILE.INC",
    "RANDARRAY", "RANK.AVG", "RANK.EQ", "REDUCE", "RRI", "SCAN", "SEC", "SECH", "SEQUENCE", "SHEET",
    "SHEETS", "SKEW.P", "SORT", "SORTBY", "STDEV.P", "STDEV.S", "SWITCH", "T.DIST", "T.DIST.2T",
    "T.DIST.RT", "T.INV", "T.INV.2T", "T.TEST", "TAKE", "TEXTAFTER", "TEXTBEFORE", "TEXTJOIN",
    "TEXTSPLIT", "TOCOL", "TOROW", "UNICHAR", "UNICODE", "UNIQUE", "VALUETOTEXT", "VAR.P", "VAR.S",
    "VSTACK", "WEIBULL.DIST", "WORKDAY.INTL", "WRAPCOLS", "WRAPROWS", "XLOOKUP", "XMATCH", "XOR",
    "Z.TEST",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// String literal or quoted sheet name, copied through untouched
    Quoted(&'a str),
    /// Function name, parameter, defined name or cell reference
    Ident { text: &'a str, call: bool },
    Other(&'a str),
}

/// Add `_xlfn.` to calls of newer functions and `_xlpm.` to `LET`/`LAMBDA` parameter names.
///
/// Text that already carries a marker is left as is, so the operation is idempotent.
///
/// # Examples
/// ```
/// use earthwork_xlsx::future_functions::add_future_prefixes;
///
/// assert_eq!(
///     add_future_prefixes("LET(x, A1, IF(x = \"\", \"-\", x))"),
///     "_xlfn.LET(_xlpm.x, A1, IF(_xlpm.x = \"\", \"-\", _xlpm.x))"
/// );
/// ```
pub fn add_future_prefixes(formula: &str) -> String {
    let tokens = tokenize(formula);
    let params = parameter_names(&tokens);
    let mut out = String::with_capacity(formula.len() + 32);

    for token in &tokens {
        match *token {
            Token::Ident { text, call: true }
                if !has_prefix(text, XL_FN_PREFIX) && is_future_function(text) =>
            {
                out.push_str(XL_FN_PREFIX);
                out.push_str(text);
            }
            Token::Ident { text, call: false }
                if !has_prefix(text, XL_PM_PREFIX)
                    && params.contains(&text.to_ascii_uppercase()) =>
            {
                out.push_str(XL_PM_PREFIX);
                out.push_str(text);
            }
            Token::Quoted(text) | Token::Ident { text, .. } | Token::Other(text) => {
                out.push_str(text)
            }
        }
    }

    out
}

/// Remove `_xlpm.` markers and the `_xlfn.` marker of known functions outside string literals.
pub fn strip_future_prefixes(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());

    for token in tokenize(formula) {
        match token {
            Token::Ident { text, call: true } => {
                let name = strip_prefix(text, XL_FN_PREFIX);
                if is_future_function(name) {
                    out.push_str(name);
                } else {
                    out.push_str(text);
                }
            }
            Token::Ident { text, call: false } => out.push_str(strip_prefix(text, XL_PM_PREFIX)),
            Token::Quoted(text) | Token::Other(text) => out.push_str(text),
        }
    }

    out
}

fn is_future_function(name: &str) -> bool {
    FUTURE_FUNCTIONS
        .iter()
        .any(|known| name.eq_ignore_ascii_case(known))
}

fn has_prefix(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(prefix))
}

fn strip_prefix<'a>(text: &'a str, prefix: &str) -> &'a str {
    if has_prefix(text, prefix) && text.len() > prefix.len() {
        &text[prefix.len()..]
    } else {
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binder {
    None,
    Let,
    Lambda,
}

impl Binder {
    fn of(call: &str) -> Self {
        let name = strip_prefix(call, XL_FN_PREFIX);
        if name.eq_ignore_ascii_case("LET") {
            Binder::Let
        } else if name.eq_ignore_ascii_case("LAMBDA") {
            Binder::Lambda
        } else {
            Binder::None
        }
    }

    fn binds(self, arg: usize) -> bool {
        match self {
            Binder::None => false,
            Binder::Let => arg % 2 == 0,
            Binder::Lambda => true,
        }
    }
}

/// Collect the parameter names bound by every `LET` and `LAMBDA` call, upper-cased and
/// unprefixed.
///
/// A name is the sole token of a binding argument that is followed by another argument: every
/// even-numbered `LET` argument and every `LAMBDA` argument. The last argument is the body and
/// never binds.
fn parameter_names(tokens: &[Token<'_>]) -> HashSet<String> {
    struct Frame<'a> {
        binder: Binder,
        arg: usize,
        started: bool,
        candidate: Option<&'a str>,
    }

    let mut names = HashSet::new();
    let mut frames: Vec<Frame<'_>> = Vec::new();
    let mut pending: Option<Binder> = None;

    for token in tokens {
        match *token {
            Token::Other(ws) if ws.trim().is_empty() => {}
            Token::Other("(") => {
                frames.push(Frame {
                    binder: pending.take().unwrap_or(Binder::None),
                    arg: 0,
                    started: false,
                    candidate: None,
                });
            }
            Token::Other(",") => {
                if let Some(frame) = frames.last_mut() {
                    if frame.binder.binds(frame.arg) {
                        if let Some(name) = frame.candidate.take() {
                            names.insert(strip_prefix(name, XL_PM_PREFIX).to_ascii_uppercase());
                        }
                    }
                    frame.arg += 1;
                    frame.started = false;
                    frame.candidate = None;
                }
            }
            Token::Other(")") => {
                frames.pop();
            }
            Token::Ident { text, call } => {
                if let Some(frame) = frames.last_mut() {
                    if !frame.started && !call {
                        frame.candidate = Some(text);
                    } else {
                        frame.candidate = None;
                    }
                    frame.started = true;
                }
                if call {
                    pending = Some(Binder::of(text));
                }
            }
            Token::Quoted(_) | Token::Other(_) => {
                if let Some(frame) = frames.last_mut() {
                    frame.started = true;
                    frame.candidate = None;
                }
            }
        }
    }

    names
}

fn tokenize(formula: &str) -> Vec<Token<'_>> {
    let bytes = formula.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            let end = quoted_end(bytes, i);
            tokens.push(Token::Quoted(&formula[i..end]));
            i = end;
        } else if b.is_ascii_alphabetic() || b == b'_' {
            let mut end = i + 1;
            while end < bytes.len() && is_ident_byte(bytes[end]) {
                end += 1;
            }
            let mut k = end;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            let call = bytes.get(k) == Some(&b'(');
            tokens.push(Token::Ident {
                text: &formula[i..end],
                call,
            });
            i = end;
        } else {
            let len = formula[i..].chars().next().map_or(1, char::len_utf8);
            tokens.push(Token::Other(&formula[i..i + len]));
            i += len;
        }
    }

    tokens
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

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_function_list_is_sorted() {
        for pair in FUTURE_FUNCTIONS.windows(2) {
            assert!(pair[0] < pair[1], "{} before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_plain_formula_is_untouched() {
        let formula = r#"=IF(SUM(D14:G14)=0, "", AVERAGE(D14:G14))"#;
        assert_eq!(add_future_prefixes(formula), formula);
        assert_eq!(strip_future_prefixes(formula), formula);
    }

    #[test]
    fn test_let_parameters_are_marked() {
        let formula = "=LET(existing, M14, proposed, N14, IFS(existing > proposed, existing - proposed, TRUE, \"-\"))";
        assert_eq!(
            add_future_prefixes(formula),
            "=_xlfn.LET(_xlpm.existing, M14, _xlpm.proposed, N14, _xlfn.IFS(_xlpm.existing > _xlpm.proposed, _xlpm.existing - _xlpm.proposed, TRUE, \"-\"))"
        );
    }

    #[test]
    fn test_result_expression_does_not_bind() {
        // `D14` is the trailing result expression, not a parameter
        let formula = "LET(x, 1, D14)";
        assert_eq!(add_future_prefixes(formula), "_xlfn.LET(_xlpm.x, 1, D14)");
    }

    #[test]
    fn test_string_literals_are_preserved() {
        let formula = r#"LET(id, C14, XMATCH(id & "id", C:C, 0))"#;
        assert_eq!(
            add_future_prefixes(formula),
            r#"_xlfn.LET(_xlpm.id, C14, _xlfn.XMATCH(_xlpm.id & "id", C:C, 0))"#
        );
    }

    #[test]
    fn test_prefixing_is_idempotent() {
        let once = add_future_prefixes("LET(a, 1, b, a + 1, b)");
        assert_eq!(add_future_prefixes(&once), once);
    }

    #[test]
    fn test_strip_restores_display_form() {
        let display = "=LET(\n    matchRow, XMATCH(C15, C:C, 0),\n    IF(ISNUMBER(matchRow), TRUE, \"-\")\n)";
        let stored = add_future_prefixes(display);
        assert!(stored.contains("_xlfn.XMATCH"));
        assert!(stored.contains("_xlpm.matchRow"));
        assert_eq!(strip_future_prefixes(&stored), display);
    }

    #[test]
    fn test_strip_is_case_insensitive() {
        assert_eq!(strip_future_prefixes("_XLFN.IFS(TRUE, 1)"), "IFS(TRUE, 1)");
    }

    #[test]
    fn test_dotted_functions_are_marked() {
        let display = "STDEV.S(D14:G14)+AGGREGATE(9, 6, D14:G14)+CEILING.MATH(M14)";
        let stored = add_future_prefixes(display);
        assert_eq!(
            stored,
            "_xlfn.STDEV.S(D14:G14)+_xlfn.AGGREGATE(9, 6, D14:G14)+_xlfn.CEILING.MATH(M14)"
        );
        assert_eq!(strip_future_prefixes(&stored), display);
        assert_eq!(add_future_prefixes("STDEV(D14:G14)"), "STDEV(D14:G14)");
    }

    #[test]
    fn test_unknown_marked_function_keeps_its_marker() {
        let stored = "_xlfn.NEWFUNC(D14)+_xlfn.FORECAST.LINEAR(1, D14:G14, D13:G13)";
        let display = strip_future_prefixes(stored);
        assert_eq!(display, "_xlfn.NEWFUNC(D14)+FORECAST.LINEAR(1, D14:G14, D13:G13)");
        assert_eq!(add_future_prefixes(&display), stored);
    }

    #[test]
    fn test_lambda_parameters_are_marked() {
        assert_eq!(
            add_future_prefixes("MAP(D14:G14, LAMBDA(level, level * 2))"),
            "_xlfn.MAP(D14:G14, _xlfn.LAMBDA(_xlpm.level, _xlpm.level * 2))"
        );
    }
}
