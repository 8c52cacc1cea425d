//! Content a read finds that [`XlsxWriter`](crate::XlsxWriter) does not write back

use std::collections::BTreeSet;
use std::fmt;

use quick_xml::events::BytesStart;

/// Parts the writer regenerates from the cell model
const REPRODUCED_PARTS: &[&str] = &[
    "[Content_Types].xml",
    "_rels/.rels",
    "xl/workbook.xml",
    "xl/_rels/workbook.xml.rels",
    // Strings are written inline
    "xl/sharedStrings.xml",
    // Rebuilt on load
    "xl/calcChain.xml",
];

/// Worksheet elements the writer never emits, with the feature they carry
const SHEET_FEATURES: &[(&[u8], &str)] = &[
    (b"autoFilter", "filters"),
    (b"cols", "column widths"),
    (b"conditionalFormatting", "conditional formatting"),
    (b"dataValidations", "data validation"),
    (b"drawing", "drawings"),
    (b"hyperlinks", "hyperlinks"),
    (b"legacyDrawing", "comments"),
    (b"mergeCells", "merged cells"),
    (b"pane", "frozen panes"),
    (b"sheetProtection", "sheet protection"),
    (b"tableParts", "tables"),
];

/// Everything a saved copy would lose, one entry per part or per sheet feature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsupportedContent {
    entries: BTreeSet<String>,
}

impl UnsupportedContent {
    /// Nothing would be lost
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in sorted order, e.g. `part xl/styles.xml` or `sheet 'Survey': merged cells`
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Record a package part unless the writer reproduces it; `sheet_parts` are the
    /// worksheets that were read.
    pub(crate) fn note_part(&mut self, part: &str, sheet_parts: &[String]) {
        if part.ends_with('/')
            || REPRODUCED_PARTS.contains(&part)
            || sheet_parts.iter().any(|p| p == part)
        {
            return;
        }
        self.entries.insert(format!("part {}", part));
    }

    pub(crate) fn note_workbook(&mut self, feature: &str) {
        self.entries.insert(format!("workbook: {}", feature));
    }

    /// Record the feature carried by a worksheet element, if the writer drops it
    pub(crate) fn note_sheet_element(&mut self, sheet: &str, e: &BytesStart<'_>) {
        let name = e.name();
        let feature = match name.as_ref() {
            b"c" if has_attr(e, b"s", |v| v != "0") => Some("cell styles"),
            b"row" if has_attr(e, b"customHeight", |v| v == "1" || v == "true") => {
                Some("row heights")
            }
            other => SHEET_FEATURES
                .iter()
                .find(|(element, _)| *element == other)
                .map(|(_, feature)| *feature),
        };
        if let Some(feature) = feature {
            self.entries.insert(format!("sheet '{}': {}", sheet, feature));
        }
    }
}

impl fmt::Display for UnsupportedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl FromIterator<String> for UnsupportedContent {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn has_attr(e: &BytesStart<'_>, key: &[u8], pred: impl Fn(&str) -> bool) -> bool {
    e.attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == key && attr.unescape_value().is_ok_and(|v| pred(&*v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reproduced_parts_are_not_reported() {
        let sheets = vec!["xl/worksheets/sheet1.xml".to_string()];
        let mut content = UnsupportedContent::default();
        for part in [
            "[Content_Types].xml",
            "xl/",
            "xl/workbook.xml",
            "xl/sharedStrings.xml",
            "xl/worksheets/sheet1.xml",
            "xl/styles.xml",
            "xl/worksheets/_rels/sheet1.xml.rels",
        ] {
            content.note_part(part, &sheets);
        }

        assert_eq!(
            content.iter().collect::<Vec<_>>(),
            ["part xl/styles.xml", "part xl/worksheets/_rels/sheet1.xml.rels"]
        );
    }

    #[test]
    fn test_sheet_elements() {
        let mut content = UnsupportedContent::default();
        content.note_sheet_element("Survey", &BytesStart::from_content(r#"c r="A1" s="0""#, 1));
        content.note_sheet_element("Survey", &BytesStart::from_content(r#"row r="2" ht="15""#, 3));
        assert!(content.is_empty());

        content.note_sheet_element("Survey", &BytesStart::from_content(r#"c r="C14" s="4""#, 1));
        content.note_sheet_element("Survey", &BytesStart::new("mergeCells"));
        content.note_sheet_element("Survey", &BytesStart::new("mergeCells"));

        assert_eq!(content.len(), 2);
        assert_eq!(
            content.to_string(),
            "sheet 'Survey': cell styles, sheet 'Survey': merged cells"
        );
    }
}
