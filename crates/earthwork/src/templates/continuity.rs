//! Topographic continuity checks
//!
//! Adjacent grid cells share an edge, so the two corner readings on that edge must agree.
//! Each check looks the neighbour up by its identifier in the identifier column and compares
//! the shared corners. Readings are numbered 1 to 4 in column order:
//!
//! ```text
//! 1 ---- 2
//! |      |
//! 3 ---- 4
//! ```
//!
//! A cell's bottom edge (3, 4) meets the top edge (1, 2) of the cell below it, and its left
//! edge (1, 3) meets the right edge (2, 4) of the cell to its left. The result is `TRUE` or
//! `FALSE`, or `"-"` when no neighbour exists.
//!
//! The left neighbour is found by stepping the identifier's first character back one code
//! point, which only holds for single-letter grid columns.

use std::fmt;

use super::FormulaTemplate;
use crate::layout::SheetLayout;
use crate::outcome::FormulaOutcome;

/// Which set of four level readings a check compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingSet {
    Existing,
    Proposed,
}

impl ReadingSet {
    /// Short tag used in the formula's variable names
    pub fn tag(self) -> &'static str {
        match self {
            ReadingSet::Existing => "Ex",
            ReadingSet::Proposed => "Pr",
        }
    }

    /// The four reading columns of this set
    pub fn columns(self, layout: &SheetLayout) -> &[String; 4] {
        match self {
            ReadingSet::Existing => &layout.existing_columns,
            ReadingSet::Proposed => &layout.proposed_columns,
        }
    }
}

impl fmt::Display for ReadingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingSet::Existing => write!(f, "existing"),
            ReadingSet::Proposed => write!(f, "proposed"),
        }
    }
}

/// Which adjacent cell a check compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbour {
    /// Same grid column, next row (vertical continuity)
    Below,
    /// Previous grid column, same row (horizontal continuity)
    Left,
}

impl Neighbour {
    /// Zero-based reading positions on the shared edge: `(current cell, neighbour)`
    fn shared_edge(self) -> ([usize; 2], [usize; 2]) {
        match self {
            Neighbour::Below => ([2, 3], [0, 1]),
            Neighbour::Left => ([0, 2], [1, 3]),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Neighbour::Below => "below",
            Neighbour::Left => "left",
        }
    }
}

/// Continuity check of one reading set against one neighbour
#[derive(Debug, Clone, Copy)]
pub struct ContinuityTemplate<'a> {
    layout: &'a SheetLayout,
    readings: ReadingSet,
    neighbour: Neighbour,
}

impl<'a> ContinuityTemplate<'a> {
    pub fn new(layout: &'a SheetLayout, readings: ReadingSet, neighbour: Neighbour) -> Self {
        Self {
            layout,
            readings,
            neighbour,
        }
    }

    pub fn readings(&self) -> ReadingSet {
        self.readings
    }

    pub fn neighbour(&self) -> Neighbour {
        self.neighbour
    }

    /// Lines deriving the neighbour's identifier and the variable holding it
    fn neighbour_id(&self) -> (String, &'static str) {
        let pattern = "0".repeat(self.layout.identifier_row_digits);
        match self.neighbour {
            Neighbour::Below => (
                format!("    downID, colLetter & TEXT(rowNumber + 1, \"{pattern}\"),"),
                "downID",
            ),
            Neighbour::Left => (
                format!(
                    "    leftColLetter, CHAR(CODE(colLetter) - 1),\n    \
                     leftID, leftColLetter & TEXT(rowNumber, \"{pattern}\"),"
                ),
                "leftID",
            ),
        }
    }
}

impl FormulaTemplate for ContinuityTemplate<'_> {
    fn render(&self, row: u32) -> String {
        let id_column = &self.layout.identifier_column;
        let columns = self.readings.columns(self.layout);
        let tag = self.readings.tag();
        let (current_edge, neighbour_edge) = self.neighbour.shared_edge();
        let prefix = self.neighbour.prefix();

        let current = current_edge.map(|i| format!("current_{tag}{}", i + 1));
        let adjacent = neighbour_edge.map(|i| format!("{prefix}_{tag}{}", i + 1));
        let (id_lines, id_name) = self.neighbour_id();

        format!(
            "=LET(
    currentID, {id_column}{row},
    {c0}, {c0_col}{row},
    {c1}, {c1_col}{row},

    colLetter, LEFT(currentID, 1),
    rowNumber, VALUE(MID(currentID, 2, LEN(currentID)-1)),
{id_lines}

    matchRow, XMATCH({id_name}, {id_column}:{id_column}, 0),

    {a0}, INDEX({a0_col}:{a0_col}, matchRow),
    {a1}, INDEX({a1_col}:{a1_col}, matchRow),

    isMatch, AND({c0} = {a0}, {c1} = {a1}),
    result, IF(ISNUMBER(matchRow), isMatch, {not_applicable}),

    result
)",
            c0 = current[0],
            c1 = current[1],
            c0_col = columns[current_edge[0]],
            c1_col = columns[current_edge[1]],
            a0 = adjacent[0],
            a1 = adjacent[1],
            a0_col = columns[neighbour_edge[0]],
            a1_col = columns[neighbour_edge[1]],
            not_applicable = FormulaOutcome::NotApplicable.formula_literal(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_existing_below() {
        let layout = SheetLayout::default();
        let expected = r#"=LET(
    currentID, C14,
    current_Ex3, F14,
    current_Ex4, G14,

    colLetter, LEFT(currentID, 1),
    rowNumber, VALUE(MID(currentID, 2, LEN(currentID)-1)),
    downID, colLetter & TEXT(rowNumber + 1, "00"),

    matchRow, XMATCH(downID, C:C, 0),

    below_Ex1, INDEX(D:D, matchRow),
    below_Ex2, INDEX(E:E, matchRow),

    isMatch, AND(current_Ex3 = below_Ex1, current_Ex4 = below_Ex2),
    result, IF(ISNUMBER(matchRow), isMatch, "-"),

    result
)"#;
        let template = ContinuityTemplate::new(&layout, ReadingSet::Existing, Neighbour::Below);
        assert_eq!(template.render(14), expected);
    }

    #[test]
    fn test_proposed_left() {
        let layout = SheetLayout::default();
        let expected = r#"=LET(
    currentID, C20,
    current_Pr1, H20,
    current_Pr3, J20,

    colLetter, LEFT(currentID, 1),
    rowNumber, VALUE(MID(currentID, 2, LEN(currentID)-1)),
    leftColLetter, CHAR(CODE(colLetter) - 1),
    leftID, leftColLetter & TEXT(rowNumber, "00"),

    matchRow, XMATCH(leftID, C:C, 0),

    left_Pr2, INDEX(I:I, matchRow),
    left_Pr4, INDEX(K:K, matchRow),

    isMatch, AND(current_Pr1 = left_Pr2, current_Pr3 = left_Pr4),
    result, IF(ISNUMBER(matchRow), isMatch, "-"),

    result
)"#;
        let template = ContinuityTemplate::new(&layout, ReadingSet::Proposed, Neighbour::Left);
        assert_eq!(template.render(20), expected);
    }

    #[test]
    fn test_proposed_below_and_existing_left_edges() {
        let layout = SheetLayout::default();

        let below = ContinuityTemplate::new(&layout, ReadingSet::Proposed, Neighbour::Below);
        let text = below.render(14);
        assert!(text.contains("current_Pr3, J14,"));
        assert!(text.contains("current_Pr4, K14,"));
        assert!(text.contains("below_Pr1, INDEX(H:H, matchRow),"));
        assert!(text.contains("below_Pr2, INDEX(I:I, matchRow),"));

        let left = ContinuityTemplate::new(&layout, ReadingSet::Existing, Neighbour::Left);
        let text = left.render(14);
        assert!(text.contains("current_Ex1, D14,"));
        assert!(text.contains("current_Ex3, F14,"));
        assert!(text.contains("left_Ex2, INDEX(E:E, matchRow),"));
        assert!(text.contains("left_Ex4, INDEX(G:G, matchRow),"));
        assert!(text.contains("isMatch, AND(current_Ex1 = left_Ex2, current_Ex3 = left_Ex4),"));
    }

    #[test]
    fn test_identifier_settings_follow_layout() {
        let mut layout = SheetLayout::default();
        layout.identifier_column = "B".into();
        layout.identifier_row_digits = 1;

        let text =
            ContinuityTemplate::new(&layout, ReadingSet::Existing, Neighbour::Below).render(9);
        assert!(text.contains("currentID, B9,"));
        assert!(text.contains(r#"TEXT(rowNumber + 1, "0")"#));
        assert!(text.contains("XMATCH(downID, B:B, 0)"));
    }
}
