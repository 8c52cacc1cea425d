//! Formula template builders
//!
//! A template turns a 1-based row number into formula text. Builders are plain values over a
//! borrowed [`SheetLayout`](crate::SheetLayout), so the same layout drives every column.

pub mod continuity;
pub mod earthwork;

pub use continuity::{ContinuityTemplate, Neighbour, ReadingSet};
pub use earthwork::{AverageTemplate, VolumeTemplate};

use crate::layout::SheetLayout;

/// Row number -> formula text
pub trait FormulaTemplate {
    /// Formula for `row`, including the leading `=`
    fn render(&self, row: u32) -> String;
}

impl<F> FormulaTemplate for F
where
    F: Fn(u32) -> String,
{
    fn render(&self, row: u32) -> String {
        self(row)
    }
}

/// A template bound to the column it fills
pub struct ColumnTemplate<'a> {
    pub column: &'a str,
    pub template: Box<dyn FormulaTemplate + 'a>,
}

impl std::fmt::Debug for ColumnTemplate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnTemplate")
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}

/// Average existing, average proposed, cut and fill, in write order
pub fn earthwork_columns(layout: &SheetLayout) -> Vec<ColumnTemplate<'_>> {
    let outputs = &layout.outputs;
    vec![
        ColumnTemplate {
            column: &outputs.average_existing,
            template: Box::new(AverageTemplate::new(&layout.existing_columns)),
        },
        ColumnTemplate {
            column: &outputs.average_proposed,
            template: Box::new(AverageTemplate::new(&layout.proposed_columns)),
        },
        ColumnTemplate {
            column: &outputs.cut_volume,
            template: Box::new(VolumeTemplate::cut(layout)),
        },
        ColumnTemplate {
            column: &outputs.fill_volume,
            template: Box::new(VolumeTemplate::fill(layout)),
        },
    ]
}

/// The four continuity checks, in write order
pub fn continuity_columns(layout: &SheetLayout) -> Vec<ColumnTemplate<'_>> {
    let outputs = &layout.outputs;
    [
        (&outputs.existing_vertical_continuity, ReadingSet::Existing, Neighbour::Below),
        (&outputs.proposed_vertical_continuity, ReadingSet::Proposed, Neighbour::Below),
        (&outputs.existing_horizontal_continuity, ReadingSet::Existing, Neighbour::Left),
        (&outputs.proposed_horizontal_continuity, ReadingSet::Proposed, Neighbour::Left),
    ]
    .into_iter()
    .map(|(column, readings, neighbour)| ColumnTemplate {
        column: column.as_str(),
        template: Box::new(ContinuityTemplate::new(layout, readings, neighbour)),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closures_are_templates() {
        let template = |row: u32| format!("=C{}", row);
        assert_eq!(template.render(14), "=C14");
    }

    #[test]
    fn test_column_sets_follow_layout() {
        let layout = SheetLayout::default();

        let columns: Vec<_> = earthwork_columns(&layout).iter().map(|c| c.column).collect();
        assert_eq!(columns, ["M", "N", "O", "P"]);

        let columns: Vec<_> = continuity_columns(&layout).iter().map(|c| c.column).collect();
        assert_eq!(columns, ["S", "T", "U", "V"]);
    }
}
