//! Level averaging and cut/fill volume formulas

use super::FormulaTemplate;
use crate::layout::SheetLayout;
use crate::outcome::{FormulaOutcome, VolumeKind};

/// Average of four level readings, blank when they sum to exactly zero
///
/// ```text
/// =IF(SUM(D14:G14)=0, "", AVERAGE(D14:G14))
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AverageTemplate<'a> {
    first: &'a str,
    last: &'a str,
}

impl<'a> AverageTemplate<'a> {
    /// Average over the contiguous reading columns `readings[0]..=readings[3]`
    pub fn new(readings: &'a [String; 4]) -> Self {
        Self {
            first: &readings[0],
            last: &readings[3],
        }
    }
}

impl FormulaTemplate for AverageTemplate<'_> {
    fn render(&self, row: u32) -> String {
        let range = format!("{}{row}:{}{row}", self.first, self.last);
        format!(
            "=IF(SUM({range})=0, {blank}, AVERAGE({range}))",
            blank = FormulaOutcome::Blank.formula_literal()
        )
    }
}

/// Cut or fill volume of one grid cell
///
/// Blank when both averages are blank; the depth times cell area times coverage when the
/// relevant level is higher; `"-"` otherwise.
#[derive(Debug, Clone, Copy)]
pub struct VolumeTemplate<'a> {
    kind: VolumeKind,
    layout: &'a SheetLayout,
}

impl<'a> VolumeTemplate<'a> {
    pub fn new(kind: VolumeKind, layout: &'a SheetLayout) -> Self {
        Self { kind, layout }
    }

    pub fn cut(layout: &'a SheetLayout) -> Self {
        Self::new(VolumeKind::Cut, layout)
    }

    pub fn fill(layout: &'a SheetLayout) -> Self {
        Self::new(VolumeKind::Fill, layout)
    }

    pub fn kind(&self) -> VolumeKind {
        self.kind
    }
}

impl FormulaTemplate for VolumeTemplate<'_> {
    fn render(&self, row: u32) -> String {
        let layout = self.layout;
        let outputs = &layout.outputs;
        let (high, low) = self.kind.operands();
        let blank = FormulaOutcome::Blank.formula_literal();
        let not_applicable = FormulaOutcome::NotApplicable.formula_literal();

        format!(
            "=LET(
    existing, {avg_existing}{row},
    proposed, {avg_proposed}{row},
    cellSizeHori, {size_h},
    cellSizeVert, {size_v},
    coverage, {coverage}{row},

    area, cellSizeHori * cellSizeVert,

    final, IFS(
        AND(existing = {blank}, proposed = {blank}), {blank},
        {high} > {low}, ({high} - {low}) * area * coverage,
        TRUE, {not_applicable}
    ),

    final
)",
            avg_existing = outputs.average_existing,
            avg_proposed = outputs.average_proposed,
            size_h = layout.horizontal_cell_size,
            size_v = layout.vertical_cell_size,
            coverage = layout.coverage_column,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_average_existing() {
        let layout = SheetLayout::default();
        assert_eq!(
            AverageTemplate::new(&layout.existing_columns).render(14),
            r#"=IF(SUM(D14:G14)=0, "", AVERAGE(D14:G14))"#
        );
        assert_eq!(
            AverageTemplate::new(&layout.proposed_columns).render(203),
            r#"=IF(SUM(H203:K203)=0, "", AVERAGE(H203:K203))"#
        );
    }

    #[test]
    fn test_cut_volume() {
        let layout = SheetLayout::default();
        let expected = r#"=LET(
    existing, M15,
    proposed, N15,
    cellSizeHori, $J$8,
    cellSizeVert, $J$9,
    coverage, L15,

    area, cellSizeHori * cellSizeVert,

    final, IFS(
        AND(existing = "", proposed = ""), "",
        existing > proposed, (existing - proposed) * area * coverage,
        TRUE, "-"
    ),

    final
)"#;
        assert_eq!(VolumeTemplate::cut(&layout).render(15), expected);
    }

    #[test]
    fn test_fill_volume_swaps_operands() {
        let layout = SheetLayout::default();
        let fill = VolumeTemplate::fill(&layout).render(14);

        assert!(fill.contains("proposed > existing, (proposed - existing) * area * coverage,"));
        assert!(fill.contains("existing, M14,"));
        assert!(!fill.contains("existing > proposed"));
    }

    #[test]
    fn test_volume_follows_layout() {
        let mut layout = SheetLayout::default();
        layout.outputs.average_existing = "AM".into();
        layout.horizontal_cell_size = "$B$2".into();
        layout.coverage_column = "Z".into();

        let cut = VolumeTemplate::cut(&layout).render(7);
        assert!(cut.contains("existing, AM7,"));
        assert!(cut.contains("cellSizeHori, $B$2,"));
        assert!(cut.contains("coverage, Z7,"));
    }
}
