//! Header render plan.
//!
//! Row 0 and row 1 are planned by two separate code paths:
//! - row 0 derives its column spans by scanning adjacent equal labels live,
//!   and only borrows the row span from the merge regions;
//! - row 1 resolves every cell through the first containing merge region.
//!
//! The two paths agree on regular header shapes but are kept apart on purpose
//! so irregular shapes keep rendering exactly as before.

use crate::spec::{SpecHeaderCellPlan, SpecHeaderMatrix, SpecMergeRegion};

/// Build the render plan for both header rows.
pub fn build_header_plan(
    header: &SpecHeaderMatrix,
    regions: &[SpecMergeRegion],
) -> Vec<Vec<SpecHeaderCellPlan>> {
    vec![
        plan_header_row0_live(header, regions),
        plan_header_row_from_regions(header, regions, 1),
    ]
}

/// Plan row 0 from live adjacent-equality scanning.
///
/// Blank labels render no cell. The first label of a run becomes one visible
/// cell spanning the run; its followers are hidden.
pub fn plan_header_row0_live(
    header: &SpecHeaderMatrix,
    regions: &[SpecMergeRegion],
) -> Vec<SpecHeaderCellPlan> {
    let row_labels = &header.rows()[0];
    let mut l_plan = Vec::with_capacity(row_labels.len());

    for (n_idx_col, c_label) in row_labels.iter().enumerate() {
        if c_label.is_empty() {
            l_plan.push(SpecHeaderCellPlan::hidden());
            continue;
        }
        if n_idx_col > 0 && row_labels[n_idx_col - 1] == *c_label {
            l_plan.push(SpecHeaderCellPlan::hidden());
            continue;
        }

        let n_col_span = row_labels[n_idx_col..]
            .iter()
            .take_while(|c_next| *c_next == c_label)
            .count();
        let n_row_span = find_first_region(regions, 0, n_idx_col).map_or(1, |r| r.row_span());
        l_plan.push(SpecHeaderCellPlan::spanned(c_label, n_row_span, n_col_span));
    }

    l_plan
}

/// Plan one header row purely from the merge-region list.
pub fn plan_header_row_from_regions(
    header: &SpecHeaderMatrix,
    regions: &[SpecMergeRegion],
    row_idx: usize,
) -> Vec<SpecHeaderCellPlan> {
    header.rows()[row_idx]
        .iter()
        .enumerate()
        .map(
            |(n_idx_col, c_label)| match find_first_region(regions, row_idx, n_idx_col) {
                Some(region) if region.is_anchor(row_idx, n_idx_col) => {
                    SpecHeaderCellPlan::spanned(
                        header.label(region.row_idx_start, region.col_idx_start),
                        region.row_span(),
                        region.col_span(),
                    )
                }
                Some(_) => SpecHeaderCellPlan::hidden(),
                None => SpecHeaderCellPlan::spanned(c_label, 1, 1),
            },
        )
        .collect()
}

fn find_first_region(
    regions: &[SpecMergeRegion],
    row_idx: usize,
    col_idx: usize,
) -> Option<&SpecMergeRegion> {
    regions.iter().find(|r| r.contains(row_idx, col_idx))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::merge::compute_merge_regions;

    fn header(rows: &[&[&str]]) -> SpecHeaderMatrix {
        SpecHeaderMatrix::from_labels(rows).expect("header")
    }

    #[test]
    fn test_plan_horizontal_run_with_vertical_blank_follower() {
        let h = header(&[&["A", "A", "B"], &["x", "", "y"]]);
        let regions = compute_merge_regions(&h);
        let plan = build_header_plan(&h, &regions);

        assert_eq!(
            plan[0],
            vec![
                SpecHeaderCellPlan::spanned("A", 1, 2),
                SpecHeaderCellPlan::hidden(),
                SpecHeaderCellPlan::spanned("B", 1, 1),
            ]
        );
        assert_eq!(
            plan[1],
            vec![
                SpecHeaderCellPlan::spanned("x", 1, 1),
                SpecHeaderCellPlan::hidden(),
                SpecHeaderCellPlan::spanned("y", 1, 1),
            ]
        );
    }

    #[test]
    fn test_plan_pulls_label_down_over_blank_row1() {
        let h = header(&[
            &["No", "Name", "Score", "Score"],
            &["", "", "pre", "post"],
        ]);
        let plan = build_header_plan(&h, &compute_merge_regions(&h));

        assert_eq!(
            plan[0],
            vec![
                SpecHeaderCellPlan::spanned("No", 2, 1),
                SpecHeaderCellPlan::spanned("Name", 2, 1),
                SpecHeaderCellPlan::spanned("Score", 1, 2),
                SpecHeaderCellPlan::hidden(),
            ]
        );
        assert_eq!(
            plan[1],
            vec![
                SpecHeaderCellPlan::hidden(),
                SpecHeaderCellPlan::hidden(),
                SpecHeaderCellPlan::spanned("pre", 1, 1),
                SpecHeaderCellPlan::spanned("post", 1, 1),
            ]
        );
    }

    #[test]
    fn test_row0_blank_label_renders_nothing() {
        let h = header(&[&["", "A"], &["x", "y"]]);
        let plan = plan_header_row0_live(&h, &compute_merge_regions(&h));
        assert_eq!(
            plan,
            vec![
                SpecHeaderCellPlan::hidden(),
                SpecHeaderCellPlan::spanned("A", 1, 1)
            ]
        );
    }

    #[test]
    fn test_row0_col_span_ignores_region_list() {
        let h = header(&[&["A", "A", "A"], &["x", "y", "z"]]);

        let plan_live = plan_header_row0_live(&h, &[]);
        assert_eq!(plan_live[0], SpecHeaderCellPlan::spanned("A", 1, 3));

        let plan_regions = plan_header_row_from_regions(&h, &[], 0);
        assert_eq!(plan_regions[0], SpecHeaderCellPlan::spanned("A", 1, 1));
        assert_eq!(plan_regions[1], SpecHeaderCellPlan::spanned("A", 1, 1));
    }

    #[test]
    fn test_region_path_agrees_with_live_path_on_regular_row0() {
        let h = header(&[&["A", "A", "B", "C", "C"], &["p", "q", "", "r", "s"]]);
        let regions = compute_merge_regions(&h);
        assert_eq!(
            plan_header_row0_live(&h, &regions),
            plan_header_row_from_regions(&h, &regions, 0)
        );
    }

    #[test]
    fn test_row1_uses_first_matching_region() {
        let h = header(&[&["A", "A"], &["", ""]]);
        let regions = compute_merge_regions(&h);
        let plan = build_header_plan(&h, &regions);

        assert_eq!(plan[0][0], SpecHeaderCellPlan::spanned("A", 1, 2));
        assert_eq!(plan[1], vec![SpecHeaderCellPlan::hidden(); 2]);
    }

    fn header_strategy() -> impl Strategy<Value = SpecHeaderMatrix> {
        (1usize..10)
            .prop_flat_map(|n_width| {
                (
                    prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), n_width),
                    prop::collection::vec(prop::sample::select(vec!["", "x", "y"]), n_width),
                )
            })
            .prop_map(|(row0, mut row1)| {
                for n_idx_col in 0..row0.len() {
                    let if_in_run = (n_idx_col > 0 && row0[n_idx_col - 1] == row0[n_idx_col])
                        || (n_idx_col + 1 < row0.len() && row0[n_idx_col + 1] == row0[n_idx_col]);
                    if if_in_run && row1[n_idx_col].is_empty() {
                        row1[n_idx_col] = "x";
                    }
                }
                SpecHeaderMatrix::from_labels(&[row0.as_slice(), row1.as_slice()])
                    .expect("header")
            })
    }

    proptest! {
        #[test]
        fn prop_visible_spans_cover_every_column(h in header_strategy()) {
            let plan = build_header_plan(&h, &compute_merge_regions(&h));

            let n_row0: usize = plan[0].iter().filter(|c| c.visible).map(|c| c.col_span).sum();
            prop_assert_eq!(n_row0, h.width());

            let n_row1_own: usize = plan[1].iter().filter(|c| c.visible).map(|c| c.col_span).sum();
            let n_row1_from_above: usize = plan[0]
                .iter()
                .filter(|c| c.visible && c.row_span == 2)
                .map(|c| c.col_span)
                .sum();
            prop_assert_eq!(n_row1_own + n_row1_from_above, h.width());
        }

        #[test]
        fn prop_region_shapes(h in header_strategy()) {
            for region in compute_merge_regions(&h) {
                if region.row_idx_end == 0 {
                    prop_assert_eq!(region.row_idx_start, 0);
                    prop_assert!(region.col_span() >= 2);
                } else {
                    prop_assert_eq!(region.col_idx_start, region.col_idx_end);
                    prop_assert_eq!((region.row_idx_start, region.row_idx_end), (0, 1));
                }
            }
        }

        #[test]
        fn prop_regions_are_idempotent_across_instances(h in header_strategy()) {
            let h_copy = SpecHeaderMatrix::new(h.rows().to_vec()).expect("header");
            prop_assert_eq!(compute_merge_regions(&h), compute_merge_regions(&h_copy));
        }
    }
}
