// SPDX-License-Identifier: GPL-3.0-only

//! Gap analysis for diagnosing layout geometry.

use crate::app_settings::{FILL_WIDTH_TOLERANCE_PX, VISIBLE_GAP_PX};
use crate::layout::Layout;

/// Geometry summary for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGapReport {
    pub row_index: usize,
    pub key_count: usize,
    /// `key[i+1].x - key[i].right()` for each neighbouring pair, in x order.
    /// Positive is a gap, negative an overlap.
    pub gaps: Vec<i32>,
    /// Rightmost key edge in the row.
    pub right_edge: i32,
    /// Pixels between the right edge and the layout width, when the row ends
    /// more than the fill tolerance short of it.
    pub shortfall: Option<i32>,
}

impl RowGapReport {
    /// Largest gap between neighbours.
    pub fn max_gap(&self) -> i32 {
        self.gaps.iter().copied().max().unwrap_or(0)
    }

    /// True when no neighbouring pair has a gap or an overlap.
    pub fn is_contiguous(&self) -> bool {
        self.gaps.iter().all(|&gap| gap == 0)
    }
}

/// Measures gaps, overlaps and right-edge shortfall for every row.
pub fn analyze_gaps(layout: &Layout) -> Vec<RowGapReport> {
    layout
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let mut keys: Vec<_> = row.keys.iter().collect();
            keys.sort_by_key(|key| key.x);

            let gaps = keys
                .windows(2)
                .map(|pair| pair[1].x - pair[0].right())
                .collect();
            let right_edge = row.right_edge();
            let missing = layout.total_width - right_edge;

            RowGapReport {
                row_index,
                key_count: row.keys.len(),
                gaps,
                right_edge,
                shortfall: (missing > FILL_WIDTH_TOLERANCE_PX).then_some(missing),
            }
        })
        .collect()
}

/// Logs the gap report at debug level, and visible gaps as warnings.
pub fn log_gap_report(layout: &Layout, phase: &str) {
    for report in analyze_gaps(layout) {
        tracing::debug!(
            phase,
            layout = %layout.id,
            row = report.row_index,
            keys = report.key_count,
            right_edge = report.right_edge,
            total_width = layout.total_width,
            "row geometry"
        );
        if report.max_gap() > VISIBLE_GAP_PX {
            tracing::warn!(
                phase,
                row = report.row_index,
                gap = report.max_gap(),
                "visible gap between keys"
            );
        }
        if let Some(missing) = report.shortfall {
            tracing::debug!(phase, row = report.row_index, missing, "row does not fill layout width");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Key, Row};

    #[test]
    fn test_analyze_reports_gaps_and_shortfall() {
        let row = Row::new(
            0,
            vec![
                Key::new(vec![1]).with_geometry(0, 0, 90, 100),
                Key::new(vec![2]).with_geometry(100, 0, 90, 100),
                Key::new(vec![3]).with_geometry(185, 0, 90, 100),
            ],
        );
        let layout = Layout::new("gaps", "Gaps", 300, vec![row]);

        let reports = analyze_gaps(&layout);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].gaps, vec![10, -5]);
        assert_eq!(reports[0].max_gap(), 10);
        assert!(!reports[0].is_contiguous());
        assert_eq!(reports[0].right_edge, 275);
        assert_eq!(reports[0].shortfall, Some(25));
    }

    #[test]
    fn test_analyze_full_row_has_no_shortfall() {
        let row = Row::new(
            0,
            vec![
                Key::new(vec![1]).with_geometry(0, 0, 150, 100),
                Key::new(vec![2]).with_geometry(150, 0, 147, 100),
            ],
        );
        let layout = Layout::new("full", "Full", 300, vec![row]);

        let report = &analyze_gaps(&layout)[0];
        assert!(report.is_contiguous());
        assert_eq!(report.shortfall, None);
    }
}
