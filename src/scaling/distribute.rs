// SPDX-License-Identifier: GPL-3.0-only

//! Row grouping and per-row width redistribution.
//!
//! After every key has been multiplied by the scale factor and floored, rows
//! carry rounding error: small gaps between keys and a right edge that falls
//! short of the target width. The functions here close the gaps and, for rows
//! that span the full layout, push the residue into the widest keys.

use std::collections::BTreeMap;

use crate::layout::{EdgeFlags, Key, Row};

/// Groups keys into rows by shared `y`, top to bottom, each sorted by `x`.
///
/// Sorting is stable, so keys with equal `x` keep their relative order.
pub fn group_rows(keys: impl IntoIterator<Item = Key>) -> Vec<Row> {
    let mut by_y: BTreeMap<i32, Vec<Key>> = BTreeMap::new();
    for key in keys {
        by_y.entry(key.y).or_default().push(key);
    }

    by_y.into_iter()
        .map(|(y, mut keys)| {
            keys.sort_by_key(|key| key.x);
            Row::new(y, keys)
        })
        .collect()
}

/// A row spans the full layout when its first key starts at (about) zero and
/// its last key carries the RIGHT edge flag.
pub fn is_fill_width(row: &Row, tolerance: i32) -> bool {
    match (row.keys.first(), row.keys.last()) {
        (Some(first), Some(last)) => {
            first.x.abs() <= tolerance && last.edge_flags.contains(EdgeFlags::RIGHT)
        }
        _ => false,
    }
}

/// Stretches or shrinks a fill-width row so it ends exactly at `target_width`,
/// then makes it contiguous. Other rows are only made contiguous.
///
/// The first key's `x` never moves, so the widths of a fill-width row must sum
/// to `target_width - first.x`.
pub fn distribute_row(row: &mut Row, target_width: i32, tolerance: i32, row_index: usize) {
    let Some(first_x) = row.keys.first().map(|key| key.x) else {
        return;
    };

    if is_fill_width(row, tolerance) {
        let row_target = target_width - first_x;
        let difference = row_target - row.width_sum();
        tracing::debug!(
            row = row_index,
            keys = row.keys.len(),
            difference,
            "distributing fill-width row"
        );
        if difference != 0 {
            spread_difference(&mut row.keys, difference);
        }
    } else {
        tracing::debug!(row = row_index, "row does not fill width, closing gaps only");
    }

    make_adjacent(row);
}

/// Adds `difference` pixels to the keys' widths, widest keys first.
///
/// While `|remaining| >= key count` every key takes an even share; after that
/// the remainder goes out one pixel at a time. Widths never go below zero.
pub fn spread_difference(keys: &mut [Key], difference: i32) {
    if keys.is_empty() {
        return;
    }

    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[b].width.cmp(&keys[a].width));

    let count = order.len() as i32;
    let mut remaining = difference;

    while remaining != 0 {
        let before = remaining;

        for &idx in &order {
            if remaining == 0 {
                break;
            }

            let mut adjustment = if remaining.abs() >= count {
                remaining / count
            } else {
                remaining.signum()
            };
            if keys[idx].width + adjustment < 0 {
                adjustment = -keys[idx].width;
            }

            keys[idx].width += adjustment;
            remaining -= adjustment;
            if adjustment != 0 {
                tracing::trace!(key = %keys[idx], adjustment, "adjusted key width");
            }
        }

        if remaining == before {
            tracing::warn!(remaining, "could not distribute remaining width");
            break;
        }
    }
}

/// Places each key directly after its left neighbour and clears all gaps.
pub fn make_adjacent(row: &mut Row) {
    let mut next_x = None;
    for key in &mut row.keys {
        if let Some(x) = next_x {
            if key.x != x {
                tracing::trace!(key = %key, to = x, "moved key");
                key.x = x;
            }
        }
        key.gap = 0;
        next_x = Some(key.x + key.width);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: i32, x: i32, y: i32, width: i32) -> Key {
        Key::new(vec![code]).with_geometry(x, y, width, 100)
    }

    /// Test 1: Keys are grouped by y and sorted by x regardless of input order
    #[test]
    fn test_group_rows_sorts_by_x() {
        let rows = group_rows(vec![
            key(3, 200, 100, 100),
            key(1, 0, 0, 100),
            key(4, 0, 100, 100),
            key(2, 100, 0, 100),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].y, 0);
        assert_eq!(rows[1].y, 100);
        let codes: Vec<i32> = rows[1].keys.iter().filter_map(Key::primary_code).collect();
        assert_eq!(codes, vec![4, 3]);
    }

    /// Test 2: Fill-width needs both the left tolerance and the RIGHT flag
    #[test]
    fn test_is_fill_width() {
        let mut row = Row::new(0, vec![key(1, 4, 0, 100), key(2, 104, 0, 100)]);
        assert!(!is_fill_width(&row, 5));

        row.keys[1].edge_flags = EdgeFlags::RIGHT;
        assert!(is_fill_width(&row, 5));

        row.keys[0].x = 6;
        assert!(!is_fill_width(&row, 5));

        assert!(!is_fill_width(&Row::default(), 5));
    }

    /// Test 3: Widest keys take the remainder first
    #[test]
    fn test_spread_prefers_widest_keys() {
        let mut keys = vec![key(1, 0, 0, 50), key(2, 0, 0, 300), key(3, 0, 0, 50)];
        spread_difference(&mut keys, 2);

        let widths: Vec<i32> = keys.iter().map(|k| k.width).collect();
        assert_eq!(widths, vec![51, 301, 50]);
    }

    /// Test 4: Large differences are shared in chunks and fully used up
    #[test]
    fn test_spread_large_difference() {
        let mut keys = vec![key(1, 0, 0, 10), key(2, 0, 0, 10)];
        spread_difference(&mut keys, 7);

        let total: i32 = keys.iter().map(|k| k.width).sum();
        assert_eq!(total, 27);
    }

    /// Test 5: Shrinking never produces negative widths
    #[test]
    fn test_spread_negative_difference() {
        let mut keys = vec![key(1, 0, 0, 1), key(2, 0, 0, 20)];
        spread_difference(&mut keys, -19);

        assert!(keys.iter().all(|k| k.width >= 0));
        let total: i32 = keys.iter().map(|k| k.width).sum();
        assert_eq!(total, 2);
    }

    /// Test 6: Non-fill rows become contiguous but keep their widths
    #[test]
    fn test_distribute_non_fill_row() {
        let mut row = Row::new(0, vec![key(1, 50, 0, 90), key(2, 145, 0, 90)]);
        row.keys[1].gap = 5;
        distribute_row(&mut row, 1000, 5, 0);

        assert_eq!(row.keys[0].x, 50);
        assert_eq!(row.keys[1].x, 140);
        assert_eq!(row.keys[1].width, 90);
        assert!(row.keys.iter().all(|k| k.gap == 0));
    }

    /// Test 7: Fill-width rows starting off zero still end at the target
    #[test]
    fn test_distribute_fill_row_with_offset() {
        let mut row = Row::new(0, vec![key(1, 3, 0, 100), key(2, 103, 0, 100)]);
        row.keys[1].edge_flags = EdgeFlags::RIGHT;
        distribute_row(&mut row, 250, 5, 0);

        assert_eq!(row.keys[0].x, 3);
        assert_eq!(row.keys[1].right(), 250);
    }
}
