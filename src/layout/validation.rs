// SPDX-License-Identifier: GPL-3.0-only

//! Validation rules for resolved keyboard layouts.
//!
//! Validation is permissive: geometry problems are collected as warnings and
//! the layout is still returned. Only problems that would break scaling or the
//! special-key toggle are fatal.

use crate::app_settings::{KEYCODE_LANGUAGE_SWITCH, KEYCODE_MODE_CHANGE};
use crate::layout::model::{EdgeFlags, Key, Layout};
use crate::layout::types::{
    ParseError, ParsedLayout, Severity, TemplateSource, ValidationIssue,
};

/// Validates a layout and returns it with warnings.
///
/// Fatal issues produce a [`ParseError::Invalid`] that carries every
/// issue found, warnings included.
pub fn validate_layout(layout: Layout) -> Result<ParsedLayout, ParseError> {
    let mut issues = Vec::new();

    validate_required_fields(&layout, &mut issues);
    validate_key_geometry(&layout, &mut issues);
    validate_fill_rows(&layout, &mut issues);
    validate_special_keys(&layout, &mut issues);

    if issues.iter().any(ValidationIssue::is_error) {
        tracing::warn!(
            layout = %layout.id,
            errors = issues.iter().filter(|issue| issue.is_error()).count(),
            "layout failed validation"
        );
        return Err(ParseError::Invalid {
            origin: TemplateSource::Inline,
            issues: sort_issues(issues),
        });
    }

    Ok(collect_warnings(layout, issues))
}

/// Checks the layout-level fields.
pub fn validate_required_fields(layout: &Layout, issues: &mut Vec<ValidationIssue>) {
    if layout.name.is_empty() {
        issues.push(
            ValidationIssue::warning("Layout name is empty", "name")
                .with_hint("Provide a descriptive name for the layout"),
        );
    }

    if layout.total_width <= 0 {
        issues.push(
            ValidationIssue::error(
                format!("Total width {} must be positive", layout.total_width),
                "total_width",
            )
            .with_hint("Set total_width to the width the template was designed for"),
        );
    }

    if layout.rows.is_empty() {
        issues.push(ValidationIssue::warning("Layout has no rows", "rows"));
    }
}

/// Checks codes and geometry of every key.
pub fn validate_key_geometry(layout: &Layout, issues: &mut Vec<ValidationIssue>) {
    for (row_idx, row) in layout.rows.iter().enumerate() {
        for (key_idx, key) in row.keys.iter().enumerate() {
            let key_path = format!("rows[{}].keys[{}]", row_idx, key_idx);
            validate_key(key, &key_path, layout.total_width, issues);
        }
    }
}

fn validate_key(key: &Key, key_path: &str, total_width: i32, issues: &mut Vec<ValidationIssue>) {
    if key.codes().is_empty() {
        issues.push(
            ValidationIssue::error("Key has no codes", format!("{}.codes", key_path))
                .with_hint("Give every key at least one code; the first is its identity"),
        );
    }

    if key.width <= 0 {
        issues.push(ValidationIssue::warning(
            format!("Key {} has non-positive width {}", key.description(), key.width),
            format!("{}.width", key_path),
        ));
    }

    if key.height <= 0 {
        issues.push(ValidationIssue::warning(
            format!("Key {} has non-positive height {}", key.description(), key.height),
            format!("{}.height", key_path),
        ));
    }

    if key.x < 0 {
        issues.push(ValidationIssue::warning(
            format!("Key {} starts left of the layout at x={}", key.description(), key.x),
            format!("{}.x", key_path),
        ));
    }

    if total_width > 0 && key.right() > total_width {
        issues.push(
            ValidationIssue::warning(
                format!(
                    "Key {} ends at {}, past the layout width {}",
                    key.description(),
                    key.right(),
                    total_width
                ),
                key_path,
            )
            .with_hint("Reduce the key width or increase total_width"),
        );
    }
}

/// Warns about rows that look fill-width but will not be stretched when scaled.
pub fn validate_fill_rows(layout: &Layout, issues: &mut Vec<ValidationIssue>) {
    for (row_idx, row) in layout.rows.iter().enumerate() {
        let (Some(first), Some(last)) = (row.keys.first(), row.keys.last()) else {
            continue;
        };
        if first.x == 0 && !last.edge_flags.contains(EdgeFlags::RIGHT) {
            issues.push(
                ValidationIssue::warning(
                    "Row starts at the left edge but its last key has no RIGHT edge flag",
                    format!("rows[{}].keys[{}].edge_flags", row_idx, row.keys.len() - 1),
                )
                .with_hint("Add \"right\" to edge_flags so the row fills the width when scaled"),
            );
        }
    }
}

/// Checks the mode-change and language-switch keys.
///
/// A missing key only disables the visibility toggle. A duplicated one is
/// fatal because the toggle could resize the wrong key.
pub fn validate_special_keys(layout: &Layout, issues: &mut Vec<ValidationIssue>) {
    for (code, name) in [
        (KEYCODE_MODE_CHANGE, "mode-change"),
        (KEYCODE_LANGUAGE_SWITCH, "language-switch"),
    ] {
        let paths: Vec<String> = layout
            .rows
            .iter()
            .enumerate()
            .flat_map(|(row_idx, row)| {
                row.keys
                    .iter()
                    .enumerate()
                    .filter(|(_, key)| key.primary_code() == Some(code))
                    .map(move |(key_idx, _)| format!("rows[{}].keys[{}]", row_idx, key_idx))
            })
            .collect();

        match paths.len() {
            0 => issues.push(
                ValidationIssue::warning(
                    format!("Layout has no {} key (code {})", name, code),
                    "rows",
                )
                .with_hint("Language switch visibility cannot be toggled without it"),
            ),
            1 => {}
            _ => issues.push(ValidationIssue::error(
                format!("{} key (code {}) appears {} times", name, code, paths.len()),
                paths.join(", "),
            )),
        }
    }
}

fn sort_issues(mut issues: Vec<ValidationIssue>) -> Vec<ValidationIssue> {
    issues.sort_by(|a, b| match (a.severity, b.severity) {
        (Severity::Error, Severity::Warning) => std::cmp::Ordering::Less,
        (Severity::Warning, Severity::Error) => std::cmp::Ordering::Greater,
        _ => a.field_path.cmp(&b.field_path),
    });
    issues
}

/// Wraps a layout that passed validation together with its warnings.
pub fn collect_warnings(layout: Layout, warnings: Vec<ValidationIssue>) -> ParsedLayout {
    for warning in &warnings {
        tracing::debug!(layout = %layout.id, "{}", warning);
    }
    ParsedLayout {
        layout,
        warnings: sort_issues(warnings),
    }
}

// ============================================================================
// Tests
// ============================================================================
