// SPDX-License-Identifier: GPL-3.0-only

//! Runtime keyboard model: keys with absolute pixel geometry grouped into rows.
//!
//! A [`Layout`] loaded from a template is treated as read-only and shared;
//! the scaling engine works on deep copies of it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_settings::{
    KEYCODE_DELETE, KEYCODE_DONE, KEYCODE_LANGUAGE_SWITCH, KEYCODE_MODE_CHANGE, KEYCODE_SHIFT,
};
use crate::special_keys::SpecialKeySnapshot;

bitflags! {
    /// Boundaries of the layout a key touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EdgeFlags: u8 {
        const LEFT = 0b0001;
        const RIGHT = 0b0010;
        const TOP = 0b0100;
        const BOTTOM = 0b1000;
    }
}

/// Opaque handle to an icon owned by the host's resource system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconRef(String);

impl IconRef {
    /// Creates a handle for the named resource.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the resource name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A single key: fixed identity (its codes) plus mutable geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Key {
    codes: Vec<i32>,
    /// Display label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Icon drawn on the key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconRef>,
    /// Icon drawn in the press preview
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_preview: Option<IconRef>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Horizontal gap to the left of the key
    pub gap: i32,
    pub edge_flags: EdgeFlags,
    pub repeatable: bool,
    pub sticky: bool,
    pub modifier: bool,
}

impl Key {
    /// Creates a key with the given codes and zero geometry.
    pub fn new(codes: Vec<i32>) -> Self {
        Self {
            codes,
            label: None,
            icon: None,
            icon_preview: None,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            gap: 0,
            edge_flags: EdgeFlags::empty(),
            repeatable: false,
            sticky: false,
            modifier: false,
        }
    }

    /// Sets position and size.
    #[must_use]
    pub fn with_geometry(mut self, x: i32, y: i32, width: i32, height: i32) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the left gap.
    #[must_use]
    pub fn with_gap(mut self, gap: i32) -> Self {
        self.gap = gap;
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets both the key icon and the preview icon.
    #[must_use]
    pub fn with_icon(mut self, icon: IconRef) -> Self {
        self.icon_preview = Some(icon.clone());
        self.icon = Some(icon);
        self
    }

    /// Sets the edge flags.
    #[must_use]
    pub fn with_edge_flags(mut self, edge_flags: EdgeFlags) -> Self {
        self.edge_flags = edge_flags;
        self
    }

    /// Input codes, primary first.
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    /// The code that identifies the key.
    pub fn primary_code(&self) -> Option<i32> {
        self.codes.first().copied()
    }

    /// X coordinate just past the key's right side.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Short name for log output.
    pub fn description(&self) -> String {
        if let Some(label) = &self.label {
            return format!("'{}'", label);
        }
        match self.primary_code() {
            Some(KEYCODE_DONE) => "DONE".to_string(),
            Some(KEYCODE_MODE_CHANGE) => "MODE_CHANGE".to_string(),
            Some(KEYCODE_LANGUAGE_SWITCH) => "LANGUAGE_SWITCH".to_string(),
            Some(KEYCODE_SHIFT) => "SHIFT".to_string(),
            Some(KEYCODE_DELETE) => "DELETE".to_string(),
            Some(32) => "SPACE".to_string(),
            Some(10) => "ENTER".to_string(),
            Some(code) => format!("CODE_{}", code),
            None => "UNKNOWN".to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x={} w={} right={}",
            self.description(),
            self.x,
            self.width,
            self.right()
        )
    }
}

/// Keys sharing one y coordinate.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Row {
    pub y: i32,
    pub keys: Vec<Key>,
}

impl Row {
    /// Creates a row at `y`.
    pub fn new(y: i32, keys: Vec<Key>) -> Self {
        Self { y, keys }
    }

    /// Sum of key widths.
    pub fn width_sum(&self) -> i32 {
        self.keys.iter().map(|key| key.width).sum()
    }

    /// Furthest right edge of any key in the row.
    pub fn right_edge(&self) -> i32 {
        self.keys.iter().map(Key::right).max().unwrap_or(0)
    }
}

/// An ordered set of rows plus the width they were designed for.
///
/// `total_width` is an ordinary field: the scaling engine sets it to the
/// target width on the copies it produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub id: String,
    pub name: String,
    pub total_width: i32,
    pub rows: Vec<Row>,
    #[serde(skip)]
    saved_special_keys: Option<SpecialKeySnapshot>,
}

impl Layout {
    /// Creates a layout and records the geometry of its mode-change and
    /// language-switch keys for the unscaled visibility toggle.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        total_width: i32,
        rows: Vec<Row>,
    ) -> Self {
        let mut layout = Self {
            id: id.into(),
            name: name.into(),
            total_width,
            rows,
            saved_special_keys: None,
        };
        layout.saved_special_keys = SpecialKeySnapshot::capture(&layout);
        layout
    }

    /// Template geometry of the special keys, if both exist.
    pub fn saved_special_keys(&self) -> Option<&SpecialKeySnapshot> {
        self.saved_special_keys.as_ref()
    }

    /// All keys, row by row.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.rows.iter().flat_map(|row| row.keys.iter())
    }

    /// All keys, mutably.
    pub fn keys_mut(&mut self) -> impl Iterator<Item = &mut Key> {
        self.rows.iter_mut().flat_map(|row| row.keys.iter_mut())
    }

    /// Number of keys across all rows.
    pub fn key_count(&self) -> usize {
        self.rows.iter().map(|row| row.keys.len()).sum()
    }

    /// Returns true if the layout has no keys.
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }

    /// Height covered by the keys.
    pub fn total_height(&self) -> i32 {
        self.keys()
            .map(|key| key.y + key.height)
            .max()
            .unwrap_or(0)
    }

    /// Finds the first key whose primary code is `code`.
    pub fn find_key(&self, code: i32) -> Option<&Key> {
        self.keys().find(|key| key.primary_code() == Some(code))
    }

    /// Finds the first key whose primary code is `code`, mutably.
    pub fn find_key_mut(&mut self, code: i32) -> Option<&mut Key> {
        self.keys_mut().find(|key| key.primary_code() == Some(code))
    }

    /// Row and column of the first key whose primary code is `code`.
    pub(crate) fn locate(&self, code: i32) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(row_idx, row)| {
            row.keys
                .iter()
                .position(|key| key.primary_code() == Some(code))
                .map(|key_idx| (row_idx, key_idx))
        })
    }

    pub(crate) fn key_at_mut(&mut self, (row_idx, key_idx): (usize, usize)) -> &mut Key {
        &mut self.rows[row_idx].keys[key_idx]
    }
}

// ============================================================================
// Tests
// ============================================================================
