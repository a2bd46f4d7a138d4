// SPDX-License-Identifier: GPL-3.0-only

//! Language-switch key visibility on scaled layouts.
//!
//! Hiding the language-switch key collapses it to zero width and lets the
//! mode-change key to its left absorb the space. Showing it restores both keys.
//! On a scaled layout the restore values come from a [`SpecialKeySnapshot`]
//! taken right after scaling; the template's own saved geometry would be wrong
//! at any other width.

use crate::app_settings::{KEYCODE_LANGUAGE_SWITCH, KEYCODE_MODE_CHANGE};
use crate::layout::{IconRef, Key, Layout};
use crate::scaling::ScaledLayout;

/// Captured geometry and icons of one special key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyProperties {
    pub x: i32,
    pub width: i32,
    pub icon: Option<IconRef>,
    pub icon_preview: Option<IconRef>,
}

impl KeyProperties {
    fn of(key: &Key) -> Self {
        Self {
            x: key.x,
            width: key.width,
            icon: key.icon.clone(),
            icon_preview: key.icon_preview.clone(),
        }
    }
}

/// Geometry of the mode-change and language-switch keys at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialKeySnapshot {
    pub mode_change: KeyProperties,
    pub language_switch: KeyProperties,
}

impl SpecialKeySnapshot {
    /// Captures both special keys, or `None` if either is missing.
    pub fn capture(layout: &Layout) -> Option<Self> {
        let mode_change = layout.find_key(KEYCODE_MODE_CHANGE)?;
        let language_switch = layout.find_key(KEYCODE_LANGUAGE_SWITCH)?;
        Some(Self {
            mode_change: KeyProperties::of(mode_change),
            language_switch: KeyProperties::of(language_switch),
        })
    }

    /// Applies the show/hide arithmetic to the live keys of `layout`.
    ///
    /// Keys are looked up on every call. Returns `false` without touching
    /// anything if either key is missing.
    fn apply(&self, layout: &mut Layout, visible: bool) -> bool {
        let (Some(mode_pos), Some(lang_pos)) = (
            layout.locate(KEYCODE_MODE_CHANGE),
            layout.locate(KEYCODE_LANGUAGE_SWITCH),
        ) else {
            return false;
        };

        let mode_change = layout.key_at_mut(mode_pos);
        if visible {
            mode_change.x = self.mode_change.x;
            mode_change.width = self.mode_change.width;
        } else {
            mode_change.width = self.mode_change.width + self.language_switch.width;
        }
        tracing::debug!(key = %mode_change, visible, "adjusted mode change key");

        let language_switch = layout.key_at_mut(lang_pos);
        if visible {
            language_switch.width = self.language_switch.width;
            language_switch.icon = self.language_switch.icon.clone();
            language_switch.icon_preview = self.language_switch.icon_preview.clone();
        } else {
            language_switch.width = 0;
            language_switch.icon = None;
            language_switch.icon_preview = None;
        }
        tracing::debug!(key = %language_switch, visible, "adjusted language switch key");

        true
    }
}

/// Which toggle path ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Restored from the post-scale snapshot
    Scaled,
    /// Fell back to the layout's saved template geometry
    Base,
    /// Neither path could find the keys; nothing changed
    Unchanged,
}

impl Layout {
    /// Shows or hides the language-switch key using the geometry recorded
    /// when this layout was built from its template.
    pub fn set_language_switch_visibility(&mut self, visible: bool) -> ToggleOutcome {
        let Some(saved) = self.saved_special_keys().cloned() else {
            tracing::warn!(layout = %self.id, "no saved special keys, visibility unchanged");
            return ToggleOutcome::Unchanged;
        };
        if saved.apply(self, visible) {
            ToggleOutcome::Base
        } else {
            tracing::warn!(layout = %self.id, "special keys not found, visibility unchanged");
            ToggleOutcome::Unchanged
        }
    }
}

/// Shows or hides the language-switch key of a scaled layout.
///
/// Unscaled layouts, and scaled ones whose snapshot or live keys are missing,
/// take the base path on [`Layout::set_language_switch_visibility`].
pub fn toggle_language_switch(scaled: &mut ScaledLayout, visible: bool) -> ToggleOutcome {
    if scaled.is_identity() {
        tracing::debug!(visible, "no scaling applied, using base toggle");
        return scaled.layout_mut().set_language_switch_visibility(visible);
    }

    let (layout, snapshot) = scaled.parts_mut();
    let Some(snapshot) = snapshot else {
        tracing::warn!(layout = %layout.id, "no scaled snapshot, falling back to base toggle");
        return layout.set_language_switch_visibility(visible);
    };

    if snapshot.apply(layout, visible) {
        ToggleOutcome::Scaled
    } else {
        tracing::warn!(layout = %layout.id, "special keys missing after scaling, falling back to base toggle");
        layout.set_language_switch_visibility(visible)
    }
}

// ============================================================================
// Tests
// ============================================================================
