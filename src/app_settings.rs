// SPDX-License-Identifier: GPL-3.0-only

//! Centralized application settings and constants.

/// Primary code of the key that switches between letters and symbols.
pub const KEYCODE_MODE_CHANGE: i32 = -2;

/// Primary code of the key that cycles the input language.
pub const KEYCODE_LANGUAGE_SWITCH: i32 = -101;

/// Primary code of the shift key.
pub const KEYCODE_SHIFT: i32 = -1;

/// Primary code of the done/close key.
pub const KEYCODE_DONE: i32 = -3;

/// Primary code of the delete key.
pub const KEYCODE_DELETE: i32 = -5;

/// Maximum distance in pixels from x = 0 for a row's first key to still count
/// as touching the left edge of the layout.
pub const FILL_WIDTH_TOLERANCE_PX: i32 = 5;

/// A gap between neighbouring keys larger than this is reported as visible.
pub const VISIBLE_GAP_PX: i32 = 2;

/// Distance from the screen bottom (in density-independent pixels) that flags
/// the floating keyboard as "near bottom" during a drag.
pub const DOCK_THRESHOLD_DP: f32 = 50.0;

/// Floating keyboard width as a fraction of the screen width.
pub const FLOATING_WIDTH_RATIO: f32 = 0.8;

/// Vertical offset above the screen centre for the first floating placement.
pub const FLOATING_INITIAL_Y_OFFSET: f32 = 200.0;

/// Default key width of a layout template when a key omits it.
pub const DEFAULT_KEY_WIDTH: i32 = 100;

/// Default key height of a layout template when a row or key omits it.
pub const DEFAULT_KEY_HEIGHT: i32 = 160;
