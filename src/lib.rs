// SPDX-License-Identifier: GPL-3.0-only

//! Floatboard - layout scaling and drag/dock logic for a floating soft keyboard
//!
//! This crate takes fixed-width keyboard layout templates and derives
//! gap-free layouts for any target width, and drives a keyboard that can be
//! docked at the bottom of the screen or dragged around as a floating overlay.
//!
//! # Architecture
//!
//! 1. **Scaling Engine** (`scaling`): multiplies key geometry by the width
//!    ratio, then closes rounding gaps and stretches fill-width rows.
//!
//! 2. **Special keys** (`special_keys`): hides or restores the
//!    language-switch key on scaled layouts, using geometry captured at scale
//!    time.
//!
//! 3. **Drag/Dock State Machine** (`drag`): turns pointer events into
//!    docked/floating transitions and clamped anchor positions.
//!
//! 4. **Controller** (`controller`): wires the machine to a host
//!    [`presenter::Surface`] and the width-specific variants in `registry`.
//!
//! # Modules
//!
//! - `app_settings`: Centralized constants (key codes, tolerances, thresholds)
//! - `config`: User configuration loaded from JSON
//! - `controller`: The floating keyboard controller
//! - `drag`: Drag/dock state machine
//! - `layout`: Key model, JSON templates, parser and validation
//! - `presenter`: Overlay presentation over the host surface
//! - `registry`: Docked and floating variants per template
//! - `scaling`: Scaling engine and gap analysis
//! - `special_keys`: Language-switch visibility

pub mod app_settings;
pub mod config;
pub mod controller;
pub mod drag;
pub mod layout;
pub mod presenter;
pub mod registry;
pub mod scaling;
pub mod special_keys;

pub use controller::{FloatingKeyboard, KeyboardError};
pub use scaling::{ScaleError, ScalePolicy, ScaledLayout, Scaler, scale};
pub use special_keys::{ToggleOutcome, toggle_language_switch};

// ============================================================================
// Integration Tests
// ============================================================================
