// SPDX-License-Identifier: GPL-3.0-only

//! Scaling engine: derives a layout for an arbitrary target width.
//!
//! Every key's `x` and `width` are multiplied by `target / total` and floored,
//! gaps are zeroed and keys are regrouped into rows. Under
//! [`ScalePolicy::DistributeToFill`] each row is then made contiguous and
//! fill-width rows are stretched to end exactly at the target width.
//!
//! The template is never modified; scaling always works on a deep copy.

pub mod analysis;
pub mod distribute;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_settings::FILL_WIDTH_TOLERANCE_PX;
use crate::layout::Layout;
use crate::special_keys::{SpecialKeySnapshot, ToggleOutcome, toggle_language_switch};

pub use analysis::{RowGapReport, analyze_gaps};

/// How rounding residue is handled after the per-key multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalePolicy {
    /// Multiply and floor only. Rows may keep small gaps.
    Naive,
    /// Close gaps and stretch fill-width rows to the target width.
    #[default]
    DistributeToFill,
}

impl fmt::Display for ScalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalePolicy::Naive => write!(f, "naive"),
            ScalePolicy::DistributeToFill => write!(f, "distribute-to-fill"),
        }
    }
}

/// Errors from scaling a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleError {
    /// Target width must be positive
    InvalidTargetWidth { target_width: i32 },
    /// Template declares a non-positive total width
    InvalidTemplateWidth { layout_id: String, total_width: i32 },
}

impl fmt::Display for ScaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleError::InvalidTargetWidth { target_width } => {
                write!(f, "Invalid target width {}: must be positive", target_width)
            }
            ScaleError::InvalidTemplateWidth {
                layout_id,
                total_width,
            } => write!(
                f,
                "Layout '{}' has invalid total width {}: must be positive",
                layout_id, total_width
            ),
        }
    }
}

impl std::error::Error for ScaleError {}

/// A layout derived from a template for one target width.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledLayout {
    layout: Layout,
    target_width: i32,
    factor: f64,
    policy: ScalePolicy,
    snapshot: Option<SpecialKeySnapshot>,
}

impl ScaledLayout {
    /// The scaled keys.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Mutable access for consumers that move keys themselves.
    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Layout, Option<&SpecialKeySnapshot>) {
        (&mut self.layout, self.snapshot.as_ref())
    }

    pub fn target_width(&self) -> i32 {
        self.target_width
    }

    /// `target_width / template.total_width`
    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn policy(&self) -> ScalePolicy {
        self.policy
    }

    /// True when the target equals the template width and nothing was scaled.
    pub fn is_identity(&self) -> bool {
        self.factor == 1.0
    }

    /// Special-key geometry captured right after scaling.
    pub fn snapshot(&self) -> Option<&SpecialKeySnapshot> {
        self.snapshot.as_ref()
    }

    /// Shows or hides the language-switch key.
    pub fn set_language_switch_visibility(&mut self, visible: bool) -> ToggleOutcome {
        toggle_language_switch(self, visible)
    }

    /// Consumes the wrapper and returns the layout.
    pub fn into_layout(self) -> Layout {
        self.layout
    }
}

/// Scales templates with a fixed policy and fill-width tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaler {
    pub policy: ScalePolicy,
    /// How far from x = 0 a row's first key may start and still count as
    /// fill-width.
    pub fill_width_tolerance: i32,
}

impl Default for Scaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scaler {
    pub fn new() -> Self {
        Self {
            policy: ScalePolicy::default(),
            fill_width_tolerance: FILL_WIDTH_TOLERANCE_PX,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ScalePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: i32) -> Self {
        self.fill_width_tolerance = tolerance;
        self
    }

    /// Produces a new layout for `target_width` from `template`.
    ///
    /// # Errors
    ///
    /// Returns an error if `target_width` or the template's total width is
    /// not positive. The template is left untouched either way.
    pub fn scale(&self, template: &Layout, target_width: i32) -> Result<ScaledLayout, ScaleError> {
        if target_width <= 0 {
            tracing::warn!(layout = %template.id, target_width, "rejected non-positive target width");
            return Err(ScaleError::InvalidTargetWidth { target_width });
        }

        let mut layout = template.clone();

        if layout.is_empty() {
            tracing::debug!(layout = %template.id, "template has no keys, nothing to scale");
            layout.total_width = target_width;
            return Ok(self.finish(layout, target_width, 1.0));
        }

        if template.total_width <= 0 {
            tracing::warn!(
                layout = %template.id,
                total_width = template.total_width,
                "rejected template with non-positive width"
            );
            return Err(ScaleError::InvalidTemplateWidth {
                layout_id: template.id.clone(),
                total_width: template.total_width,
            });
        }

        if target_width == template.total_width {
            tracing::debug!(layout = %template.id, target_width, "target equals template width");
            for key in layout.keys_mut() {
                key.gap = 0;
            }
            return Ok(self.finish(layout, target_width, 1.0));
        }

        let factor = f64::from(target_width) / f64::from(template.total_width);
        tracing::debug!(
            layout = %template.id,
            from = template.total_width,
            to = target_width,
            factor,
            policy = %self.policy,
            "scaling layout"
        );

        for key in layout.keys_mut() {
            key.x = (f64::from(key.x) * factor).floor() as i32;
            key.width = (f64::from(key.width) * factor).floor() as i32;
            key.gap = 0;
        }

        let keys: Vec<_> = layout.rows.drain(..).flat_map(|row| row.keys).collect();
        layout.rows = distribute::group_rows(keys);
        layout.total_width = target_width;

        if self.policy == ScalePolicy::DistributeToFill {
            analysis::log_gap_report(&layout, "before distribution");
            for (row_index, row) in layout.rows.iter_mut().enumerate() {
                distribute::distribute_row(row, target_width, self.fill_width_tolerance, row_index);
            }
            analysis::log_gap_report(&layout, "after distribution");
        }

        Ok(self.finish(layout, target_width, factor))
    }

    fn finish(&self, layout: Layout, target_width: i32, factor: f64) -> ScaledLayout {
        let snapshot = SpecialKeySnapshot::capture(&layout);
        if let Some(snapshot) = &snapshot {
            tracing::debug!(
                mode_change_x = snapshot.mode_change.x,
                mode_change_width = snapshot.mode_change.width,
                language_switch_width = snapshot.language_switch.width,
                "captured special key snapshot"
            );
        }
        ScaledLayout {
            layout,
            target_width,
            factor,
            policy: self.policy,
            snapshot,
        }
    }
}

/// Scales `template` to `target_width` with the default policy and tolerance.
pub fn scale(template: &Layout, target_width: i32) -> Result<ScaledLayout, ScaleError> {
    Scaler::new().scale(template, target_width)
}

// ============================================================================
// Tests
// ============================================================================
