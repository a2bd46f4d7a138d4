// SPDX-License-Identifier: GPL-3.0-only

//! Overlay presentation of the floating keyboard.
//!
//! The host owns the actual drawing surface; this module only talks to it
//! through the [`Surface`] contract: add a view, move or resize it, remove it,
//! and ask for the screen size. Surface failures are logged and leave the
//! presenter's own bookkeeping unchanged. They are never fatal.

use std::fmt;

use crate::app_settings::FLOATING_INITIAL_Y_OFFSET;
use crate::registry::VariantKey;

/// Position and size of the overlay view in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ViewGeometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Failure reported by the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The view is not attached to the surface
    NotAttached,
    /// The host refused the request (e.g. missing overlay permission)
    Rejected(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::NotAttached => write!(f, "view is not attached to the surface"),
            SurfaceError::Rejected(reason) => write!(f, "surface rejected request: {}", reason),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Host window system contract.
pub trait Surface {
    fn add_view(&mut self, geometry: ViewGeometry) -> Result<(), SurfaceError>;

    fn update_view_layout(&mut self, geometry: ViewGeometry) -> Result<(), SurfaceError>;

    fn remove_view(&mut self) -> Result<(), SurfaceError>;

    /// Screen size as `(width, height)`.
    fn screen_size(&self) -> (i32, i32);
}

/// Shows, moves and hides the floating keyboard overlay.
#[derive(Debug)]
pub struct OverlayPresenter<S: Surface> {
    surface: S,
    /// Current geometry while the view is attached
    shown: Option<ViewGeometry>,
    /// Last position the view had, reused when it is shown again
    last_position: Option<(i32, i32)>,
    selected: Option<VariantKey>,
}

impl<S: Surface> OverlayPresenter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            shown: None,
            last_position: None,
            selected: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_visible(&self) -> bool {
        self.shown.is_some()
    }

    /// Geometry of the attached view, if any.
    pub fn geometry(&self) -> Option<ViewGeometry> {
        self.shown
    }

    /// The keyboard variant the overlay is presenting.
    pub fn selected_keyboard(&self) -> Option<&VariantKey> {
        self.selected.as_ref()
    }

    /// Records which keyboard variant the overlay presents.
    pub fn select_keyboard(&mut self, key: VariantKey) {
        tracing::debug!(layout = %key.layout_id, class = ?key.width_class, "overlay keyboard selected");
        self.selected = Some(key);
    }

    /// Where a newly shown view of `width x height` goes: centred
    /// horizontally, a fixed distance above the vertical middle. The y is
    /// pulled up so a tall view still ends on screen, but never above 0.
    pub fn initial_position(&self, width: i32, height: i32) -> (i32, i32) {
        let (screen_width, screen_height) = self.surface.screen_size();
        let x = (screen_width - width) as f32 / 2.0;
        let y = (screen_height as f32 / 2.0 - FLOATING_INITIAL_Y_OFFSET)
            .min((screen_height - height) as f32)
            .max(0.0);
        (x.round() as i32, y.round() as i32)
    }

    /// Attaches the view, or resizes it if already attached. Returns the
    /// resulting geometry, or `None` if the surface refused.
    pub fn show(&mut self, width: i32, height: i32) -> Option<ViewGeometry> {
        if self.shown.is_some() {
            return self.resize(width, height);
        }

        let (x, y) = self
            .last_position
            .unwrap_or_else(|| self.initial_position(width, height));
        let geometry = ViewGeometry::new(x, y, width, height);

        match self.surface.add_view(geometry) {
            Ok(()) => {
                tracing::info!(x, y, width, height, "overlay shown");
                self.shown = Some(geometry);
                self.last_position = Some((x, y));
                self.shown
            }
            Err(err) => {
                tracing::warn!(%err, "failed to add overlay view");
                None
            }
        }
    }

    /// Detaches the view. The last position is kept for the next `show`.
    pub fn hide(&mut self) {
        if self.shown.is_none() {
            return;
        }
        match self.surface.remove_view() {
            Ok(()) => {
                tracing::info!("overlay hidden");
                self.shown = None;
            }
            Err(err) => tracing::warn!(%err, "failed to remove overlay view"),
        }
    }

    /// Moves the attached view.
    pub fn move_to(&mut self, x: i32, y: i32) -> Option<ViewGeometry> {
        let current = self.shown?;
        self.update(ViewGeometry { x, y, ..current })
    }

    /// Resizes the attached view in place.
    pub fn resize(&mut self, width: i32, height: i32) -> Option<ViewGeometry> {
        let current = self.shown?;
        self.update(ViewGeometry {
            width,
            height,
            ..current
        })
    }

    fn update(&mut self, geometry: ViewGeometry) -> Option<ViewGeometry> {
        if self.shown == Some(geometry) {
            return self.shown;
        }
        match self.surface.update_view_layout(geometry) {
            Ok(()) => {
                tracing::trace!(?geometry, "overlay updated");
                self.shown = Some(geometry);
                self.last_position = Some((geometry.x, geometry.y));
            }
            Err(err) => tracing::warn!(%err, "failed to update overlay view"),
        }
        self.shown
    }
}

/// In-memory surface that records every call.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    pub screen: (i32, i32),
    pub attached: Option<ViewGeometry>,
    pub calls: Vec<String>,
    pub fail_next: bool,
}

#[cfg(test)]
impl RecordingSurface {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            screen: (width, height),
            ..Self::default()
        }
    }

    fn check(&mut self) -> Result<(), SurfaceError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(SurfaceError::Rejected("test".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn add_view(&mut self, geometry: ViewGeometry) -> Result<(), SurfaceError> {
        self.check()?;
        self.calls.push("add".into());
        self.attached = Some(geometry);
        Ok(())
    }

    fn update_view_layout(&mut self, geometry: ViewGeometry) -> Result<(), SurfaceError> {
        self.check()?;
        if self.attached.is_none() {
            return Err(SurfaceError::NotAttached);
        }
        self.calls.push("update".into());
        self.attached = Some(geometry);
        Ok(())
    }

    fn remove_view(&mut self) -> Result<(), SurfaceError> {
        self.check()?;
        self.calls.push("remove".into());
        self.attached = None;
        Ok(())
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test 1: Show places a new view at the initial position
    #[test]
    fn test_show_uses_initial_position() {
        let mut presenter = OverlayPresenter::new(RecordingSurface::new(1080, 2000));

        let geometry = presenter.show(864, 640).unwrap();
        assert_eq!(geometry, ViewGeometry::new(108, 800, 864, 640));
        assert!(presenter.is_visible());
        assert_eq!(presenter.surface().attached, Some(geometry));
    }

    /// Test 2: Re-showing reuses the last position
    #[test]
    fn test_move_hide_and_show_again() {
        let mut presenter = OverlayPresenter::new(RecordingSurface::new(1080, 2000));
        presenter.show(864, 640);
        presenter.move_to(20, 30);
        presenter.hide();
        assert!(!presenter.is_visible());
        assert_eq!(presenter.surface().attached, None);

        let geometry = presenter.show(864, 640).unwrap();
        assert_eq!((geometry.x, geometry.y), (20, 30));
        assert_eq!(presenter.surface().calls, vec!["add", "update", "remove", "add"]);
    }

    /// Test 3: Move and hide without a view do nothing
    #[test]
    fn test_move_without_view_is_noop() {
        let mut presenter = OverlayPresenter::new(RecordingSurface::new(1080, 2000));
        assert_eq!(presenter.move_to(5, 5), None);
        presenter.hide();
        assert!(presenter.surface().calls.is_empty());
    }

    /// Test 4: Failed add or update keeps the previous state
    #[test]
    fn test_surface_failure_is_not_fatal() {
        let mut surface = RecordingSurface::new(1080, 2000);
        surface.fail_next = true;
        let mut presenter = OverlayPresenter::new(surface);

        assert_eq!(presenter.show(864, 640), None);
        assert!(!presenter.is_visible());

        presenter.show(864, 640);
        presenter.surface_mut().fail_next = true;
        let geometry = presenter.move_to(1, 1).unwrap();
        assert_eq!((geometry.x, geometry.y), (108, 800));
    }

    /// Test 5: Showing an attached view resizes it in place
    #[test]
    fn test_resize_keeps_position() {
        let mut presenter = OverlayPresenter::new(RecordingSurface::new(1080, 2000));
        presenter.show(864, 640);
        let geometry = presenter.show(500, 300).unwrap();
        assert_eq!(geometry, ViewGeometry::new(108, 800, 500, 300));
    }

    /// Test 6: A failed remove leaves the view attached and tracked
    #[test]
    fn test_failed_hide_keeps_view() {
        let mut presenter = OverlayPresenter::new(RecordingSurface::new(1080, 2000));
        presenter.show(864, 640);
        presenter.surface_mut().fail_next = true;
        presenter.hide();

        assert!(presenter.is_visible());
        assert!(presenter.surface().attached.is_some());

        // Showing again resizes the tracked view instead of adding a second one
        presenter.show(864, 640);
        assert_eq!(presenter.surface().calls, vec!["add"]);

        presenter.hide();
        assert!(!presenter.is_visible());
        assert_eq!(presenter.surface().calls, vec!["add", "remove"]);
    }

    /// Test 7: A view taller than the space below the initial y is pulled up
    #[test]
    fn test_initial_position_keeps_tall_view_on_screen() {
        let presenter = OverlayPresenter::new(RecordingSurface::new(1080, 1000));
        assert_eq!(presenter.initial_position(864, 400), (108, 300));
        assert_eq!(presenter.initial_position(864, 900), (108, 100));
        assert_eq!(presenter.initial_position(864, 1200), (108, 0));
    }
}
