// SPDX-License-Identifier: GPL-3.0-only

//! The floating keyboard controller.
//!
//! [`FloatingKeyboard`] owns the variant registry, the drag/dock state machine
//! and the overlay presenter. Pointer events go to the state machine; the
//! signals it emits are turned into variant switches and presenter commands.

use std::fmt;

use crate::config::Config;
use crate::drag::{DockMode, DragDockMachine, DragSignal, Point, PointerEvent, Size};
use crate::layout::Layout;
use crate::presenter::{OverlayPresenter, Surface};
use crate::registry::{VariantKey, VariantRegistry, WidthClass};
use crate::scaling::{ScaleError, ScaledLayout};

/// Errors from driving the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardError {
    /// No template with this id has been registered
    UnknownLayout(String),
    /// A variant could not be built
    Scale(ScaleError),
}

impl fmt::Display for KeyboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyboardError::UnknownLayout(id) => write!(f, "Unknown keyboard layout '{}'", id),
            KeyboardError::Scale(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for KeyboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KeyboardError::Scale(err) => Some(err),
            KeyboardError::UnknownLayout(_) => None,
        }
    }
}

impl From<ScaleError> for KeyboardError {
    fn from(err: ScaleError) -> Self {
        KeyboardError::Scale(err)
    }
}

/// A keyboard that can be docked at the screen bottom or dragged around as a
/// floating overlay.
#[derive(Debug)]
pub struct FloatingKeyboard<S: Surface> {
    registry: VariantRegistry,
    machine: DragDockMachine,
    presenter: OverlayPresenter<S>,
    active_layout: Option<String>,
}

impl<S: Surface> FloatingKeyboard<S> {
    /// Creates a docked keyboard sized to the surface's screen.
    pub fn new(config: &Config, surface: S) -> Self {
        let (screen_width, screen_height) = surface.screen_size();
        let registry =
            VariantRegistry::new(config.scaler(), screen_width, config.floating_width_ratio);
        let machine = DragDockMachine::new(
            config.drag_config(),
            Size::default(),
            Size::new(screen_width as f32, screen_height as f32),
        );

        Self {
            registry,
            machine,
            presenter: OverlayPresenter::new(surface),
            active_layout: None,
        }
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn machine(&self) -> &DragDockMachine {
        &self.machine
    }

    pub fn presenter(&self) -> &OverlayPresenter<S> {
        &self.presenter
    }

    pub fn mode(&self) -> DockMode {
        self.machine.mode()
    }

    pub fn active_layout(&self) -> Option<&str> {
        self.active_layout.as_deref()
    }

    /// Registers a template and builds its docked and floating variants.
    pub fn register_template(&mut self, template: Layout) -> Result<(), KeyboardError> {
        self.registry.register(template)?;
        Ok(())
    }

    /// Switches to a registered layout, keeping the current mode.
    pub fn activate(&mut self, layout_id: &str) -> Result<(), KeyboardError> {
        if self.registry.template(layout_id).is_none() {
            tracing::warn!(layout = layout_id, "activation of unknown layout");
            return Err(KeyboardError::UnknownLayout(layout_id.to_string()));
        }

        tracing::info!(layout = layout_id, mode = ?self.mode(), "activated keyboard layout");
        self.active_layout = Some(layout_id.to_string());
        match self.mode() {
            DockMode::Docked => self.enter_docked(),
            DockMode::Floating => self.refresh_floating(),
        }
        Ok(())
    }

    fn width_class(&self) -> WidthClass {
        match self.mode() {
            DockMode::Docked => WidthClass::Docked,
            DockMode::Floating => WidthClass::Floating,
        }
    }

    /// The variant matching the current mode.
    pub fn active_variant(&self) -> Option<&ScaledLayout> {
        let layout_id = self.active_layout.as_deref()?;
        self.registry.variant(layout_id, self.width_class())
    }

    fn variant_size(&self, class: WidthClass) -> Option<Size> {
        let layout_id = self.active_layout.as_deref()?;
        let scaled = self.registry.variant(layout_id, class)?;
        Some(Size::new(
            scaled.target_width() as f32,
            scaled.layout().total_height() as f32,
        ))
    }

    /// Routes one pointer event from the drag handle. Returns the signals the
    /// state machine emitted, for the host's own mode-switch UI.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<DragSignal> {
        let mut signals = Vec::new();
        self.machine.handle(event, &mut signals);
        self.apply_signals(&signals);
        signals
    }

    /// Returns a floating keyboard to the docked position.
    pub fn force_dock(&mut self) -> Vec<DragSignal> {
        let mut signals = Vec::new();
        self.machine.force_dock(&mut signals);
        self.apply_signals(&signals);
        signals
    }

    fn apply_signals(&mut self, signals: &[DragSignal]) {
        for signal in signals {
            match *signal {
                DragSignal::FloatingChange(true) => self.enter_floating(),
                DragSignal::FloatingChange(false) => self.enter_docked(),
                DragSignal::PositionChange { x, y } => {
                    self.presenter.move_to(x.round() as i32, y.round() as i32);
                }
                DragSignal::DragStart | DragSignal::DragMove { .. } | DragSignal::DragEnd => {}
            }
        }
    }

    fn enter_floating(&mut self) {
        let Some(layout_id) = self.active_layout.clone() else {
            tracing::warn!("floating requested with no active layout");
            return;
        };
        let Some(size) = self.variant_size(WidthClass::Floating) else {
            return;
        };

        self.presenter
            .select_keyboard(VariantKey::new(layout_id, WidthClass::Floating));
        self.machine.set_view_size(size);
        if let Some(geometry) = self
            .presenter
            .show(size.width as i32, size.height as i32)
        {
            self.machine
                .set_anchor(Point::new(geometry.x as f32, geometry.y as f32));
        }
    }

    fn refresh_floating(&mut self) {
        let (Some(layout_id), Some(size)) = (
            self.active_layout.clone(),
            self.variant_size(WidthClass::Floating),
        ) else {
            return;
        };
        self.presenter
            .select_keyboard(VariantKey::new(layout_id, WidthClass::Floating));
        self.machine.set_view_size(size);
        self.presenter.resize(size.width as i32, size.height as i32);
    }

    fn enter_docked(&mut self) {
        self.presenter.hide();

        let Some(layout_id) = self.active_layout.clone() else {
            return;
        };
        let Some(size) = self.variant_size(WidthClass::Docked) else {
            return;
        };

        self.presenter
            .select_keyboard(VariantKey::new(layout_id, WidthClass::Docked));
        self.machine.set_view_size(size);
        let screen = self.machine.screen_size();
        self.machine
            .set_anchor(Point::new(0.0, screen.height - size.height));
    }

    /// Rebuilds variants for a new screen size, e.g. after rotation.
    pub fn set_screen_size(&mut self, width: i32, height: i32) -> Result<(), KeyboardError> {
        self.registry.set_screen_width(width)?;
        self.machine
            .set_screen_size(Size::new(width as f32, height as f32));
        match self.mode() {
            DockMode::Docked => self.enter_docked(),
            DockMode::Floating => {
                self.refresh_floating();
                let anchor = self.machine.anchor();
                let clamped = self.machine.set_anchor(anchor);
                self.presenter
                    .move_to(clamped.x.round() as i32, clamped.y.round() as i32);
            }
        }
        Ok(())
    }

    /// Shows or hides the language-switch key on every variant.
    pub fn set_language_switch_visible(&mut self, visible: bool) {
        self.registry.set_language_switch_visible(visible);
    }

    /// Ends the keyboard session: overlay removed, back to docked.
    pub fn end_session(&mut self) {
        tracing::info!("keyboard session ended");
        self.machine.reset();
        self.enter_docked();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_settings::KEYCODE_LANGUAGE_SWITCH;
    use crate::layout::parse_builtin_layout;
    use crate::presenter::{RecordingSurface, ViewGeometry};

    fn keyboard() -> FloatingKeyboard<RecordingSurface> {
        let mut keyboard = FloatingKeyboard::new(&Config::default(), RecordingSurface::new(1080, 2000));
        keyboard
            .register_template(parse_builtin_layout("qwerty").unwrap().layout)
            .unwrap();
        keyboard.activate("qwerty").unwrap();
        keyboard
    }

    /// Test 1: The keyboard starts docked at the bottom edge
    #[test]
    fn test_starts_docked_at_bottom() {
        let keyboard = keyboard();
        assert_eq!(keyboard.mode(), DockMode::Docked);
        assert!(!keyboard.presenter().is_visible());
        assert_eq!(keyboard.active_variant().unwrap().target_width(), 1080);
        assert_eq!(keyboard.machine().anchor(), Point::new(0.0, 1360.0));
    }

    /// Test 2: Pressing on the docked keyboard detaches it into the overlay
    #[test]
    fn test_drag_detaches_into_overlay() {
        let mut keyboard = keyboard();

        let signals = keyboard.handle_pointer(PointerEvent::down(540.0, 1400.0));
        assert_eq!(
            signals,
            vec![DragSignal::FloatingChange(true), DragSignal::DragStart]
        );
        assert_eq!(keyboard.mode(), DockMode::Floating);
        assert_eq!(keyboard.active_variant().unwrap().target_width(), 864);
        assert_eq!(
            keyboard.presenter().geometry(),
            Some(ViewGeometry::new(108, 800, 864, 640))
        );
        assert_eq!(
            keyboard.presenter().selected_keyboard(),
            Some(&VariantKey::new("qwerty", WidthClass::Floating))
        );

        keyboard.handle_pointer(PointerEvent::moved(560.0, 1350.0));
        let geometry = keyboard.presenter().geometry().unwrap();
        assert_eq!((geometry.x, geometry.y), (128, 750));
    }

    /// Test 3: Force dock hides the overlay and restores the docked size
    #[test]
    fn test_force_dock_removes_overlay() {
        let mut keyboard = keyboard();
        keyboard.handle_pointer(PointerEvent::down(540.0, 1400.0));
        keyboard.handle_pointer(PointerEvent::up(540.0, 1400.0));
        assert_eq!(keyboard.mode(), DockMode::Floating);

        let signals = keyboard.force_dock();
        assert_eq!(signals, vec![DragSignal::FloatingChange(false)]);
        assert_eq!(keyboard.mode(), DockMode::Docked);
        assert!(!keyboard.presenter().is_visible());
        assert_eq!(keyboard.machine().view_size(), Size::new(1080.0, 640.0));
        assert!(keyboard.force_dock().is_empty());
    }

    /// Test 4: Activating an unregistered layout fails and keeps the active one
    #[test]
    fn test_unknown_layout() {
        let mut keyboard = keyboard();
        assert_eq!(
            keyboard.activate("azerty"),
            Err(KeyboardError::UnknownLayout("azerty".into()))
        );
        assert_eq!(keyboard.active_layout(), Some("qwerty"));
    }

    /// Test 5: Language switch visibility and session end
    #[test]
    fn test_language_switch_and_session_end() {
        let mut keyboard = keyboard();
        keyboard.set_language_switch_visible(false);
        let layout = keyboard.active_variant().unwrap().layout();
        assert_eq!(layout.find_key(KEYCODE_LANGUAGE_SWITCH).unwrap().width, 0);

        keyboard.handle_pointer(PointerEvent::down(10.0, 1500.0));
        keyboard.end_session();
        assert_eq!(keyboard.mode(), DockMode::Docked);
        assert!(!keyboard.presenter().is_visible());
        assert!(!keyboard.machine().is_dragging());
    }

    /// Test 6: A screen change rebuilds variants and re-anchors the dock
    #[test]
    fn test_rotation_rebuilds_variants() {
        let mut keyboard = keyboard();
        keyboard.set_screen_size(2000, 1080).unwrap();
        assert_eq!(keyboard.active_variant().unwrap().target_width(), 2000);
        assert_eq!(keyboard.machine().anchor(), Point::new(0.0, 440.0));
    }
}
