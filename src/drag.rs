// SPDX-License-Identifier: GPL-3.0-only

//! Drag/dock state machine for the floating keyboard.
//!
//! The keyboard starts docked. The first pointer-down on the drag handle
//! detaches it into floating mode; from then on every move assigns the anchor
//! directly from the pointer (no easing), clamped to the screen. Ending or
//! cancelling a drag leaves the keyboard floating where it is. Only
//! [`DragDockMachine::force_dock`] returns it to the docked state.

use serde::{Deserialize, Serialize};

use crate::app_settings::DOCK_THRESHOLD_DP;

/// A position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A size in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Whether the keyboard is attached to the screen edge or free-floating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockMode {
    #[default]
    Docked,
    Floating,
}

/// Mode and position of the keyboard for one keyboard session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatState {
    pub mode: DockMode,
    /// Top-left corner of the keyboard view
    pub anchor: Point,
    /// View size when the keyboard left the docked state
    pub original_size: Size,
}

/// An in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// `anchor - pointer` at pointer-down
    pub pointer_offset: Point,
}

/// How far the floating keyboard may leave the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Up to half of the view may hang off any edge.
    #[default]
    HalfOffscreen,
    /// The whole view stays on screen.
    FullyOnscreen,
}

impl ClampPolicy {
    /// Clamps `anchor` for a view of `view` size on a screen of `screen` size.
    ///
    /// A view larger than the screen pins to the upper bound instead of
    /// panicking on an empty range.
    pub fn clamp(self, anchor: Point, view: Size, screen: Size) -> Point {
        let (min_x, max_x, min_y, max_y) = match self {
            ClampPolicy::HalfOffscreen => (
                -view.width / 2.0,
                screen.width - view.width / 2.0,
                -view.height / 2.0,
                screen.height - view.height / 2.0,
            ),
            ClampPolicy::FullyOnscreen => (
                0.0,
                screen.width - view.width,
                0.0,
                screen.height - view.height,
            ),
        };
        Point::new(anchor.x.max(min_x).min(max_x), anchor.y.max(min_y).min(max_y))
    }
}

/// Tunables for [`DragDockMachine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Distance from the screen bottom that counts as "near bottom"
    pub dock_threshold_px: f32,
    pub clamp_policy: ClampPolicy,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            dock_threshold_px: DOCK_THRESHOLD_DP,
            clamp_policy: ClampPolicy::default(),
        }
    }
}

/// Pointer event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub screen_x: f32,
    pub screen_y: f32,
}

impl PointerEvent {
    pub const fn new(kind: PointerKind, screen_x: f32, screen_y: f32) -> Self {
        Self {
            kind,
            screen_x,
            screen_y,
        }
    }

    pub const fn down(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    pub const fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub const fn up(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    pub const fn cancel() -> Self {
        Self::new(PointerKind::Cancel, 0.0, 0.0)
    }

    fn position(&self) -> Point {
        Point::new(self.screen_x, self.screen_y)
    }
}

/// Whether the machine consumed an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Handled,
    /// Move, up or cancel without an active drag
    Ignored,
}

/// Receives the machine's notifications. Every method defaults to a no-op.
pub trait DragListener {
    /// The keyboard entered (`true`) or left (`false`) floating mode.
    fn on_floating_change(&mut self, _floating: bool) {}

    fn on_drag_start(&mut self) {}

    /// Called on every move. `near_bottom` is a visual hint only.
    fn on_drag_move(&mut self, _near_bottom: bool) {}

    /// The anchor changed to `(x, y)`.
    fn on_position_change(&mut self, _x: f32, _y: f32) {}

    fn on_drag_end(&mut self) {}
}

/// A recorded listener notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragSignal {
    FloatingChange(bool),
    DragStart,
    DragMove { near_bottom: bool },
    PositionChange { x: f32, y: f32 },
    DragEnd,
}

impl DragSignal {
    /// Delivers this notification to `listener`.
    pub fn replay(self, listener: &mut impl DragListener) {
        match self {
            DragSignal::FloatingChange(floating) => listener.on_floating_change(floating),
            DragSignal::DragStart => listener.on_drag_start(),
            DragSignal::DragMove { near_bottom } => listener.on_drag_move(near_bottom),
            DragSignal::PositionChange { x, y } => listener.on_position_change(x, y),
            DragSignal::DragEnd => listener.on_drag_end(),
        }
    }
}

impl DragListener for Vec<DragSignal> {
    fn on_floating_change(&mut self, floating: bool) {
        self.push(DragSignal::FloatingChange(floating));
    }

    fn on_drag_start(&mut self) {
        self.push(DragSignal::DragStart);
    }

    fn on_drag_move(&mut self, near_bottom: bool) {
        self.push(DragSignal::DragMove { near_bottom });
    }

    fn on_position_change(&mut self, x: f32, y: f32) {
        self.push(DragSignal::PositionChange { x, y });
    }

    fn on_drag_end(&mut self) {
        self.push(DragSignal::DragEnd);
    }
}

impl DragListener for () {}

/// Tracks docked/floating mode and the floating anchor across pointer events.
#[derive(Debug, Clone)]
pub struct DragDockMachine {
    config: DragConfig,
    state: FloatState,
    session: Option<DragSession>,
    view_size: Size,
    screen_size: Size,
}

impl DragDockMachine {
    /// Creates a docked machine.
    pub fn new(config: DragConfig, view_size: Size, screen_size: Size) -> Self {
        Self {
            config,
            state: FloatState::default(),
            session: None,
            view_size,
            screen_size,
        }
    }

    pub fn state(&self) -> &FloatState {
        &self.state
    }

    pub fn mode(&self) -> DockMode {
        self.state.mode
    }

    pub fn anchor(&self) -> Point {
        self.state.anchor
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn view_size(&self) -> Size {
        self.view_size
    }

    pub fn screen_size(&self) -> Size {
        self.screen_size
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Updates the keyboard view size, e.g. after switching variants.
    pub fn set_view_size(&mut self, size: Size) {
        self.view_size = size;
    }

    /// Updates the screen size, e.g. after a rotation.
    pub fn set_screen_size(&mut self, size: Size) {
        self.screen_size = size;
    }

    /// Places the anchor directly, clamped to the screen. Returns the
    /// position actually stored.
    ///
    /// During a drag the pointer offset shifts by the same amount, so the
    /// next move continues from the new anchor instead of jumping back.
    pub fn set_anchor(&mut self, anchor: Point) -> Point {
        let previous = self.state.anchor;
        let clamped = self.assign_anchor(anchor);
        if let Some(session) = &mut self.session {
            session.pointer_offset.x += clamped.x - previous.x;
            session.pointer_offset.y += clamped.y - previous.y;
        }
        clamped
    }

    fn assign_anchor(&mut self, anchor: Point) -> Point {
        let clamped = self.clamp(anchor);
        self.state.anchor = clamped;
        clamped
    }

    /// Ends the keyboard session: back to docked, no drag, zero anchor.
    pub fn reset(&mut self) {
        tracing::debug!("drag state reset");
        self.state = FloatState::default();
        self.session = None;
    }

    /// `anchor_y + view_height > screen_height - dock_threshold`
    pub fn is_near_bottom(&self, anchor_y: f32) -> bool {
        anchor_y + self.view_size.height > self.screen_size.height - self.config.dock_threshold_px
    }

    fn clamp(&self, anchor: Point) -> Point {
        self.config
            .clamp_policy
            .clamp(anchor, self.view_size, self.screen_size)
    }

    /// Processes one pointer event.
    pub fn handle(&mut self, event: PointerEvent, listener: &mut impl DragListener) -> EventDisposition {
        match event.kind {
            PointerKind::Down => {
                self.drag_start(event.position(), listener);
                EventDisposition::Handled
            }
            PointerKind::Move => self.drag_move(event.position(), listener),
            PointerKind::Up | PointerKind::Cancel => self.drag_end(event.kind, listener),
        }
    }

    fn drag_start(&mut self, pointer: Point, listener: &mut impl DragListener) {
        let anchor = self.state.anchor;
        self.session = Some(DragSession {
            pointer_offset: Point::new(anchor.x - pointer.x, anchor.y - pointer.y),
        });

        if self.state.mode == DockMode::Docked {
            self.state.mode = DockMode::Floating;
            self.state.original_size = self.view_size;
            tracing::info!(
                width = self.view_size.width,
                height = self.view_size.height,
                "keyboard detached to floating mode"
            );
            listener.on_floating_change(true);
        }

        tracing::debug!(x = pointer.x, y = pointer.y, "drag started");
        listener.on_drag_start();
    }

    fn drag_move(&mut self, pointer: Point, listener: &mut impl DragListener) -> EventDisposition {
        let Some(session) = self.session else {
            tracing::trace!("move without active drag ignored");
            return EventDisposition::Ignored;
        };

        let target = Point::new(
            pointer.x + session.pointer_offset.x,
            pointer.y + session.pointer_offset.y,
        );
        let near_bottom = self.is_near_bottom(target.y);
        let anchor = self.assign_anchor(target);

        tracing::trace!(x = anchor.x, y = anchor.y, near_bottom, "drag moved");
        listener.on_position_change(anchor.x, anchor.y);
        listener.on_drag_move(near_bottom);
        EventDisposition::Handled
    }

    fn drag_end(&mut self, kind: PointerKind, listener: &mut impl DragListener) -> EventDisposition {
        if self.session.take().is_none() {
            return EventDisposition::Ignored;
        }

        let anchor = self.state.anchor;
        tracing::debug!(?kind, x = anchor.x, y = anchor.y, "drag ended");
        listener.on_drag_end();
        EventDisposition::Handled
    }

    /// Returns a floating keyboard to the docked state and restores the view
    /// size it had before floating. Does nothing when already docked.
    ///
    /// Returns true if the mode changed.
    pub fn force_dock(&mut self, listener: &mut impl DragListener) -> bool {
        if self.state.mode != DockMode::Floating {
            return false;
        }

        self.session = None;
        self.state.mode = DockMode::Docked;
        self.view_size = self.state.original_size;
        tracing::info!(
            width = self.view_size.width,
            height = self.view_size.height,
            "keyboard docked"
        );
        listener.on_floating_change(false);
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> DragDockMachine {
        DragDockMachine::new(
            DragConfig {
                dock_threshold_px: 50.0,
                clamp_policy: ClampPolicy::HalfOffscreen,
            },
            Size::new(800.0, 120.0),
            Size::new(2000.0, 1000.0),
        )
    }

    /// Test 1: Pointer-down detaches and records the offset
    #[test]
    fn test_drag_start_detaches() {
        let mut machine = machine();
        machine.set_anchor(Point::new(100.0, 200.0));

        let mut signals: Vec<DragSignal> = Vec::new();
        let disposition = machine.handle(PointerEvent::down(500.0, 800.0), &mut signals);

        assert_eq!(disposition, EventDisposition::Handled);
        assert_eq!(machine.mode(), DockMode::Floating);
        assert_eq!(machine.state().original_size, Size::new(800.0, 120.0));
        assert_eq!(
            machine.session().unwrap().pointer_offset,
            Point::new(-400.0, -600.0)
        );
        assert_eq!(
            signals,
            vec![DragSignal::FloatingChange(true), DragSignal::DragStart]
        );
    }

    /// Test 2: Move assigns pointer + offset directly
    #[test]
    fn test_move_follows_pointer() {
        let mut machine = machine();
        machine.set_anchor(Point::new(100.0, 200.0));
        machine.handle(PointerEvent::down(500.0, 800.0), &mut ());

        let mut signals: Vec<DragSignal> = Vec::new();
        machine.handle(PointerEvent::moved(520.0, 810.0), &mut signals);

        assert_eq!(machine.anchor(), Point::new(120.0, 210.0));
        assert_eq!(
            signals,
            vec![
                DragSignal::PositionChange { x: 120.0, y: 210.0 },
                DragSignal::DragMove { near_bottom: false },
            ]
        );
    }

    /// Test 3: Second drag while floating starts a new session only
    #[test]
    fn test_redrag_while_floating() {
        let mut machine = machine();
        machine.handle(PointerEvent::down(10.0, 10.0), &mut ());
        machine.handle(PointerEvent::up(10.0, 10.0), &mut ());

        let mut signals: Vec<DragSignal> = Vec::new();
        machine.handle(PointerEvent::down(40.0, 40.0), &mut signals);
        assert_eq!(signals, vec![DragSignal::DragStart]);
        assert_eq!(machine.mode(), DockMode::Floating);
    }

    /// Test 4: Near-bottom boundary is strictly greater-than
    #[test]
    fn test_near_bottom_boundary() {
        let machine = machine();
        // 1000 - 50 = 950; 830 + 120 = 950 is not past it.
        assert!(!machine.is_near_bottom(830.0));
        assert!(machine.is_near_bottom(831.0));
    }

    /// Test 5: near_bottom never docks by itself
    #[test]
    fn test_near_bottom_never_docks() {
        let mut machine = machine();
        machine.handle(PointerEvent::down(0.0, 0.0), &mut ());

        let mut signals: Vec<DragSignal> = Vec::new();
        for y in [900.0, 920.0, 940.0, 960.0] {
            machine.handle(PointerEvent::moved(100.0, y), &mut signals);
        }
        machine.handle(PointerEvent::up(100.0, 960.0), &mut signals);

        assert!(signals.contains(&DragSignal::DragMove { near_bottom: true }));
        assert!(!signals.contains(&DragSignal::FloatingChange(false)));
        assert_eq!(machine.mode(), DockMode::Floating);

        assert!(machine.force_dock(&mut signals));
        assert_eq!(machine.mode(), DockMode::Docked);
        assert_eq!(signals.last(), Some(&DragSignal::FloatingChange(false)));
    }

    /// Test 6: Events without a session are ignored
    #[test]
    fn test_events_without_session_ignored() {
        let mut machine = machine();
        let mut signals: Vec<DragSignal> = Vec::new();

        assert_eq!(
            machine.handle(PointerEvent::moved(5.0, 5.0), &mut signals),
            EventDisposition::Ignored
        );
        assert_eq!(
            machine.handle(PointerEvent::up(5.0, 5.0), &mut signals),
            EventDisposition::Ignored
        );
        assert_eq!(
            machine.handle(PointerEvent::cancel(), &mut signals),
            EventDisposition::Ignored
        );
        assert!(signals.is_empty());
        assert_eq!(machine.mode(), DockMode::Docked);
    }

    /// Test 7: Cancel keeps the last clamped anchor
    #[test]
    fn test_cancel_keeps_last_anchor() {
        let mut machine = machine();
        machine.handle(PointerEvent::down(0.0, 0.0), &mut ());
        machine.handle(PointerEvent::moved(300.0, 400.0), &mut ());
        machine.handle(PointerEvent::moved(5000.0, 400.0), &mut ());
        let last = machine.anchor();

        let mut signals: Vec<DragSignal> = Vec::new();
        assert_eq!(
            machine.handle(PointerEvent::cancel(), &mut signals),
            EventDisposition::Handled
        );
        assert_eq!(machine.anchor(), last);
        assert_eq!(last.x, 1600.0);
        assert_eq!(signals, vec![DragSignal::DragEnd]);
        assert!(!machine.is_dragging());
    }

    /// Test 8: Half-offscreen clamp allows half the view past each edge
    #[test]
    fn test_half_offscreen_clamp() {
        let view = Size::new(800.0, 120.0);
        let screen = Size::new(2000.0, 1000.0);
        let policy = ClampPolicy::HalfOffscreen;

        assert_eq!(
            policy.clamp(Point::new(-1000.0, -1000.0), view, screen),
            Point::new(-400.0, -60.0)
        );
        assert_eq!(
            policy.clamp(Point::new(5000.0, 5000.0), view, screen),
            Point::new(1600.0, 940.0)
        );
    }

    /// Test 9: Fully-onscreen clamp, including a view wider than the screen
    #[test]
    fn test_fully_onscreen_clamp() {
        let screen = Size::new(2000.0, 1000.0);
        let policy = ClampPolicy::FullyOnscreen;

        assert_eq!(
            policy.clamp(Point::new(-10.0, 990.0), Size::new(800.0, 120.0), screen),
            Point::new(0.0, 880.0)
        );
        assert_eq!(
            policy.clamp(Point::new(10.0, 0.0), Size::new(2400.0, 120.0), screen),
            Point::new(-400.0, 0.0)
        );
    }

    /// Test 10: force_dock restores the pre-float size and is a no-op when docked
    #[test]
    fn test_force_dock_restores_size() {
        let mut machine = machine();
        let mut signals: Vec<DragSignal> = Vec::new();
        assert!(!machine.force_dock(&mut signals));
        assert!(signals.is_empty());

        machine.handle(PointerEvent::down(0.0, 0.0), &mut ());
        machine.set_view_size(Size::new(640.0, 120.0));
        machine.handle(PointerEvent::moved(10.0, 10.0), &mut ());

        assert!(machine.force_dock(&mut signals));
        assert_eq!(machine.view_size(), Size::new(800.0, 120.0));
        assert!(!machine.is_dragging());
    }

    /// Test 11: Moving the anchor mid-drag rebases the pointer offset
    #[test]
    fn test_set_anchor_during_drag_rebases() {
        let mut machine = machine();
        machine.handle(PointerEvent::down(100.0, 100.0), &mut ());
        machine.set_anchor(Point::new(600.0, 300.0));

        machine.handle(PointerEvent::moved(110.0, 105.0), &mut ());
        assert_eq!(machine.anchor(), Point::new(610.0, 305.0));
    }

    /// Test 12: Recorded signals replay onto another listener
    #[test]
    fn test_signal_replay() {
        let recorded = vec![
            DragSignal::FloatingChange(true),
            DragSignal::DragStart,
            DragSignal::PositionChange { x: 1.0, y: 2.0 },
            DragSignal::DragMove { near_bottom: true },
            DragSignal::DragEnd,
        ];

        let mut replayed: Vec<DragSignal> = Vec::new();
        for signal in &recorded {
            signal.replay(&mut replayed);
        }
        assert_eq!(replayed, recorded);
    }
}
