//! Pointer input.  Raw window mouse state turned into press/move/release
//! events, plus the user commands that ride alongside them.
//!
//! Consumers only see [`InputEvent`]s; whether they came from a real window
//! or a test script makes no difference.

use crate::region::{NormalizedPoint, RawPoint};

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press(RawPoint),
    Move(RawPoint),
    Release,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserCommand {
    ClearDrawing,
    ToggleColorMode,
    GrantAudioPermission,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Command(UserCommand),
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// PointerTracker
// ════════════════════════════════════════════════════════════════════════════

/// Edge-detects a polled (position, button) pair into [`PointerEvent`]s.
#[derive(Debug, Default)]
pub struct PointerTracker {
    down: bool,
    last: Option<RawPoint>,
}

impl PointerTracker {
    pub fn new() -> Self { Self::default() }

    pub fn is_down(&self) -> bool { self.down }

    /// Feed one frame's worth of mouse state.  A press needs a position; a
    /// held button only reports a move when the pointer actually moved.
    pub fn update(&mut self, pos: Option<(f32, f32)>, down: bool) -> Option<PointerEvent> {
        let point = pos.map(|(x, y)| RawPoint::new(x, y));
        match (self.down, down, point) {
            (false, true, Some(p)) => {
                self.down = true;
                self.last = Some(p);
                Some(PointerEvent::Press(p))
            }
            (true, true, Some(p)) if self.last != Some(p) => {
                self.last = Some(p);
                Some(PointerEvent::Move(p))
            }
            (true, false, _) => {
                self.down = false;
                self.last = None;
                Some(PointerEvent::Release)
            }
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureState
// ════════════════════════════════════════════════════════════════════════════

/// The stroke in progress.  Reset when the gesture ends.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureState {
    pub active:       bool,
    pub last_point:   Option<NormalizedPoint>,
    /// Pressed inside the drawing region; such a gesture wants the transport
    /// running for as long as it is held.
    pub began_inside: bool,
}

impl GestureState {
    pub fn begin(&mut self, at: Option<NormalizedPoint>, inside: bool) {
        self.active       = true;
        self.last_point   = at;
        self.began_inside = inside;
    }

    pub fn reset(&mut self) {
        *self = GestureState::default();
    }
}
