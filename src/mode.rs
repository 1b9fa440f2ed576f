/// Which controller owns the camera this frame. The set is closed: dispatch
/// is always an exhaustive match, so an unknown mode cannot reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Free-flying camera, passes through everything.
    FreeCamera,
    /// First-person player with gravity and jumping.
    FpsPlayer,
    /// Paused: overlay shown, mouse released, nothing moves.
    Menu,
}

/// Tracks the active mode and which of the two live modes the menu should
/// return to on click.
#[derive(Debug, Clone, Copy)]
pub struct ModeState {
    current: ControlMode,
    /// Last non-menu mode; what a menu click resumes into.
    previous_active: ControlMode,
}

impl ModeState {
    pub fn new(initial: ControlMode) -> Self {
        let previous_active = match initial {
            ControlMode::Menu => ControlMode::FpsPlayer,
            other => other,
        };
        Self {
            current: initial,
            previous_active,
        }
    }

    pub fn current(&self) -> ControlMode {
        self.current
    }

    pub fn is_menu(&self) -> bool {
        self.current == ControlMode::Menu
    }

    /// Relative mouse mode with a hidden cursor is wanted in both live modes.
    pub fn mouse_captured(&self) -> bool {
        self.current != ControlMode::Menu
    }

    /// Open the menu. Returns true when this was an actual transition (the
    /// caller then releases the mouse and flushes buffered deltas).
    pub fn open_menu(&mut self) -> bool {
        if self.current == ControlMode::Menu {
            return false;
        }
        self.previous_active = self.current;
        self.current = ControlMode::Menu;
        true
    }

    /// Leave the menu back to whichever mode was active before it.
    /// Returns true on an actual transition.
    pub fn close_menu(&mut self) -> bool {
        if self.current != ControlMode::Menu {
            return false;
        }
        self.current = self.previous_active;
        true
    }

    /// Switch straight into the free camera (works from any mode).
    /// Returns true on an actual transition.
    pub fn enter_free_camera(&mut self) -> bool {
        if self.current == ControlMode::FreeCamera {
            return false;
        }
        self.current = ControlMode::FreeCamera;
        self.previous_active = ControlMode::FreeCamera;
        true
    }

    /// Switch straight into FPS mode. Returns true on an actual transition.
    pub fn enter_fps(&mut self) -> bool {
        if self.current == ControlMode::FpsPlayer {
            return false;
        }
        self.current = ControlMode::FpsPlayer;
        self.previous_active = ControlMode::FpsPlayer;
        true
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::new(ControlMode::FpsPlayer)
    }
}
