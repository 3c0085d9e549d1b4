use glam::Vec2;
use rustc_hash::FxHashSet;

/// Snapshot of device state for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputState {
    pub keys_down: FxHashSet<u32>,
    pub buttons_down: FxHashSet<u8>,
    pub mouse_position: Vec2,
}

/// Double-buffered input. The window layer injects raw state whenever it
/// arrives; the per-frame poll task snapshots it so every task of the
/// frame observes the same state, and edge queries (pressed/released)
/// compare against the previous frame's snapshot.
pub struct InputComponent {
    pending: InputState,
    current: InputState,
    previous: InputState,
}

impl InputComponent {
    pub fn new() -> Self {
        InputComponent {
            pending: InputState::default(),
            current: InputState::default(),
            previous: InputState::default(),
        }
    }

    // Injection side, called from the window layer.

    pub fn inject_key_down(&mut self, key: u32) {
        self.pending.keys_down.insert(key);
    }

    pub fn inject_key_up(&mut self, key: u32) {
        self.pending.keys_down.remove(&key);
    }

    pub fn inject_button_down(&mut self, button: u8) {
        self.pending.buttons_down.insert(button);
    }

    pub fn inject_button_up(&mut self, button: u8) {
        self.pending.buttons_down.remove(&button);
    }

    pub fn inject_mouse_position(&mut self, position: Vec2) {
        self.pending.mouse_position = position;
    }

    /// Freeze pending state as this frame's snapshot.
    pub fn poll(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.pending.clone());
    }

    // Query side, stable for the duration of a frame.

    pub fn key_down(&self, key: u32) -> bool {
        self.current.keys_down.contains(&key)
    }

    /// Key went down this frame.
    pub fn key_pressed(&self, key: u32) -> bool {
        self.current.keys_down.contains(&key) && !self.previous.keys_down.contains(&key)
    }

    /// Key came up this frame.
    pub fn key_released(&self, key: u32) -> bool {
        !self.current.keys_down.contains(&key) && self.previous.keys_down.contains(&key)
    }

    pub fn button_down(&self, button: u8) -> bool {
        self.current.buttons_down.contains(&button)
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.current.mouse_position
    }
}

impl Default for InputComponent {
    fn default() -> Self {
        InputComponent::new()
    }
}
