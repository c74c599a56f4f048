//! Input sampling.
//!
//! [`Input`] folds raw window events into key and pointer state as they
//! arrive. Once per frame the render loop takes a [`FrameInput`] snapshot and
//! applies it; nothing in the simulation reacts to window events directly.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Keys the particle system reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    // Camera movement
    W, A, S, D, Q, E,

    // Toggles
    P, Z, L, G, T, X, C, Tab,

    // Generator movement
    Up, Down, Left, Right, Home, End,

    // Point size
    PageUp, PageDown,

    // Modifiers
    ShiftLeft, ControlLeft,

    Escape,

    // Other
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyW => KeyCode::W,
            WinitKeyCode::KeyA => KeyCode::A,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyD => KeyCode::D,
            WinitKeyCode::KeyQ => KeyCode::Q,
            WinitKeyCode::KeyE => KeyCode::E,

            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::KeyZ => KeyCode::Z,
            WinitKeyCode::KeyL => KeyCode::L,
            WinitKeyCode::KeyG => KeyCode::G,
            WinitKeyCode::KeyT => KeyCode::T,
            WinitKeyCode::KeyX => KeyCode::X,
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::Tab => KeyCode::Tab,

            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,
            WinitKeyCode::Home => KeyCode::Home,
            WinitKeyCode::End => KeyCode::End,

            WinitKeyCode::PageUp => KeyCode::PageUp,
            WinitKeyCode::PageDown => KeyCode::PageDown,

            WinitKeyCode::ShiftLeft => KeyCode::ShiftLeft,
            WinitKeyCode::ControlLeft => KeyCode::ControlLeft,

            WinitKeyCode::Escape => KeyCode::Escape,

            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Pointer facts for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    /// Position in normalized device coordinates, y up.
    pub ndc: Vec2,
    /// Accumulated motion this frame in pixels, y up.
    pub delta: Vec2,
    /// Whether the pointer is strictly inside the window.
    pub inside: bool,
    /// Whether the pointer moved this frame.
    pub moved: bool,
}

/// Immutable snapshot of the input facts the render loop applies each frame.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pressed: HashSet<KeyCode>,
    held: HashSet<KeyCode>,
    pub pointer: PointerState,
}

impl FrameInput {
    /// Build a snapshot directly, without a window.
    pub fn new(
        pressed: impl IntoIterator<Item = KeyCode>,
        held: impl IntoIterator<Item = KeyCode>,
        pointer: PointerState,
    ) -> Self {
        Self {
            pressed: pressed.into_iter().collect(),
            held: held.into_iter().collect(),
            pointer,
        }
    }

    /// Key went down this frame.
    pub fn pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Key is currently held down.
    pub fn held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }
}

/// Event accumulator for keyboard and pointer.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_position: Option<Vec2>,
    mouse_ndc: Vec2,
    mouse_delta: Vec2,
    mouse_moved: bool,

    window_size: (u32, u32),
}

impl Input {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            ..Default::default()
        }
    }

    /// Check if a key is currently held down.
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed since the last frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Pointer position in normalized device coordinates (-1 to 1).
    pub fn mouse_ndc(&self) -> Vec2 {
        self.mouse_ndc
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Freeze the current state into a snapshot and start a new frame.
    pub fn take_frame(&mut self) -> FrameInput {
        let (w, h) = self.window_size;
        let inside = self
            .mouse_position
            .map(|p| p.x > 0.0 && p.y > 0.0 && p.x < w as f32 && p.y < h as f32)
            .unwrap_or(false);

        let frame = FrameInput {
            pressed: std::mem::take(&mut self.keys_pressed),
            held: self.keys_held.clone(),
            pointer: PointerState {
                ndc: self.mouse_ndc,
                delta: self.mouse_delta,
                inside,
                moved: self.mouse_moved,
            },
        };

        self.mouse_delta = Vec2::ZERO;
        self.mouse_moved = false;
        frame
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press_key(KeyCode::from(keycode)),
                        ElementState::Released => self.release_key(KeyCode::from(keycode)),
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(position.x as f32, position.y as f32);
            }
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
            }
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
            }
            _ => {}
        }
    }

    pub(crate) fn press_key(&mut self, key: KeyCode) {
        // Only fire pressed event if not already held (no repeat)
        if !self.keys_held.contains(&key) {
            self.keys_pressed.insert(key);
        }
        self.keys_held.insert(key);
    }

    pub(crate) fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub(crate) fn move_cursor(&mut self, x: f32, y: f32) {
        let new_pos = Vec2::new(x, y);
        // The first sample only establishes a reference point
        if let Some(last) = self.mouse_position {
            self.mouse_delta += Vec2::new(new_pos.x - last.x, last.y - new_pos.y);
            self.mouse_moved = true;
        }
        self.mouse_position = Some(new_pos);

        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.mouse_ndc = Vec2::new(
                (x / w as f32) * 2.0 - 1.0,
                -((y / h as f32) * 2.0 - 1.0),
            );
        }
    }
}
