// Input state tracking for keyboard and pointer
// Abstracts winit events into a queryable per-frame snapshot

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,
    // Pressed this frame, auto-repeat excluded. Reset in end_frame().
    keys_pressed: HashSet<KeyCode>,

    // Pointer
    pub pointer_position: Vec2,
    /// Cleared when the cursor leaves the window.
    pub pointer_inside: bool,
    /// Left click position this frame, if any.
    pub click: Option<Vec2>,

    pub window_size: (u32, u32),
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            pointer_position: Vec2::ZERO,
            pointer_inside: false,
            click: None,
            window_size: (0, 0),
        }
    }

    /// Feed a winit WindowEvent into the input state.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !event.repeat {
                                self.keys_pressed.insert(key);
                            }
                            self.keys_held.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_held.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_position = Vec2::new(position.x as f32, position.y as f32);
                self.pointer_inside = true;
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer_inside = false;
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                self.click = Some(self.pointer_position);
            }
            WindowEvent::Focused(false) => {
                // Key-up events are lost while unfocused; don't keep walking.
                self.keys_held.clear();
            }
            WindowEvent::Resized(size) => {
                self.window_size = (size.width, size.height);
            }
            _ => {}
        }
    }

    /// Call once per processed frame after the tick has consumed input.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.click = None;
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.window_size.0 as f32, self.window_size.1 as f32)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the gallery reads from input each tick. Decoupled from winit so the
/// tick can be driven by tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub forward: bool,
    pub back: bool,
    pub select_nearest: bool,
    pub deselect: bool,
    pub reset_camera: bool,
    /// Pointer position while it is inside the window. Hover is re-cast from
    /// it every processed frame, moved or not.
    pub hover: Option<Vec2>,
    pub click: Option<Vec2>,
    pub viewport: Vec2,
}

impl FrameInput {
    /// Key bindings: W/S walk, Space views the nearest artwork, Escape leaves
    /// it, R resets the camera.
    pub fn from_state(input: &InputState) -> Self {
        Self {
            forward: input.is_key_held(KeyCode::KeyW),
            back: input.is_key_held(KeyCode::KeyS),
            select_nearest: input.was_pressed(KeyCode::Space),
            deselect: input.was_pressed(KeyCode::Escape),
            reset_camera: input.was_pressed(KeyCode::KeyR),
            hover: input.pointer_inside.then_some(input.pointer_position),
            click: input.click,
            viewport: input.viewport(),
        }
    }
}
