use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::fly_camera::{CameraMovement, FlyCamera};

/// Pixels of trackpad scroll per degree of zoom
const PIXELS_PER_ZOOM_STEP: f32 = 20.0;

/// Turns raw input into fly camera motion
///
/// Keys only latch movement state; [`CameraController::update`] applies it
/// once per frame, scaled by the frame time.
#[derive(Debug, Default)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    is_looking: bool,
    is_panning: bool,
    is_alt_held: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Right button looks around; Alt + left button pans
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Right => self.is_looking = pressed,
            MouseButton::Left => self.is_panning = pressed && self.is_alt_held,
            _ => (),
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, window: &Window, camera: &mut FlyCamera) {
        match event {
            DeviceEvent::MouseWheel { delta } => {
                let scroll_amount = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 / PIXELS_PER_ZOOM_STEP
                    }
                };
                camera.process_mouse_scroll(scroll_amount);
                window.request_redraw();
            }
            DeviceEvent::MouseMotion { delta } => {
                // Screen y grows downward
                let (dx, dy) = (delta.0 as f32, -delta.1 as f32);
                if self.is_panning {
                    camera.pan(dx, dy);
                    window.request_redraw();
                } else if self.is_looking {
                    camera.process_mouse_movement(dx, dy, true);
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        match code {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            KeyCode::Space => self.up = pressed,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.down = pressed,
            KeyCode::AltLeft | KeyCode::AltRight => {
                self.is_alt_held = pressed;
                if !pressed {
                    self.is_panning = false;
                }
            }
            _ => (),
        }
    }

    /// Drops all latched input, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }

    pub fn update(&self, camera: &mut FlyCamera, delta_time: f32) {
        let held = [
            (self.forward, CameraMovement::Forward),
            (self.backward, CameraMovement::Backward),
            (self.left, CameraMovement::Left),
            (self.right, CameraMovement::Right),
            (self.up, CameraMovement::Up),
            (self.down, CameraMovement::Down),
        ];
        for (_, direction) in held.into_iter().filter(|(active, _)| *active) {
            camera.process_keyboard(direction, delta_time);
        }
    }
}
