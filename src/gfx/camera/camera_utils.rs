use cgmath::{Matrix4, SquareMatrix, Vector3};
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton},
    window::Window,
};

use super::{camera_controller::CameraController, fly_camera::FlyCamera};

/// The editor camera together with the input state that drives it
pub struct CameraManager {
    pub camera: FlyCamera,
    pub controller: CameraController,
}

impl Default for CameraManager {
    fn default() -> Self {
        Self::new(FlyCamera::default(), CameraController::new())
    }
}

impl CameraManager {
    pub fn new(camera: FlyCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        self.controller
            .process_events(event, window, &mut self.camera);
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller.process_keyed_events(event);
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.controller.process_mouse_button(button, state);
    }

    /// Applies held movement keys and refreshes the camera uniform
    pub fn update(&mut self, delta_time: f32) {
        self.controller.update(&mut self.camera, delta_time);
        self.camera.update_view_proj();
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// Eye position; `w` is padding so the matrix stays 16-byte aligned
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }
}

impl CameraUniform {
    pub fn set(&mut self, eye: Vector3<f32>, view_proj: Matrix4<f32>) {
        self.view_position = [eye.x, eye.y, eye.z, 1.0];
        self.view_proj = view_proj.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }

    #[test]
    fn test_set_pads_eye_with_one() {
        let mut uniform = CameraUniform::default();
        let translation = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        uniform.set(Vector3::new(4.0, 5.0, 6.0), translation);
        assert_eq!(uniform.view_position, [4.0, 5.0, 6.0, 1.0]);
        assert_eq!(uniform.view_proj[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_manager_update_refreshes_uniform() {
        let mut manager = CameraManager::default();
        assert_eq!(manager.camera.uniform, CameraUniform::default());
        manager.update(0.016);
        assert_eq!(manager.camera.uniform.view_position, [0.0, 0.0, 3.0, 1.0]);
    }
}
