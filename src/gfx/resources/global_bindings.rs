//! Per-frame global uniforms shared by every pipeline
//!
//! Bound at group 0: the camera, the light array and the global render toggles.

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    gfx::{
        camera::camera_utils::CameraUniform,
        scene::{
            lights::{LightSystem, LightUniform, MAX_LIGHTS},
            scene::RenderSettings,
        },
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform content
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    /// Camera position in homogeneous coordinates
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    /// Used by the sky pass to turn clip positions into view rays
    pub inv_view_proj: [[f32; 4]; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
    /// x: light count, y: lighting enabled, z: colors enabled, w: unused
    pub params: [u32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &CameraUniform, lights: &LightSystem, settings: &RenderSettings) -> Self {
        let view_proj = Matrix4::from(camera.view_proj);
        let inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity);
        let (lights, light_count) = lights.to_uniforms();

        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            inv_view_proj: inv_view_proj.into(),
            lights,
            params: [
                light_count,
                settings.lighting_enabled as u32,
                settings.colors_enabled as u32,
                0,
            ],
        }
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Layout and bind group for the global uniform buffer
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_matches_shader_layout() {
        // 16 + 64 + 64 + 10 * 64 + 16
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 800);
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
    }

    #[test]
    fn test_toggles_and_light_count() {
        let mut settings = RenderSettings::default();
        settings.lighting_enabled = false;
        let lights = LightSystem::with_defaults(MAX_LIGHTS);

        let globals = GlobalUniform::new(&CameraUniform::default(), &lights, &settings);
        assert_eq!(globals.params, [1, 0, 1, 0]);
        assert_eq!(globals.inv_view_proj, globals.view_proj);
    }
}
