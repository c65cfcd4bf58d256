//! Material system for PBR rendering
//!
//! Materials live in a bounded [`MaterialRegistry`] and objects refer to them
//! through [`MaterialHandle`]s. Name lookups that miss fall back to the
//! registry's default material instead of failing.

use wgpu::Device;

use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    UniformBuffer,
};

/// Maximum number of materials the registry holds
pub const MAX_MATERIALS: usize = 50;

/// Name of the material used when a lookup fails
pub const DEFAULT_MATERIAL: &str = "peacockOre";

/// Weak reference into the material registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub(crate) usize);

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub occlusion_strength: f32,
    _padding0: f32,
    pub emissive: [f32; 3],
    _padding1: f32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Material definition with PBR properties
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub occlusion_strength: f32,
    pub emissive: [f32; 3],

    // GPU resources, shared by all objects using this material
    material_ubo: Option<MaterialUBO>,
    bind_group: Option<wgpu::BindGroup>,
}

impl Material {
    /// Metallic and roughness are clamped to `0..=1`
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            occlusion_strength: 1.0,
            emissive: [0.0, 0.0, 0.0],
            material_ubo: None,
            bind_group: None,
        }
    }

    pub fn with_occlusion(mut self, strength: f32) -> Self {
        self.occlusion_strength = strength.clamp(0.0, 1.0);
        self
    }

    pub fn with_emission(mut self, r: f32, g: f32, b: f32) -> Self {
        self.emissive = [r, g, b];
        self
    }

    /// Layout shared by every material bind group
    pub fn bind_group_layout(device: &Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Material Bind Group Layout")
    }

    fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            occlusion_strength: self.occlusion_strength,
            _padding0: 0.0,
            emissive: self.emissive,
            _padding1: 0.0,
        }
    }

    /// Creates the uniform buffer and bind group on first use and syncs properties
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        let uniform = self.uniform();
        let ubo = self
            .material_ubo
            .get_or_insert_with(|| MaterialUBO::new(device));
        ubo.update_content(queue, uniform);

        if self.bind_group.is_none() {
            self.bind_group = Some(
                BindGroupBuilder::new(layout)
                    .resource(ubo.binding_resource())
                    .create(device, &format!("Material Bind Group: {}", self.name)),
            );
        }
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

/// Bounded, name-addressed material storage
///
/// Handles are indices into the registry and stay valid for its lifetime;
/// registering an existing name updates that entry in place.
pub struct MaterialRegistry {
    materials: Vec<Material>,
    capacity: usize,
    default_handle: MaterialHandle,
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialRegistry {
    /// Creates a registry seeded with the built-in presets
    pub fn new() -> Self {
        let materials = vec![
            Material::new(DEFAULT_MATERIAL, [0.22, 0.36, 0.78, 1.0], 0.85, 0.35)
                .with_emission(0.02, 0.04, 0.06),
            Material::new("rockyAsphalt", [0.21, 0.21, 0.22, 1.0], 0.0, 0.92),
            Material::new("chunkyRockface", [0.46, 0.41, 0.36, 1.0], 0.0, 0.85).with_occlusion(0.8),
            Material::new("stainlessSteel", [0.78, 0.78, 0.80, 1.0], 1.0, 0.25),
        ];

        Self {
            materials,
            capacity: MAX_MATERIALS,
            default_handle: MaterialHandle(0),
        }
    }

    /// Makes `name` the fallback material if it is registered
    pub fn set_default(&mut self, name: &str) -> bool {
        match self.find(name) {
            Some(handle) => {
                self.default_handle = handle;
                true
            }
            None => {
                log::warn!("Cannot make unknown material '{}' the default", name);
                false
            }
        }
    }

    /// Adds a material, or replaces the one with the same name
    ///
    /// Returns `None` when the registry is full.
    pub fn register(&mut self, material: Material) -> Option<MaterialHandle> {
        if let Some(handle) = self.find(&material.name) {
            self.materials[handle.0] = material;
            return Some(handle);
        }

        if self.materials.len() >= self.capacity {
            log::warn!(
                "Material registry full ({} entries), '{}' not added",
                self.capacity,
                material.name
            );
            return None;
        }

        self.materials.push(material);
        Some(MaterialHandle(self.materials.len() - 1))
    }

    pub fn find(&self, name: &str) -> Option<MaterialHandle> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(MaterialHandle)
    }

    /// Looks up a material by name, falling back to the default
    pub fn resolve_by_name(&self, name: &str) -> MaterialHandle {
        self.find(name).unwrap_or_else(|| {
            log::warn!(
                "Unknown material '{}', using '{}'",
                name,
                self.materials[self.default_handle.0].name
            );
            self.default_handle
        })
    }

    pub fn default_handle(&self) -> MaterialHandle {
        self.default_handle
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.0)
    }

    /// The material for a handle, or the default one for a stale handle
    pub fn get_or_default(&self, handle: MaterialHandle) -> &Material {
        self.materials
            .get(handle.0)
            .unwrap_or(&self.materials[self.default_handle.0])
    }

    pub fn name_of(&self, handle: MaterialHandle) -> &str {
        &self.get_or_default(handle).name
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        for material in &mut self.materials {
            material.update_gpu_resources(device, queue, layout);
        }
    }

    pub fn bind_group(&self, handle: MaterialHandle) -> Option<&wgpu::BindGroup> {
        self.get_or_default(handle).bind_group()
    }
}
