//! Texture registry
//!
//! Holds RGBA8 image data by name, bounded to [`MAX_TEXTURES`] entries, and
//! uploads each texture to the GPU the first time the renderer asks for it.

use std::path::{Path, PathBuf};

use wgpu::Device;

use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
};

use super::texture_resource::TextureResource;

pub const MAX_TEXTURES: usize = 10;

/// Name of the procedural texture every registry starts with
pub const DEFAULT_TEXTURE: &str = "checker";

/// Weak reference into the texture registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) usize);

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("could not decode texture '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture registry is full ({capacity} entries)")]
    RegistryFull { capacity: usize },
}

struct TextureGpu {
    resource: TextureResource,
    bind_group: wgpu::BindGroup,
}

/// RGBA8 pixels plus their GPU upload
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
    gpu: Option<TextureGpu>,
}

impl Texture {
    /// Layout shared by every texture bind group: view then sampler
    pub fn bind_group_layout(device: &Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Filtering,
            ))
            .create(device, "Texture Bind Group Layout")
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn upload(&mut self, device: &Device, queue: &wgpu::Queue, layout: &BindGroupLayoutWithDesc) {
        if self.gpu.is_some() {
            return;
        }

        let resource = TextureResource::from_rgba(
            device,
            queue,
            &self.pixels,
            self.width,
            self.height,
            &self.name,
        );
        let bind_group = BindGroupBuilder::new(layout)
            .texture(&resource.view)
            .sampler(&resource.sampler)
            .create(device, &format!("Texture Bind Group: {}", self.name));

        self.gpu = Some(TextureGpu {
            resource,
            bind_group,
        });
    }

    fn release(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.resource.texture.destroy();
        }
    }
}

/// Procedural two-tone checkerboard
pub fn checker_pixels(size: u32, cells: u32) -> Vec<u8> {
    let cell = (size / cells.max(1)).max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            let value = if light { 230 } else { 70 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    pixels
}

/// Bounded, name-addressed texture storage
pub struct TextureRegistry {
    textures: Vec<Texture>,
    capacity: usize,
    default_handle: TextureHandle,
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            textures: Vec::new(),
            capacity: MAX_TEXTURES,
            default_handle: TextureHandle(0),
        };
        registry.register_rgba(DEFAULT_TEXTURE, 64, 64, checker_pixels(64, 8));
        registry
    }

    /// Adds RGBA8 pixel data under `name`, replacing an existing entry of that name
    ///
    /// Returns `None` if the data does not match the dimensions or the registry is full.
    pub fn register_rgba(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Option<TextureHandle> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|texels| texels.checked_mul(4));
        if width == 0 || height == 0 || expected != Some(pixels.len()) {
            log::warn!(
                "Texture '{}' has {} bytes, expected {}x{} RGBA",
                name,
                pixels.len(),
                width,
                height
            );
            return None;
        }

        let texture = Texture {
            name: name.to_string(),
            width,
            height,
            pixels,
            gpu: None,
        };

        if let Some(handle) = self.find(name) {
            self.textures[handle.0].release();
            self.textures[handle.0] = texture;
            return Some(handle);
        }

        if self.textures.len() >= self.capacity {
            log::warn!(
                "Texture registry full ({} entries), '{}' not added",
                self.capacity,
                name
            );
            return None;
        }

        self.textures.push(texture);
        Some(TextureHandle(self.textures.len() - 1))
    }

    /// Decodes an image file and registers it under `name`
    pub fn load_from_file(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle, TextureError> {
        let path = path.as_ref();
        if self.find(name).is_none() && self.textures.len() >= self.capacity {
            return Err(TextureError::RegistryFull {
                capacity: self.capacity,
            });
        }

        let image = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();

        let handle = self
            .register_rgba(name, width, height, image.into_raw())
            .ok_or(TextureError::RegistryFull {
                capacity: self.capacity,
            })?;
        log::info!("Loaded texture '{}' from {} ({}x{})", name, path.display(), width, height);
        Ok(handle)
    }

    pub fn find(&self, name: &str) -> Option<TextureHandle> {
        self.textures
            .iter()
            .position(|t| t.name == name)
            .map(TextureHandle)
    }

    /// Looks up a texture by name, falling back to the default
    pub fn resolve_by_name(&self, name: &str) -> TextureHandle {
        self.find(name).unwrap_or_else(|| {
            log::warn!("Unknown texture '{}', using '{}'", name, DEFAULT_TEXTURE);
            self.default_handle
        })
    }

    pub fn default_handle(&self) -> TextureHandle {
        self.default_handle
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0)
    }

    pub fn name_of(&self, handle: TextureHandle) -> &str {
        self.textures
            .get(handle.0)
            .unwrap_or(&self.textures[self.default_handle.0])
            .name
            .as_str()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.textures.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        for texture in &mut self.textures {
            texture.upload(device, queue, layout);
        }
    }

    /// Bind group for a handle, or the default texture's for a stale handle
    pub fn bind_group(&self, handle: TextureHandle) -> Option<&wgpu::BindGroup> {
        self.textures
            .get(handle.0)
            .or_else(|| self.textures.get(self.default_handle.0))
            .and_then(|t| t.gpu.as_ref())
            .map(|gpu| &gpu.bind_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_checker_is_registered() {
        let registry = TextureRegistry::new();
        assert_eq!(registry.len(), 1);
        let checker = registry.get(registry.default_handle()).unwrap();
        assert_eq!(checker.name, DEFAULT_TEXTURE);
        assert_eq!(checker.pixels().len(), 64 * 64 * 4);
    }

    #[test]
    fn test_unknown_texture_falls_back() {
        let registry = TextureRegistry::new();
        assert_eq!(registry.resolve_by_name("missing"), registry.default_handle());
    }

    #[test]
    fn test_rejects_mismatched_pixel_data() {
        let mut registry = TextureRegistry::new();
        assert!(registry.register_rgba("bad", 2, 2, vec![0; 3]).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rejects_dimensions_that_overflow() {
        let mut registry = TextureRegistry::new();
        assert!(registry
            .register_rgba("huge", u32::MAX, u32::MAX, vec![0; 4])
            .is_none());
        assert!(registry.register_rgba("wide", 1 << 16, 1 << 16, vec![0; 4]).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_capacity_and_replacement() {
        let mut registry = TextureRegistry::new();
        for i in 1..MAX_TEXTURES {
            let name = format!("tex{}", i);
            assert!(registry.register_rgba(&name, 1, 1, vec![255; 4]).is_some());
        }
        assert!(registry.register_rgba("overflow", 1, 1, vec![255; 4]).is_none());

        let replaced = registry.register_rgba("tex3", 2, 1, vec![0; 8]);
        assert_eq!(replaced, registry.find("tex3"));
        assert_eq!(registry.get(replaced.unwrap()).unwrap().width, 2);
    }

    #[test]
    fn test_missing_image_file_is_decode_error() {
        let mut registry = TextureRegistry::new();
        let err = registry
            .load_from_file("nope", "/no/such/texture.png")
            .unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
    }

    #[test]
    fn test_checker_alternates() {
        let pixels = checker_pixels(4, 2);
        assert_eq!(pixels[0], 230);
        assert_eq!(pixels[2 * 4], 70);
    }
}
