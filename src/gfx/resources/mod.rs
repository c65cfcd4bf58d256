//! GPU-facing resources
//!
//! Materials, textures and the global uniform bindings shared by all pipelines.

pub mod global_bindings;
pub mod material;
pub mod texture;
pub mod texture_resource;

pub use global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform};
pub use material::{Material, MaterialHandle, MaterialRegistry};
pub use texture::{Texture, TextureHandle, TextureRegistry};
pub use texture_resource::{DepthBuffer, TextureResource};
