//! Small wgpu helpers
//!
//! Typed uniform buffers and builders that pair a bind group layout with the
//! entries it was made from, so bind groups can be checked against it.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;
