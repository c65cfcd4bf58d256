// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! [`FramePlan`] decides what is drawn and in which order; [`RenderEngine`]
//! executes the plan on the GPU.

pub mod frame_composer;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use frame_composer::{DrawItem, FramePlan};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
