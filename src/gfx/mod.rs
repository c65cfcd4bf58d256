//! # Graphics Module
//!
//! Everything between the editor's data and the GPU.
//!
//! ## Architecture Overview
//!
//! - **Geometry** ([`geometry`]) - Primitive builders and the OBJ importer
//! - **Scene** ([`scene`]) - Objects, undo history, lights and persistence
//! - **Camera** ([`camera`]) - Free-fly camera and its input controller
//! - **Resources** ([`resources`]) - Materials, textures and global uniforms
//! - **Rendering** ([`rendering`]) - Draw ordering and GPU submission
//!
//! ## Usage
//!
//! ```no_run
//! use stagehand::gfx::{camera::CameraManager, scene::Scene};
//!
//! // The render engine is created by the app once a window exists
//! // let render_engine = RenderEngine::new(window, width, height, &config.window).await;
//! let scene = Scene::new(CameraManager::default());
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::FlyCamera;
pub use rendering::render_engine::RenderEngine;
