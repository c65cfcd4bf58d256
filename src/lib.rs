// src/lib.rs
//! Stagehand 3D scene editor
//!
//! An interactive editor built on wgpu and winit: place primitives and
//! imported meshes, light them, undo and redo every edit, and save the
//! result as a JSON project.

pub mod app;
pub mod config;
pub mod gfx;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

pub use app::EditorApp;
pub use config::EditorConfig;

/// Creates an editor using `stagehand.toml` from the working directory, if any
pub fn default() -> Result<EditorApp, winit::error::EventLoopError> {
    EditorApp::new(EditorConfig::load_or_default(config::DEFAULT_CONFIG_PATH))
}
