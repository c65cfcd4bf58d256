//! # User Interface Module
//!
//! Dear ImGui panels for the editor.
//!
//! - [`UiManager`] owns the imgui context and its winit/wgpu glue
//! - [`panel::editor_panel`] draws the editor windows and returns the
//!   [`EditorIntent`]s the user triggered
//!
//! The panel never touches the scene directly. The app applies the returned
//! intents through [`Scene::apply`], which is where history is recorded.
//! While imgui has keyboard or mouse focus the camera ignores that input.
//!
//! [`EditorIntent`]: crate::gfx::scene::EditorIntent
//! [`Scene::apply`]: crate::gfx::scene::Scene::apply

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{editor_panel, EditBuffer, PanelState};
