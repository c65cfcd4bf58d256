//! # Scene Management Module
//!
//! The editable scene: objects with stable ids, the undo history, dynamic
//! lights and project persistence.
//!
//! ## Key Components
//!
//! - [`Scene`] - Owns everything below and exposes the undoable operations
//! - [`ObjectManager`] - Bounded, densely packed object storage
//! - [`ActionHistory`] - Undo/redo stacks of object snapshots
//! - [`LightSystem`] - Up to ten directional, point or spot lights
//! - [`ProjectData`] - The JSON project format
//!
//! ## Usage
//!
//! ```no_run
//! use stagehand::gfx::camera::CameraManager;
//! use stagehand::gfx::scene::{ObjectKind, Scene};
//!
//! let mut scene = Scene::new(CameraManager::default());
//! let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();
//! scene.remove_object_with_action(id);
//! scene.undo();
//! ```

pub mod history;
pub mod lights;
pub mod object;
pub mod object_manager;
pub mod project;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use history::{Action, ActionHistory, ActionKind};
pub use lights::{Light, LightSystem, LightType};
pub use object::{
    Color, DrawObject, ObjectId, ObjectKind, ObjectSnapshot, SceneObject, ShadingFlags, Shape,
    Transform,
};
pub use object_manager::{ObjectManager, ObjectSpec};
pub use project::{ProjectData, ProjectError};
pub use scene::{EditorError, EditorIntent, RenderOption, RenderSettings, Scene};
pub use vertex::Vertex3D;
