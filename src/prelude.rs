//! # Stagehand Prelude
//!
//! The types most programs touch when driving the editor from code.
//!
//! ```no_run
//! use stagehand::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = stagehand::default()?;
//!     let scene = app.scene_mut();
//!     if let Some(id) = scene.add_object_with_action(ObjectKind::Sphere) {
//!         scene.change_color_with_action(id, [0.9, 0.3, 0.2, 1.0]);
//!     }
//!     app.run()?;
//!     Ok(())
//! }
//! ```

pub use crate::app::EditorApp;
pub use crate::config::EditorConfig;
pub use crate::default;

pub use crate::gfx::camera::{CameraManager, FlyCamera};
pub use crate::gfx::geometry::{
    generate_cube, generate_cylinder, generate_plane, generate_pyramid, generate_sphere,
    GeometryData,
};
pub use crate::gfx::scene::{
    EditorError, EditorIntent, Light, LightType, ObjectId, ObjectKind, ProjectData, RenderOption,
    RenderSettings, Scene, Transform,
};

pub use cgmath::{InnerSpace, Vector3, Zero};
