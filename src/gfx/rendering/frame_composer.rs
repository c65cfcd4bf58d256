//! Per-frame draw ordering
//!
//! Turns the live object set into a [`FramePlan`] without touching the GPU:
//! opaque objects in manager order, then transparent objects back to front.

use std::cmp::Ordering;

use cgmath::{InnerSpace, Vector3};

use crate::gfx::scene::{
    object::{ObjectId, ObjectUniform, ShadingMode, WHITE},
    object_manager::ObjectManager,
    scene::RenderSettings,
};

/// One object draw with everything the GPU pass needs to bind
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub id: ObjectId,
    /// Storage position, valid for this frame only
    pub index: usize,
    pub distance: f32,
    pub mode: ShadingMode,
    pub uniform: ObjectUniform,
}

#[derive(Debug, Clone, Default)]
pub struct FramePlan {
    pub draw_sky: bool,
    pub opaque: Vec<DrawItem>,
    /// Farthest first
    pub transparent: Vec<DrawItem>,
}

impl FramePlan {
    pub fn compose(
        objects: &ObjectManager,
        camera_position: Vector3<f32>,
        settings: &RenderSettings,
    ) -> Self {
        let mut plan = FramePlan {
            draw_sky: settings.background_enabled,
            ..Default::default()
        };

        for (index, object) in objects.iter().enumerate() {
            let state = object.state();
            let mode = state.shading_mode(settings);
            let color = match mode {
                ShadingMode::Color if !settings.colors_enabled => {
                    [WHITE[0], WHITE[1], WHITE[2], state.color[3]]
                }
                _ => state.color,
            };
            let lit = settings.lighting_enabled && state.shading.use_lighting;

            let item = DrawItem {
                id: state.id,
                index,
                distance: (state.transform.position - camera_position).magnitude(),
                mode,
                uniform: ObjectUniform::new(object.model_matrix(), color, mode, lit),
            };

            if state.is_transparent() {
                plan.transparent.push(item);
            } else {
                plan.opaque.push(item);
            }
        }

        // Stable, so equal distances keep manager order
        plan.transparent
            .sort_by(|a, b| b.distance.partial_cmp(&a.distance).unwrap_or(Ordering::Equal));
        plan
    }

    pub fn draw_count(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    /// Opaque items followed by transparent ones, in submission order
    pub fn draw_order(&self) -> impl Iterator<Item = &DrawItem> {
        self.opaque.iter().chain(&self.transparent)
    }
}
