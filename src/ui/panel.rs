// src/ui/panel.rs
//! The editor panel
//!
//! Reads the scene and turns widget interaction into [`EditorIntent`]s; it
//! never mutates the scene itself. Continuous widgets (drags, color pickers)
//! edit a local buffer and only emit an intent once the edit is finished, so
//! one drag becomes one undo step.

use cgmath::Vector3;

use crate::gfx::resources::{material::MaterialHandle, texture::TextureHandle};
use crate::gfx::scene::{
    lights::{Light, LightType},
    object::{Color, ObjectId, ObjectKind, ObjectSnapshot, SceneObject, ShadingFlags, Transform},
    scene::{EditorIntent, RenderOption, Scene},
};

/// Smallest scale a drag can produce
pub const MIN_SCALE: f32 = 0.001;

/// In-progress values of the selected object's continuous widgets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditBuffer {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub color: Color,
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::from_transform(&Transform::default(), [1.0; 4])
    }
}

impl EditBuffer {
    pub fn from_transform(transform: &Transform, color: Color) -> Self {
        Self {
            position: transform.position.into(),
            rotation: transform.rotation.into(),
            scale: transform.scale.into(),
            color,
        }
    }

    pub fn from_snapshot(snapshot: &ObjectSnapshot) -> Self {
        Self::from_transform(&snapshot.transform, snapshot.color)
    }

    pub fn transform(&self) -> Transform {
        let [sx, sy, sz] = self.scale.map(|s| s.max(MIN_SCALE));
        Transform {
            position: Vector3::from(self.position),
            rotation: Vector3::from(self.rotation),
            scale: Vector3::new(sx, sy, sz),
        }
    }
}

/// Panel state that must survive between frames
#[derive(Debug, Default)]
pub struct PanelState {
    edit: EditBuffer,
    edit_target: Option<ObjectId>,
    pub project_path: String,
    pub import_path: String,
    pub texture_name: String,
    pub texture_path: String,
    /// Last failure reported back by the app
    pub status: Option<String>,
}

impl PanelState {
    pub fn new(project_path: &str) -> Self {
        Self {
            project_path: project_path.to_string(),
            ..Default::default()
        }
    }

    /// Mirrors the selected object into the edit buffer unless a widget is mid-edit
    pub fn sync(&mut self, selected: Option<&SceneObject>, editing: bool) {
        let target = selected.map(SceneObject::id);
        if editing && target == self.edit_target {
            return;
        }
        self.edit_target = target;
        if let Some(object) = selected {
            self.edit = EditBuffer::from_snapshot(object.state());
        }
    }

    pub fn edit_buffer(&self) -> &EditBuffer {
        &self.edit
    }
}

/// Draws the editor windows and returns what the user asked for this frame
pub fn editor_panel(ui: &imgui::Ui, scene: &Scene, state: &mut PanelState) -> Vec<EditorIntent> {
    let mut intents = Vec::new();

    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return intents;
    }
    let panel_width = (display_size[0] * 0.28).clamp(340.0, 480.0);

    state.sync(scene.selected_object(), ui.is_any_item_active());

    ui.window("Scene")
        .size([panel_width, display_size[1] * 0.9], imgui::Condition::FirstUseEver)
        .position([16.0, 16.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            render_project_controls(ui, scene, state, &mut intents);
            ui.separator();
            render_add_controls(ui, state, &mut intents);
            ui.separator();
            render_object_list(ui, scene, &mut intents);
            ui.separator();
            render_selection(ui, scene, state, &mut intents);
        });

    ui.window("Lighting & History")
        .size([panel_width, display_size[1] * 0.6], imgui::Condition::FirstUseEver)
        .position(
            [display_size[0] - panel_width - 16.0, 16.0],
            imgui::Condition::FirstUseEver,
        )
        .resizable(true)
        .collapsible(true)
        .build(|| {
            render_render_options(ui, scene, &mut intents);
            ui.separator();
            render_lights(ui, scene, &mut intents);
            ui.separator();
            render_history(ui, scene);
        });

    intents
}

fn render_project_controls(
    ui: &imgui::Ui,
    scene: &Scene,
    state: &mut PanelState,
    intents: &mut Vec<EditorIntent>,
) {
    ui.input_text("Project", &mut state.project_path).build();
    let path = std::path::PathBuf::from(state.project_path.trim());

    if ui.button("New") {
        intents.push(EditorIntent::NewProject);
    }
    ui.same_line();
    if ui.button("Save") {
        intents.push(EditorIntent::SaveProject(path.clone()));
    }
    ui.same_line();
    if ui.button("Load") {
        intents.push(EditorIntent::LoadProject(path));
    }

    ui.same_line();
    {
        let _disabled = ui.begin_disabled(!scene.history().can_undo());
        if ui.button("Undo") {
            intents.push(EditorIntent::Undo);
        }
    }
    ui.same_line();
    {
        let _disabled = ui.begin_disabled(!scene.history().can_redo());
        if ui.button("Redo") {
            intents.push(EditorIntent::Redo);
        }
    }

    if let Some(status) = &state.status {
        ui.text_colored([1.0, 0.45, 0.4, 1.0], status);
    }
}

fn render_add_controls(ui: &imgui::Ui, state: &mut PanelState, intents: &mut Vec<EditorIntent>) {
    ui.text("Add");
    for (i, kind) in ObjectKind::PRIMITIVES.into_iter().enumerate() {
        if i > 0 {
            ui.same_line();
        }
        if ui.button(kind.label()) {
            intents.push(EditorIntent::AddObject(kind));
        }
    }

    ui.input_text("Mesh file", &mut state.import_path).build();
    ui.same_line();
    if ui.button("Import") && !state.import_path.trim().is_empty() {
        intents.push(EditorIntent::ImportMesh(state.import_path.trim().into()));
    }

    ui.input_text("Texture name", &mut state.texture_name).build();
    ui.input_text("Texture file", &mut state.texture_path).build();
    ui.same_line();
    if ui.button("Load##texture")
        && !state.texture_name.trim().is_empty()
        && !state.texture_path.trim().is_empty()
    {
        intents.push(EditorIntent::LoadTexture {
            name: state.texture_name.trim().to_string(),
            path: state.texture_path.trim().into(),
        });
    }
}

fn render_object_list(ui: &imgui::Ui, scene: &Scene, intents: &mut Vec<EditorIntent>) {
    let objects = scene.objects();
    ui.text(format!("Objects ({}/{})", objects.len(), objects.capacity()));

    if objects.is_empty() {
        ui.text_disabled("Empty scene. Press 1-5 or use the Add buttons.");
        return;
    }

    ui.child_window("object_list")
        .size([0.0, 160.0])
        .border(true)
        .build(|| {
            for object in objects.iter() {
                let selected = scene.selected() == Some(object.id());
                if ui
                    .selectable_config(object.name())
                    .selected(selected)
                    .build()
                {
                    intents.push(EditorIntent::Select((!selected).then(|| object.id())));
                }
            }
        });
}

fn render_selection(
    ui: &imgui::Ui,
    scene: &Scene,
    state: &mut PanelState,
    intents: &mut Vec<EditorIntent>,
) {
    let Some(object) = scene.selected_object() else {
        ui.text_disabled("Nothing selected");
        if scene.clipboard().is_some() && ui.button("Paste") {
            intents.push(EditorIntent::Paste);
        }
        return;
    };
    let id = object.id();

    ui.text(format!("Selected: {}", object.name()));
    if ui.button("Copy") {
        intents.push(EditorIntent::Copy(id));
    }
    ui.same_line();
    if ui.button("Cut") {
        intents.push(EditorIntent::Cut(id));
    }
    ui.same_line();
    {
        let _disabled = ui.begin_disabled(scene.clipboard().is_none());
        if ui.button("Paste") {
            intents.push(EditorIntent::Paste);
        }
    }
    ui.same_line();
    if ui.button("Delete") {
        intents.push(EditorIntent::RemoveObject(id));
    }

    if ui.collapsing_header("Transform", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        let edit = &mut state.edit;
        let mut committed = false;

        imgui::Drag::new("Position")
            .speed(0.05)
            .build_array(ui, &mut edit.position);
        committed |= ui.is_item_deactivated_after_edit();
        imgui::Drag::new("Rotation")
            .speed(0.5)
            .build_array(ui, &mut edit.rotation);
        committed |= ui.is_item_deactivated_after_edit();
        imgui::Drag::new("Scale")
            .speed(0.01)
            .range(MIN_SCALE, 100.0)
            .build_array(ui, &mut edit.scale);
        committed |= ui.is_item_deactivated_after_edit();

        if ui.button("Reset transform") {
            let position = object.transform().position;
            *edit = EditBuffer::from_transform(&Transform::at(position), edit.color);
            committed = true;
        }

        if committed {
            intents.push(EditorIntent::SetTransform(id, edit.transform()));
        }
    }

    if ui.collapsing_header("Appearance", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        ui.color_edit4("Color", &mut state.edit.color);
        if ui.is_item_deactivated_after_edit() {
            intents.push(EditorIntent::SetColor(id, state.edit.color));
        }

        render_shading(ui, scene, object, intents);
    }

    let meshes = object.geometry().meshes();
    let vertices: usize = meshes.iter().map(|m| m.vertex_count()).sum();
    let triangles: u32 = meshes.iter().map(|m| m.index_count() / 3).sum();
    ui.text_disabled(format!("{vertices} vertices, {triangles} triangles"));
}

fn render_shading(
    ui: &imgui::Ui,
    scene: &Scene,
    object: &SceneObject,
    intents: &mut Vec<EditorIntent>,
) {
    let state = object.state();
    let mut shading = state.shading;
    let mut changed = false;

    changed |= ui.checkbox("Use color", &mut shading.use_color);
    changed |= ui.checkbox("Use texture", &mut shading.use_texture);
    changed |= ui.checkbox("Use PBR material", &mut shading.use_pbr);
    changed |= ui.checkbox("Lit", &mut shading.use_lighting);

    let texture_names: Vec<&str> = scene.textures.names().collect();
    let mut texture_index = state
        .texture
        .map(|handle| scene.textures.name_of(handle))
        .and_then(|name| texture_names.iter().position(|n| *n == name))
        .unwrap_or(0);
    let texture_changed = ui.combo_simple_string("Texture", &mut texture_index, &texture_names);

    let material_names: Vec<&str> = scene.materials.names().collect();
    let mut material_index = state
        .material
        .map(|handle| scene.materials.name_of(handle))
        .and_then(|name| material_names.iter().position(|n| *n == name))
        .unwrap_or(0);
    let material_changed = ui.combo_simple_string("Material", &mut material_index, &material_names);

    if changed || texture_changed || material_changed {
        let texture = texture_names
            .get(texture_index)
            .and_then(|name| scene.textures.find(name));
        let material = material_names
            .get(material_index)
            .and_then(|name| scene.materials.find(name));
        intents.push(shading_intent(object.id(), shading, texture, material));
    }
}

fn shading_intent(
    id: ObjectId,
    shading: ShadingFlags,
    texture: Option<TextureHandle>,
    material: Option<MaterialHandle>,
) -> EditorIntent {
    EditorIntent::SetShading {
        id,
        shading,
        texture,
        material,
    }
}

fn render_render_options(ui: &imgui::Ui, scene: &Scene, intents: &mut Vec<EditorIntent>) {
    ui.text("Render options");
    for option in RenderOption::ALL {
        let mut enabled = scene.settings().get(option);
        if ui.checkbox(option.label(), &mut enabled) {
            intents.push(EditorIntent::ToggleOption(option, enabled));
        }
    }
}

fn render_lights(ui: &imgui::Ui, scene: &Scene, intents: &mut Vec<EditorIntent>) {
    let lights = scene.lights();
    ui.text(format!("Lights ({}/{})", lights.len(), lights.capacity()));

    for light_type in LightType::ALL {
        if light_type != LightType::Directional {
            ui.same_line();
        }
        if ui.button(format!("+ {}", light_type.label())) {
            intents.push(EditorIntent::AddLightInView(light_type));
        }
    }

    for (index, light) in lights.iter().enumerate() {
        let _id = ui.push_id_usize(index);
        let header = format!("{} light {}###light", light.light_type.label(), index + 1);
        if !ui.collapsing_header(&header, imgui::TreeNodeFlags::empty()) {
            continue;
        }

        if let Some(updated) = render_light_editor(ui, light) {
            intents.push(EditorIntent::UpdateLight(index, updated));
        }
        if ui.button("Remove light") {
            intents.push(EditorIntent::RemoveLight(index));
        }
    }
}

/// Lights are not part of the undo history, so edits apply live
fn render_light_editor(ui: &imgui::Ui, light: &Light) -> Option<Light> {
    let mut edited = *light;
    let mut position: [f32; 3] = light.position.into();
    let mut direction: [f32; 3] = light.direction.into();
    let mut color: [f32; 3] = light.color.into();
    let mut changed = false;

    if light.light_type != LightType::Directional {
        changed |= imgui::Drag::new("Position")
            .speed(0.05)
            .build_array(ui, &mut position);
    }
    if light.light_type != LightType::Point {
        changed |= imgui::Drag::new("Direction")
            .speed(0.01)
            .build_array(ui, &mut direction);
    }
    changed |= ui.color_edit3("Light color", &mut color);
    changed |= imgui::Drag::new("Intensity")
        .speed(0.01)
        .range(0.0, 100.0)
        .build(ui, &mut edited.intensity);

    if !changed {
        return None;
    }
    edited.position = Vector3::from(position);
    edited.direction = Vector3::from(direction);
    edited.color = Vector3::from(color);
    Some(edited)
}

fn render_history(ui: &imgui::Ui, scene: &Scene) {
    let history = scene.history();
    ui.text(format!(
        "History ({} undo, {} redo)",
        history.undo_len(),
        history.redo_len()
    ));
    ui.child_window("history_log")
        .size([0.0, 0.0])
        .border(true)
        .build(|| {
            for entry in history.entries() {
                ui.text(entry);
            }
        });
}
