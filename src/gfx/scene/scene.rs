use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::EditorConfig,
    gfx::{
        camera::{camera_utils::CameraManager, FlyCamera},
        geometry::{import_mesh, ImportError, MeshData},
        resources::{
            material::{MaterialHandle, MaterialRegistry, DEFAULT_MATERIAL},
            texture::{TextureError, TextureHandle, TextureRegistry},
        },
    },
};

use super::{
    history::{Action, ActionHistory},
    lights::{white_light, Light, LightSystem, LightType},
    object::{Color, ObjectId, ObjectKind, ObjectSnapshot, SceneObject, ShadingFlags, Shape, Transform},
    object_manager::{ObjectManager, ObjectSpec},
    project::{CameraState, ObjectRecord, ProjectData, ProjectError},
};

/// Global render toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderOption {
    Textures,
    Colors,
    Lighting,
    Pbr,
    Background,
}

impl RenderOption {
    pub const ALL: [RenderOption; 5] = [
        RenderOption::Textures,
        RenderOption::Colors,
        RenderOption::Lighting,
        RenderOption::Pbr,
        RenderOption::Background,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RenderOption::Textures => "Textures",
            RenderOption::Colors => "Colors",
            RenderOption::Lighting => "Lighting",
            RenderOption::Pbr => "PBR",
            RenderOption::Background => "Background",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub textures_enabled: bool,
    pub colors_enabled: bool,
    pub lighting_enabled: bool,
    pub pbr_enabled: bool,
    /// Draw the sky behind the scene
    pub background_enabled: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            textures_enabled: true,
            colors_enabled: true,
            lighting_enabled: true,
            pbr_enabled: true,
            background_enabled: true,
        }
    }
}

impl RenderSettings {
    pub fn get(&self, option: RenderOption) -> bool {
        match option {
            RenderOption::Textures => self.textures_enabled,
            RenderOption::Colors => self.colors_enabled,
            RenderOption::Lighting => self.lighting_enabled,
            RenderOption::Pbr => self.pbr_enabled,
            RenderOption::Background => self.background_enabled,
        }
    }

    pub fn set(&mut self, option: RenderOption, value: bool) {
        let slot = match option {
            RenderOption::Textures => &mut self.textures_enabled,
            RenderOption::Colors => &mut self.colors_enabled,
            RenderOption::Lighting => &mut self.lighting_enabled,
            RenderOption::Pbr => &mut self.pbr_enabled,
            RenderOption::Background => &mut self.background_enabled,
        };
        *slot = value;
    }
}

/// A discrete request from the input or UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum EditorIntent {
    AddObject(ObjectKind),
    ImportMesh(PathBuf),
    RemoveObject(ObjectId),
    SetTransform(ObjectId, Transform),
    SetColor(ObjectId, Color),
    SetShading {
        id: ObjectId,
        shading: ShadingFlags,
        texture: Option<TextureHandle>,
        material: Option<MaterialHandle>,
    },
    Select(Option<ObjectId>),
    Undo,
    Redo,
    Cut(ObjectId),
    Copy(ObjectId),
    Paste,
    ToggleOption(RenderOption, bool),
    AddLight(Light),
    AddLightInView(LightType),
    UpdateLight(usize, Light),
    RemoveLight(usize),
    LoadTexture { name: String, path: PathBuf },
    SaveProject(PathBuf),
    LoadProject(PathBuf),
    NewProject,
}

/// Failures an intent can report back to the UI
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// The editable scene and everything that acts on it
///
/// Object storage is private: user-visible mutations go through the
/// `*_with_action` methods so each one lands in the undo history.
pub struct Scene {
    pub camera_manager: CameraManager,
    pub materials: MaterialRegistry,
    pub textures: TextureRegistry,
    objects: ObjectManager,
    history: ActionHistory,
    lights: LightSystem,
    settings: RenderSettings,
    selection: Option<ObjectId>,
    clipboard: Option<ObjectSnapshot>,
    spawn_distance: f32,
}

impl Scene {
    pub fn new(camera_manager: CameraManager) -> Self {
        Self::from_config(&EditorConfig::default(), camera_manager)
    }

    pub fn from_config(config: &EditorConfig, mut camera_manager: CameraManager) -> Self {
        let camera = &mut camera_manager.camera;
        camera.movement_speed = config.camera.movement_speed;
        camera.mouse_sensitivity = config.camera.mouse_sensitivity;
        camera.invert_y = config.camera.invert_y;

        let mut materials = MaterialRegistry::new();
        materials.set_default(&config.scene.default_material);

        Self {
            camera_manager,
            materials,
            textures: TextureRegistry::new(),
            objects: ObjectManager::new(config.scene.max_objects),
            history: ActionHistory::new(config.scene.max_actions),
            lights: LightSystem::with_defaults(config.scene.max_lights),
            settings: RenderSettings::default(),
            selection: None,
            clipboard: None,
            spawn_distance: config.scene.spawn_distance,
        }
    }

    /// Per-frame logic: camera movement and matrices
    pub fn update(&mut self, delta_time: f32) {
        self.camera_manager.update(delta_time);
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera_manager.camera
    }

    pub fn objects(&self) -> &ObjectManager {
        &self.objects
    }

    pub(crate) fn objects_mut(&mut self) -> &mut ObjectManager {
        &mut self.objects
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn lights(&self) -> &LightSystem {
        &self.lights
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn clipboard(&self) -> Option<&ObjectSnapshot> {
        self.clipboard.as_ref()
    }

    // Selection

    /// Selects a live object, or clears the selection with `None`
    pub fn select(&mut self, id: Option<ObjectId>) -> bool {
        match id {
            Some(id) if self.objects.find(id).is_none() => {
                log::warn!("Cannot select {}, no such object", id);
                false
            }
            _ => {
                self.selection = id;
                true
            }
        }
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selection.and_then(|id| self.objects.find(id))
    }

    fn validate_selection(&mut self) {
        if let Some(id) = self.selection {
            if self.objects.find(id).is_none() {
                self.selection = None;
            }
        }
    }

    // Undoable object operations

    fn spawn_spec(&self, shape: Shape) -> ObjectSpec {
        let position = self.camera().spawn_point(self.spawn_distance);
        let mut spec = ObjectSpec::new(shape, Transform::at(position));
        spec.shading.use_lighting = self.settings.lighting_enabled;
        spec.texture = Some(self.textures.default_handle());
        spec.material = Some(self.materials.default_handle());
        spec
    }

    fn add_with_action(&mut self, spec: ObjectSpec) -> Option<ObjectId> {
        let id = self.objects.add_object(spec)?;
        let index = self.objects.index_of(id)?;
        let snapshot = self.objects.find(id)?.snapshot();
        self.history.record(Action::add(snapshot, index));
        Some(id)
    }

    /// Adds a primitive in front of the camera; `None` if rejected
    pub fn add_object_with_action(&mut self, kind: ObjectKind) -> Option<ObjectId> {
        let Some(shape) = Shape::primitive(kind) else {
            log::warn!("{} objects are created by importing a mesh file", kind.label());
            return None;
        };
        self.add_with_action(self.spawn_spec(shape))
    }

    /// Imports a mesh file and places it in front of the camera
    ///
    /// `Ok(None)` means the import was skipped because the scene is full.
    pub fn import_mesh_with_action(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Option<ObjectId>, ImportError> {
        if self.objects.is_full() {
            log::warn!(
                "Object limit of {} reached, {} not imported",
                self.objects.capacity(),
                path.as_ref().display()
            );
            return Ok(None);
        }

        let data = import_mesh(path)?;
        Ok(self.add_with_action(self.spawn_spec(Shape::Mesh(Arc::new(data)))))
    }

    /// Removes an object; a removed selection moves to the object that took its place
    pub fn remove_object_with_action(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.objects.index_of(id) else {
            log::warn!("Cannot remove {}, no such object", id);
            return false;
        };
        let Some(snapshot) = self.objects.remove_object(index) else {
            return false;
        };
        self.history.record(Action::remove(snapshot, index));

        if self.selection == Some(id) {
            let neighbor = index.min(self.objects.len().saturating_sub(1));
            self.selection = self.objects.get(neighbor).map(SceneObject::id);
        }
        true
    }

    /// Captures the object, lets `edit` change a copy, then applies and records it
    fn modify_with_action(
        &mut self,
        id: ObjectId,
        edit: impl FnOnce(&mut ObjectSnapshot),
        action: fn(ObjectSnapshot, ObjectSnapshot, usize) -> Action,
    ) -> bool {
        let (Some(index), Some(object)) = (self.objects.index_of(id), self.objects.find(id)) else {
            log::warn!("Cannot modify {}, no such object", id);
            return false;
        };

        let previous = object.snapshot();
        let mut new = previous.clone();
        edit(&mut new);
        if new == previous {
            return false;
        }

        self.objects.update_object(&new);
        self.history.record(action(previous, new, index));
        true
    }

    pub fn transform_object_with_action(&mut self, id: ObjectId, transform: Transform) -> bool {
        self.modify_with_action(id, |s| s.transform = transform, Action::transform)
    }

    pub fn change_color_with_action(&mut self, id: ObjectId, color: Color) -> bool {
        self.modify_with_action(id, |s| s.color = color, Action::recolor)
    }

    pub fn set_shading_with_action(
        &mut self,
        id: ObjectId,
        shading: ShadingFlags,
        texture: Option<TextureHandle>,
        material: Option<MaterialHandle>,
    ) -> bool {
        self.modify_with_action(
            id,
            |s| {
                s.shading = shading.normalized();
                s.texture = texture;
                s.material = material;
            },
            Action::restyle,
        )
    }

    /// Flips a global toggle and records it in the history
    pub fn toggle_option_with_action(&mut self, option: RenderOption, value: bool) -> bool {
        let previous = self.settings.get(option);
        if previous == value {
            return false;
        }
        self.settings.set(option, value);
        self.history.record(Action::toggle(option, previous, value));
        true
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.objects, &mut self.settings);
        self.validate_selection();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.objects, &mut self.settings);
        self.validate_selection();
        redone
    }

    // Clipboard

    pub fn copy(&mut self, id: ObjectId) -> bool {
        match self.objects.find(id) {
            Some(object) => {
                self.clipboard = Some(object.snapshot());
                true
            }
            None => {
                log::warn!("Cannot copy {}, no such object", id);
                false
            }
        }
    }

    pub fn cut(&mut self, id: ObjectId) -> bool {
        self.copy(id) && self.remove_object_with_action(id)
    }

    /// Adds a copy of the clipboard object one unit along +X and selects it
    pub fn paste(&mut self) -> Option<ObjectId> {
        let source = self.clipboard.as_ref()?;
        let mut transform = source.transform;
        transform.position.x += 1.0;

        let spec = ObjectSpec {
            shape: source.shape.clone(),
            transform,
            color: source.color,
            shading: source.shading,
            texture: source.texture,
            material: source.material,
        };
        let id = self.add_with_action(spec)?;
        self.selection = Some(id);
        Some(id)
    }

    // Lights

    pub fn add_light(&mut self, light: Light) -> Option<usize> {
        self.lights.add_light(light)
    }

    /// Adds a white light placed like new objects and facing the view direction
    pub fn add_light_in_view(&mut self, light_type: LightType) -> Option<usize> {
        let camera = self.camera();
        let position = match light_type {
            LightType::Directional => camera.position,
            LightType::Point | LightType::Spot => camera.spawn_point(self.spawn_distance),
        };
        let light = white_light(light_type, position, camera.front);
        self.add_light(light)
    }

    pub fn update_light(&mut self, index: usize, light: Light) -> bool {
        self.lights.update_light(index, light)
    }

    pub fn remove_light(&mut self, index: usize) -> bool {
        self.lights.remove_light(index).is_some()
    }

    // Projects

    /// Empties the scene and restores default lights and toggles
    pub fn new_project(&mut self) {
        self.objects.initialize();
        self.history.clear();
        self.lights.reset_to_defaults();
        self.settings = RenderSettings::default();
        self.selection = None;
        self.clipboard = None;
        log::info!("Started a new project");
    }

    pub fn to_project_data(&self) -> ProjectData {
        let objects = self
            .objects
            .iter()
            .map(|object| {
                let state = object.state();
                ObjectRecord {
                    kind: state.kind(),
                    transform: state.transform,
                    color: state.color,
                    shading: state.shading,
                    texture_name: state.texture.map(|h| self.textures.name_of(h).to_string()),
                    material_name: state.material.map(|h| self.materials.name_of(h).to_string()),
                    model_path: match &state.shape {
                        Shape::Mesh(data) => Some(data.source.clone()),
                        _ => None,
                    },
                }
            })
            .collect();

        ProjectData {
            objects,
            lights: self.lights.iter().copied().collect(),
            camera: CameraState::from_camera(self.camera()),
            settings: self.settings,
        }
    }

    /// Replaces the whole scene with project contents; returns how many objects were placed
    ///
    /// Mesh objects whose file can no longer be imported are skipped.
    pub fn apply_project_data(&mut self, data: ProjectData) -> usize {
        self.objects.initialize();
        self.history.clear();
        self.selection = None;
        self.clipboard = None;

        self.lights.clear();
        for light in data.lights {
            self.lights.add_light(light);
        }
        self.settings = data.settings;
        data.camera.apply_to(&mut self.camera_manager.camera);

        let mut meshes: HashMap<PathBuf, Arc<MeshData>> = HashMap::new();
        let mut placed = 0;
        for record in data.objects {
            let Some(shape) = self.shape_for_record(&record, &mut meshes) else {
                continue;
            };

            let texture = match &record.texture_name {
                Some(name) => self.textures.resolve_by_name(name),
                None => self.textures.default_handle(),
            };
            let material = self
                .materials
                .resolve_by_name(record.material_name.as_deref().unwrap_or(DEFAULT_MATERIAL));

            let spec = ObjectSpec {
                shape,
                transform: record.transform,
                color: record.color,
                shading: record.shading,
                texture: Some(texture),
                material: Some(material),
            };
            if self.objects.add_object(spec).is_some() {
                placed += 1;
            }
        }
        placed
    }

    fn shape_for_record(
        &self,
        record: &ObjectRecord,
        meshes: &mut HashMap<PathBuf, Arc<MeshData>>,
    ) -> Option<Shape> {
        if let Some(shape) = Shape::primitive(record.kind) {
            return Some(shape);
        }

        let Some(path) = &record.model_path else {
            log::warn!("Skipping model without a file path");
            return None;
        };
        if let Some(data) = meshes.get(path) {
            return Some(Shape::Mesh(Arc::clone(data)));
        }

        match import_mesh(path) {
            Ok(data) => {
                let data = Arc::new(data);
                meshes.insert(path.clone(), Arc::clone(&data));
                Some(Shape::Mesh(data))
            }
            Err(err) => {
                log::warn!("Skipping model: {}", err);
                None
            }
        }
    }

    pub fn save_project(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        self.to_project_data().save(path)?;
        log::info!("Saved {} objects to {}", self.objects.len(), path.display());
        Ok(())
    }

    /// Loads a project file; on error the current scene is left untouched
    pub fn load_project(&mut self, path: impl AsRef<Path>) -> Result<usize, ProjectError> {
        let path = path.as_ref();
        let data = ProjectData::load(path)?;
        let placed = self.apply_project_data(data);
        log::info!("Loaded {} objects from {}", placed, path.display());
        Ok(placed)
    }

    // Intent dispatch

    /// Applies one request from the input or UI layer
    ///
    /// Rejections (full scene, unknown id) are logged and are not errors;
    /// failed file operations are.
    pub fn apply(&mut self, intent: EditorIntent) -> Result<(), EditorError> {
        match intent {
            EditorIntent::AddObject(kind) => {
                if let Some(id) = self.add_object_with_action(kind) {
                    self.selection = Some(id);
                }
            }
            EditorIntent::ImportMesh(path) => {
                if let Some(id) = self.import_mesh_with_action(&path)? {
                    self.selection = Some(id);
                }
            }
            EditorIntent::RemoveObject(id) => {
                self.remove_object_with_action(id);
            }
            EditorIntent::SetTransform(id, transform) => {
                self.transform_object_with_action(id, transform);
            }
            EditorIntent::SetColor(id, color) => {
                self.change_color_with_action(id, color);
            }
            EditorIntent::SetShading {
                id,
                shading,
                texture,
                material,
            } => {
                self.set_shading_with_action(id, shading, texture, material);
            }
            EditorIntent::Select(id) => {
                self.select(id);
            }
            EditorIntent::Undo => {
                self.undo();
            }
            EditorIntent::Redo => {
                self.redo();
            }
            EditorIntent::Cut(id) => {
                self.cut(id);
            }
            EditorIntent::Copy(id) => {
                self.copy(id);
            }
            EditorIntent::Paste => {
                self.paste();
            }
            EditorIntent::ToggleOption(option, value) => {
                self.toggle_option_with_action(option, value);
            }
            EditorIntent::AddLight(light) => {
                self.add_light(light);
            }
            EditorIntent::AddLightInView(light_type) => {
                self.add_light_in_view(light_type);
            }
            EditorIntent::UpdateLight(index, light) => {
                self.update_light(index, light);
            }
            EditorIntent::RemoveLight(index) => {
                self.remove_light(index);
            }
            EditorIntent::LoadTexture { name, path } => {
                self.textures.load_from_file(&name, &path)?;
            }
            EditorIntent::SaveProject(path) => self.save_project(&path)?,
            EditorIntent::LoadProject(path) => {
                self.load_project(&path)?;
            }
            EditorIntent::NewProject => self.new_project(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector3;

    fn scene() -> Scene {
        Scene::new(CameraManager::default())
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stagehand-scene-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_new_objects_spawn_in_front_of_camera() {
        let mut scene = scene();
        let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        let object = scene.objects().find(id).unwrap();

        assert_eq!(object.name(), format!("Cube {}", id.value()));
        let position = object.transform().position;
        assert_relative_eq!(position.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(position.z, -2.0, epsilon = 1e-5);
        assert!(object.shading().use_color);
        assert!(scene.history().can_undo());
    }

    #[test]
    fn test_mesh_kind_needs_import() {
        let mut scene = scene();
        assert!(scene.add_object_with_action(ObjectKind::Mesh).is_none());
        assert!(scene.objects().is_empty());
        assert!(!scene.history().can_undo());
    }

    #[test]
    fn test_spawned_lighting_follows_global_toggle() {
        let mut scene = scene();
        scene.toggle_option_with_action(RenderOption::Lighting, false);
        let id = scene.add_object_with_action(ObjectKind::Sphere).unwrap();
        assert!(!scene.objects().find(id).unwrap().shading().use_lighting);
    }

    #[test]
    fn test_undo_redo_inverse_law() {
        let mut scene = scene();
        for kind in [ObjectKind::Cube, ObjectKind::Sphere, ObjectKind::Pyramid, ObjectKind::Cylinder] {
            scene.add_object_with_action(kind);
        }
        let id = scene.add_object_with_action(ObjectKind::Plane).unwrap();
        assert_eq!(id.value(), 5);
        let before = scene.objects().find(id).unwrap().snapshot();

        assert!(scene.undo());
        assert_eq!(scene.objects().len(), 4);
        assert!(scene.objects().find(id).is_none());

        assert!(scene.redo());
        assert_eq!(scene.objects().len(), 5);
        assert_eq!(scene.objects().find(id).unwrap().snapshot(), before);
    }

    #[test]
    fn test_removing_selection_moves_to_neighbor() {
        let mut scene = scene();
        let a = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        let b = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        let c = scene.add_object_with_action(ObjectKind::Cube).unwrap();

        scene.select(Some(b));
        assert!(scene.remove_object_with_action(b));
        assert_eq!(scene.selected(), Some(c));

        scene.select(Some(c));
        assert!(scene.remove_object_with_action(c));
        assert_eq!(scene.selected(), Some(a));

        assert!(scene.remove_object_with_action(a));
        assert_eq!(scene.selected(), None);
        assert!(!scene.remove_object_with_action(a));
    }

    #[test]
    fn test_undo_clears_selection_of_vanished_object() {
        let mut scene = scene();
        let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        scene.select(Some(id));
        scene.undo();
        assert_eq!(scene.selected(), None);
        assert!(scene.selected_object().is_none());
    }

    #[test]
    fn test_selection_survives_compaction() {
        let mut scene = scene();
        let a = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        let b = scene.add_object_with_action(ObjectKind::Sphere).unwrap();
        scene.select(Some(b));
        scene.remove_object_with_action(a);
        assert_eq!(scene.selected_object().map(SceneObject::id), Some(b));
    }

    #[test]
    fn test_transform_and_color_are_undoable() {
        let mut scene = scene();
        let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        let original = *scene.objects().find(id).unwrap().transform();

        let moved = Transform::at(Vector3::new(3.0, 1.0, 0.0));
        assert!(scene.transform_object_with_action(id, moved));
        assert!(scene.change_color_with_action(id, [1.0, 0.0, 0.0, 0.4]));
        // Unchanged values record nothing
        assert!(!scene.change_color_with_action(id, [1.0, 0.0, 0.0, 0.4]));

        scene.undo();
        assert_eq!(scene.objects().find(id).unwrap().color(), [1.0; 4]);
        scene.undo();
        assert_eq!(*scene.objects().find(id).unwrap().transform(), original);
        scene.redo();
        assert_eq!(*scene.objects().find(id).unwrap().transform(), moved);
    }

    #[test]
    fn test_shading_change_is_undoable() {
        let mut scene = scene();
        let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        let steel = scene.materials.resolve_by_name("stainlessSteel");
        let shading = ShadingFlags {
            use_pbr: true,
            use_color: false,
            ..ShadingFlags::default()
        };

        assert!(scene.set_shading_with_action(id, shading, None, Some(steel)));
        assert_eq!(scene.objects().find(id).unwrap().state().material, Some(steel));
        scene.undo();
        assert!(!scene.objects().find(id).unwrap().shading().use_pbr);
    }

    #[test]
    fn test_option_toggle_is_recorded() {
        let mut scene = scene();
        assert!(scene.toggle_option_with_action(RenderOption::Background, false));
        assert!(!scene.settings().background_enabled);
        scene.undo();
        assert!(scene.settings().background_enabled);
        assert_eq!(scene.history().entries().count(), 1);
    }

    #[test]
    fn test_copy_paste_and_cut() {
        let mut scene = scene();
        let id = scene.add_object_with_action(ObjectKind::Pyramid).unwrap();
        assert!(scene.change_color_with_action(id, [0.0, 1.0, 0.0, 1.0]));
        let source = scene.objects().find(id).unwrap().snapshot();

        assert!(scene.copy(id));
        let pasted = scene.paste().unwrap();
        assert_ne!(pasted, id);
        assert_eq!(scene.selected(), Some(pasted));
        let copy = scene.objects().find(pasted).unwrap();
        assert_eq!(copy.kind(), ObjectKind::Pyramid);
        assert_eq!(copy.color(), source.color);
        assert_relative_eq!(
            copy.transform().position.x,
            source.transform.position.x + 1.0,
            epsilon = 1e-6
        );

        // Paste is a normal add
        scene.undo();
        assert!(scene.objects().find(pasted).is_none());

        assert!(scene.cut(id));
        assert!(scene.objects().is_empty());
        assert_eq!(scene.clipboard().map(|s| s.id), Some(id));
        scene.undo();
        assert!(scene.objects().find(id).is_some());
    }

    #[test]
    fn test_select_unknown_id_fails() {
        let mut scene = scene();
        assert!(!scene.select(Some(ObjectId(77))));
        assert!(scene.select(None));
    }

    #[test]
    fn test_object_capacity_from_config() {
        let mut config = EditorConfig::default();
        config.scene.max_objects = 2;
        let mut scene = Scene::from_config(&config, CameraManager::default());
        assert!(scene.add_object_with_action(ObjectKind::Cube).is_some());
        assert!(scene.add_object_with_action(ObjectKind::Cube).is_some());
        assert!(scene.add_object_with_action(ObjectKind::Cube).is_none());
        assert_eq!(scene.objects().len(), 2);
        assert_eq!(scene.history().undo_len(), 2);
        assert!(matches!(
            scene.import_mesh_with_action("/does/not/matter.obj"),
            Ok(None)
        ));
    }

    #[test]
    fn test_undo_after_full_history_keeps_untracked_edits() {
        let mut config = EditorConfig::default();
        config.scene.max_actions = 2;
        let mut scene = Scene::from_config(&config, CameraManager::default());

        let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        let mut moved = *scene.objects().find(id).unwrap().transform();
        let origin = moved.position;
        moved.position.x = 9.0;
        assert!(scene.transform_object_with_action(id, moved));

        // Applied, but the full history cannot record it
        assert!(scene.change_color_with_action(id, [1.0, 0.0, 0.0, 1.0]));
        assert_eq!(scene.history().undo_len(), 2);

        assert!(scene.undo());
        let object = scene.objects().find(id).unwrap();
        assert_eq!(object.transform().position, origin);
        assert_eq!(object.color(), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_lights() {
        let mut scene = scene();
        assert_eq!(scene.lights().len(), 1);
        let index = scene.add_light_in_view(LightType::Spot).unwrap();
        let spot = *scene.lights().get(index).unwrap();
        assert_relative_eq!(spot.position.z, -2.0, epsilon = 1e-5);
        assert_relative_eq!(spot.direction.z, -1.0, epsilon = 1e-5);
        assert!(scene.remove_light(0));
        assert_eq!(scene.lights().len(), 1);
        assert!(!scene.remove_light(3));
    }

    #[test]
    fn test_new_project_resets() {
        let mut scene = scene();
        let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        scene.copy(id);
        scene.toggle_option_with_action(RenderOption::Textures, false);
        scene.add_light_in_view(LightType::Point);

        scene.new_project();
        assert!(scene.objects().is_empty());
        assert!(!scene.history().can_undo());
        assert!(scene.clipboard().is_none());
        assert_eq!(scene.lights().len(), 1);
        assert_eq!(*scene.settings(), RenderSettings::default());

        // Ids keep counting after a reset
        let next = scene.add_object_with_action(ObjectKind::Cube).unwrap();
        assert!(next > id);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut scene = scene();
        let a = scene.add_object_with_action(ObjectKind::Cylinder).unwrap();
        let b = scene.add_object_with_action(ObjectKind::Plane).unwrap();
        scene.transform_object_with_action(a, Transform::at(Vector3::new(1.0, 2.0, 3.0)));
        scene.change_color_with_action(b, [0.2, 0.3, 0.4, 0.5]);
        let steel = scene.materials.resolve_by_name("stainlessSteel");
        scene.set_shading_with_action(
            b,
            ShadingFlags {
                use_pbr: true,
                ..ShadingFlags::default()
            },
            None,
            Some(steel),
        );
        scene.toggle_option_with_action(RenderOption::Colors, false);

        let path = temp_path("round-trip.json");
        scene.save_project(&path).unwrap();

        let mut loaded = Scene::new(CameraManager::default());
        loaded.add_object_with_action(ObjectKind::Sphere);
        assert_eq!(loaded.load_project(&path).unwrap(), 2);
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.objects().len(), 2);
        assert!(!loaded.history().can_undo());
        assert!(!loaded.settings().colors_enabled);
        for (original, restored) in scene.objects().iter().zip(loaded.objects().iter()) {
            assert_eq!(original.kind(), restored.kind());
            assert_eq!(original.transform(), restored.transform());
            assert_eq!(original.color(), restored.color());
            assert_eq!(original.shading(), restored.shading());
        }
        let restored_b = loaded.objects().get(1).unwrap();
        assert_eq!(
            restored_b.state().material.map(|h| loaded.materials.name_of(h)),
            Some("stainlessSteel")
        );
    }

    #[test]
    fn test_failed_load_leaves_scene_untouched() {
        let mut scene = scene();
        let id = scene.add_object_with_action(ObjectKind::Cube).unwrap();

        let path = temp_path("broken.json");
        std::fs::write(&path, "{ this is not json").unwrap();
        assert!(scene.load_project(&path).is_err());
        std::fs::remove_file(&path).ok();

        assert!(scene.load_project(temp_path("missing.json")).is_err());
        assert!(scene.objects().find(id).is_some());
        assert!(scene.history().can_undo());
    }

    #[test]
    fn test_missing_model_is_skipped_on_load() {
        let mut scene = scene();
        let data = ProjectData::from_json(
            r#"{ "objects": [ { "type": "model", "modelPath": "/gone/model.obj" }, { "type": "cube" } ] }"#,
        )
        .unwrap();
        assert_eq!(scene.apply_project_data(data), 1);
        assert_eq!(scene.objects().get(0).unwrap().kind(), ObjectKind::Cube);
    }

    #[test]
    fn test_intents_dispatch() {
        let mut scene = scene();
        scene.apply(EditorIntent::AddObject(ObjectKind::Sphere)).unwrap();
        let id = scene.selected().unwrap();

        scene
            .apply(EditorIntent::SetColor(id, [0.0, 0.0, 1.0, 1.0]))
            .unwrap();
        scene.apply(EditorIntent::Copy(id)).unwrap();
        scene.apply(EditorIntent::Paste).unwrap();
        assert_eq!(scene.objects().len(), 2);

        scene.apply(EditorIntent::Undo).unwrap();
        scene.apply(EditorIntent::Undo).unwrap();
        assert_eq!(scene.objects().find(id).unwrap().color(), [1.0; 4]);
        scene.apply(EditorIntent::Redo).unwrap();

        scene.apply(EditorIntent::RemoveObject(id)).unwrap();
        assert!(scene.objects().find(id).is_none());

        scene
            .apply(EditorIntent::ToggleOption(RenderOption::Pbr, false))
            .unwrap();
        assert!(!scene.settings().pbr_enabled);

        let err = scene
            .apply(EditorIntent::ImportMesh(PathBuf::from("/no/such/mesh.obj")))
            .unwrap_err();
        assert!(matches!(err, EditorError::Import(_)));

        scene.apply(EditorIntent::NewProject).unwrap();
        assert!(scene.objects().is_empty());
    }
}
