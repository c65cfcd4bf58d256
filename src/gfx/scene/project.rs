//! Project files
//!
//! A project is a JSON document holding the object list, the lights, the
//! camera pose and the global render toggles. Writing goes through typed serde
//! structs. Reading walks a [`serde_json::Value`] by hand so one bad field
//! only costs that field: it takes its default and a warning is logged.

use std::path::{Path, PathBuf};

use cgmath::Vector3;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::gfx::{
    camera::FlyCamera,
    resources::material::DEFAULT_MATERIAL,
};

use super::{
    lights::{create_light, Light, LightType},
    object::{Color, ObjectKind, ShadingFlags, Transform, WHITE},
    scene::RenderSettings,
};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("project file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("project file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("project root must be a JSON object")]
    NotAnObject,
}

/// One object as stored in a project
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub kind: ObjectKind,
    pub transform: Transform,
    pub color: Color,
    pub shading: ShadingFlags,
    pub texture_name: Option<String>,
    pub material_name: Option<String>,
    pub model_path: Option<PathBuf>,
}

/// Camera pose and preferences as stored in a project
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub right: Vector3<f32>,
    pub world_up: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub zoom: f32,
    pub invert_y: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::from_camera(&FlyCamera::default())
    }
}

impl CameraState {
    pub fn from_camera(camera: &FlyCamera) -> Self {
        Self {
            position: camera.position,
            front: camera.front,
            up: camera.up,
            right: camera.right,
            world_up: camera.world_up,
            yaw: camera.yaw,
            pitch: camera.pitch,
            movement_speed: camera.movement_speed,
            mouse_sensitivity: camera.mouse_sensitivity,
            zoom: camera.zoom,
            invert_y: camera.invert_y,
        }
    }

    /// Restores the pose; the basis is rederived from yaw and pitch
    pub fn apply_to(&self, camera: &mut FlyCamera) {
        camera.position = self.position;
        camera.world_up = self.world_up;
        camera.yaw = self.yaw;
        camera.pitch = self.pitch;
        camera.movement_speed = self.movement_speed;
        camera.mouse_sensitivity = self.mouse_sensitivity;
        camera.zoom = self.zoom;
        camera.invert_y = self.invert_y;
        camera.update_vectors();
    }
}

/// Everything a project file contains
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectData {
    pub objects: Vec<ObjectRecord>,
    pub lights: Vec<Light>,
    pub camera: CameraState,
    pub settings: RenderSettings,
}

impl ProjectData {
    pub fn to_json(&self) -> Result<String, ProjectError> {
        let document = ProjectDocument {
            objects: self.objects.iter().map(ObjectEntry::from).collect(),
            lights: self.lights.iter().map(LightEntry::from).collect(),
            camera: CameraEntry::from(&self.camera),
            background: BackgroundEntry {
                enabled: self.settings.background_enabled,
            },
            settings: SettingsEntry::from(&self.settings),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parses a project, substituting defaults for missing or mistyped fields
    ///
    /// Only a document that is not JSON, or whose root is not an object, is an error.
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let root: Value = serde_json::from_str(text)?;
        let root = root.as_object().ok_or(ProjectError::NotAnObject)?;
        let fields = Fields::new(root, "project");

        let objects = fields
            .array("objects")
            .iter()
            .enumerate()
            .filter_map(|(i, value)| match value.as_object() {
                Some(map) => Some(parse_object(&Fields::new(map, "object"))),
                None => {
                    log::warn!("Skipping object entry {} that is not a JSON object", i);
                    None
                }
            })
            .collect();

        let lights = fields
            .array("lights")
            .iter()
            .enumerate()
            .filter_map(|(i, value)| match value.as_object() {
                Some(map) => Some(parse_light(&Fields::new(map, "light"))),
                None => {
                    log::warn!("Skipping light entry {} that is not a JSON object", i);
                    None
                }
            })
            .collect();

        let camera = fields
            .object("camera")
            .map(|map| parse_camera(&Fields::new(map, "camera")))
            .unwrap_or_default();

        let defaults = RenderSettings::default();
        let mut settings = fields
            .object("settings")
            .map(|map| {
                let f = Fields::new(map, "settings");
                RenderSettings {
                    textures_enabled: f.bool_or("texturesEnabled", defaults.textures_enabled),
                    colors_enabled: f.bool_or("colorsEnabled", defaults.colors_enabled),
                    lighting_enabled: f.bool_or("lightingEnabled", defaults.lighting_enabled),
                    pbr_enabled: f.bool_or("usePBR", defaults.pbr_enabled),
                    background_enabled: defaults.background_enabled,
                }
            })
            .unwrap_or(defaults);
        settings.background_enabled = fields
            .object("background")
            .map(|map| Fields::new(map, "background").bool_or("enabled", true))
            .unwrap_or(true);

        Ok(Self {
            objects,
            lights,
            camera,
            settings,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

fn parse_object(f: &Fields) -> ObjectRecord {
    let tag = f.str_or("type", "cube");
    let kind = ObjectKind::from_tag(&tag).unwrap_or_else(|| {
        log::warn!("Unknown object type '{}', loading it as a cube", tag);
        ObjectKind::Cube
    });

    let transform = Transform {
        position: f.flat_vec3_or("position", Vector3::new(0.0, 0.0, 0.0)),
        rotation: f.flat_vec3_or("rotation", Vector3::new(0.0, 0.0, 0.0)),
        scale: f.flat_vec3_or("scale", Vector3::new(1.0, 1.0, 1.0)),
    };

    let color = [
        f.f32_or("colorR", WHITE[0]),
        f.f32_or("colorG", WHITE[1]),
        f.f32_or("colorB", WHITE[2]),
        f.f32_or("colorA", WHITE[3]),
    ];

    let defaults = ShadingFlags::default();
    let shading = ShadingFlags {
        use_texture: f.bool_or("useTexture", false),
        use_color: f.optional_bool("useColor").unwrap_or(defaults.use_color),
        use_pbr: f.bool_or("usePBR", false),
        use_lighting: f.bool_or("useLighting", defaults.use_lighting),
    }
    .normalized();

    let texture_name = f.optional_str("textureName").filter(|name| !name.is_empty());
    let material_name = Some(f.str_or("materialName", DEFAULT_MATERIAL));
    let model_path = if kind == ObjectKind::Mesh {
        let path = f.str_or("modelPath", "");
        (!path.is_empty()).then(|| PathBuf::from(path))
    } else {
        None
    };

    ObjectRecord {
        kind,
        transform,
        color,
        shading,
        texture_name,
        material_name,
        model_path,
    }
}

fn parse_light(f: &Fields) -> Light {
    let tag = f.str_or("type", "point");
    let light_type = LightType::from_tag(&tag).unwrap_or_else(|| {
        log::warn!("Unknown light type '{}', loading it as a point light", tag);
        LightType::Point
    });

    // Start from the standard parameters so omitted ones stay sensible
    let base = create_light(
        f.vec3_or("position", Vector3::new(0.0, 0.0, 0.0)),
        f.vec3_or("direction", -Vector3::unit_y()),
        f.vec3_or("color", Vector3::new(1.0, 1.0, 1.0)),
        f.f32_or("intensity", 1.0),
        light_type,
    );

    Light {
        constant: f.f32_or("constant", base.constant),
        linear: f.f32_or("linear", base.linear),
        quadratic: f.f32_or("quadratic", base.quadratic),
        cut_off: f.f32_or("cutOff", base.cut_off),
        outer_cut_off: f.f32_or("outerCutOff", base.outer_cut_off),
        ..base
    }
}

fn parse_camera(f: &Fields) -> CameraState {
    let d = CameraState::default();
    CameraState {
        position: f.vec3_or("position", d.position),
        front: f.vec3_or("front", d.front),
        up: f.vec3_or("up", d.up),
        right: f.vec3_or("right", d.right),
        world_up: f.vec3_or("worldUp", d.world_up),
        yaw: f.f32_or("yaw", d.yaw),
        pitch: f.f32_or("pitch", d.pitch),
        movement_speed: f.f32_or("movementSpeed", d.movement_speed),
        mouse_sensitivity: f.f32_or("mouseSensitivity", d.mouse_sensitivity),
        zoom: f.f32_or("zoom", d.zoom),
        invert_y: f.bool_or("invertY", d.invert_y),
    }
}

/// Typed field access over one JSON object with default substitution
struct Fields<'a> {
    map: &'a Map<String, Value>,
    context: &'static str,
}

impl<'a> Fields<'a> {
    fn new(map: &'a Map<String, Value>, context: &'static str) -> Self {
        Self { map, context }
    }

    fn substitute<T: std::fmt::Debug>(&self, key: &str, default: T) -> T {
        match self.map.get(key) {
            None => log::warn!("{}: missing '{}', using {:?}", self.context, key, default),
            Some(value) => log::warn!(
                "{}: '{}' has unexpected value {}, using {:?}",
                self.context,
                key,
                value,
                default
            ),
        }
        default
    }

    fn f32_or(&self, key: &str, default: f32) -> f32 {
        match self.map.get(key).and_then(Value::as_f64) {
            Some(value) => value as f32,
            None => self.substitute(key, default),
        }
    }

    fn optional_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).and_then(Value::as_bool)
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.optional_bool(key) {
            Some(value) => value,
            None => self.substitute(key, default),
        }
    }

    fn optional_str(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn str_or(&self, key: &str, default: &str) -> String {
        match self.optional_str(key) {
            Some(value) => value,
            None => self.substitute(key, default.to_string()),
        }
    }

    fn array(&self, key: &str) -> &'a [Value] {
        const EMPTY: &[Value] = &[];
        match self.map.get(key).and_then(Value::as_array) {
            Some(values) => values.as_slice(),
            None => self.substitute(key, EMPTY),
        }
    }

    fn object(&self, key: &str) -> Option<&'a Map<String, Value>> {
        let object = self.map.get(key).and_then(Value::as_object);
        if object.is_none() {
            log::warn!("{}: missing '{}' section, using defaults", self.context, key);
        }
        object
    }

    /// Accepts `[x, y, z]` or the flat `keyX`/`keyY`/`keyZ` form
    fn vec3_or(&self, key: &str, default: Vector3<f32>) -> Vector3<f32> {
        if let Some(values) = self.map.get(key).and_then(Value::as_array) {
            let numbers: Vec<f32> = values.iter().filter_map(Value::as_f64).map(|v| v as f32).collect();
            if let [x, y, z] = numbers[..] {
                return Vector3::new(x, y, z);
            }
        }
        if self.map.contains_key(&format!("{}X", key)) {
            return self.flat_vec3_or(key, default);
        }
        self.substitute(key, default)
    }

    fn flat_vec3_or(&self, key: &str, default: Vector3<f32>) -> Vector3<f32> {
        Vector3::new(
            self.f32_or(&format!("{}X", key), default.x),
            self.f32_or(&format!("{}Y", key), default.y),
            self.f32_or(&format!("{}Z", key), default.z),
        )
    }
}

#[derive(Serialize)]
struct ProjectDocument {
    objects: Vec<ObjectEntry>,
    lights: Vec<LightEntry>,
    camera: CameraEntry,
    background: BackgroundEntry,
    settings: SettingsEntry,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectEntry {
    #[serde(rename = "type")]
    kind: &'static str,
    position_x: f32,
    position_y: f32,
    position_z: f32,
    rotation_x: f32,
    rotation_y: f32,
    rotation_z: f32,
    scale_x: f32,
    scale_y: f32,
    scale_z: f32,
    color_r: f32,
    color_g: f32,
    color_b: f32,
    color_a: f32,
    use_texture: bool,
    texture_name: String,
    use_color: bool,
    #[serde(rename = "usePBR")]
    use_pbr: bool,
    material_name: String,
    use_lighting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_path: Option<String>,
}

impl From<&ObjectRecord> for ObjectEntry {
    fn from(record: &ObjectRecord) -> Self {
        let t = &record.transform;
        Self {
            kind: record.kind.tag(),
            position_x: t.position.x,
            position_y: t.position.y,
            position_z: t.position.z,
            rotation_x: t.rotation.x,
            rotation_y: t.rotation.y,
            rotation_z: t.rotation.z,
            scale_x: t.scale.x,
            scale_y: t.scale.y,
            scale_z: t.scale.z,
            color_r: record.color[0],
            color_g: record.color[1],
            color_b: record.color[2],
            color_a: record.color[3],
            use_texture: record.shading.use_texture,
            texture_name: record.texture_name.clone().unwrap_or_default(),
            use_color: record.shading.use_color,
            use_pbr: record.shading.use_pbr,
            material_name: record
                .material_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MATERIAL.to_string()),
            use_lighting: record.shading.use_lighting,
            model_path: record
                .model_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LightEntry {
    #[serde(rename = "type")]
    kind: &'static str,
    position: [f32; 3],
    direction: [f32; 3],
    color: [f32; 3],
    intensity: f32,
    constant: f32,
    linear: f32,
    quadratic: f32,
    cut_off: f32,
    outer_cut_off: f32,
}

impl From<&Light> for LightEntry {
    fn from(light: &Light) -> Self {
        Self {
            kind: light.light_type.tag(),
            position: light.position.into(),
            direction: light.direction.into(),
            color: light.color.into(),
            intensity: light.intensity,
            constant: light.constant,
            linear: light.linear,
            quadratic: light.quadratic,
            cut_off: light.cut_off,
            outer_cut_off: light.outer_cut_off,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CameraEntry {
    position: [f32; 3],
    front: [f32; 3],
    up: [f32; 3],
    right: [f32; 3],
    world_up: [f32; 3],
    yaw: f32,
    pitch: f32,
    movement_speed: f32,
    mouse_sensitivity: f32,
    zoom: f32,
    invert_y: bool,
}

impl From<&CameraState> for CameraEntry {
    fn from(camera: &CameraState) -> Self {
        Self {
            position: camera.position.into(),
            front: camera.front.into(),
            up: camera.up.into(),
            right: camera.right.into(),
            world_up: camera.world_up.into(),
            yaw: camera.yaw,
            pitch: camera.pitch,
            movement_speed: camera.movement_speed,
            mouse_sensitivity: camera.mouse_sensitivity,
            zoom: camera.zoom,
            invert_y: camera.invert_y,
        }
    }
}

#[derive(Serialize)]
struct BackgroundEntry {
    enabled: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsEntry {
    textures_enabled: bool,
    colors_enabled: bool,
    lighting_enabled: bool,
    #[serde(rename = "usePBR")]
    use_pbr: bool,
}

impl From<&RenderSettings> for SettingsEntry {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            textures_enabled: settings.textures_enabled,
            colors_enabled: settings.colors_enabled,
            lighting_enabled: settings.lighting_enabled,
            use_pbr: settings.pbr_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProjectData {
        let mut camera = FlyCamera::default();
        camera.position = Vector3::new(1.0, 2.0, 3.0);
        camera.yaw = -45.0;
        camera.pitch = 10.0;
        camera.update_vectors();

        ProjectData {
            objects: vec![
                ObjectRecord {
                    kind: ObjectKind::Sphere,
                    transform: Transform {
                        position: Vector3::new(1.0, 2.0, 3.0),
                        rotation: Vector3::new(0.0, 45.0, 0.0),
                        scale: Vector3::new(2.0, 2.0, 2.0),
                    },
                    color: [0.5, 0.25, 1.0, 0.5],
                    shading: ShadingFlags {
                        use_texture: true,
                        use_color: false,
                        use_pbr: false,
                        use_lighting: true,
                    },
                    texture_name: Some("checker".to_string()),
                    material_name: Some("stainlessSteel".to_string()),
                    model_path: None,
                },
                ObjectRecord {
                    kind: ObjectKind::Mesh,
                    transform: Transform::default(),
                    color: WHITE,
                    shading: ShadingFlags::default(),
                    texture_name: None,
                    material_name: Some(DEFAULT_MATERIAL.to_string()),
                    model_path: Some(PathBuf::from("models/teapot.obj")),
                },
            ],
            lights: vec![
                Light::default(),
                create_light(
                    Vector3::new(0.0, 3.0, 0.0),
                    Vector3::new(0.0, -1.0, 0.0),
                    Vector3::new(1.0, 0.5, 0.25),
                    2.0,
                    LightType::Spot,
                ),
            ],
            camera: CameraState::from_camera(&camera),
            settings: RenderSettings {
                textures_enabled: false,
                colors_enabled: true,
                lighting_enabled: false,
                pbr_enabled: true,
                background_enabled: false,
            },
        }
    }

    #[test]
    fn test_save_then_load_reproduces_project() {
        let data = sample();
        let json = data.to_json().unwrap();
        assert_eq!(ProjectData::from_json(&json).unwrap(), data);
    }

    #[test]
    fn test_written_keys() {
        let value: Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        let object = &value["objects"][0];
        assert_eq!(object["type"], "sphere");
        assert_eq!(object["rotationY"], 45.0);
        assert_eq!(object["colorA"], 0.5);
        assert_eq!(object["usePBR"], false);
        assert!(object.get("modelPath").is_none());
        assert_eq!(value["objects"][1]["modelPath"], "models/teapot.obj");
        assert_eq!(value["lights"][1]["type"], "spot");
        assert!(value["camera"]["worldUp"].is_array());
        assert_eq!(value["background"]["enabled"], false);
        assert_eq!(value["settings"]["usePBR"], true);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let data = ProjectData::from_json(r#"{ "objects": [ { "type": "pyramid", "positionX": 4 } ] }"#)
            .unwrap();
        assert_eq!(data.objects.len(), 1);
        let object = &data.objects[0];
        assert_eq!(object.kind, ObjectKind::Pyramid);
        assert_eq!(object.transform.position, Vector3::new(4.0, 0.0, 0.0));
        assert_eq!(object.transform.scale, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(object.color, WHITE);
        assert!(object.shading.use_color);
        assert_eq!(object.material_name.as_deref(), Some(DEFAULT_MATERIAL));

        assert!(data.lights.is_empty());
        assert_eq!(data.camera, CameraState::default());
        assert_eq!(data.settings, RenderSettings::default());
    }

    #[test]
    fn test_ill_typed_fields_take_defaults() {
        let data = ProjectData::from_json(
            r#"{ "objects": [ { "type": "teapot", "colorR": "red", "scaleY": null } ],
                 "lights": [ { "type": "point", "intensity": "bright" }, 7 ] }"#,
        )
        .unwrap();
        assert_eq!(data.objects[0].kind, ObjectKind::Cube);
        assert_eq!(data.objects[0].color[0], 1.0);
        assert_eq!(data.objects[0].transform.scale.y, 1.0);
        assert_eq!(data.lights.len(), 1);
        assert_eq!(data.lights[0].intensity, 1.0);
        assert_eq!(data.lights[0].linear, 0.09);
    }

    #[test]
    fn test_flat_vector_keys_are_accepted() {
        let data = ProjectData::from_json(
            r#"{ "lights": [ { "type": "directional", "directionX": 0, "directionY": 0, "directionZ": -2 } ],
                 "camera": { "positionX": 1, "positionY": 2, "positionZ": 3 } }"#,
        )
        .unwrap();
        assert_eq!(data.lights[0].direction, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(data.camera.position, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_root_errors() {
        assert!(matches!(
            ProjectData::from_json("[1, 2, 3]"),
            Err(ProjectError::NotAnObject)
        ));
        assert!(matches!(
            ProjectData::from_json("{ not json"),
            Err(ProjectError::Parse(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("stagehand-project-{}.json", std::process::id()));
        let data = sample();
        data.save(&path).unwrap();
        assert_eq!(ProjectData::load(&path).unwrap(), data);
        std::fs::remove_file(path).ok();
    }
}
