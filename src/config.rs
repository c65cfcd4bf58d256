//! Editor configuration
//!
//! Read from an optional TOML file. Every field has a default, so a partial
//! file (or none at all) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gfx::{
    camera::fly_camera::{DEFAULT_SENSITIVITY, DEFAULT_SPEED},
    resources::material::DEFAULT_MATERIAL,
    scene::{history::MAX_ACTIONS, lights::MAX_LIGHTS, object_manager::MAX_OBJECTS},
};

pub const DEFAULT_CONFIG_PATH: &str = "stagehand.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// RGBA clear color behind the sky
    pub clear_color: [f64; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Stagehand".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            clear_color: [0.1, 0.2, 0.3, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub max_objects: usize,
    pub max_actions: usize,
    pub max_lights: usize,
    /// Distance in front of the camera where new objects appear
    pub spawn_distance: f32,
    pub default_material: String,
    pub project_path: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_objects: MAX_OBJECTS,
            max_actions: MAX_ACTIONS,
            max_lights: MAX_LIGHTS,
            spawn_distance: 5.0,
            default_material: DEFAULT_MATERIAL.to_string(),
            project_path: PathBuf::from("scene.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            invert_y: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub window: WindowConfig,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
}

impl EditorConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Loads the file if there is one; any problem falls back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("{} ({}), using defaults", err, path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        assert_eq!(EditorConfig::from_toml("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = EditorConfig::from_toml(
            "[scene]\nmax_objects = 12\n\n[camera]\ninvert_y = true\n",
        )
        .unwrap();
        assert_eq!(config.scene.max_objects, 12);
        assert_eq!(config.scene.max_actions, MAX_ACTIONS);
        assert!(config.camera.invert_y);
        assert_eq!(config.camera.movement_speed, DEFAULT_SPEED);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = EditorConfig::from_toml("[scene\nmax_objects = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("stagehand-config-{}.toml", std::process::id()));
        let mut config = EditorConfig::default();
        config.window.title = "Test".to_string();
        config.scene.spawn_distance = 8.0;
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = EditorConfig::load_or_default("/no/such/stagehand.toml");
        assert_eq!(config, EditorConfig::default());
    }
}
