//! Configuration options for tidewater.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::SceneVisibility;
use crate::error::Result;
use crate::water::WaterTuning;

/// Environment variable naming a config file when none is passed on the command line.
pub const CONFIG_ENV_VAR: &str = "TIDEWATER_CONFIG";

/// Global configuration options for tidewater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Initial window width.
    pub window_width: u32,

    /// Initial window height.
    pub window_height: u32,

    /// Main camera defaults.
    pub camera: CameraOptions,

    /// Water shading parameters.
    pub tuning: WaterTuning,

    /// Which meshes are shown.
    pub visibility: SceneVisibility,

    /// Where assets are read from.
    pub assets: AssetPaths,

    /// Material color of the decorative mesh.
    pub decor_color: Vec3,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            camera: CameraOptions::default(),
            tuning: WaterTuning::default(),
            visibility: SceneVisibility::default(),
            assets: AssetPaths::default(),
            decor_color: Vec3::new(0.8, 0.3, 0.2),
        }
    }
}

impl Options {
    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let options = Self::from_json(&text)?;
        log::info!("loaded options from {}", path.as_ref().display());
        Ok(options)
    }

    /// Reads options from `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(options) => options,
            Err(e) => {
                log::warn!(
                    "could not read options from {}: {e}; using defaults",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    /// Resolves options from the first CLI argument or `TIDEWATER_CONFIG`.
    pub fn from_env_or_args(args: impl IntoIterator<Item = String>) -> Self {
        let path = args
            .into_iter()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok());
        match path {
            Some(path) => Self::load_or_default(path),
            None => Self::default(),
        }
    }

    /// Writes options as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("saved options to {}", path.as_ref().display());
        Ok(())
    }
}

/// Main camera defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.01,
            far: 1000.0,
            position: Vec3::new(0.0, 4.0, 12.0),
            target: Vec3::ZERO,
        }
    }
}

/// Asset file locations. `None` entries use procedural placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Equirectangular environment image (HDR or LDR).
    pub environment: Option<PathBuf>,
    /// OBJ file containing `poolBig`, `poolSmall` and optionally `suzanne`.
    pub scene: Option<PathBuf>,
    pub foam_mask: Option<PathBuf>,
    pub normal_map: Option<PathBuf>,
}

impl AssetPaths {
    /// Whether any file needs loading.
    pub fn is_empty(&self) -> bool {
        self.environment.is_none()
            && self.scene.is_none()
            && self.foam_mask.is_none()
            && self.normal_map.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.camera.fov_degrees, 75.0);
        assert_eq!(options.camera.position, Vec3::new(0.0, 4.0, 12.0));
        assert!(options.visibility.pool_big);
        assert!(!options.visibility.pool_small);
        assert!(options.assets.is_empty());
    }

    #[test]
    fn test_partial_json() {
        let options = Options::from_json(
            r#"{
                "window_width": 800,
                "tuning": { "solid_foam": true },
                "visibility": { "pool_small": true },
                "assets": { "scene": "assets/pools.obj" }
            }"#,
        )
        .unwrap();
        assert_eq!(options.window_width, 800);
        assert_eq!(options.window_height, 720);
        assert!(options.tuning.solid_foam);
        assert_eq!(options.tuning.max_depth, 2.5);
        assert!(options.visibility.pool_small);
        assert!(options.visibility.pool_big);
        assert_eq!(
            options.assets.scene.as_deref(),
            Some(Path::new("assets/pools.obj"))
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(Options::from_json("{ not json").is_err());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("tidewater-options-{}.json", std::process::id()));
        let mut options = Options::default();
        options.tuning.distortion_amplitude = 0.01;
        options.save(&path).unwrap();
        let loaded = Options::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let options = Options::load_or_default("/nonexistent/tidewater.json");
        assert_eq!(options, Options::default());
    }

    #[test]
    fn test_cli_argument_missing_file_uses_defaults() {
        let options = Options::from_env_or_args(vec![
            "tidewater".to_string(),
            "/nonexistent/from-cli.json".to_string(),
        ]);
        assert_eq!(options, Options::default());
    }
}
