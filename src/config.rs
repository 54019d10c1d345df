//! Runtime configuration
//!
//! Every tunable constant of the scene lives in [`SceneConfig`]. The defaults
//! reproduce the stock scene; an optional TOML file can override any subset of
//! keys, and `HAUNTED_SEED` pins the grave layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HauntedError, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "HAUNTED_CONFIG";
/// Environment variable overriding the grave RNG seed
pub const SEED_ENV: &str = "HAUNTED_SEED";
/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "haunted.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Upper bound on the device pixel ratio used for the render target
    pub max_pixel_ratio: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Haunted House".to_string(),
            width: 1200,
            height: 800,
            vsync: true,
            max_pixel_ratio: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub damping: bool,
    pub damping_factor: f32,
    /// Radians per pixel of mouse motion
    pub rotate_speed: f32,
    /// Multiplicative zoom step per wheel notch
    pub zoom_scale: f32,
    pub pan_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: [4.0, 2.0, 5.0],
            target: [0.0, 0.0, 0.0],
            damping: true,
            damping_factor: 0.05,
            rotate_speed: 0.005,
            zoom_scale: 0.95,
            pan_speed: 0.002,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraveConfig {
    pub count: usize,
    pub min_radius: f32,
    /// Width of the placement band; radii fall in `[min, min + span)`
    pub radius_span: f32,
    /// Full range of the random Y/Z tilt, centred on zero
    pub jitter: f32,
}

impl Default for GraveConfig {
    fn default() -> Self {
        Self {
            count: 50,
            min_radius: 3.0,
            radius_span: 6.0,
            jitter: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub root: PathBuf,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets/textures"),
        }
    }
}

/// Top-level configuration for the application
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub graves: GraveConfig,
    pub textures: TextureConfig,
    /// Fixed seed for grave placement; random each run when unset
    pub seed: Option<u64>,
    /// Shows the light tuning panel
    pub debug_ui: bool,
}

impl SceneConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SceneConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| HauntedError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Loads configuration from the environment
    ///
    /// Reads the file named by `HAUNTED_CONFIG`, else `haunted.toml` in the
    /// working directory if it exists, else the defaults. `HAUNTED_SEED`
    /// overrides the seed in every case.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let seed = std::env::var(SEED_ENV).ok();
        Self::resolve(explicit, Path::new(DEFAULT_CONFIG_FILE), seed.as_deref())
    }

    fn resolve(explicit: Option<PathBuf>, fallback: &Path, seed: Option<&str>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None if fallback.is_file() => {
                log::info!("Loading config from {}", fallback.display());
                Self::from_file(fallback)?
            }
            None => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Some(seed) = seed {
            config.seed = Some(parse_seed(seed)?);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(HauntedError::InvalidConfig(msg));

        let graves = &self.graves;
        if !(graves.min_radius >= 0.0) {
            return invalid(format!("graves.min_radius must be >= 0, got {}", graves.min_radius));
        }
        if !(graves.radius_span > 0.0) {
            return invalid(format!("graves.radius_span must be > 0, got {}", graves.radius_span));
        }
        if !(graves.jitter >= 0.0) {
            return invalid(format!("graves.jitter must be >= 0, got {}", graves.jitter));
        }

        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            ));
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return invalid(format!(
                "camera.near must be positive and below camera.far, got {} / {}",
                camera.near, camera.far
            ));
        }
        if !(camera.damping_factor > 0.0 && camera.damping_factor <= 1.0) {
            return invalid(format!(
                "camera.damping_factor must be in (0, 1], got {}",
                camera.damping_factor
            ));
        }
        if !(camera.zoom_scale > 0.0 && camera.zoom_scale < 1.0) {
            return invalid(format!(
                "camera.zoom_scale must be in (0, 1), got {}",
                camera.zoom_scale
            ));
        }

        if !(self.window.max_pixel_ratio >= 1.0) {
            return invalid(format!(
                "window.max_pixel_ratio must be >= 1, got {}",
                self.window.max_pixel_ratio
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return invalid("window size must be non-zero".to_string());
        }

        Ok(())
    }
}

fn parse_seed(value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        HauntedError::InvalidConfig(format!("{SEED_ENV} must be a u64, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.graves.count, 50);
        assert_eq!(config.graves.min_radius, 3.0);
        assert_eq!(config.graves.radius_span, 6.0);
        assert_eq!(config.graves.jitter, 0.4);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.position, [4.0, 2.0, 5.0]);
        assert_eq!(config.camera.damping_factor, 0.05);
        assert_eq!(config.window.max_pixel_ratio, 2.0);
        assert!(!config.debug_ui);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = SceneConfig::from_toml_str(
            r#"
            seed = 42
            debug_ui = true

            [graves]
            count = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(42));
        assert!(config.debug_ui);
        assert_eq!(config.graves.count, 10);
        assert_eq!(config.graves.min_radius, 3.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(SceneConfig::from_toml_str("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SceneConfig::from_toml_str("graves = 3").unwrap_err();
        assert!(matches!(err, HauntedError::ConfigParse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            "[graves]\nradius_span = 0.0",
            "[graves]\nmin_radius = -1.0",
            "[camera]\nnear = 10.0\nfar = 1.0",
            "[camera]\nfov_degrees = 180.0",
            "[camera]\ndamping_factor = 0.0",
            "[window]\nmax_pixel_ratio = 0.5",
        ];
        for case in cases {
            let err = SceneConfig::from_toml_str(case).unwrap_err();
            assert!(matches!(err, HauntedError::InvalidConfig(_)), "{case}");
        }
    }

    #[test]
    fn zero_graves_is_allowed() {
        let config = SceneConfig::from_toml_str("[graves]\ncount = 0").unwrap();
        assert_eq!(config.graves.count, 0);
    }

    #[test]
    fn seed_override_applies_without_file() {
        let missing = Path::new("definitely/not/here.toml");
        let config = SceneConfig::resolve(None, missing, Some(" 1234 ")).unwrap();
        assert_eq!(config.seed, Some(1234));
    }

    #[test]
    fn bad_seed_is_rejected() {
        let missing = Path::new("definitely/not/here.toml");
        let err = SceneConfig::resolve(None, missing, Some("ghost")).unwrap_err();
        assert!(matches!(err, HauntedError::InvalidConfig(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_io_error() {
        let missing = PathBuf::from("definitely/not/here.toml");
        let err = SceneConfig::resolve(Some(missing), Path::new("x"), None).unwrap_err();
        assert!(matches!(err, HauntedError::ConfigIo { .. }));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = SceneConfig::default();
        config.seed = Some(7);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(SceneConfig::from_toml_str(&text).unwrap(), config);
    }
}
