/// Viewer configuration, loaded from TOML.
///
/// Every field has a default that reproduces the stock product showcase, so an
/// empty file (or no file at all) is a valid configuration.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::lighting::EnvironmentPreset;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub environment: EnvironmentPreset,
    pub product: ProductConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub animation: AnimationConfig,
    pub lighting: LightingConfig,
    pub shadows: ShadowConfig,
}

/// Product colors as CSS hex strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    pub body_color: String,
    pub hover_color: String,
    pub panel_color: String,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            body_color: "#6366f1".to_string(),
            hover_color: "#4f46e5".to_string(),
            panel_color: "#1f2937".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub fov_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            fov_degrees: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub auto_rotate_speed: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_pan: false,
            enable_zoom: true,
            enable_rotate: true,
            min_distance: 3.0,
            max_distance: 8.0,
            auto_rotate_speed: 0.5,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

/// Per-frame increments at a 60 Hz reference rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub idle_spin: f32,
    pub active_spin: f32,
    pub hover_lift: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            idle_spin: 0.005,
            active_spin: 0.02,
            hover_lift: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_intensity: f32,
    pub spot_position: [f32; 3],
    pub spot_angle: f32,
    pub spot_penumbra: f32,
    pub spot_intensity: f32,
    pub point_position: [f32; 3],
    pub point_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.4,
            spot_position: [10.0, 10.0, 10.0],
            spot_angle: 0.15,
            spot_penumbra: 1.0,
            spot_intensity: 1.0,
            point_position: [-10.0, -10.0, -10.0],
            point_intensity: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub enabled: bool,
    pub position_y: f32,
    pub opacity: f32,
    pub scale: f32,
    pub blur: f32,
    pub far: f32,
    pub resolution: usize,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            position_y: -1.4,
            opacity: 0.4,
            scale: 10.0,
            blur: 1.5,
            far: 4.5,
            resolution: 64,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        log::info!("loaded viewer configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.product;
        for hex in [&p.body_color, &p.hover_color, &p.panel_color] {
            Color::from_hex(hex)?;
        }

        let fov = self.camera.fov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(invalid(format!("camera.fov_degrees must be in (0, 180), got {fov}")));
        }

        let c = &self.controls;
        if c.min_distance <= 0.0 || c.max_distance <= 0.0 {
            return Err(invalid("controls distances must be positive".to_string()));
        }
        if c.min_distance > c.max_distance {
            return Err(invalid(format!(
                "controls.min_distance ({}) exceeds controls.max_distance ({})",
                c.min_distance, c.max_distance
            )));
        }
        if c.auto_rotate_speed < 0.0 || c.rotate_speed < 0.0 || c.zoom_speed < 0.0 {
            return Err(invalid("controls speeds must not be negative".to_string()));
        }

        let a = &self.animation;
        if a.idle_spin < 0.0 || a.active_spin < 0.0 {
            return Err(invalid("animation spins must not be negative".to_string()));
        }

        let s = &self.shadows;
        if !(0.0..=1.0).contains(&s.opacity) {
            return Err(invalid(format!("shadows.opacity must be in [0, 1], got {}", s.opacity)));
        }
        if s.resolution == 0 || s.scale <= 0.0 || s.far <= 0.0 || s.blur < 0.0 {
            return Err(invalid(
                "shadows need a positive resolution, scale and far distance".to_string(),
            ));
        }

        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.environment, EnvironmentPreset::City);
        assert_eq!(config.controls.min_distance, 3.0);
        assert_eq!(config.controls.max_distance, 8.0);
        assert!(!config.controls.enable_pan);
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_toml_str(
            r#"
            environment = "sunset"

            [controls]
            auto_rotate_speed = 2.0

            [shadows]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, EnvironmentPreset::Sunset);
        assert_eq!(config.controls.auto_rotate_speed, 2.0);
        assert_eq!(config.controls.max_distance, 8.0);
        assert!(!config.shadows.enabled);
        assert_eq!(config.shadows.opacity, 0.4);
    }

    #[test]
    fn test_rejects_inverted_distances() {
        let err = ViewerConfig::from_toml_str(
            "[controls]\nmin_distance = 9.0\nmax_distance = 8.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_fov_and_opacity() {
        assert!(ViewerConfig::from_toml_str("[camera]\nfov_degrees = 180.0\n").is_err());
        assert!(ViewerConfig::from_toml_str("[shadows]\nopacity = 1.5\n").is_err());
    }

    #[test]
    fn test_rejects_bad_product_color() {
        let err = ViewerConfig::from_toml_str("[product]\nbody_color = \"indigo\"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidColor(_)));

        let config = ViewerConfig::from_toml_str("[product]\npanel_color = \"#000\"\n").unwrap();
        assert_eq!(config.product.panel_color, "#000");
        assert_eq!(config.product.body_color, "#6366f1");
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = ViewerConfig::from_toml_str("environment = ").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_unknown_preset_is_parse_error() {
        assert!(ViewerConfig::from_toml_str("environment = \"forest\"").is_err());
    }

    #[test]
    fn test_serialized_defaults_load_back() {
        let text = ViewerConfig::default().to_toml_string().unwrap();
        assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ViewerConfig::load("/nonexistent/pv3d.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
