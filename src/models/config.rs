use crate::error::ConfigError;
use crate::models::{DepthMapParams, DiffusionParams, ModelType, ShineType};
use crate::RADIUS_MAX;
use serde::Deserialize;
use std::path::Path;

/// Blur configuration loaded from a YAML file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BlurConfig {
    /// Shape of the point-spread function
    #[serde(default)]
    pub model_type: ModelType,

    /// Kernel radius at the farthest depth
    #[serde(default = "default_model_radius")]
    pub model_radius: f32,

    /// Interior fill ratio for ring/concave models (percent)
    #[serde(default = "default_percent_half")]
    pub model_fill: f32,

    /// Gaussian softening of the kernel edge (percent)
    #[serde(default)]
    pub model_softness: f32,

    /// How many levels stay unsoftened before softness ramps in (percent)
    #[serde(default)]
    pub model_softness_delay: f32,

    /// Radius whose density caps the shine boost
    #[serde(default)]
    pub shine_radius: f32,

    #[serde(default)]
    pub enable_shine: bool,

    #[serde(default)]
    pub shine_type: ShineType,

    /// Brightness above which pixels start to shine
    #[serde(default = "default_shine_threshold")]
    pub shine_threshold: u8,

    /// Strength of the shine map (percent)
    #[serde(default = "default_percent_half")]
    pub shine_level: f32,

    #[serde(default)]
    pub enable_depth_map: bool,

    /// Depth that stays in focus (percent of the depth range)
    #[serde(default)]
    pub focal_depth: f32,

    /// Nearer pixels occlude farther ones
    #[serde(default)]
    pub enable_depth_precedence: bool,

    /// Refill coverage lost to precedence from pixels behind
    #[serde(default)]
    pub enable_depth_fill_behind: bool,

    /// Blend the fill-behind edge by depth distance
    #[serde(default)]
    pub enable_depth_fuzzy: bool,
}

fn default_model_radius() -> f32 {
    5.0
}

fn default_percent_half() -> f32 {
    50.0
}

fn default_shine_threshold() -> u8 {
    200
}

impl BlurConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            model = ?config.model_type,
            radius = config.model_radius,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check every field against its allowed range.
    ///
    /// Together the radius and softness caps keep the softened kernel within
    /// `RADIUS_MAX`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_radius = (RADIUS_MAX / 2) as f32;
        check_range("model_radius", self.model_radius, 0.0, max_radius)?;
        check_range("model_fill", self.model_fill, 0.0, 100.0)?;
        check_range("model_softness", self.model_softness, 0.0, 100.0)?;
        check_range(
            "model_softness_delay",
            self.model_softness_delay,
            0.0,
            100.0,
        )?;
        check_range("shine_radius", self.shine_radius, 0.0, RADIUS_MAX as f32)?;
        check_range("shine_level", self.shine_level, 0.0, 100.0)?;
        check_range("focal_depth", self.focal_depth, 0.0, 100.0)?;
        Ok(())
    }

    /// Snapshot of the fields that govern the diffusion table
    pub fn diffusion_params(&self) -> DiffusionParams {
        DiffusionParams {
            model_type: self.model_type,
            model_radius: self.model_radius,
            model_fill: self.model_fill,
            model_softness: self.model_softness,
            model_softness_delay: self.model_softness_delay,
            shine_radius: self.shine_radius,
        }
    }

    /// Snapshot of the fields that govern the depth map
    pub fn depth_map_params(&self) -> DepthMapParams {
        DepthMapParams {
            enabled: self.enable_depth_map,
            focal_depth: self.focal_depth,
        }
    }

    /// Shine is only applied when both the switch and the radius are set
    pub fn shine_enabled(&self) -> bool {
        self.enable_shine && self.shine_radius > 0.0 && self.shine_level > 0.0
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            model_type: ModelType::Flat,
            model_radius: default_model_radius(),
            model_fill: default_percent_half(),
            model_softness: 0.0,
            model_softness_delay: 0.0,
            shine_radius: 0.0,
            enable_shine: false,
            shine_type: ShineType::Luminosity,
            shine_threshold: default_shine_threshold(),
            shine_level: default_percent_half(),
            enable_depth_map: false,
            focal_depth: 0.0,
            enable_depth_precedence: false,
            enable_depth_fill_behind: false,
            enable_depth_fuzzy: false,
        }
    }
}
