use serde::{Deserialize, Serialize};

/// Shape of the point-spread function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Uniform disc with a one-pixel anti-aliased rim
    #[default]
    Flat,
    /// Bright rim around an interior dimmed to the fill ratio
    Ring,
    /// Energy rising quadratically from the fill ratio at the center to the rim
    Concave,
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(ModelType::Flat),
            "ring" => Ok(ModelType::Ring),
            "concave" => Ok(ModelType::Concave),
            other => Err(format!("unknown model type: {other}")),
        }
    }
}

/// Channel a shine map is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShineType {
    #[default]
    Luminosity,
    Saturation,
}

/// Parameters governing a diffusion table.
///
/// Any change except `shine_radius` invalidates every cached kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionParams {
    pub model_type: ModelType,
    pub model_radius: f32,
    /// Fill ratio in percent (ring and concave models)
    pub model_fill: f32,
    /// Softness in percent
    pub model_softness: f32,
    /// Softness delay in percent
    pub model_softness_delay: f32,
    pub shine_radius: f32,
}

impl DiffusionParams {
    /// Same kernels; only the shine radius may differ.
    pub fn same_kernels(&self, other: &DiffusionParams) -> bool {
        self.model_type == other.model_type
            && self.model_radius == other.model_radius
            && self.model_fill == other.model_fill
            && self.model_softness == other.model_softness
            && self.model_softness_delay == other.model_softness_delay
    }

    /// Integer radius of the softened kernel, `ceil(radius * (1 + softness / 100))`.
    pub fn radius_int(&self) -> usize {
        let radius = self.model_radius * (1.0 + self.model_softness / 100.0);
        radius.max(0.0).ceil() as usize
    }
}

/// Parameters governing a depth map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthMapParams {
    pub enabled: bool,
    /// Focal depth in percent of the depth range
    pub focal_depth: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DiffusionParams {
        DiffusionParams {
            model_type: ModelType::Flat,
            model_radius: 10.0,
            model_fill: 50.0,
            model_softness: 25.0,
            model_softness_delay: 0.0,
            shine_radius: 0.0,
        }
    }

    #[test]
    fn test_radius_int_includes_softness() {
        assert_eq!(params().radius_int(), 13);
    }

    #[test]
    fn test_radius_int_without_softness() {
        let p = DiffusionParams {
            model_softness: 0.0,
            model_radius: 3.2,
            ..params()
        };
        assert_eq!(p.radius_int(), 4);
    }

    #[test]
    fn test_same_kernels_ignores_shine_radius() {
        let a = params();
        let b = DiffusionParams {
            shine_radius: 7.0,
            ..a
        };
        assert!(a.same_kernels(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_kernels_detects_model_change() {
        let a = params();
        let b = DiffusionParams {
            model_type: ModelType::Ring,
            ..a
        };
        assert!(!a.same_kernels(&b));
    }

    #[test]
    fn test_model_type_from_str() {
        assert_eq!("Ring".parse::<ModelType>(), Ok(ModelType::Ring));
        assert_eq!("concave".parse::<ModelType>(), Ok(ModelType::Concave));
        assert!("hexagon".parse::<ModelType>().is_err());
    }
}
