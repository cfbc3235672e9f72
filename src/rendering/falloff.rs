//! Falloff models: weight of a kernel cell as a function of the kernel
//! radius and the cell's distance from the center.

use crate::models::ModelType;

/// A model type bound to its fill ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    model: ModelType,
    /// Fill ratio as a fraction, `0.0..=1.0`
    fill: f32,
}

impl Falloff {
    /// `fill_percent` is ignored by the flat model.
    pub fn new(model: ModelType, fill_percent: f32) -> Self {
        Self {
            model,
            fill: fill_percent / 100.0,
        }
    }

    pub fn model(&self) -> ModelType {
        self.model
    }

    pub fn fill(&self) -> f32 {
        self.fill
    }

    #[inline]
    pub fn weight(&self, radius: f32, difference: f32) -> f32 {
        match self.model {
            ModelType::Flat => flat(radius, difference),
            ModelType::Ring => ring(radius, difference, self.fill),
            ModelType::Concave => concave(radius, difference, self.fill),
        }
    }
}

/// Disc with a one-pixel anti-aliased rim.
#[inline]
pub fn flat(radius: f32, difference: f32) -> f32 {
    (1.0 + radius - difference).clamp(0.0, 1.0)
}

/// Full weight on the rim, `fill` in the interior, linear in between.
#[inline]
pub fn ring(radius: f32, difference: f32, fill: f32) -> f32 {
    let distribution = 1.0 + radius - difference;

    if distribution <= 0.0 {
        0.0
    } else if distribution >= 2.0 {
        fill
    } else if distribution > 1.0 {
        (2.0 - distribution) * (1.0 - fill) + fill
    } else {
        distribution
    }
}

/// Bowl: `fill` at the center rising quadratically to full weight at the rim.
#[inline]
pub fn concave(radius: f32, difference: f32, fill: f32) -> f32 {
    let distribution = 1.0 + radius - difference;

    if distribution <= 0.0 {
        0.0
    } else if distribution > 1.0 {
        let t = (difference + 0.5) / (radius + 0.5);
        t * t * (1.0 - fill) + fill
    } else {
        distribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_boundary_inclusive() {
        for radius in [0.5f32, 1.0, 3.0, 17.25] {
            assert_eq!(flat(radius, radius), 1.0);
        }
    }

    #[test]
    fn test_flat_antialiased_rim() {
        assert_eq!(flat(3.0, 0.0), 1.0);
        assert_eq!(flat(3.0, 3.5), 0.5);
        assert_eq!(flat(3.0, 4.0), 0.0);
        assert_eq!(flat(3.0, 9.0), 0.0);
    }

    #[test]
    fn test_ring_interior_is_fill() {
        let fill = 0.3;
        assert_eq!(ring(5.0, 0.0, fill), fill);
        assert_eq!(ring(5.0, 4.0, fill), fill);
    }

    #[test]
    fn test_ring_transition_band() {
        let fill = 0.2;
        // distribution = 1.5 -> halfway between 1.0 and fill
        let w = ring(5.0, 4.5, fill);
        assert!((w - 0.6).abs() < 1e-6, "got {w}");
        // rim itself is full weight
        assert_eq!(ring(5.0, 5.0, fill), 1.0);
        // outer anti-aliased edge
        assert_eq!(ring(5.0, 5.5, fill), 0.5);
        assert_eq!(ring(5.0, 6.0, fill), 0.0);
    }

    #[test]
    fn test_concave_profile() {
        let fill = 0.25;
        let center = concave(4.0, 0.0, fill);
        let expected = (0.5f32 / 4.5).powi(2) * 0.75 + 0.25;
        assert!((center - expected).abs() < 1e-6);

        // Rises towards the rim
        let mut previous = center;
        for d in 1..4 {
            let w = concave(4.0, d as f32, fill);
            assert!(w > previous, "not increasing at {d}");
            previous = w;
        }
        assert_eq!(concave(4.0, 4.5, fill), 0.5);
        assert_eq!(concave(4.0, 5.0, fill), 0.0);
    }

    #[test]
    fn test_falloff_dispatch() {
        let falloff = Falloff::new(ModelType::Ring, 40.0);
        assert_eq!(falloff.model(), ModelType::Ring);
        assert!((falloff.fill() - 0.4).abs() < 1e-6);
        assert_eq!(falloff.weight(10.0, 0.0), falloff.fill());

        let flat_falloff = Falloff::new(ModelType::Flat, 40.0);
        assert_eq!(flat_falloff.weight(10.0, 0.0), 1.0);
    }
}
