//! Softness pass: separable Gaussian smoothing of a quarter kernel.
//!
//! Adjacent integer blur levels produce discs whose rims jump by whole
//! pixels; smoothing the rim hides that banding. Both passes reflect at the
//! quadrant axes (index `|x + i|`) and drop taps beyond the stored radius.

use crate::rendering::kernel::QuarterKernel;
use crate::DEPTH_MAX;

/// Ratio of Gaussian sigma to `blur_radius + 1`.
const SPREAD: f32 = 0.300_386_63;

/// Softness settings of a diffusion table, both in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Softness {
    pub softness: f32,
    pub delay: f32,
}

impl Softness {
    pub fn new(softness: f32, delay: f32) -> Self {
        assert!(
            (0.0..=100.0).contains(&softness),
            "softness {softness} out of range 0..=100"
        );
        assert!(
            (0.0..=100.0).contains(&delay),
            "softness delay {delay} out of range 0..=100"
        );
        Self { softness, delay }
    }

    /// Fraction of the configured softness applied at `level`, or `None`
    /// when the level lies below the delay window.
    ///
    /// Without delay every level gets the full softness. Any delay up to 50%
    /// ramps the strength up from zero over all levels; beyond 50% the first
    /// softened level moves towards `DEPTH_MAX`.
    pub fn strength(&self, level: i32) -> Option<f32> {
        if self.softness == 0.0 {
            return None;
        }

        let delay = 2.0 * self.delay / 100.0;
        let (delay_start, level_low) = if delay <= 1.0 {
            // The starting strength is all or nothing
            (if delay == 0.0 { 1.0 } else { 0.0 }, -1)
        } else {
            (0.0, (DEPTH_MAX as f32 * (delay - 1.0)).round() as i32 - 1)
        };

        if level < level_low {
            return None;
        }

        let ramp = (level - level_low) as f32 / (DEPTH_MAX - level_low) as f32;
        Some(self.softness / 100.0 * (delay_start + (1.0 - delay_start) * ramp))
    }

    /// Smooth `kernel` in place for a level whose model radius is `model_radius`.
    pub fn apply(&self, kernel: &mut QuarterKernel, model_radius: f32, level: i32) {
        let Some(strength) = self.strength(level) else {
            return;
        };

        let blur_radius = model_radius * strength;
        let taps = GaussianTaps::new(blur_radius);
        tracing::trace!(level, blur_radius, taps = taps.len(), "Softening kernel");

        let range = kernel.radius();
        let mut sum = vec![0.0f32; range + 1];

        // Horizontal pass
        for y in 0..=range {
            let row = kernel.row(y);
            for (x, out) in sum.iter_mut().enumerate() {
                *out = taps.convolve(x, range, |j| row[j]);
            }
            kernel.row_mut(y).copy_from_slice(&sum);
        }

        // Vertical pass
        for x in 0..=range {
            for (y, out) in sum.iter_mut().enumerate() {
                *out = taps.convolve(y, range, |j| kernel.at(x, j));
            }
            for (y, &value) in sum.iter().enumerate() {
                kernel.set(x, y, value);
            }
        }
    }
}

/// Sampled 1D Gaussian over `-radius_int..=radius_int`.
struct GaussianTaps {
    taps: Vec<f32>,
    radius_int: i32,
    total: f32,
}

impl GaussianTaps {
    fn new(blur_radius: f32) -> Self {
        let radius_int = blur_radius.ceil() as i32;
        let sigma = SPREAD * (blur_radius + 1.0);
        let coefficient = -1.0 / (2.0 * sigma * sigma);

        let taps: Vec<f32> = (-radius_int..=radius_int)
            .map(|i| ((i * i) as f32 * coefficient).exp())
            .collect();
        let total = taps.iter().sum();

        Self {
            taps,
            radius_int,
            total,
        }
    }

    fn len(&self) -> usize {
        self.taps.len()
    }

    /// Normalized weighted sum around `center`, reflecting at 0 and
    /// skipping samples past `range`.
    #[inline]
    fn convolve(&self, center: usize, range: usize, sample: impl Fn(usize) -> f32) -> f32 {
        let mut value = 0.0;
        for (k, &tap) in self.taps.iter().enumerate() {
            let i = k as i32 - self.radius_int;
            let j = (center as i32 + i).unsigned_abs() as usize;
            if j <= range {
                value += tap * sample(j);
            }
        }
        value / self.total
    }
}
