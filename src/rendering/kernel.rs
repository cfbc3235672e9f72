//! Quarter-kernel storage.
//!
//! Every model is radially symmetric, so only the first quadrant
//! `[0, radius]²` is stored; lookups fold signed offsets with [`fold`].

/// Folds a signed offset into quarter-kernel coordinates.
#[inline]
pub fn fold(dx: i32, dy: i32) -> (usize, usize) {
    (dx.unsigned_abs() as usize, dy.unsigned_abs() as usize)
}

/// First quadrant of a point-spread function, row-major with explicit stride.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterKernel {
    weights: Vec<f32>,
    rowstride: usize,
}

impl QuarterKernel {
    /// Zeroed kernel covering offsets `0..=radius` on both axes.
    pub fn zeroed(radius: usize) -> Self {
        let rowstride = radius + 1;
        Self {
            weights: vec![0.0; rowstride * rowstride],
            rowstride,
        }
    }

    /// Largest offset stored along each axis.
    pub fn radius(&self) -> usize {
        self.rowstride - 1
    }

    pub fn rowstride(&self) -> usize {
        self.rowstride
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.rowstride && y < self.rowstride);
        self.weights[y * self.rowstride + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        debug_assert!(x < self.rowstride && y < self.rowstride);
        self.weights[y * self.rowstride + x] = value;
    }

    /// Weight at a signed offset from the center; zero outside the kernel.
    #[inline]
    pub fn sample(&self, dx: i32, dy: i32) -> f32 {
        let (x, y) = fold(dx, dy);
        if x >= self.rowstride || y >= self.rowstride {
            return 0.0;
        }
        self.weights[y * self.rowstride + x]
    }

    pub fn row(&self, y: usize) -> &[f32] {
        &self.weights[y * self.rowstride..(y + 1) * self.rowstride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        &mut self.weights[y * self.rowstride..(y + 1) * self.rowstride]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn scale(&mut self, factor: f32) {
        self.weights.iter_mut().for_each(|w| *w *= factor);
    }

    /// Total weight of the full kernel after mirroring into all four quadrants.
    ///
    /// The y = 0 row is rotated into the other quadrants as their axes,
    /// so four copies of everything except that row plus the center cell
    /// cover the plane exactly once.
    pub fn mirrored_sum(&self) -> f32 {
        let quadrant: f32 = self.weights.iter().sum();
        let first_row: f32 = self.row(0).iter().sum();
        4.0 * (quadrant - first_row) + self.at(0, 0)
    }
}
