//! Euclidean distance lookup shared by every diffusion table.
//!
//! The table covers offsets `0..=RADIUS_MAX` on both axes and is built once
//! per process. Only the upper triangle is computed; the lower triangle is
//! copied by transposition.

use crate::RADIUS_MAX;
use std::sync::OnceLock;

/// Side length of the distance table.
pub const TABLE_LENGTH: usize = RADIUS_MAX + 1;

static DISTANCE_TABLE: OnceLock<DistanceTable> = OnceLock::new();

/// Square table of `hypot(x, y)` for non-negative integer offsets.
pub struct DistanceTable {
    data: Vec<f32>,
}

impl DistanceTable {
    /// The process-wide table, built on first access.
    pub fn global() -> &'static DistanceTable {
        DISTANCE_TABLE.get_or_init(|| {
            tracing::debug!(length = TABLE_LENGTH, "Building distance table");
            Self::build()
        })
    }

    fn build() -> Self {
        let mut data = vec![0.0f32; TABLE_LENGTH * TABLE_LENGTH];

        for y in 0..TABLE_LENGTH {
            for x in 0..y {
                data[y * TABLE_LENGTH + x] = data[x * TABLE_LENGTH + y];
            }
            for x in y..TABLE_LENGTH {
                data[y * TABLE_LENGTH + x] = (x as f32).hypot(y as f32);
            }
        }

        Self { data }
    }

    /// Distance of `(x, y)` from the origin.
    ///
    /// # Panics
    ///
    /// Panics if either offset exceeds `RADIUS_MAX`.
    #[inline]
    pub fn distance(&self, x: usize, y: usize) -> f32 {
        assert!(
            x < TABLE_LENGTH && y < TABLE_LENGTH,
            "offset ({x}, {y}) outside distance table"
        );
        self.data[y * TABLE_LENGTH + x]
    }

    /// One row of the table, `distance(0..=RADIUS_MAX, y)`.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * TABLE_LENGTH..(y + 1) * TABLE_LENGTH]
    }
}

/// Shorthand for `DistanceTable::global().distance(x, y)`.
pub fn distance(x: usize, y: usize) -> f32 {
    DistanceTable::global().distance(x, y)
}
