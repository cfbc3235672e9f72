//! Diffusion table: lazily built point-spread functions per blur level.
//!
//! A table is bound to one set of [`DiffusionParams`]. Kernels are built on
//! first query of a level and kept until the table is replaced. Slots are
//! stored farthest first: level `L` lives at index `DEPTH_MAX - |L|`.

use crate::models::DiffusionParams;
use crate::rendering::acceleration::{AccelerationCache, Update};
use crate::rendering::distance::{DistanceTable, TABLE_LENGTH};
use crate::rendering::falloff::Falloff;
use crate::rendering::kernel::QuarterKernel;
use crate::rendering::soften::Softness;
use crate::{DEPTH_MAX, DIFFUSION_NTABLES};

/// A kernel together with its energy before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedKernel {
    pub weights: QuarterKernel,
    pub density: f32,
}

pub struct DiffusionTable {
    params: DiffusionParams,
    falloff: Falloff,
    softness: Softness,
    radius_int: usize,
    slots: Vec<Option<CachedKernel>>,
    density_max: f32,
}

impl DiffusionTable {
    /// Fresh table with every slot empty.
    pub fn new(params: &DiffusionParams) -> Self {
        let radius_int = params.radius_int();
        assert!(
            radius_int < TABLE_LENGTH,
            "kernel radius {radius_int} exceeds distance table"
        );

        let mut table = Self {
            params: *params,
            falloff: Falloff::new(params.model_type, params.model_fill),
            softness: Softness::new(params.model_softness, params.model_softness_delay),
            radius_int,
            slots: vec![None; DIFFUSION_NTABLES],
            density_max: 0.0,
        };
        table.density_max = table.make_density(params.shine_radius);

        tracing::info!(
            model = ?params.model_type,
            radius = params.model_radius,
            radius_int,
            density_max = table.density_max,
            "Created diffusion table"
        );
        table
    }

    pub fn params(&self) -> &DiffusionParams {
        &self.params
    }

    /// Largest offset with a possibly non-zero weight.
    pub fn radius_int(&self) -> usize {
        self.radius_int
    }

    pub fn rowstride(&self) -> usize {
        self.radius_int + 1
    }

    /// Number of weights in one cached kernel.
    pub fn block_len(&self) -> usize {
        self.rowstride() * self.rowstride()
    }

    /// Density of a disc of the shine radius; caps the shine boost.
    pub fn density_max(&self) -> f32 {
        self.density_max
    }

    /// Number of levels built so far.
    pub fn cached_levels(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Cached kernel for `level`, if it has been built.
    pub fn kernel(&self, level: i32) -> Option<&CachedKernel> {
        if level == 0 {
            return None;
        }
        self.slots[slot_index(level)].as_ref()
    }

    /// Cached kernel for `level`, building it if needed.
    ///
    /// # Panics
    ///
    /// Panics if `level` is zero or outside `-DEPTH_MAX..=DEPTH_MAX`.
    pub fn kernel_mut(&mut self, level: i32) -> &CachedKernel {
        assert!(level != 0, "in-focus level has no kernel");
        let num = slot_index(level);
        if self.slots[num].is_none() {
            let kernel = self.make(level.abs());
            self.slots[num] = Some(kernel);
        }
        match &self.slots[num] {
            Some(kernel) => kernel,
            None => unreachable!("slot {num} populated above"),
        }
    }

    /// Build every level up front so the table can be shared read-only.
    pub fn prepare_all(&mut self) {
        for level in 1..=DEPTH_MAX {
            self.kernel_mut(level);
        }
    }

    /// Weight of input pixel `(x, y)` for output pixel `(pos_x, pos_y)` at `level`.
    ///
    /// # Panics
    ///
    /// Panics if `level` is outside `-DEPTH_MAX..=DEPTH_MAX`.
    pub fn get(&mut self, level: i32, pos_x: i32, pos_y: i32, x: i32, y: i32) -> f32 {
        let dx = pos_x - x;
        let dy = pos_y - y;
        let r = self.radius_int as i32;

        if dx < -r || dx > r || dy < -r || dy > r {
            return 0.0;
        }

        assert!(
            (-DEPTH_MAX..=DEPTH_MAX).contains(&level),
            "blur level {level} out of range"
        );

        if level == 0 {
            return if dx != 0 || dy != 0 { 0.0 } else { 1.0 };
        }

        self.kernel_mut(level).weights.sample(dx, dy)
    }

    /// Highlight multiplier for a pixel at `depth_level` with shine `shine_level` (0..=255).
    ///
    /// # Panics
    ///
    /// Panics if `depth_level` is outside `-DEPTH_MAX..=DEPTH_MAX`.
    pub fn get_shine(&mut self, depth_level: i32, shine_level: u8) -> f32 {
        assert!(
            (-DEPTH_MAX..=DEPTH_MAX).contains(&depth_level),
            "blur level {depth_level} out of range"
        );

        if depth_level == 0 || shine_level == 0 || self.params.shine_radius == 0.0 {
            return 1.0;
        }

        let density_max = self.density_max;
        let mut density = self.kernel_mut(depth_level).density;

        if density_max > 1.0 && density > density_max {
            density = density_max;
        }

        let excess = density - 1.0;
        if excess < 0.0 {
            tracing::warn!(
                depth_level,
                density,
                "Kernel density below one, shine disabled"
            );
            return 1.0;
        }

        1.0 + shine_level as f32 * excess / 255.0
    }

    /// Build the kernel for a positive `level`.
    fn make(&self, level: i32) -> CachedKernel {
        assert!(level > 0);

        let radius = self.params.model_radius * (level as f32 / DEPTH_MAX as f32);
        let range = radius.ceil() as usize;

        assert!(radius >= 0.0);
        assert!(range < TABLE_LENGTH, "kernel range {range} exceeds table");

        let distances = DistanceTable::global();
        let mut weights = QuarterKernel::zeroed(self.radius_int);

        for y in 0..=range {
            let differences = distances.row(y);
            for x in 0..=range {
                weights.set(x, y, self.falloff.weight(radius, differences[x]));
            }
        }

        let density = weights.mirrored_sum();
        weights.scale(1.0 / density);

        self.softness.apply(&mut weights, radius, level);

        tracing::debug!(level, radius, density, "Built diffusion kernel");
        CachedKernel { weights, density }
    }

    /// Energy of an unnormalized kernel of `radius`, without caching it.
    pub fn make_density(&self, radius: f32) -> f32 {
        if radius == 0.0 {
            return 1.0;
        }
        if radius < 0.0 {
            return 0.0;
        }

        let range = radius.ceil() as usize;
        assert!(range < TABLE_LENGTH, "density range {range} exceeds table");

        let distances = DistanceTable::global();
        let mut density = 0.0f32;

        // Skip the first row, then rotate four times like a pinwheel
        for y in 1..=range {
            let differences = distances.row(y);
            for &difference in &differences[..=range] {
                density += self.falloff.weight(radius, difference);
            }
        }

        4.0 * density + self.falloff.weight(radius, 0.0)
    }
}

/// Slot for `level`; the farthest level sits at index 0.
#[inline]
fn slot_index(level: i32) -> usize {
    assert!(
        level != 0 && (-DEPTH_MAX..=DEPTH_MAX).contains(&level),
        "blur level {level} out of range"
    );
    (DEPTH_MAX - level.abs()) as usize
}

/// Reconcile `slot` with `params`.
///
/// A change of the shine radius alone only recomputes the maximum density.
/// Any other change replaces the table and invalidates the acceleration cache.
pub fn update(
    slot: &mut Option<DiffusionTable>,
    cache: Option<&mut dyn AccelerationCache>,
    params: &DiffusionParams,
) -> Update {
    if let Some(table) = slot.as_mut() {
        if table.params.same_kernels(params) {
            if table.params.shine_radius == params.shine_radius {
                return Update::Unchanged;
            }

            table.params.shine_radius = params.shine_radius;
            table.density_max = table.make_density(params.shine_radius);
            tracing::debug!(
                shine_radius = params.shine_radius,
                density_max = table.density_max,
                "Updated shine density"
            );
            return Update::Refreshed;
        }

        destroy(slot);
    }

    if let Some(cache) = cache {
        cache.invalidate_diffusion();
    }

    *slot = Some(DiffusionTable::new(params));
    Update::Replaced
}

/// Drop the table and every cached kernel. Safe on an empty slot.
pub fn destroy(slot: &mut Option<DiffusionTable>) {
    if let Some(table) = slot.take() {
        tracing::debug!(
            cached_levels = table.cached_levels(),
            "Destroyed diffusion table"
        );
    }
}
