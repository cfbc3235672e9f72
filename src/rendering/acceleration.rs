//! Invalidation contract towards an external convolution accelerator
//! (for example an FFT-domain copy of the kernels or the depth map).

/// Result of reconciling a diffusion table or depth map with new parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Nothing changed
    Unchanged,
    /// Derived scalars were recomputed; cached kernels and depth data are intact
    Refreshed,
    /// The previous state was dropped
    Replaced,
}

impl Update {
    pub fn changed(self) -> bool {
        self != Update::Unchanged
    }
}

/// Receives invalidation notices whenever the engine replaces state that a
/// derived cache was computed from.
pub trait AccelerationCache {
    fn invalidate_diffusion(&mut self);
    fn invalidate_depth_map(&mut self);
}

/// Accelerator that caches nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAcceleration;

impl AccelerationCache for NoAcceleration {
    fn invalidate_diffusion(&mut self) {}
    fn invalidate_depth_map(&mut self) {}
}
