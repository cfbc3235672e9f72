//! Focusblur - depth-of-field blur engine.
//!
//! Synthesizes a family of point-spread functions indexed by blur level and
//! convolves images with them so that pixels far from the focal depth blur
//! proportionally to their depth distance.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod rendering;
pub mod services;

/// Deepest quantized depth; depth bytes are `source / 2`.
pub const DEPTH_MAX: i32 = 127;

/// Largest kernel radius covered by the distance table.
pub const RADIUS_MAX: usize = 200;

/// Number of cached kernel slots (one per non-zero absolute level).
pub const DIFFUSION_NTABLES: usize = DEPTH_MAX as usize;
