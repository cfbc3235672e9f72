pub mod config;
pub mod params;

pub use config::BlurConfig;
pub use params::{DepthMapParams, DiffusionParams, ModelType, ShineType};
