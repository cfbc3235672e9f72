pub mod acceleration;
pub mod depth_map;
pub mod diffusion;
pub mod distance;
pub mod falloff;
pub mod image;
pub mod kernel;
pub mod render;
pub mod shine;
pub mod soften;

pub use acceleration::{AccelerationCache, NoAcceleration, Update};
pub use depth_map::DepthMap;
pub use diffusion::{CachedKernel, DiffusionTable};
pub use distance::DistanceTable;
pub use falloff::Falloff;
pub use image::{ChannelLayout, DepthSource, PixelImage, SourceId};
pub use kernel::QuarterKernel;
pub use render::{RenderOptions, Renderer};
pub use shine::ShineMap;
pub use soften::Softness;
