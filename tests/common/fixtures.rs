//! Test fixtures: images, depth sources and configurations.

use focusblur::models::{BlurConfig, ModelType};
use focusblur::rendering::{AccelerationCache, ChannelLayout, PixelImage};

/// Acceleration cache that counts invalidations.
#[derive(Debug, Default)]
pub struct CountingCache {
    pub diffusion: usize,
    pub depth_map: usize,
}

impl AccelerationCache for CountingCache {
    fn invalidate_diffusion(&mut self) {
        self.diffusion += 1;
    }

    fn invalidate_depth_map(&mut self) {
        self.depth_map += 1;
    }
}

/// Gray image, black everywhere except one white pixel at `(x, y)`.
pub fn spot(width: u32, height: u32, x: u32, y: u32) -> PixelImage {
    let mut image = PixelImage::blank(width, height, ChannelLayout::Gray);
    image.pixel_mut(x, y)[0] = 255;
    image
}

/// RGB image with a horizontal red ramp and constant green and blue.
pub fn rgb_ramp(width: u32, height: u32) -> PixelImage {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..height {
        for x in 0..width {
            data.extend([(x * 255 / (width - 1).max(1)) as u8, 80, 160]);
        }
    }
    PixelImage::new(width, height, ChannelLayout::Rgb, data).unwrap()
}

/// Gray depth image filled with `value`.
pub fn flat_depth(width: u32, height: u32, value: u8) -> PixelImage {
    PixelImage::new(
        width,
        height,
        ChannelLayout::Gray,
        vec![value; (width * height) as usize],
    )
    .unwrap()
}

/// Gray depth image: left half `near`, right half `far`.
pub fn split_depth(width: u32, height: u32, near: u8, far: u8) -> PixelImage {
    let mut image = flat_depth(width, height, near);
    for y in 0..height {
        for x in width / 2..width {
            image.pixel_mut(x, y)[0] = far;
        }
    }
    image
}

/// Plain blur with no depth map.
pub fn blur_config(model_type: ModelType, radius: f32) -> BlurConfig {
    BlurConfig {
        model_type,
        model_radius: radius,
        ..Default::default()
    }
}

/// Depth-aware blur focused at `focal_depth` percent.
pub fn depth_config(radius: f32, focal_depth: f32) -> BlurConfig {
    BlurConfig {
        model_radius: radius,
        enable_depth_map: true,
        focal_depth,
        ..Default::default()
    }
}

pub const CONFIG_YAML: &str = r#"
model_type: ring
model_radius: 4
model_fill: 30
model_softness: 20
enable_depth_map: true
focal_depth: 25
"#;
