//! Shine map: how strongly each source pixel acts as a highlight.
//!
//! Bright pixels above a threshold get a shine byte in `0..=255` that the
//! renderer feeds into `DiffusionTable::get_shine`.

use crate::models::ShineType;
use crate::rendering::image::{ChannelLayout, PixelImage};

/// Per-pixel shine bytes for one source image.
#[derive(Debug, Clone)]
pub struct ShineMap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ShineMap {
    /// Derive shine from `image`.
    ///
    /// `threshold` is the brightness where shine starts; `level` is a
    /// percentage scaling the result.
    pub fn from_image(image: &PixelImage, shine_type: ShineType, threshold: u8, level: f32) -> Self {
        let layout = image.layout();
        let scale = (level / 100.0).clamp(0.0, 1.0);
        let span = (255 - threshold as u32).max(1) as f32;

        let data = image
            .data()
            .chunks_exact(layout.bytes_per_pixel())
            .map(|px| {
                let value = brightness(layout, px, shine_type);
                if value <= threshold as f32 {
                    return 0;
                }
                let shine = (value - threshold as f32) / span * scale * 255.0;
                shine.round().clamp(0.0, 255.0) as u8
            })
            .collect();

        let map = Self {
            width: image.width(),
            height: image.height(),
            data,
        };
        tracing::debug!(
            shine_type = ?shine_type,
            threshold,
            shining = map.data.iter().filter(|&&s| s > 0).count(),
            "Built shine map"
        );
        map
    }

    /// Shine at `(x, y)`, clamped to the map bounds.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.data[y * self.width as usize + x]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Brightness a pixel contributes to shine, `0.0..=255.0`.
fn brightness(layout: ChannelLayout, px: &[u8], shine_type: ShineType) -> f32 {
    if layout.color_channels() == 1 {
        return px[0] as f32;
    }

    let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
    match shine_type {
        ShineType::Luminosity => 0.30 * r + 0.59 * g + 0.11 * b,
        ShineType::Saturation => {
            let max = r.max(g).max(b);
            if max == 0.0 {
                return 0.0;
            }
            let min = r.min(g).min(b);
            // Whiter pixels shine more than saturated ones
            let whiteness = 1.0 - (max - min) / max;
            max * whiteness
        }
    }
}
