//! Reference convolution: walks every output pixel and gathers its
//! neighbourhood through the diffusion table.

use crate::rendering::depth_map::DepthMap;
use crate::rendering::diffusion::DiffusionTable;
use crate::rendering::image::PixelImage;
use crate::rendering::shine::ShineMap;
use crate::DEPTH_MAX;

const COLOR_FNUM: f32 = 1.0 / 255.0;
const DEPTH_NTABLES: usize = DEPTH_MAX as usize + 1;

/// Depth-ordering switches; all require a depth map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Nearer depths occlude farther ones
    pub precedence: bool,
    /// Refill coverage lost to precedence from pixels behind (needs precedence)
    pub fill_behind: bool,
    /// Soften the fill-behind edge by depth distance
    pub fuzzy: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    alpha: f32,
    pixel: f32,
    color: [f32; 3],
}

impl Sums {
    #[inline]
    fn accumulate(&mut self, px: &[u8], channels: usize, val_alpha: f32, val_pixel: f32) {
        for (sum, &value) in self.color.iter_mut().zip(&px[..channels]) {
            *sum += val_alpha * value as f32;
        }
        self.alpha += val_alpha;
        self.pixel += val_pixel;
    }

    #[inline]
    fn add_scaled(&mut self, other: &Sums, factor: f32) {
        self.alpha += factor * other.alpha;
        self.pixel += factor * other.pixel;
        for (sum, value) in self.color.iter_mut().zip(other.color) {
            *sum += factor * value;
        }
    }
}

pub struct Renderer<'a> {
    source: &'a PixelImage,
    diffusion: &'a mut DiffusionTable,
    depth_map: Option<&'a DepthMap>,
    shine: Option<&'a ShineMap>,
    options: RenderOptions,
    buckets: Vec<Sums>,
    transit: Vec<f32>,
}

impl<'a> Renderer<'a> {
    pub fn new(source: &'a PixelImage, diffusion: &'a mut DiffusionTable) -> Self {
        Self {
            source,
            diffusion,
            depth_map: None,
            shine: None,
            options: RenderOptions::default(),
            buckets: vec![Sums::default(); DEPTH_NTABLES],
            transit: vec![0.0; DEPTH_NTABLES],
        }
    }

    pub fn depth_map(mut self, depth_map: Option<&'a DepthMap>) -> Self {
        self.depth_map = depth_map;
        self
    }

    pub fn shine(mut self, shine: Option<&'a ShineMap>) -> Self {
        self.shine = shine;
        self
    }

    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Render the whole source into a new image of the same layout.
    pub fn render(&mut self) -> PixelImage {
        let (width, height) = (self.source.width(), self.source.height());
        let layout = self.source.layout();
        let mut output = PixelImage::blank(width, height, layout);
        let mut pixel = [0u8; 4];
        let bpp = layout.bytes_per_pixel();

        tracing::debug!(
            width,
            height,
            radius = self.diffusion.radius_int(),
            depth_map = self.depth_map.is_some(),
            shine = self.shine.is_some(),
            "Rendering"
        );

        for y in 0..height {
            for x in 0..width {
                self.render_pixel(x as i32, y as i32, &mut pixel[..bpp]);
                output.pixel_mut(x, y).copy_from_slice(&pixel[..bpp]);
            }
        }
        output
    }

    /// Compute output pixel `(pos_x, pos_y)` into `dest`.
    pub fn render_pixel(&mut self, pos_x: i32, pos_y: i32, dest: &mut [u8]) {
        let layout = self.source.layout();
        let channels = layout.color_channels();
        let has_alpha = layout.has_alpha();

        let precedence = self.depth_map.is_some() && self.options.precedence;
        let fill_behind = precedence && self.options.fill_behind;

        let mut sums = Sums::default();
        if precedence {
            self.buckets.fill(Sums::default());
            self.transit.fill(0.0);
        }

        // Farthest level when no depth map is given
        let mut depth = 0;
        let mut level = DEPTH_MAX;

        let r = self.diffusion.radius_int() as i32;
        let x1 = (pos_x - r).max(0);
        let x2 = (pos_x + r + 1).min(self.source.width() as i32);
        let y1 = (pos_y - r).max(0);
        let y2 = (pos_y + r + 1).min(self.source.height() as i32);

        for y in y1..y2 {
            for x in x1..x2 {
                if let Some(map) = self.depth_map {
                    depth = map.get_depth(x, y);
                    level = map.get_level(depth);
                }

                let mut distribution = self.diffusion.get(level, pos_x, pos_y, x, y);
                if distribution <= 0.0 {
                    continue;
                }

                let px = self.source.pixel(x as u32, y as u32);

                let mut val_shone = distribution;
                if let Some(shine_map) = self.shine {
                    let shine = shine_map.get(x, y);
                    if shine != 0 {
                        val_shone *= self.diffusion.get_shine(level, shine);
                    }
                }

                let mut val_alpha = val_shone;
                if has_alpha {
                    let alpha = COLOR_FNUM * px[channels] as f32;
                    val_alpha *= alpha;
                    distribution *= alpha;
                }

                if precedence {
                    let d = depth as usize;
                    self.buckets[d].accumulate(px, channels, val_alpha, val_shone);
                    self.transit[d] += distribution;
                } else {
                    sums.accumulate(px, channels, val_alpha, val_shone);
                }
            }
        }

        if precedence {
            let mut through = 1.0f32;
            for (bucket, &transit) in self.buckets.iter().zip(&self.transit) {
                if transit > 0.0 {
                    let taken = transit.min(through);
                    through -= taken;
                    sums.add_scaled(bucket, taken / transit);

                    if through < COLOR_FNUM {
                        break;
                    }
                }
            }
        }

        if fill_behind && sums.pixel < 1.0 {
            if let Some(map) = self.depth_map {
                let behind = self.gather_behind(map, pos_x, pos_y, (x1, x2, y1, y2));
                if behind.pixel > COLOR_FNUM {
                    let through = (1.0 - sums.pixel) / behind.pixel;
                    sums.add_scaled(&behind, through);
                }
            }
        }

        write_pixel(&sums, channels, has_alpha, dest);
    }

    /// Pixels deeper than the output pixel, weighted with the output pixel's own level.
    fn gather_behind(
        &mut self,
        map: &DepthMap,
        pos_x: i32,
        pos_y: i32,
        (x1, x2, y1, y2): (i32, i32, i32, i32),
    ) -> Sums {
        let layout = self.source.layout();
        let channels = layout.color_channels();
        let has_alpha = layout.has_alpha();

        let depth_pos = map.get_depth(pos_x, pos_y);
        let level = map.get_level(depth_pos);

        let mut depth_fuzzy = 0.0f32;
        let mut depth_nearest = 0;
        if self.options.fuzzy {
            depth_nearest = depth_pos;
            for y in y1..y2 {
                for x in x1..x2 {
                    if self.diffusion.get(level, pos_x, pos_y, x, y) <= 0.0 {
                        continue;
                    }
                    depth_nearest = depth_nearest.min(map.get_depth(x, y));
                }
            }
            if depth_pos > depth_nearest {
                depth_fuzzy = 1.0 / (depth_pos - depth_nearest) as f32;
            }
        }

        let mut behind = Sums::default();
        for y in y1..y2 {
            for x in x1..x2 {
                let mut distribution = self.diffusion.get(level, pos_x, pos_y, x, y);
                if distribution <= 0.0 {
                    continue;
                }

                let depth = map.get_depth(x, y);
                if depth <= depth_pos {
                    if depth_fuzzy == 0.0 {
                        continue;
                    }
                    distribution *= depth_fuzzy * (depth - depth_nearest) as f32;
                }

                let px = self.source.pixel(x as u32, y as u32);
                let mut val_alpha = distribution;
                if has_alpha {
                    val_alpha *= COLOR_FNUM * px[channels] as f32;
                }
                behind.accumulate(px, channels, val_alpha, distribution);
            }
        }
        behind
    }
}

fn write_pixel(sums: &Sums, channels: usize, has_alpha: bool, dest: &mut [u8]) {
    if sums.pixel == 0.0 || sums.alpha / sums.pixel < COLOR_FNUM {
        dest.fill(0);
        return;
    }

    for (out, &color) in dest.iter_mut().zip(&sums.color[..channels]) {
        *out = (color / sums.alpha).round().clamp(0.0, 255.0) as u8;
    }
    if has_alpha {
        dest[channels] = (255.0 * sums.alpha / sums.pixel).round().clamp(0.0, 255.0) as u8;
    }
}
