//! Quantized per-pixel depth and its conversion into blur levels.

use crate::error::DepthMapError;
use crate::models::DepthMapParams;
use crate::rendering::acceleration::{AccelerationCache, Update};
use crate::rendering::image::{ChannelLayout, DepthSource, SourceId};
use crate::DEPTH_MAX;

/// Depth buffer read from a [`DepthSource`], one byte per pixel in `0..=DEPTH_MAX`.
#[derive(Debug, Clone)]
pub struct DepthMap {
    source_id: SourceId,
    has_alpha: bool,
    focal_depth: f32,
    focal_depth_int: i32,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Integer focal level for a focal depth in percent.
pub fn focal_level(focal_depth: f32) -> i32 {
    (DEPTH_MAX as f32 * focal_depth / 100.0).round() as i32
}

impl DepthMap {
    /// Read and quantize `source`.
    ///
    /// Transparent areas blend towards the focal depth so they stay sharp.
    pub fn make(source: &dyn DepthSource, focal_depth: f32) -> Result<Self, DepthMapError> {
        let (width, height) = source.dimensions()?;
        if width == 0 || height == 0 {
            return Err(DepthMapError::EmptySource { width, height });
        }

        let layout = source.layout();
        let bpp = layout.bytes_per_pixel();
        let row_len = width as usize * bpp;
        let focal = (255.0 * focal_depth / 100.0).round() as u32;

        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let line = source.scanline(y)?;
            if line.len() < row_len {
                return Err(DepthMapError::ShortScanline {
                    row: y,
                    expected: row_len,
                    actual: line.len(),
                });
            }

            data.extend(
                line[..row_len]
                    .chunks_exact(bpp)
                    .map(|px| quantize(layout, px, focal)),
            );
        }

        tracing::info!(
            source = source.id().0,
            width,
            height,
            layout = ?layout,
            "Built depth map"
        );

        Ok(Self {
            source_id: source.id(),
            has_alpha: source.has_alpha(),
            focal_depth,
            focal_depth_int: focal_level(focal_depth),
            width,
            height,
            data,
        })
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Depth at `(x, y)`; both axes wrap so the map tiles.
    #[inline]
    pub fn get_depth(&self, x: i32, y: i32) -> i32 {
        let x = x.rem_euclid(self.width as i32) as usize;
        let y = y.rem_euclid(self.height as i32) as usize;
        self.data[y * self.width as usize + x] as i32
    }

    /// Signed blur level of `depth`.
    #[inline]
    pub fn get_level(&self, depth: i32) -> i32 {
        depth - self.focal_depth_int
    }

    /// Integer focal level.
    pub fn focal_depth(&self) -> i32 {
        self.focal_depth_int
    }

    /// Focal depth in percent as configured.
    pub fn focal_depth_percent(&self) -> f32 {
        self.focal_depth
    }
}

/// Depth byte of one source pixel.
#[inline]
fn quantize(layout: ChannelLayout, px: &[u8], focal: u32) -> u8 {
    let value = match layout {
        ChannelLayout::Gray => px[0] as u32,
        ChannelLayout::GrayAlpha => {
            let alpha = px[1] as u32;
            (px[0] as u32 * alpha + focal * (255 - alpha)) / 255
        }
        ChannelLayout::Rgb => (px[0] as u32 + px[1] as u32 + px[2] as u32) / 3,
        ChannelLayout::Rgba => {
            let alpha = px[3] as u32;
            let gray = (px[0] as u32 + px[1] as u32 + px[2] as u32) / 3;
            (gray * alpha + focal * (255 - alpha)) / 255
        }
    };
    (value / 2) as u8
}

/// Reconcile `slot` with `params` and `source`.
///
/// - Disabled depth maps leave the slot alone.
/// - Same source, new focal depth: only the focal level is refreshed, unless
///   the source has alpha (transparent pixels blend with the focal depth).
/// - Otherwise the map is rebuilt. Without a source the slot ends up empty.
///
/// On failure the slot is empty; no partial map is kept.
pub fn update(
    slot: &mut Option<DepthMap>,
    cache: Option<&mut dyn AccelerationCache>,
    params: &DepthMapParams,
    source: Option<&dyn DepthSource>,
) -> Result<Update, DepthMapError> {
    if !params.enabled {
        return Ok(Update::Unchanged);
    }

    if let Some(map) = slot.as_mut() {
        if source.map(|s| s.id()) == Some(map.source_id) {
            if params.focal_depth == map.focal_depth {
                return Ok(Update::Unchanged);
            }

            map.focal_depth = params.focal_depth;
            map.focal_depth_int = focal_level(params.focal_depth);

            if !map.has_alpha {
                tracing::debug!(focal = map.focal_depth_int, "Updated focal level");
                return Ok(Update::Refreshed);
            }
        }

        destroy(slot);
    }

    if let Some(cache) = cache {
        cache.invalidate_depth_map();
    }

    let Some(source) = source else {
        tracing::debug!("No depth source, depth map cleared");
        return Ok(Update::Replaced);
    };

    *slot = Some(DepthMap::make(source, params.focal_depth)?);
    Ok(Update::Replaced)
}

/// Drop the map. Safe on an empty slot.
pub fn destroy(slot: &mut Option<DepthMap>) {
    if let Some(map) = slot.take() {
        tracing::debug!(source = map.source_id.0, "Destroyed depth map");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::acceleration::tests::CountingCache;
    use crate::rendering::image::PixelImage;
    use pretty_assertions::assert_eq;

    fn enabled(focal_depth: f32) -> DepthMapParams {
        DepthMapParams {
            enabled: true,
            focal_depth,
        }
    }

    fn gray(width: u32, height: u32, data: Vec<u8>) -> PixelImage {
        PixelImage::new(width, height, ChannelLayout::Gray, data).unwrap()
    }

    #[test]
    fn test_gray_is_halved() {
        let image = gray(4, 1, vec![0, 1, 128, 255]);
        let map = DepthMap::make(&image, 0.0).unwrap();
        assert_eq!(map.data(), &[0, 0, 64, 127]);
    }

    #[test]
    fn test_rgb_is_channel_average() {
        let image = PixelImage::new(2, 1, ChannelLayout::Rgb, vec![30, 60, 90, 255, 255, 254])
            .unwrap();
        let map = DepthMap::make(&image, 0.0).unwrap();
        // (180 / 3) / 2 = 30, (764 / 3) / 2 = 127
        assert_eq!(map.data(), &[30, 127]);
    }

    #[test]
    fn test_gray_alpha_blends_towards_focal() {
        let image = PixelImage::new(
            3,
            1,
            ChannelLayout::GrayAlpha,
            vec![200, 255, 200, 0, 0, 128],
        )
        .unwrap();
        let map = DepthMap::make(&image, 100.0).unwrap();
        // opaque: 200 / 2; transparent: focal 255 / 2; half: (0 * 128 + 255 * 127) / 255 / 2
        assert_eq!(map.data(), &[100, 127, 63]);
    }

    #[test]
    fn test_rgba_blends_towards_focal() {
        let image = PixelImage::new(
            2,
            1,
            ChannelLayout::Rgba,
            vec![90, 90, 90, 255, 255, 255, 255, 0],
        )
        .unwrap();
        let map = DepthMap::make(&image, 0.0).unwrap();
        assert_eq!(map.data(), &[45, 0]);
    }

    #[test]
    fn test_depth_stays_in_range() {
        let data: Vec<u8> = (0..=255).collect();
        let image = gray(256, 1, data);
        let map = DepthMap::make(&image, 50.0).unwrap();
        assert!(map.data().iter().all(|&d| d as i32 <= DEPTH_MAX));
        assert_eq!(map.data().len(), 256);
    }

    #[test]
    fn test_get_depth_wraps() {
        let image = gray(3, 2, vec![0, 20, 40, 60, 80, 100]);
        let map = DepthMap::make(&image, 0.0).unwrap();

        for y in 0..2 {
            for x in 0..3 {
                let depth = map.get_depth(x, y);
                assert_eq!(map.get_depth(x + 3, y), depth);
                assert_eq!(map.get_depth(x, y + 2), depth);
                assert_eq!(map.get_depth(x - 3, y - 2), depth);
            }
        }
        assert_eq!(map.get_depth(3, 0), 0);
        assert_eq!(map.get_depth(-1, 0), 20);
    }

    #[test]
    fn test_get_level() {
        let image = gray(1, 1, vec![100]);
        let map = DepthMap::make(&image, 50.0).unwrap();
        // round(127 * 0.5) = 64
        assert_eq!(map.focal_depth(), 64);
        assert_eq!(map.get_level(50), -14);
        assert_eq!(map.get_level(64), 0);
        assert_eq!(map.get_level(DEPTH_MAX), 63);
    }

    #[test]
    fn test_empty_source_fails() {
        let image = PixelImage::blank(0, 4, ChannelLayout::Gray);
        let result = DepthMap::make(&image, 0.0);
        assert!(matches!(
            result,
            Err(DepthMapError::EmptySource {
                width: 0,
                height: 4
            })
        ));
    }

    #[test]
    fn test_update_disabled_is_noop() {
        let image = gray(1, 1, vec![10]);
        let mut slot = None;
        let params = DepthMapParams {
            enabled: false,
            focal_depth: 0.0,
        };
        let outcome = update(&mut slot, None, &params, Some(&image)).unwrap();
        assert_eq!(outcome, Update::Unchanged);
        assert!(slot.is_none());
    }

    #[test]
    fn test_update_builds_and_invalidates() {
        let image = gray(2, 1, vec![10, 20]);
        let mut slot = None;
        let mut cache = CountingCache::default();

        let outcome = update(&mut slot, Some(&mut cache), &enabled(0.0), Some(&image)).unwrap();
        assert_eq!(outcome, Update::Replaced);
        assert_eq!(cache.depth_map, 1);
        assert_eq!(slot.as_ref().unwrap().source_id(), image.id());

        let outcome = update(&mut slot, Some(&mut cache), &enabled(0.0), Some(&image)).unwrap();
        assert_eq!(outcome, Update::Unchanged);
        assert_eq!(cache.depth_map, 1);
    }

    #[test]
    fn test_focal_change_without_alpha_refreshes_level() {
        let image = gray(2, 1, vec![10, 200]);
        let mut slot = None;
        update(&mut slot, None, &enabled(0.0), Some(&image)).unwrap();
        let before: Vec<i32> = (0..2).map(|x| slot.as_ref().unwrap().get_depth(x, 0)).collect();

        let mut cache = CountingCache::default();
        let outcome = update(&mut slot, Some(&mut cache), &enabled(20.0), Some(&image)).unwrap();
        assert_eq!(outcome, Update::Refreshed);
        assert_eq!(cache.depth_map, 0);

        let map = slot.as_ref().unwrap();
        let delta = focal_level(20.0);
        for (x, &depth) in before.iter().enumerate() {
            assert_eq!(map.get_depth(x as i32, 0), depth);
            assert_eq!(map.get_level(depth), depth - delta);
        }
    }

    #[test]
    fn test_focal_change_with_alpha_rebuilds() {
        let image = PixelImage::new(1, 1, ChannelLayout::GrayAlpha, vec![0, 0]).unwrap();
        let mut slot = None;
        update(&mut slot, None, &enabled(0.0), Some(&image)).unwrap();
        assert_eq!(slot.as_ref().unwrap().get_depth(0, 0), 0);

        let mut cache = CountingCache::default();
        let outcome = update(&mut slot, Some(&mut cache), &enabled(100.0), Some(&image)).unwrap();
        assert_eq!(outcome, Update::Replaced);
        assert_eq!(cache.depth_map, 1);
        // Fully transparent pixel now sits at the focal depth
        assert_eq!(slot.as_ref().unwrap().get_depth(0, 0), DEPTH_MAX);
    }

    /// Gray source that still reports transparency.
    struct MaskedGray(PixelImage);

    impl DepthSource for MaskedGray {
        fn id(&self) -> SourceId {
            self.0.id()
        }

        fn layout(&self) -> ChannelLayout {
            self.0.layout()
        }

        fn dimensions(&self) -> Result<(u32, u32), DepthMapError> {
            Ok((self.0.width(), self.0.height()))
        }

        fn scanline(&self, y: u32) -> Result<&[u8], DepthMapError> {
            let stride = self.0.rowstride();
            let start = y as usize * stride;
            Ok(&self.0.data()[start..start + stride])
        }

        fn has_alpha(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_focal_change_follows_source_alpha() {
        let source = MaskedGray(gray(2, 1, vec![10, 200]));
        let mut slot = None;
        update(&mut slot, None, &enabled(0.0), Some(&source)).unwrap();

        let mut cache = CountingCache::default();
        let outcome = update(&mut slot, Some(&mut cache), &enabled(20.0), Some(&source)).unwrap();
        assert_eq!(outcome, Update::Replaced);
        assert_eq!(cache.depth_map, 1);
    }

    #[test]
    fn test_source_change_rebuilds() {
        let first = gray(1, 1, vec![0]);
        let second = gray(1, 1, vec![254]);
        let mut slot = None;
        update(&mut slot, None, &enabled(0.0), Some(&first)).unwrap();

        let outcome = update(&mut slot, None, &enabled(0.0), Some(&second)).unwrap();
        assert_eq!(outcome, Update::Replaced);
        assert_eq!(slot.as_ref().unwrap().get_depth(0, 0), 127);
    }

    #[test]
    fn test_missing_source_clears_map() {
        let image = gray(1, 1, vec![0]);
        let mut slot = None;
        update(&mut slot, None, &enabled(0.0), Some(&image)).unwrap();

        let outcome = update(&mut slot, None, &enabled(0.0), None).unwrap();
        assert_eq!(outcome, Update::Replaced);
        assert!(slot.is_none());
    }

    #[test]
    fn test_failed_build_leaves_slot_empty() {
        let good = gray(1, 1, vec![0]);
        let empty = PixelImage::blank(0, 0, ChannelLayout::Gray);
        let mut slot = None;
        update(&mut slot, None, &enabled(0.0), Some(&good)).unwrap();

        assert!(update(&mut slot, None, &enabled(0.0), Some(&empty)).is_err());
        assert!(slot.is_none());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let image = gray(1, 1, vec![0]);
        let mut slot = Some(DepthMap::make(&image, 0.0).unwrap());
        destroy(&mut slot);
        destroy(&mut slot);
        assert!(slot.is_none());
    }
}
