//! 8-bit pixel buffers and the depth-source abstraction.

use crate::error::{DepthMapError, ImageError};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_SOURCE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a depth source; a depth map is rebuilt when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

impl SourceId {
    /// A process-unique identifier.
    pub fn next() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Channel layout of an 8-bit image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Number of colour channels, excluding alpha.
    pub fn color_channels(self) -> usize {
        match self {
            ChannelLayout::Gray | ChannelLayout::GrayAlpha => 1,
            ChannelLayout::Rgb | ChannelLayout::Rgba => 3,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.color_channels() + usize::from(self.has_alpha())
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, ChannelLayout::GrayAlpha | ChannelLayout::Rgba)
    }
}

/// A rectangular image a depth map can be read from, one scanline at a time.
pub trait DepthSource {
    fn id(&self) -> SourceId;

    fn layout(&self) -> ChannelLayout;

    /// `(width, height)`; fails if the source cannot be sized.
    fn dimensions(&self) -> Result<(u32, u32), DepthMapError>;

    /// Raw bytes of row `y`, at least `width * bytes_per_pixel` long.
    fn scanline(&self, y: u32) -> Result<&[u8], DepthMapError>;

    fn has_alpha(&self) -> bool {
        self.layout().has_alpha()
    }
}

/// Owned, row-major 8-bit image.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    id: SourceId,
    width: u32,
    height: u32,
    layout: ChannelLayout,
    data: Vec<u8>,
}

impl PixelImage {
    /// Wrap `data`, which must hold exactly `width * height` pixels.
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * layout.bytes_per_pixel();
        if data.len() != expected {
            return Err(ImageError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            id: SourceId::next(),
            width,
            height,
            layout,
            data,
        })
    }

    /// Zero-filled image.
    pub fn blank(width: u32, height: u32, layout: ChannelLayout) -> Self {
        let len = width as usize * height as usize * layout.bytes_per_pixel();
        Self {
            id: SourceId::next(),
            width,
            height,
            layout,
            data: vec![0; len],
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn rowstride(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// Bytes of the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.layout.bytes_per_pixel();
        let offset = y as usize * self.rowstride() + x as usize * bpp;
        &self.data[offset..offset + bpp]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let bpp = self.layout.bytes_per_pixel();
        let offset = y as usize * self.rowstride() + x as usize * bpp;
        &mut self.data[offset..offset + bpp]
    }
}

impl DepthSource for PixelImage {
    fn id(&self) -> SourceId {
        self.id
    }

    fn layout(&self) -> ChannelLayout {
        self.layout
    }

    fn dimensions(&self) -> Result<(u32, u32), DepthMapError> {
        Ok((self.width, self.height))
    }

    fn scanline(&self, y: u32) -> Result<&[u8], DepthMapError> {
        if y >= self.height {
            return Err(DepthMapError::SourceUnavailable(format!(
                "row {y} outside {}x{} image",
                self.width, self.height
            )));
        }
        let stride = self.rowstride();
        let start = y as usize * stride;
        Ok(&self.data[start..start + stride])
    }
}
