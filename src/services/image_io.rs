use crate::error::ImageError;
use crate::rendering::{ChannelLayout, PixelImage};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

/// Decode a PNG file into an 8-bit image.
pub fn load_png(path: impl AsRef<Path>) -> Result<PixelImage, ImageError> {
    let file = File::open(path.as_ref())?;
    let image = decode_png(BufReader::new(file))?;
    tracing::debug!(
        path = %path.as_ref().display(),
        width = image.width(),
        height = image.height(),
        layout = ?image.layout(),
        "Loaded PNG"
    );
    Ok(image)
}

/// Decode PNG data, expanding palettes and reducing 16-bit samples to 8 bits.
pub fn decode_png<R: Read>(reader: R) -> Result<PixelImage, ImageError> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let layout = match info.color_type {
        png::ColorType::Grayscale => ChannelLayout::Gray,
        png::ColorType::GrayscaleAlpha => ChannelLayout::GrayAlpha,
        png::ColorType::Rgb => ChannelLayout::Rgb,
        png::ColorType::Rgba => ChannelLayout::Rgba,
        other => return Err(ImageError::UnsupportedFormat(format!("{other:?}"))),
    };

    // Drop any row padding so rows are tightly packed
    let row_len = info.width as usize * layout.bytes_per_pixel();
    let data = if info.line_size == row_len {
        buf.truncate(row_len * info.height as usize);
        buf
    } else {
        buf.chunks(info.line_size)
            .take(info.height as usize)
            .flat_map(|line| line[..row_len].iter().copied())
            .collect()
    };

    PixelImage::new(info.width, info.height, layout, data)
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &PixelImage) -> Result<Vec<u8>, ImageError> {
    let color_type = match image.layout() {
        ChannelLayout::Gray => png::ColorType::Grayscale,
        ChannelLayout::GrayAlpha => png::ColorType::GrayscaleAlpha,
        ChannelLayout::Rgb => png::ColorType::Rgb,
        ChannelLayout::Rgba => png::ColorType::Rgba,
    };

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, image.width(), image.height());
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ImageError::Encode(e.to_string()))?;
        writer
            .write_image_data(image.data())
            .map_err(|e| ImageError::Encode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Write an image to a PNG file.
pub fn save_png(path: impl AsRef<Path>, image: &PixelImage) -> Result<(), ImageError> {
    let bytes = encode_png(image)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    tracing::debug!(path = %path.as_ref().display(), bytes = bytes.len(), "Saved PNG");
    Ok(())
}
