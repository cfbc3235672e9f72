use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

#[derive(Debug, Error)]
pub enum DepthMapError {
    #[error("Depth source is empty: {width}x{height}")]
    EmptySource { width: u32, height: u32 },

    #[error("Scanline {row} too short: expected {expected} bytes, got {actual}")]
    ShortScanline {
        row: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Depth source unavailable: {0}")]
    SourceUnavailable(String),
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("PNG decode error: {0}")]
    Decode(String),

    #[error("PNG encode error: {0}")]
    Encode(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Depth map error: {0}")]
    DepthMap(#[from] DepthMapError),
}
