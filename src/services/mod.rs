pub mod engine;
pub mod image_io;

pub use engine::{BlurEngine, EngineUpdate};
pub use image_io::{decode_png, encode_png, load_png, save_png};
