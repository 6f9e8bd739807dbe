pub mod config;
pub mod cpu;
pub mod decode;
pub mod encode;

use ndarray::{Array, IxDyn};
use thiserror::Error;

pub use config::{
    DEFAULT_INPUT_SIZE, NormalizationSpec, PreprocessConfig, ResizeMode, TensorLayout,
};
pub use cpu::CpuPreProcessor;
pub use decode::{RgbPixelGrid, decode_rgb, resize};
pub use encode::encode;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("buffer size mismatch: expected {expected} bytes for {width}x{height} RGB, got {actual}")]
    BufferMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("invalid image buffer: {0}")]
    ImageBuffer(#[from] fast_image_resize::ImageBufferError),

    #[error("resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("invalid normalization: {0}")]
    InvalidNormalization(String),
}

/// Result of preprocessing an encoded image
#[derive(Debug)]
pub struct PreprocessResult {
    /// Network input tensor, batch dimension of 1
    pub tensor: Array<f32, IxDyn>,
    /// Width of the decoded image before resizing
    pub orig_width: u32,
    /// Height of the decoded image before resizing
    pub orig_height: u32,
}

/// Trait for image preprocessing implementations
pub trait Preprocess: Send + Sync {
    /// Turn compressed image bytes into a network input tensor.
    ///
    /// Implementations must not keep per-call state, so a single instance can
    /// serve concurrent requests.
    fn preprocess(&self, bytes: &[u8]) -> Result<PreprocessResult, PreprocessError>;
}
