use crate::PreprocessError;
use std::fmt;
use std::str::FromStr;

/// Spatial resolution shared by the MobileNet and ResNet style classifiers.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (224, 224);

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

pub const SYMMETRIC_OFFSET: f32 = 127.0;
pub const SYMMETRIC_SCALE: f32 = 128.0;

/// Dimension ordering of the network input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// Channel-last: `[1, height, width, 3]`
    Nhwc,
    /// Channel-first: `[1, 3, height, width]`
    Nchw,
}

impl TensorLayout {
    pub fn shape(&self, height: usize, width: usize) -> [usize; 4] {
        match self {
            TensorLayout::Nhwc => [1, height, width, 3],
            TensorLayout::Nchw => [1, 3, height, width],
        }
    }

    /// Flat offset of pixel `i` (row-major `y * width + x`), channel `c`.
    #[inline]
    pub fn offset(&self, pixel: usize, channel: usize, spatial: usize) -> usize {
        match self {
            TensorLayout::Nhwc => pixel * 3 + channel,
            TensorLayout::Nchw => channel * spatial + pixel,
        }
    }
}

impl FromStr for TensorLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nhwc" | "channel-last" | "channels_last" => Ok(Self::Nhwc),
            "nchw" | "channel-first" | "channels_first" => Ok(Self::Nchw),
            other => Err(format!(
                "{} is not a supported tensor layout. Use either `nhwc` or `nchw`.",
                other
            )),
        }
    }
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorLayout::Nhwc => f.write_str("nhwc"),
            TensorLayout::Nchw => f.write_str("nchw"),
        }
    }
}

/// How an 8-bit channel value maps into the tensor's numeric domain.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationSpec {
    /// `(v - offset) / scale`, identical for every channel.
    Symmetric { offset: f32, scale: f32 },
    /// `(v / 255 - mean[c]) / std[c]`
    Standardize { mean: [f32; 3], std: [f32; 3] },
    /// `v / 255`
    UnitScale,
}

impl NormalizationSpec {
    /// `[-1, 1]` scaling used by TensorFlow MobileNet exports.
    pub fn symmetric() -> Self {
        Self::Symmetric {
            offset: SYMMETRIC_OFFSET,
            scale: SYMMETRIC_SCALE,
        }
    }

    /// Torchvision ImageNet statistics.
    pub fn imagenet() -> Self {
        Self::Standardize {
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    #[inline]
    pub fn apply(&self, value: u8, channel: usize) -> f32 {
        let v = value as f32;
        match self {
            NormalizationSpec::Symmetric { offset, scale } => (v - offset) / scale,
            NormalizationSpec::Standardize { mean, std } => {
                (v / 255.0 - mean[channel]) / std[channel]
            }
            NormalizationSpec::UnitScale => v / 255.0,
        }
    }

    /// Reject parameters that would divide by zero or produce NaN.
    pub fn validate(&self) -> Result<(), PreprocessError> {
        match self {
            NormalizationSpec::Symmetric { offset, scale } => {
                if !offset.is_finite() || !scale.is_finite() || *scale == 0.0 {
                    return Err(PreprocessError::InvalidNormalization(format!(
                        "symmetric scale must be finite and non-zero (offset={}, scale={})",
                        offset, scale
                    )));
                }
            }
            NormalizationSpec::Standardize { mean, std } => {
                if let Some(c) = (0..3).find(|&c| std[c] <= 0.0 || !std[c].is_finite()) {
                    return Err(PreprocessError::InvalidNormalization(format!(
                        "std[{}] must be strictly positive, got {}",
                        c, std[c]
                    )));
                }
                if mean.iter().any(|m| !m.is_finite()) {
                    return Err(PreprocessError::InvalidNormalization(format!(
                        "mean must be finite, got {:?}",
                        mean
                    )));
                }
            }
            NormalizationSpec::UnitScale => {}
        }
        Ok(())
    }
}

/// Strategy used to bring a decoded image to the network resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Resize straight to the target size, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Aspect-preserving resize centred on a gray canvas.
    Letterbox,
}

impl FromStr for ResizeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stretch" | "exact" => Ok(Self::Stretch),
            "letterbox" => Ok(Self::Letterbox),
            other => Err(format!(
                "{} is not a supported resize mode. Use either `stretch` or `letterbox`.",
                other
            )),
        }
    }
}

/// Everything a deployed model declares about its input.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub input_size: (u32, u32),
    pub layout: TensorLayout,
    pub normalization: NormalizationSpec,
    pub resize_mode: ResizeMode,
}

impl PreprocessConfig {
    /// Channel-last, symmetric `[-1, 1]` input (TensorFlow MobileNet).
    pub fn mobilenet() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nhwc,
            normalization: NormalizationSpec::symmetric(),
            resize_mode: ResizeMode::Stretch,
        }
    }

    /// Channel-first, ImageNet-standardized input (torchvision ResNet).
    pub fn imagenet() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nchw,
            normalization: NormalizationSpec::imagenet(),
            resize_mode: ResizeMode::Stretch,
        }
    }

    pub fn validate(&self) -> Result<(), PreprocessError> {
        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            return Err(PreprocessError::InvalidNormalization(format!(
                "input size must be non-zero, got {}x{}",
                self.input_size.0, self.input_size.1
            )));
        }
        self.normalization.validate()
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::mobilenet()
    }
}
