use crate::{
    Preprocess, PreprocessConfig, PreprocessError, PreprocessResult, decode_rgb, encode, resize,
};
use common::span;

/// Decode, resize and encode on the calling thread.
///
/// Holds only the immutable model input declaration, so one instance is
/// shared by every request.
#[derive(Debug, Clone, Default)]
pub struct CpuPreProcessor {
    config: PreprocessConfig,
}

impl CpuPreProcessor {
    pub fn new(config: PreprocessConfig) -> Result<Self, PreprocessError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Preprocess for CpuPreProcessor {
    fn preprocess(&self, bytes: &[u8]) -> Result<PreprocessResult, PreprocessError> {
        let _s = span!("preprocess_image");

        let decoded = decode_rgb(bytes)?;
        let resized = resize(&decoded, self.config.input_size, self.config.resize_mode)?;
        let tensor = encode(&resized, &self.config.normalization, self.config.layout)?;

        Ok(PreprocessResult {
            tensor,
            orig_width: decoded.width,
            orig_height: decoded.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NormalizationSpec, ResizeMode, TensorLayout};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode_image(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_mobilenet_pipeline_shape() {
        let img = RgbImage::from_pixel(640, 480, Rgb([255, 0, 0]));
        let preprocessor = CpuPreProcessor::new(PreprocessConfig::mobilenet()).unwrap();

        let result = preprocessor
            .preprocess(&encode_image(&img, ImageFormat::Png))
            .unwrap();

        assert_eq!(result.tensor.shape(), &[1, 224, 224, 3]);
        assert_eq!((result.orig_width, result.orig_height), (640, 480));
        assert_eq!(result.tensor[[0, 100, 100, 0]], 1.0);
        assert!((result.tensor[[0, 100, 100, 1]] - (-0.9921875)).abs() < 1e-6);
    }

    #[test]
    fn test_imagenet_pipeline_shape() {
        let img = RgbImage::from_pixel(100, 100, Rgb([128, 128, 128]));
        let preprocessor = CpuPreProcessor::new(PreprocessConfig::imagenet()).unwrap();

        let result = preprocessor
            .preprocess(&encode_image(&img, ImageFormat::Png))
            .unwrap();

        assert_eq!(result.tensor.shape(), &[1, 3, 224, 224]);

        let r = result.tensor[[0, 0, 112, 112]];
        let b = result.tensor[[0, 2, 112, 112]];
        assert!((r - 0.074).abs() < 0.01, "R channel should be ~0.074 (got {})", r);
        assert!((b - 0.427).abs() < 0.01, "B channel should be ~0.427 (got {})", b);
    }

    #[test]
    fn test_jpeg_input_decodes() {
        let img = RgbImage::from_pixel(300, 200, Rgb([40, 80, 120]));
        let preprocessor = CpuPreProcessor::default();

        let result = preprocessor.preprocess(&encode_image(&img, ImageFormat::Jpeg));

        assert!(result.is_ok(), "JPEG preprocessing should succeed");
    }

    #[test]
    fn test_custom_resolution_and_letterbox() {
        let config = PreprocessConfig {
            input_size: (320, 256),
            layout: TensorLayout::Nchw,
            normalization: NormalizationSpec::UnitScale,
            resize_mode: ResizeMode::Letterbox,
        };
        let preprocessor = CpuPreProcessor::new(config).unwrap();

        let img = RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]));
        let result = preprocessor
            .preprocess(&encode_image(&img, ImageFormat::Png))
            .unwrap();

        assert_eq!(result.tensor.shape(), &[1, 3, 256, 320]);
        // square image on a wide canvas: left border is padding, centre is white
        assert!((result.tensor[[0, 0, 128, 0]] - 114.0 / 255.0).abs() < 1e-6);
        assert_eq!(result.tensor[[0, 0, 128, 160]], 1.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PreprocessConfig {
            normalization: NormalizationSpec::Standardize {
                mean: [0.5; 3],
                std: [0.5, -1.0, 0.5],
            },
            ..PreprocessConfig::imagenet()
        };
        assert!(CpuPreProcessor::new(config).is_err());
    }

    #[test]
    fn test_corrupt_bytes_fail_with_decode_error() {
        let preprocessor = CpuPreProcessor::default();
        let result = preprocessor.preprocess(&[0xFF, 0xD8, 0xFF, 0x00, 0x01]);
        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }
}
