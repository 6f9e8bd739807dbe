use crate::{PreprocessError, ResizeMode};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};

const LETTERBOX_COLOR: u8 = 114;

/// Interleaved RGB8 pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbPixelGrid {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbPixelGrid {
    pub fn from_pixel(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = rgb.iter().copied().cycle().take(pixels * 3).collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * self.width + x) * 3) as usize;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let idx = ((y * self.width + x) * 3) as usize;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }
}

/// Decode any enabled image format (JPEG, PNG, BMP, GIF, WebP) into RGB8.
///
/// Alpha is dropped and grayscale is expanded to three channels.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbPixelGrid, PreprocessError> {
    let _s = span!("decode_image");

    let image = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = image.dimensions();

    tracing::trace!(
        width,
        height,
        encoded_bytes = bytes.len(),
        "Decoded image dimensions"
    );

    Ok(RgbPixelGrid {
        width,
        height,
        data: image.into_raw(),
    })
}

/// Resize to exactly `target` (width, height) with a bilinear convolution.
///
/// The filter is fixed so the same input always yields the same grid.
pub fn resize(
    grid: &RgbPixelGrid,
    target: (u32, u32),
    mode: ResizeMode,
) -> Result<RgbPixelGrid, PreprocessError> {
    let _s = span!("resize");

    match mode {
        ResizeMode::Stretch => resize_exact(grid, target.0, target.1),
        ResizeMode::Letterbox => letterbox(grid, target),
    }
}

fn resize_exact(
    grid: &RgbPixelGrid,
    width: u32,
    height: u32,
) -> Result<RgbPixelGrid, PreprocessError> {
    if grid.width == width && grid.height == height {
        return Ok(grid.clone());
    }

    let src = ImageRef::new(grid.width, grid.height, &grid.data, PixelType::U8x3)?;
    let mut resized = Image::new(width, height, PixelType::U8x3);

    Resizer::new().resize(
        &src,
        &mut resized,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
    )?;

    Ok(RgbPixelGrid {
        width,
        height,
        data: resized.buffer().to_vec(),
    })
}

fn letterbox(grid: &RgbPixelGrid, target: (u32, u32)) -> Result<RgbPixelGrid, PreprocessError> {
    let scale = (target.0 as f32 / grid.width as f32).min(target.1 as f32 / grid.height as f32);
    let new_width = ((grid.width as f32 * scale) as u32).clamp(1, target.0);
    let new_height = ((grid.height as f32 * scale) as u32).clamp(1, target.1);

    let offset_x = (target.0 - new_width) / 2;
    let offset_y = (target.1 - new_height) / 2;

    tracing::trace!(scale, new_width, new_height, offset_x, offset_y, "Letterbox geometry");

    let resized = resize_exact(grid, new_width, new_height)?;

    let mut canvas = RgbPixelGrid::from_pixel(target.0, target.1, [LETTERBOX_COLOR; 3]);
    let stride = (target.0 * 3) as usize;
    let row_len = (new_width * 3) as usize;

    for y in 0..new_height as usize {
        let src_row = y * row_len;
        let dst_row = (y + offset_y as usize) * stride + (offset_x * 3) as usize;

        canvas.data[dst_row..dst_row + row_len]
            .copy_from_slice(&resized.data[src_row..src_row + row_len]);
    }

    Ok(canvas)
}
