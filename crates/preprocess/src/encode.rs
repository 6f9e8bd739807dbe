use crate::{NormalizationSpec, PreprocessError, RgbPixelGrid, TensorLayout};
use common::span_debug;
use ndarray::{Array, IxDyn};

/// Write every (y, x, c) of `grid` into a rank-4 tensor with batch size 1.
///
/// NHWC puts pixel (y, x) channel c at `[0, y, x, c]`, NCHW at `[0, c, y, x]`.
pub fn encode(
    grid: &RgbPixelGrid,
    normalization: &NormalizationSpec,
    layout: TensorLayout,
) -> Result<Array<f32, IxDyn>, PreprocessError> {
    let _s = span_debug!("normalize");

    let width = grid.width as usize;
    let height = grid.height as usize;
    let spatial = width * height;

    if grid.data.len() != spatial * 3 {
        return Err(PreprocessError::BufferMismatch {
            width: grid.width,
            height: grid.height,
            expected: spatial * 3,
            actual: grid.data.len(),
        });
    }

    let mut output = vec![0.0f32; 3 * spatial];

    for (i, px) in grid.data.chunks_exact(3).enumerate() {
        for (c, &value) in px.iter().enumerate() {
            output[layout.offset(i, c, spatial)] = normalization.apply(value, c);
        }
    }

    Ok(Array::from_shape_vec(
        IxDyn(&layout.shape(height, width)),
        output,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Dimension;

    const SIZE: u32 = 224;

    fn single_pixel_variation(x: u32, y: u32) -> (RgbPixelGrid, RgbPixelGrid) {
        let base = RgbPixelGrid::from_pixel(SIZE, SIZE, [0, 0, 0]);
        let mut varied = base.clone();
        varied.set_pixel(x, y, [0, 255, 0]);
        (base, varied)
    }

    fn changed_indices(a: &Array<f32, IxDyn>, b: &Array<f32, IxDyn>) -> Vec<Vec<usize>> {
        a.indexed_iter()
            .zip(b.iter())
            .filter(|((_, va), vb)| va != vb)
            .map(|((idx, _), _)| idx.slice().to_vec())
            .collect()
    }

    #[test]
    fn test_nhwc_single_pixel_variation() {
        let (base, varied) = single_pixel_variation(17, 101);
        let norm = NormalizationSpec::symmetric();

        let a = encode(&base, &norm, TensorLayout::Nhwc).unwrap();
        let b = encode(&varied, &norm, TensorLayout::Nhwc).unwrap();

        assert_eq!(a.shape(), &[1, 224, 224, 3]);
        assert_eq!(changed_indices(&a, &b), vec![vec![0, 101, 17, 1]]);
        assert_eq!(b[[0, 101, 17, 1]], 1.0);
    }

    #[test]
    fn test_nchw_single_pixel_variation() {
        let (base, varied) = single_pixel_variation(17, 101);
        let norm = NormalizationSpec::imagenet();

        let a = encode(&base, &norm, TensorLayout::Nchw).unwrap();
        let b = encode(&varied, &norm, TensorLayout::Nchw).unwrap();

        assert_eq!(a.shape(), &[1, 3, 224, 224]);
        assert_eq!(changed_indices(&a, &b), vec![vec![0, 1, 101, 17]]);

        let expected = (1.0 - 0.456) / 0.224;
        assert!((b[[0, 1, 101, 17]] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_layouts_hold_same_values() {
        let mut grid = RgbPixelGrid::from_pixel(5, 4, [0, 0, 0]);
        for y in 0..4 {
            for x in 0..5 {
                grid.set_pixel(x, y, [x as u8 * 10, y as u8 * 20, (x + y) as u8]);
            }
        }
        let norm = NormalizationSpec::UnitScale;

        let nhwc = encode(&grid, &norm, TensorLayout::Nhwc).unwrap();
        let nchw = encode(&grid, &norm, TensorLayout::Nchw).unwrap();

        for y in 0..4 {
            for x in 0..5 {
                for c in 0..3 {
                    assert_eq!(nhwc[[0, y, x, c]], nchw[[0, c, y, x]]);
                }
            }
        }
    }

    #[test]
    fn test_every_cell_written() {
        // 255 never normalizes to 0.0 under symmetric scaling, so any
        // unwritten cell would still hold the zero it was allocated with.
        let grid = RgbPixelGrid::from_pixel(SIZE, SIZE, [255, 255, 255]);
        let tensor = encode(&grid, &NormalizationSpec::symmetric(), TensorLayout::Nchw).unwrap();

        assert_eq!(tensor.len(), 224 * 224 * 3);
        assert!(tensor.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_rejects_truncated_grid() {
        let grid = RgbPixelGrid {
            width: 4,
            height: 4,
            data: vec![0; 10],
        };
        let result = encode(&grid, &NormalizationSpec::UnitScale, TensorLayout::Nhwc);
        assert!(matches!(result, Err(PreprocessError::BufferMismatch { .. })));
    }
}
