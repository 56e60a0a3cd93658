//! Export of rendered frames to 8-bit grayscale images
//!
//! Frames are `Array2<f64>` indexed `[row, col]`; images are addressed as
//! `(x, y)` = `(col, row)`.

use std::error::Error;
use std::path::Path;

use image::{GrayImage, Luma};
use ndarray::Array2;

/// Stretch a frame linearly onto 0..=255 using its finite min and max
///
/// Non-finite pixels map to 0. A constant frame maps to all zeros.
pub fn normalize_to_u8(frame: &Array2<f64>) -> Array2<u8> {
    let (min, max) = frame
        .iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        });

    let range = max - min;
    if !(range.is_finite() && range > 0.0) {
        return Array2::zeros(frame.dim());
    }

    frame.mapv(|value| {
        if value.is_finite() {
            ((value - min) / range * 255.0).round() as u8
        } else {
            0
        }
    })
}

/// Convert a `[row, col]` array into an image of `(cols, rows)` pixels
pub fn array2_to_gray_image(arr: &Array2<u8>) -> GrayImage {
    let (height, width) = arr.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([arr[[y as usize, x as usize]]])
    })
}

/// Save an 8-bit frame; the format follows the file extension
pub fn save_u8_image<P: AsRef<Path>>(image: &Array2<u8>, path: P) -> Result<(), Box<dyn Error>> {
    array2_to_gray_image(image).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_stretches_range() {
        let frame = array![[1000.0, 1102.0], [1204.0, 1510.0]];
        assert_eq!(normalize_to_u8(&frame), array![[0, 51], [102, 255]]);
    }

    #[test]
    fn test_normalize_ignores_non_finite() {
        let frame = array![[f64::NAN, 0.0], [f64::INFINITY, 2.0]];
        let scaled = normalize_to_u8(&frame);
        assert_eq!(scaled, array![[0, 0], [0, 255]]);
    }

    #[test]
    fn test_normalize_constant_frame() {
        let frame = Array2::from_elem((3, 2), 1000.0);
        assert_eq!(normalize_to_u8(&frame), Array2::<u8>::zeros((3, 2)));
    }

    #[test]
    fn test_gray_image_orientation() {
        let arr = array![[1u8, 2, 3], [4, 5, 6]];
        let img = array2_to_gray_image(&arr);
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 0)[0], 3);
        assert_eq!(img.get_pixel(0, 1)[0], 4);
    }

    #[test]
    fn test_png_roundtrip() {
        let dir = std::env::temp_dir().join(format!("temsim_io_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");

        let arr = array![[0u8, 128], [255, 7]];
        save_u8_image(&arr, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.get_pixel(1, 0)[0], 128);
        assert_eq!(loaded.get_pixel(0, 1)[0], 255);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
