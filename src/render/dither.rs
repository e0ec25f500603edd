//! 1-bit conversion for thermal label printers.
//!
//! Thermal heads only burn or skip a dot. A grayscale label render is turned
//! into black/white either with a fixed threshold (crisp text and codes) or
//! with Bayer 8x8 ordered dithering (photos and logos).
//!
//! ```text
//! threshold(x, y) = (BAYER8[y mod 8][x mod 8] + 0.5) / 64
//! dot printed     = darkness > threshold(x, y)
//! ```

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// How grayscale pixels become dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DitherMode {
    /// Keep grayscale output
    #[default]
    None,
    /// Dark if darkness > 0.5
    Threshold,
    /// Bayer 8x8 ordered dithering
    Bayer,
}

/// Bayer 8x8 threshold matrix, values 0..64.
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Ordered-dither threshold for a pixel, strictly inside (0, 1).
#[inline]
pub fn bayer_threshold(x: u32, y: u32) -> f32 {
    (BAYER8[(y & 7) as usize][(x & 7) as usize] as f32 + 0.5) / 64.0
}

/// Whether the pixel at (x, y) prints a dot.
#[inline]
pub fn is_dot(mode: DitherMode, x: u32, y: u32, luma: u8) -> bool {
    let darkness = 1.0 - luma as f32 / 255.0;
    match mode {
        DitherMode::None | DitherMode::Threshold => darkness > 0.5,
        DitherMode::Bayer => darkness > bayer_threshold(x, y),
    }
}

/// Convert to pure black/white. `DitherMode::None` returns a copy.
pub fn apply(image: &GrayImage, mode: DitherMode) -> GrayImage {
    if mode == DitherMode::None {
        return image.clone();
    }
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if is_dot(mode, x, y, image.get_pixel(x, y).0[0]) {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Pack the image into printer raster rows: MSB = leftmost dot, 1 = black,
/// each row padded to a whole byte.
pub fn pack_rows(image: &GrayImage, mode: DitherMode) -> Vec<u8> {
    let width_bytes = (image.width() as usize).div_ceil(8);
    let mut data = vec![0u8; width_bytes * image.height() as usize];

    for (x, y, pixel) in image.enumerate_pixels() {
        if is_dot(mode, x, y, pixel.0[0]) {
            let idx = y as usize * width_bytes + x as usize / 8;
            data[idx] |= 0x80 >> (x % 8);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bayer_matrix_is_a_permutation() {
        let mut seen = [false; 64];
        for &v in BAYER8.iter().flatten() {
            assert!(!seen[v as usize], "duplicate {v}");
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_black_and_white_are_stable() {
        for y in 0..8 {
            for x in 0..8 {
                assert!(is_dot(DitherMode::Bayer, x, y, 0));
                assert!(!is_dot(DitherMode::Bayer, x, y, 255));
            }
        }
    }

    #[test]
    fn test_bayer_mid_gray_prints_about_half() {
        let gray = GrayImage::from_pixel(8, 8, Luma([128]));
        let out = apply(&gray, DitherMode::Bayer);
        let dots = out.pixels().filter(|p| p.0[0] == 0).count();
        assert!((24..=40).contains(&dots), "{dots} dots");
    }

    #[test]
    fn test_threshold_mode() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 100 } else { 200 }]));
        let out = apply(&img, DitherMode::Threshold);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_pack_rows_msb_first_with_padding() {
        // 10 px wide: black, white, black, then white, last px black
        let img = GrayImage::from_fn(10, 1, |x, _| Luma([if x == 0 || x == 2 || x == 9 { 0 } else { 255 }]));
        assert_eq!(pack_rows(&img, DitherMode::Threshold), vec![0b1010_0000, 0b0100_0000]);
    }
}
