//! Pixel-art edge detection.
//!
//! A pixel is an edge when its gray level differs from its right or lower
//! neighbor by more than the threshold. The last row and column have no such
//! neighbors and are never edges.

use image::{DynamicImage, GrayImage, Luma, RgbImage};

use super::options::MapperOptions;
use super::resize::fit_to_grid;
use crate::error::MatchError;

/// Luma weights for the grayscale conversion.
pub const GRAY_WEIGHTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// Boolean edge flags for an image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap {
    width: u32,
    height: u32,
    flags: Vec<bool>,
}

impl EdgeMap {
    /// Detect edges in `image` using a gray-level `threshold`.
    pub fn detect(image: &RgbImage, threshold: u8) -> Self {
        let (width, height) = image.dimensions();
        let gray: Vec<i32> = image.pixels().map(|p| gray_level(p.0)).collect();
        let at = |x: u32, y: u32| gray[(y * width + x) as usize];
        let threshold = threshold as i32;

        let mut flags = vec![false; gray.len()];
        for y in 0..height.saturating_sub(1) {
            for x in 0..width.saturating_sub(1) {
                let here = at(x, y);
                if (here - at(x + 1, y)).abs() > threshold || (here - at(x, y + 1)).abs() > threshold {
                    flags[(y * width + x) as usize] = true;
                }
            }
        }

        Self {
            width,
            height,
            flags,
        }
    }

    /// Out-of-bounds coordinates are not edges.
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.flags[(y * self.width + x) as usize]
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&edge| edge).count()
    }

    /// White edges on black, one pixel per grid cell.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.is_edge(x, y) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

/// Preview the edges the refinement pass would see.
///
/// The image is fitted onto the grid exactly as an edge-mode conversion does
/// (nearest resize plus sharpen), even when `options` has edge mode off.
pub fn edge_map(
    image: &DynamicImage,
    options: &MapperOptions,
    width_pct: f64,
    height_pct: f64,
) -> Result<EdgeMap, MatchError> {
    let options = options.clone().edge_detection(true);
    let grid = fit_to_grid(image, &options, width_pct, height_pct)?;
    Ok(EdgeMap::detect(&grid, options.clamped_threshold()))
}

/// Weighted gray level, truncated toward zero.
fn gray_level([r, g, b]: [u8; 3]) -> i32 {
    (GRAY_WEIGHTS[0] * r as f64 + GRAY_WEIGHTS[1] * g as f64 + GRAY_WEIGHTS[2] * b as f64) as i32
}
