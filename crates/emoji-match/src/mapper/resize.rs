//! Grid sizing, resampling and the sharpen filter used in edge mode.

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage};

use super::options::{MapperOptions, Resampling};
use crate::error::MatchError;

/// 3x3 sharpen kernel, divided by [`SHARPEN_SCALE`].
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[-2, -2, -2], [-2, 32, -2], [-2, -2, -2]];
const SHARPEN_SCALE: i32 = 16;

/// Grid size for a `width x height` source.
///
/// Fits the source inside `max_width x max_height` keeping its aspect ratio
/// (wide sources are fitted by width first, others by height first), scales
/// the result by the percentages (clamped to 1..=100), then clamps to the
/// maxima again. Both dimensions are at least 1.
pub fn target_dimensions(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
    width_pct: f64,
    height_pct: f64,
) -> (u32, u32) {
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);
    if width == 0 || height == 0 {
        return (1, 1);
    }

    let scale = |value: u32, factor: f64| (value as f64 * factor) as u32;

    let (mut target_w, mut target_h);
    if width > height {
        target_w = width.min(max_width);
        target_h = scale(height, target_w as f64 / width as f64);
        if target_h > max_height {
            target_h = max_height;
            target_w = scale(width, target_h as f64 / height as f64);
        }
    } else {
        target_h = height.min(max_height);
        target_w = scale(width, target_h as f64 / height as f64);
        if target_w > max_width {
            target_w = max_width;
            target_h = scale(height, target_w as f64 / width as f64);
        }
    }

    target_w = scale(target_w, clamp_pct(width_pct) / 100.0);
    target_h = scale(target_h, clamp_pct(height_pct) / 100.0);

    (
        target_w.clamp(1, max_width),
        target_h.clamp(1, max_height),
    )
}

fn clamp_pct(pct: f64) -> f64 {
    if pct.is_nan() {
        100.0
    } else {
        pct.clamp(1.0, 100.0)
    }
}

fn resize_alg(mode: Resampling) -> ResizeAlg {
    match mode {
        Resampling::Nearest => ResizeAlg::Nearest,
        Resampling::Box => ResizeAlg::Convolution(FilterType::Box),
        Resampling::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
        Resampling::Hamming => ResizeAlg::Convolution(FilterType::Hamming),
        Resampling::Bicubic => ResizeAlg::Convolution(FilterType::CatmullRom),
        Resampling::Lanczos => ResizeAlg::Convolution(FilterType::Lanczos3),
    }
}

/// Resample an RGB image to exactly `width x height`.
pub fn resize_rgb(
    source: &RgbImage,
    width: u32,
    height: u32,
    mode: Resampling,
) -> Result<RgbImage, MatchError> {
    if source.dimensions() == (width, height) {
        return Ok(source.clone());
    }

    let src = Image::from_vec_u8(
        source.width(),
        source.height(),
        source.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(|e| MatchError::Resize(e.to_string()))?;
    let mut dst = Image::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(resize_alg(mode));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| MatchError::Resize(e.to_string()))?;

    RgbImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| MatchError::Resize("resized buffer has unexpected length".to_string()))
}

/// Convert `image` to RGB and resize it onto the grid `options` allow.
///
/// In edge mode the resize is nearest-neighbor followed by a sharpen,
/// whatever resampling was selected.
pub fn fit_to_grid(
    image: &DynamicImage,
    options: &MapperOptions,
    width_pct: f64,
    height_pct: f64,
) -> Result<RgbImage, MatchError> {
    let rgb = image.to_rgb8();
    let (width, height) = target_dimensions(
        rgb.width(),
        rgb.height(),
        options.max_width,
        options.max_height,
        width_pct,
        height_pct,
    );

    let resized = resize_rgb(&rgb, width, height, options.effective_resampling())?;
    if options.edge_detection {
        Ok(sharpen(&resized))
    } else {
        Ok(resized)
    }
}

/// Apply the 3x3 sharpen kernel. Border pixels are copied unchanged.
pub fn sharpen(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = [0i32; 3];
            for (ky, row) in SHARPEN_KERNEL.iter().enumerate() {
                for (kx, &weight) in row.iter().enumerate() {
                    let p = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for c in 0..3 {
                        acc[c] += weight * p[c] as i32;
                    }
                }
            }
            let pixel = out.get_pixel_mut(x, y);
            for c in 0..3 {
                let value = (acc[c] as f32 / SHARPEN_SCALE as f32).round();
                pixel[c] = value.clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}
