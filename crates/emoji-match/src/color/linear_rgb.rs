//! Linear RGB color type
//!
//! Linear RGB is proportional to emitted light, which is what relative
//! luminance is defined on.

use super::lut::srgb8_to_linear;
use super::rgb::Rgb;

/// Rec. 709 luminance weights for linear R, G, B.
const LUMINANCE_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// A color in linear RGB color space, channels in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRgb {
    /// Red channel (linear light intensity)
    pub r: f64,
    /// Green channel (linear light intensity)
    pub g: f64,
    /// Blue channel (linear light intensity)
    pub b: f64,
}

impl LinearRgb {
    #[inline]
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Relative luminance `Y` (0.0 for black, 1.0 for white).
    #[inline]
    pub fn luminance(self) -> f64 {
        LUMINANCE_WEIGHTS[0] * self.r + LUMINANCE_WEIGHTS[1] * self.g + LUMINANCE_WEIGHTS[2] * self.b
    }
}

impl From<Rgb> for LinearRgb {
    /// Gamma-decode an 8-bit sRGB color through the lookup table.
    fn from(color: Rgb) -> Self {
        Self::new(
            srgb8_to_linear(color.r),
            srgb8_to_linear(color.g),
            srgb8_to_linear(color.b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_extremes() {
        assert!(LinearRgb::from(Rgb::new(0, 0, 0)).luminance().abs() < 1e-12);
        assert!((LinearRgb::from(Rgb::new(255, 255, 255)).luminance() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_green_dominates_luminance() {
        let red = LinearRgb::from(Rgb::new(255, 0, 0)).luminance();
        let green = LinearRgb::from(Rgb::new(0, 255, 0)).luminance();
        let blue = LinearRgb::from(Rgb::new(0, 0, 255)).luminance();
        assert!(green > red && red > blue);
        assert!((green - 0.7152).abs() < 1e-9);
    }
}
