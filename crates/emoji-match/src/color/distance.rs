//! Luminance-weighted perceptual distance.
//!
//! ```text
//! d = sqrt((3·ΔY)² + Δr² + Δg² + Δb²)
//! ```
//!
//! `Y` is relative luminance of the gamma-decoded colors; `Δr/Δg/Δb` are the
//! differences of the raw channels normalized to 0.0..=1.0. This is a simple
//! approximation, not a CIE ΔE, and the matcher's thresholds (the 0.2 edge
//! contrast minimum in particular) are tuned against it.

use super::linear_rgb::LinearRgb;
use super::rgb::Rgb;

/// Multiplier applied to the luminance difference.
pub const LUMINANCE_EMPHASIS: f64 = 3.0;

/// Perceptual distance between two colors.
///
/// Zero for identical colors, symmetric, and maximal (`sqrt(12)`) between
/// black and white.
pub fn perceptual_distance(a: Rgb, b: Rgb) -> f64 {
    let luma = (LinearRgb::from(a).luminance() - LinearRgb::from(b).luminance())
        * LUMINANCE_EMPHASIS;

    let [ar, ag, ab] = a.normalized();
    let [br, bg, bb] = b.normalized();
    let (dr, dg, db) = (ar - br, ag - bg, ab - bb);

    (luma * luma + dr * dr + dg * dg + db * db).sqrt()
}
