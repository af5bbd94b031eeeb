//! Color types, gamma decoding and the perceptual distance used for matching.
//!
//! Palette features and image pixels are both plain 8-bit sRGB ([`Rgb`]).
//! [`LinearRgb`] exists only to compute relative luminance for
//! [`perceptual_distance`].
//!
//! # Example
//!
//! ```
//! use emoji_match::{perceptual_distance, Rgb};
//!
//! let red = Rgb::new(255, 0, 0);
//! assert_eq!(perceptual_distance(red, red), 0.0);
//! ```

mod distance;
mod linear_rgb;
mod lut;
mod rgb;

pub use distance::{perceptual_distance, LUMINANCE_EMPHASIS};
pub use linear_rgb::LinearRgb;
pub use rgb::Rgb;
