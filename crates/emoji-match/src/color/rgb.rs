//! 8-bit sRGB color type
//!
//! Every color the matcher sees (image pixels, cluster centroids, flat
//! palette colors, the compositing background) is an [`Rgb`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseColorError;

/// An 8-bit sRGB color.
///
/// Serializes as a `[r, g, b]` array. Ordering is lexicographic by channel,
/// which is what the matcher sorts neighbor colors by before hashing them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a byte array `[R, G, B]`.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels scaled to 0.0..=1.0 without gamma decoding.
    #[inline]
    pub fn normalized(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    /// Round float channels (0.0..=255.0 scale) to the nearest 8-bit color.
    ///
    /// Values outside the range are clamped.
    #[inline]
    pub fn from_f32_rounded(channels: [f32; 3]) -> Self {
        let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self::new(to_u8(channels[0]), to_u8(channels[1]), to_u8(channels[2]))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        color.to_bytes()
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(pixel: image::Rgb<u8>) -> Self {
        Self::from_bytes(pixel.0)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse a color from a hex string.
    ///
    /// Supports `#RRGGBB`, `RRGGBB`, `#RGB` and `RGB`, case-insensitive,
    /// with surrounding whitespace trimmed.
    ///
    /// ```
    /// use emoji_match::Rgb;
    ///
    /// let bg: Rgb = "#222529".parse().unwrap();
    /// assert_eq!(bg, Rgb::new(0x22, 0x25, 0x29));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);

        let mut nibbles = [0u8; 6];
        let mut count = 0;
        for (index, found) in digits.chars().enumerate() {
            let nibble = found
                .to_digit(16)
                .ok_or(ParseColorError::Digit { index, found })?;
            if let Some(slot) = nibbles.get_mut(index) {
                *slot = nibble as u8;
            }
            count += 1;
        }

        let [a, b, c, d, e, f] = nibbles;
        match count {
            // Shorthand doubles each digit: f -> ff
            3 => Ok(Self::new(a * 17, b * 17, c * 17)),
            6 => Ok(Self::new(a << 4 | b, c << 4 | d, e << 4 | f)),
            n => Err(ParseColorError::Length(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!("#FFFFFF".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("000000".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!("#f00".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
        assert_eq!("  #AbC  ".parse::<Rgb>().unwrap(), Rgb::new(0xAA, 0xBB, 0xCC));
    }

    #[test]
    fn test_hex_parsing_errors() {
        assert_eq!(
            "#GGG".parse::<Rgb>(),
            Err(ParseColorError::Digit { index: 0, found: 'G' })
        );
        assert_eq!("#FFFF".parse::<Rgb>(), Err(ParseColorError::Length(4)));
        assert_eq!("".parse::<Rgb>(), Err(ParseColorError::Length(0)));
        // Multi-byte input is rejected by character, never sliced
        assert_eq!(
            "#ab€".parse::<Rgb>(),
            Err(ParseColorError::Digit { index: 2, found: '€' })
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let color = Rgb::new(0x22, 0x25, 0x29);
        assert_eq!(color.to_string(), "#222529");
        assert_eq!(color.to_string().parse::<Rgb>().unwrap(), color);
    }

    #[test]
    fn test_rounding_clamps() {
        assert_eq!(
            Rgb::from_f32_rounded([254.6, -3.0, 300.0]),
            Rgb::new(255, 0, 255)
        );
        assert_eq!(Rgb::from_f32_rounded([10.49, 10.5, 0.0]), Rgb::new(10, 11, 0));
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(1, 2, 3));
    }
}
