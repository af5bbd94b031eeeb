//! Conversion settings for [`ImageMapper`](super::ImageMapper).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseResamplingError;

/// Default grid bounds.
pub const DEFAULT_MAX_WIDTH: u32 = 35;
pub const DEFAULT_MAX_HEIGHT: u32 = 45;
/// Default gray-level difference that marks an edge.
pub const DEFAULT_EDGE_THRESHOLD: u8 = 20;

/// Resampling filter used to shrink the source image onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    #[default]
    Nearest,
    Box,
    Bilinear,
    Hamming,
    Bicubic,
    Lanczos,
}

impl Resampling {
    pub const ALL: [Resampling; 6] = [
        Resampling::Nearest,
        Resampling::Box,
        Resampling::Bilinear,
        Resampling::Hamming,
        Resampling::Bicubic,
        Resampling::Lanczos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resampling::Nearest => "nearest",
            Resampling::Box => "box",
            Resampling::Bilinear => "bilinear",
            Resampling::Hamming => "hamming",
            Resampling::Bicubic => "bicubic",
            Resampling::Lanczos => "lanczos",
        }
    }
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resampling {
    type Err = ParseResamplingError;

    /// Parse a mode name, ignoring case (`"Lanczos"` and `"lanczos"` both work).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Resampling::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseResamplingError(s.to_string()))
    }
}

/// Settings for one image conversion.
///
/// Out-of-range values are clamped by the setters and again when read by the
/// mapper, so struct-literal construction is safe too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperOptions {
    /// Maximum grid width in cells.
    pub max_width: u32,
    /// Maximum grid height in cells.
    pub max_height: u32,
    /// Filter for the shrink step; ignored when edge detection is on.
    pub resampling: Resampling,
    /// Nearest-neighbor resize, sharpening, context-aware matching and the
    /// contrast refinement pass.
    pub edge_detection: bool,
    /// Gray-level difference (1..=100) above which neighbors form an edge.
    pub edge_threshold: u8,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            resampling: Resampling::default(),
            edge_detection: false,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
        }
    }
}

impl MapperOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width.max(1);
        self.max_height = max_height.max(1);
        self
    }

    pub fn resampling(mut self, resampling: Resampling) -> Self {
        self.resampling = resampling;
        self
    }

    pub fn edge_detection(mut self, enabled: bool) -> Self {
        self.edge_detection = enabled;
        self
    }

    pub fn edge_threshold(mut self, threshold: u8) -> Self {
        self.edge_threshold = clamp_threshold(threshold);
        self
    }

    /// Resampling actually applied: edge detection forces nearest-neighbor.
    pub fn effective_resampling(&self) -> Resampling {
        if self.edge_detection {
            Resampling::Nearest
        } else {
            self.resampling
        }
    }

    pub(crate) fn clamped_threshold(&self) -> u8 {
        clamp_threshold(self.edge_threshold)
    }
}

fn clamp_threshold(threshold: u8) -> u8 {
    threshold.clamp(1, 100)
}
