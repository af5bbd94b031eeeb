//! Error types for the emoji-match crate.

use std::fmt;

/// A color string that is not `rgb` or `rrggbb` hex, with optional `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseColorError {
    /// Number of digits after the `#`, when it is neither 3 nor 6
    Length(usize),
    /// First character that is not a hex digit and its position after the `#`
    Digit { index: usize, found: char },
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseColorError::Length(n) => write!(f, "expected 3 or 6 hex digits, found {n}"),
            ParseColorError::Digit { index, found } => {
                write!(f, "'{found}' at position {index} is not a hex digit")
            }
        }
    }
}

impl std::error::Error for ParseColorError {}

/// Error type for image mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    /// The feature set holds no icons; matching cannot run
    EmptyFeatureSet,
    /// The resampler rejected the source or target buffer
    Resize(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::EmptyFeatureSet => write!(f, "no emoji features available"),
            MatchError::Resize(msg) => write!(f, "resize failed: {}", msg),
        }
    }
}

impl std::error::Error for MatchError {}

/// Error type for resampling mode names.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResamplingError(pub String);

impl fmt::Display for ParseResamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown resampling mode '{}' (expected nearest, box, bilinear, hamming, bicubic or lanczos)",
            self.0
        )
    }
}

impl std::error::Error for ParseResamplingError {}
