//! Emoji Mosaic
//!
//! Turns images into grids of chat emoji. The color analysis and matching
//! live in the `emoji-match` crate; this crate fetches palette icons,
//! manages the versioned feature cache and drives conversions.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod services;
