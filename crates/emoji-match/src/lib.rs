//! Color feature extraction and emoji matching for image-to-emoji mosaics.
//!
//! The crate has no I/O of its own. Callers decode icons and images, and
//! this crate does the analysis:
//!
//! - [`Quantizer`] reduces an icon bitmap to at most five dominant colors
//!   with the share of visible pixels each one covers ([`ColorFeature`]).
//! - [`FeatureSet`] holds the features of a whole palette together with two
//!   spatial indexes over their dominant colors: [`BucketIndex`] (4-wide
//!   cells, used for matching) and [`ClusterIndex`] (16-wide cells, used for
//!   edge-contrast refinement).
//! - [`ImageMapper`] resizes an image onto a bounded grid and picks an icon
//!   for every cell using [`perceptual_distance`], optionally refining edge
//!   cells for contrast.
//!
//! # Quick start
//!
//! ```
//! use emoji_match::{FeatureSet, ImageMapper, MapperOptions, Quantizer, Rgb};
//! use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
//!
//! let background = Rgb::new(0x22, 0x25, 0x29);
//! let quantizer = Quantizer::new();
//!
//! let mut features = FeatureSet::new();
//! for (name, rgba) in [("fire", [230, 80, 20, 255]), ("ocean", [20, 60, 220, 255])] {
//!     let icon = RgbaImage::from_pixel(16, 16, Rgba(rgba));
//!     features.insert(name, quantizer.quantize(&icon, background), false);
//! }
//! features.rebuild_indexes();
//!
//! let photo = DynamicImage::ImageRgb8(RgbImage::from_fn(8, 4, |x, _| {
//!     if x < 4 { image::Rgb([240, 90, 30]) } else { image::Rgb([10, 50, 200]) }
//! }));
//! let mut mapper = ImageMapper::new(&features, MapperOptions::default());
//! let grid = mapper.process(&photo, 100.0, 100.0).unwrap();
//! assert_eq!(grid.get(0, 0), Some("fire"));
//! assert_eq!(grid.get(7, 3), Some("ocean"));
//!
//! let display = grid.to_display();
//! assert_eq!(display.mapping[":fire:"], 1);
//! ```

pub mod color;
pub mod error;
pub mod features;
pub mod index;
pub mod mapper;
pub mod quantize;

pub use color::{perceptual_distance, LinearRgb, Rgb, LUMINANCE_EMPHASIS};
pub use error::{MatchError, ParseColorError, ParseResamplingError};
pub use features::{ColorFeature, FeatureSet, Swatch};
pub use index::{BucketIndex, ClusterIndex, GridKey};
pub use mapper::{
    edge_map, fit_to_grid, normalize_name, target_dimensions, DisplayGrid, EdgeMap, EmojiGrid,
    ImageMapper, MapperOptions, MapperStage, Resampling, EMPTY_SENTINEL,
};
pub use quantize::Quantizer;
