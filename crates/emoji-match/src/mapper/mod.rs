//! Image-to-emoji mapping.
//!
//! [`ImageMapper`] borrows a [`FeatureSet`] and turns an image into an
//! [`EmojiGrid`] in up to two passes:
//!
//! 1. **Matching.** The image is resized onto the grid and every cell gets the
//!    icon whose dominant color is perceptually closest to the cell's pixel.
//!    Candidates come from the 27 fine buckets around the pixel, falling back
//!    to every icon when that neighborhood is empty.
//! 2. **Edge refinement** (edge detection only). For every edge cell whose
//!    icon is too similar to a non-edge neighbor's icon, a contrast search
//!    over the coarse cluster index picks a replacement that stands out from
//!    the neighbor while staying close to the pixel.
//!
//! Cells are visited in row-major order and refinement writes back into the
//! grid it reads, so a refined cell can influence cells visited after it and
//! a later neighbor of the same cell can overwrite an earlier replacement.
//!
//! # Example
//!
//! ```
//! use emoji_match::{ColorFeature, FeatureSet, ImageMapper, MapperOptions, Rgb};
//! use image::{DynamicImage, RgbImage};
//!
//! let mut features = FeatureSet::new();
//! features.insert("red", ColorFeature::solid(Rgb::new(255, 0, 0)), false);
//! features.insert("blue", ColorFeature::solid(Rgb::new(0, 0, 255)), false);
//! features.rebuild_indexes();
//!
//! let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, image::Rgb([250, 5, 5])));
//! let mut mapper = ImageMapper::new(&features, MapperOptions::default());
//! let grid = mapper.process(&image, 100.0, 100.0).unwrap();
//! assert_eq!(grid.get(0, 0), Some("red"));
//! ```

mod edges;
mod grid;
mod options;
mod resize;

pub use edges::{edge_map, EdgeMap, GRAY_WEIGHTS};
pub use grid::{normalize_name, DisplayGrid, EmojiGrid, EMPTY_SENTINEL};
pub use options::{
    MapperOptions, Resampling, DEFAULT_EDGE_THRESHOLD, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH,
};
pub use resize::{fit_to_grid, resize_rgb, sharpen, target_dimensions};

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use image::{DynamicImage, RgbImage};

use crate::color::{perceptual_distance, Rgb};
use crate::error::MatchError;
use crate::features::FeatureSet;

/// Icons closer than this to a non-edge neighbor's icon get refined.
pub const MIN_EDGE_CONTRAST: f64 = 0.2;
/// Weight of contrast against the neighbor in the refinement score.
pub const CONTRAST_WEIGHT: f64 = 0.6;
/// Weight of similarity to the original pixel in the refinement score.
pub const SIMILARITY_WEIGHT: f64 = 0.4;
/// Primary cluster size below which the 26 surrounding clusters are searched too.
pub const MIN_PRIMARY_CANDIDATES: usize = 5;

/// The 8 neighbors of a cell, row by row.
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Progress of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapperStage {
    #[default]
    Idle,
    Resized,
    FeatureIndexReady,
    FirstPassComplete,
    RefinementComplete,
    Done,
}

/// Match cache key: the pixel plus, in edge mode, a hash of its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MatchKey {
    pixel: Rgb,
    context: Option<u64>,
}

/// Maps images onto icon names using a borrowed feature set.
///
/// The match cache lives as long as the mapper and is cleared by
/// [`reset`](Self::reset) and at the start of every [`process`](Self::process).
pub struct ImageMapper<'a> {
    features: &'a FeatureSet,
    options: MapperOptions,
    match_cache: HashMap<MatchKey, &'a str>,
    stage: MapperStage,
}

impl<'a> ImageMapper<'a> {
    pub fn new(features: &'a FeatureSet, options: MapperOptions) -> Self {
        Self {
            features,
            options,
            match_cache: HashMap::new(),
            stage: MapperStage::Idle,
        }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    pub fn stage(&self) -> MapperStage {
        self.stage
    }

    /// Number of memoized lookups.
    pub fn cached_matches(&self) -> usize {
        self.match_cache.len()
    }

    /// Forget memoized matches and return to [`MapperStage::Idle`].
    pub fn reset(&mut self) {
        self.match_cache.clear();
        self.stage = MapperStage::Idle;
    }

    /// Convert and resize `image` onto the grid, see [`fit_to_grid`].
    pub fn resize(
        &mut self,
        image: &DynamicImage,
        width_pct: f64,
        height_pct: f64,
    ) -> Result<RgbImage, MatchError> {
        let resized = fit_to_grid(image, &self.options, width_pct, height_pct)?;
        self.stage = MapperStage::Resized;
        Ok(resized)
    }

    /// Best icon for `pixel`.
    ///
    /// In edge mode a non-empty `neighbors` list becomes part of the cache key.
    /// Candidates are the icons registered in the 27 buckets around the pixel,
    /// or every icon when those are empty; the perceptually closest wins and
    /// the first candidate wins ties.
    pub fn find_closest(
        &mut self,
        pixel: Rgb,
        neighbors: Option<&[Rgb]>,
    ) -> Result<&'a str, MatchError> {
        let features: &'a FeatureSet = self.features;
        if features.is_empty() {
            return Err(MatchError::EmptyFeatureSet);
        }

        let context = match neighbors {
            Some(neighbors) if self.options.edge_detection && !neighbors.is_empty() => {
                Some(context_hash(neighbors))
            }
            _ => None,
        };
        let key = MatchKey { pixel, context };
        if let Some(&name) = self.match_cache.get(&key) {
            return Ok(name);
        }

        let mut candidates: Vec<(&'a str, Rgb)> = features
            .buckets()
            .near(pixel)
            .into_iter()
            .map(|(name, color)| (name.as_str(), *color))
            .collect();
        if candidates.is_empty() {
            candidates = features.dominant_colors().collect();
        }

        let mut best = None;
        let mut best_distance = f64::INFINITY;
        for (name, color) in candidates {
            let distance = perceptual_distance(pixel, color);
            if distance < best_distance {
                best_distance = distance;
                best = Some(name);
            }
        }

        let best = best.ok_or(MatchError::EmptyFeatureSet)?;
        self.match_cache.insert(key, best);
        Ok(best)
    }

    /// Resize `image` and map it onto icon names.
    ///
    /// Percentages are clamped to 1..=100. Fails with
    /// [`MatchError::EmptyFeatureSet`] when the feature set is empty.
    pub fn process(
        &mut self,
        image: &DynamicImage,
        width_pct: f64,
        height_pct: f64,
    ) -> Result<EmojiGrid, MatchError> {
        self.reset();
        let resized = self.resize(image, width_pct, height_pct)?;
        self.map_pixels(&resized)
    }

    /// Map an image that is already grid-sized, one icon per pixel.
    pub fn map_pixels(&mut self, image: &RgbImage) -> Result<EmojiGrid, MatchError> {
        if self.features.is_empty() {
            return Err(MatchError::EmptyFeatureSet);
        }
        self.stage = MapperStage::FeatureIndexReady;

        let edges = self
            .options
            .edge_detection
            .then(|| EdgeMap::detect(image, self.options.clamped_threshold()));

        let mut grid = self.first_pass(image)?;
        self.stage = MapperStage::FirstPassComplete;

        if let Some(edges) = &edges {
            self.refine(image, edges, &mut grid);
            self.stage = MapperStage::RefinementComplete;
        }

        self.stage = MapperStage::Done;
        Ok(EmojiGrid::new(
            grid.into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect(),
        ))
    }

    fn first_pass(&mut self, image: &RgbImage) -> Result<Vec<Vec<&'a str>>, MatchError> {
        let (width, height) = image.dimensions();
        let mut unique_contexts: HashMap<MatchKey, &'a str> = HashMap::new();
        let mut grid = Vec::with_capacity(height as usize);

        for y in 0..height {
            let mut row = Vec::with_capacity(width as usize);
            for x in 0..width {
                let pixel = Rgb::from(*image.get_pixel(x, y));
                let neighbors = self
                    .options
                    .edge_detection
                    .then(|| neighbor_colors(image, x, y));
                let context = neighbors
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .map(context_hash);
                let key = MatchKey { pixel, context };

                let name = match unique_contexts.get(&key) {
                    Some(&name) => name,
                    None => {
                        let name = self.find_closest(pixel, neighbors.as_deref())?;
                        unique_contexts.insert(key, name);
                        name
                    }
                };
                row.push(name);
            }
            grid.push(row);
        }
        Ok(grid)
    }

    fn refine(&self, image: &RgbImage, edges: &EdgeMap, grid: &mut [Vec<&'a str>]) {
        let (width, height) = image.dimensions();

        for y in 0..height {
            for x in 0..width {
                if !edges.is_edge(x, y) {
                    continue;
                }
                let current = grid[y as usize][x as usize];
                let Some(current_color) = self.features.dominant(current) else {
                    continue;
                };

                for (nx, ny) in neighbor_coords(x, y, width, height) {
                    if edges.is_edge(nx, ny) {
                        continue;
                    }
                    let Some(neighbor_color) = self.features.dominant(grid[ny as usize][nx as usize])
                    else {
                        continue;
                    };
                    if perceptual_distance(current_color, neighbor_color) < MIN_EDGE_CONTRAST {
                        let pixel = Rgb::from(*image.get_pixel(x, y));
                        grid[y as usize][x as usize] =
                            self.find_contrasting(pixel, neighbor_color, current);
                    }
                }
            }
        }
    }

    /// Icon near `target` with the most contrast against `avoid`.
    ///
    /// Returns `current` when no candidate has a dominant color.
    fn find_contrasting(&self, target: Rgb, avoid: Rgb, current: &'a str) -> &'a str {
        let features: &'a FeatureSet = self.features;
        let mut best = current;
        let mut best_score = f64::NEG_INFINITY;

        for name in features.clusters().candidates(target, MIN_PRIMARY_CANDIDATES) {
            let Some(color) = features.dominant(name) else {
                continue;
            };
            let similarity = 1.0 / (1.0 + perceptual_distance(target, color));
            let contrast = perceptual_distance(color, avoid);
            let score = CONTRAST_WEIGHT * contrast + SIMILARITY_WEIGHT * similarity;
            if score > best_score {
                best_score = score;
                best = name;
            }
        }
        best
    }
}

/// In-bounds neighbors of `(x, y)`, row by row.
fn neighbor_coords(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    NEIGHBOR_OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        (nx >= 0 && ny >= 0 && nx < width as i64 && ny < height as i64)
            .then_some((nx as u32, ny as u32))
    })
}

/// Colors of the (up to 8) pixels around `(x, y)`, row by row.
fn neighbor_colors(image: &RgbImage, x: u32, y: u32) -> Vec<Rgb> {
    let (width, height) = image.dimensions();
    neighbor_coords(x, y, width, height)
        .map(|(nx, ny)| Rgb::from(*image.get_pixel(nx, ny)))
        .collect()
}

/// Order-independent hash of a neighborhood.
fn context_hash(neighbors: &[Rgb]) -> u64 {
    let mut sorted = neighbors.to_vec();
    sorted.sort_unstable();
    let mut hasher = DefaultHasher::new();
    sorted.hash(&mut hasher);
    hasher.finish()
}
