//! Dominant color extraction for icon bitmaps.
//!
//! [`Quantizer`] reduces an icon's visible pixels to at most five
//! representative colors with the share of pixels each one covers:
//!
//! 1. Every pixel is blended over a flat background using its alpha.
//!    Pixels at or below [`Quantizer::alpha_epsilon`] are transparent and
//!    ignored. A fully transparent icon becomes the background color.
//! 2. Icons with at most [`Quantizer::min_cluster_pixels`] visible pixels are
//!    summarized by their mean color.
//! 3. Everything else runs seeded k-means with k-means++ initialization.
//!    Numerical trouble falls back to the mean color.
//!
//! Each call creates its own RNG from [`Quantizer::seed`], so identical
//! pixels always produce identical features.

use image::RgbaImage;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;
use crate::features::{ColorFeature, Swatch};

/// Seed shared by every quantization run.
pub const DEFAULT_SEED: u64 = 0;

type Pixel = [f32; 3];

/// k-means could not produce finite centroids.
#[derive(Debug)]
struct Degenerate;

/// Seeded k-means color quantizer.
#[derive(Debug, Clone)]
pub struct Quantizer {
    /// RNG seed for k-means++ sampling and empty-cluster reseeding.
    ///
    /// Default: `0`
    pub seed: u64,
    /// Upper bound on the number of clusters (`k = min(max_colors, n / 10)`).
    ///
    /// Default: `5`
    pub max_colors: usize,
    /// Iteration cap for Lloyd's algorithm.
    ///
    /// Default: `20`
    pub max_iterations: usize,
    /// Stop once total centroid movement (Frobenius norm) drops below this.
    ///
    /// Default: `1e-4`
    pub tolerance: f32,
    /// Pixels with alpha (0.0..=1.0) at or below this are transparent.
    ///
    /// Default: `0.001`
    pub alpha_epsilon: f32,
    /// Icons with this many visible pixels or fewer skip clustering.
    ///
    /// Default: `100`
    pub min_cluster_pixels: usize,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_colors: 5,
            max_iterations: 20,
            tolerance: 1e-4,
            alpha_epsilon: 0.001,
            min_cluster_pixels: 100,
        }
    }
}

impl Quantizer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn max_colors(mut self, max_colors: usize) -> Self {
        self.max_colors = max_colors.max(1);
        self
    }

    /// Compute the color feature of an icon composited over `background`.
    pub fn quantize(&self, image: &RgbaImage, background: Rgb) -> ColorFeature {
        let pixels = self.visible_pixels(image, background);

        if pixels.is_empty() {
            return ColorFeature::solid(background);
        }
        if pixels.len() <= self.min_cluster_pixels {
            return ColorFeature::solid(mean_color(&pixels));
        }

        let k = self.max_colors.min(pixels.len() / 10).max(1);
        self.kmeans(&pixels, k)
            .unwrap_or_else(|_| ColorFeature::solid(mean_color(&pixels)))
    }

    /// Alpha-composite every pixel over the background, keeping visible ones.
    fn visible_pixels(&self, image: &RgbaImage, background: Rgb) -> Vec<Pixel> {
        let bg = [
            background.r as f32,
            background.g as f32,
            background.b as f32,
        ];
        image
            .pixels()
            .filter_map(|p| {
                let [r, g, b, a] = p.0;
                let alpha = a as f32 / 255.0;
                (alpha > self.alpha_epsilon).then(|| {
                    let blend = |c: u8, bg: f32| c as f32 * alpha + bg * (1.0 - alpha);
                    [blend(r, bg[0]), blend(g, bg[1]), blend(b, bg[2])]
                })
            })
            .collect()
    }

    fn kmeans(&self, pixels: &[Pixel], k: usize) -> Result<ColorFeature, Degenerate> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = seed_centroids(pixels, k, &mut rng)?;
        let mut labels = vec![0usize; pixels.len()];

        for _ in 0..self.max_iterations {
            assign(pixels, &centroids, &mut labels);

            let mut sums = vec![[0f64; 3]; k];
            let mut counts = vec![0usize; k];
            for (pixel, &label) in pixels.iter().zip(&labels) {
                for c in 0..3 {
                    sums[label][c] += pixel[c] as f64;
                }
                counts[label] += 1;
            }

            let updated: Vec<Pixel> = (0..k)
                .map(|i| {
                    if counts[i] > 0 {
                        let n = counts[i] as f64;
                        [
                            (sums[i][0] / n) as f32,
                            (sums[i][1] / n) as f32,
                            (sums[i][2] / n) as f32,
                        ]
                    } else {
                        pixels[rng.gen_range(0..pixels.len())]
                    }
                })
                .collect();

            let shift = centroids
                .iter()
                .zip(&updated)
                .map(|(a, b)| squared_distance(a, b))
                .sum::<f32>()
                .sqrt();
            centroids = updated;

            if !shift.is_finite() {
                return Err(Degenerate);
            }
            if shift < self.tolerance {
                break;
            }
        }

        let mut counts = vec![0usize; k];
        for &label in &labels {
            counts[label] += 1;
        }

        let total = pixels.len() as f64;
        let swatches = centroids
            .iter()
            .zip(&counts)
            .filter(|(_, &count)| count > 0)
            .map(|(centroid, &count)| {
                if centroid.iter().all(|c| c.is_finite()) {
                    Ok(Swatch::new(Rgb::from_f32_rounded(*centroid), count as f64 / total))
                } else {
                    Err(Degenerate)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ColorFeature::new(swatches))
    }
}

/// k-means++ seeding: first center uniform, the rest weighted by squared
/// distance to the nearest chosen center.
fn seed_centroids(pixels: &[Pixel], k: usize, rng: &mut StdRng) -> Result<Vec<Pixel>, Degenerate> {
    let n = pixels.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(pixels[rng.gen_range(0..n)]);

    let mut nearest: Vec<f32> = pixels
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let next = match WeightedIndex::new(&nearest) {
            Ok(dist) => dist.sample(rng),
            // Every pixel coincides with a chosen center
            Err(WeightedError::AllWeightsZero) => rng.gen_range(0..n),
            Err(_) => return Err(Degenerate),
        };
        let center = pixels[next];
        for (d, p) in nearest.iter_mut().zip(pixels) {
            *d = d.min(squared_distance(p, &center));
        }
        centroids.push(center);
    }

    Ok(centroids)
}

/// Label each pixel with its nearest centroid (first wins ties).
fn assign(pixels: &[Pixel], centroids: &[Pixel], labels: &mut [usize]) {
    for (pixel, label) in pixels.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, centroid) in centroids.iter().enumerate() {
            let d = squared_distance(pixel, centroid);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        *label = best;
    }
}

#[inline]
fn squared_distance(a: &Pixel, b: &Pixel) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

fn mean_color(pixels: &[Pixel]) -> Rgb {
    let mut sum = [0f64; 3];
    for p in pixels {
        for c in 0..3 {
            sum[c] += p[c] as f64;
        }
    }
    let n = pixels.len() as f64;
    Rgb::from_f32_rounded([
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BG: Rgb = Rgb::new(0x22, 0x25, 0x29);

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    /// Left half red, right half blue.
    fn split(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    /// Deterministic noisy image with several color regions.
    fn noisy(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = (x * 31 + y * 17) % 64;
            match (x / 8 + y / 8) % 3 {
                0 => Rgba([200 + (v as u8 % 50), v as u8, 10, 255]),
                1 => Rgba([10, 150 + v as u8, 40, 255]),
                _ => Rgba([v as u8, 20, 180 + v as u8, 200]),
            }
        })
    }

    #[test]
    fn test_fully_transparent_uses_background() {
        let feature = Quantizer::new().quantize(&solid(32, 32, [255, 0, 0, 0]), BG);
        assert_eq!(feature, ColorFeature::solid(BG));
    }

    #[test]
    fn test_small_icon_uses_mean_color() {
        // 5x5 = 25 visible pixels, below the clustering minimum
        let image = RgbaImage::from_fn(5, 5, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([100, 100, 100, 255])
            }
        });
        let feature = Quantizer::new().quantize(&image, BG);
        assert_eq!(feature.swatches().len(), 1);
        assert_eq!(feature.dominant(), Some(Rgb::new(80, 80, 80)));
        assert_eq!(feature.total_proportion(), 1.0);
    }

    #[test]
    fn test_alpha_blends_over_background() {
        let image = solid(4, 4, [255, 255, 255, 51]); // alpha 0.2
        let feature = Quantizer::new().quantize(&image, Rgb::BLACK);
        assert_eq!(feature.dominant(), Some(Rgb::new(51, 51, 51)));
    }

    #[test]
    fn test_solid_icon_collapses_to_one_swatch() {
        let feature = Quantizer::new().quantize(&solid(16, 16, [10, 200, 30, 255]), BG);
        assert_eq!(feature, ColorFeature::solid(Rgb::new(10, 200, 30)));
    }

    #[test]
    fn test_two_color_icon_splits_evenly() {
        let feature = Quantizer::new().quantize(&split(20, 20), BG);
        let colors: Vec<Rgb> = feature.swatches().iter().map(|s| s.color).collect();
        assert!(colors.contains(&Rgb::new(255, 0, 0)));
        assert!(colors.contains(&Rgb::new(0, 0, 255)));
        assert_eq!(feature.swatches().len(), 2);
        for swatch in feature.swatches() {
            assert!((swatch.proportion - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_proportions_sum_to_one_and_descend() {
        let feature = Quantizer::new().quantize(&noisy(40, 40), BG);
        assert!(!feature.is_empty());
        assert!(feature.swatches().len() <= 5);
        let total = feature.total_proportion();
        assert!((total - 1.0).abs() < 1e-6, "total {total}");
        for pair in feature.swatches().windows(2) {
            assert!(pair[0].proportion >= pair[1].proportion);
        }
        for swatch in feature.swatches() {
            assert!(swatch.proportion > 0.0 && swatch.proportion <= 1.0);
        }
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let image = noisy(48, 48);
        let quantizer = Quantizer::new();
        let first = quantizer.quantize(&image, BG);
        for _ in 0..3 {
            assert_eq!(quantizer.quantize(&image, BG), first);
        }
    }

    #[test]
    fn test_max_colors_caps_swatches() {
        let feature = Quantizer::new().max_colors(2).quantize(&noisy(40, 40), BG);
        assert!(feature.swatches().len() <= 2);
    }
}
