//! Test fixtures and constants.

use async_trait::async_trait;
use emoji_match::Rgb;
use emoji_mosaic::error::FetchError;
use emoji_mosaic::models::Palette;
use emoji_mosaic::services::{IconFetcher, StoreOptions};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Solid icon colors used across scenarios
pub mod colors {
    use emoji_match::Rgb;

    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const FOREST: Rgb = Rgb::new(0, 150, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
}

/// Icon edge length; large enough to go through k-means
pub const ICON_SIZE: u32 = 16;

pub fn solid_icon(color: Rgb) -> RgbaImage {
    RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, Rgba([color.r, color.g, color.b, 255]))
}

/// PNG encoding of a solid opaque icon
pub fn solid_png(color: Rgb) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(solid_icon(color))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Build an image from rows of pixels
pub fn pixel_image(rows: &[&[Rgb]]) -> DynamicImage {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |row| row.len()) as u32;
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        let color = rows[y as usize][x as usize];
        image::Rgb([color.r, color.g, color.b])
    });
    DynamicImage::ImageRgb8(image)
}

/// Store options writing the cache into `dir`
pub fn store_options(dir: &Path) -> StoreOptions {
    StoreOptions::new(dir.join("features.json")).concurrency(4)
}

/// Palette with `stub:<name>` locations served by [`StubFetcher`]
pub fn stub_palette(names: &[&str]) -> Palette {
    Palette::from_sources(names.iter().map(|name| (*name, format!("stub:{name}"))))
}

/// In-process fetcher serving solid icons by location.
///
/// Tracks how many fetches run at once; `with_delay` keeps each one in
/// flight long enough for overlap to show.
#[derive(Default)]
pub struct StubFetcher {
    icons: HashMap<String, Rgb>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `color` for `stub:<name>`
    pub fn with_icon(mut self, name: &str, color: Rgb) -> Self {
        self.icons.insert(format!("stub:{name}"), color);
        self
    }

    /// Hold every fetch for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most fetches ever in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IconFetcher for StubFetcher {
    async fn fetch(&self, _name: &str, location: &str) -> Result<RgbaImage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.icons.get(location) {
            Some(color) => Ok(solid_icon(*color)),
            None => Err(FetchError::Status(404)),
        }
    }
}
