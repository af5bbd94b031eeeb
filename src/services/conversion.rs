use crate::error::ConvertError;
use crate::models::Palette;
use crate::services::{FeatureStore, IconFetcher};
use emoji_match::{DisplayGrid, EmojiGrid, ImageMapper, MapperOptions};
use image::{DynamicImage, GrayImage};
use std::time::Instant;

/// Per-run conversion settings
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Width scale in percent of the fitted grid (1..=100)
    pub width_pct: f64,
    /// Height scale in percent of the fitted grid (1..=100)
    pub height_pct: f64,
    pub options: MapperOptions,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            width_pct: 100.0,
            height_pct: 100.0,
            options: MapperOptions::default(),
        }
    }
}

/// Grid of names plus its indexed display form
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub grid: EmojiGrid,
    pub display: DisplayGrid,
}

/// Drives one image conversion: feature store, then mapper
pub struct ConversionPipeline<'a> {
    store: &'a mut FeatureStore,
    fetcher: &'a dyn IconFetcher,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(store: &'a mut FeatureStore, fetcher: &'a dyn IconFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Convert an image onto emoji names.
    ///
    /// Starts from a clean store: features come from the cache for `version`
    /// or are rebuilt from the palette before matching begins.
    pub async fn convert(
        &mut self,
        palette: &Palette,
        version: &str,
        image: &DynamicImage,
        request: &ConversionRequest,
        progress: impl FnMut(u8),
    ) -> Result<ConversionResult, ConvertError> {
        let start = Instant::now();

        self.store.reset();
        self.store
            .build_all(palette, version, self.fetcher, progress)
            .await?;

        let mut mapper = ImageMapper::new(self.store.features(), request.options.clone());
        let grid = mapper.process(image, request.width_pct, request.height_pct)?;
        let display = grid.to_display();
        let distinct = display.mapping.len() - 1;

        tracing::info!(
            width = grid.width(),
            height = grid.height(),
            distinct,
            edge_detection = request.options.edge_detection,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Image converted"
        );

        Ok(ConversionResult { grid, display })
    }
}

/// Edge preview for `image`: white cells are the edges an edge-mode
/// conversion with `request` would refine
pub fn edge_preview(
    image: &DynamicImage,
    request: &ConversionRequest,
) -> Result<GrayImage, ConvertError> {
    let edges = emoji_match::edge_map(
        image,
        &request.options,
        request.width_pct,
        request.height_pct,
    )?;
    tracing::debug!(edges = edges.count(), "Edge preview computed");
    Ok(edges.to_image())
}
