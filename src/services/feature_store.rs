//! Versioned feature cache for a palette.
//!
//! The store fetches and quantizes every palette icon once per palette
//! version, persists the result as JSON and reloads it on later runs while
//! the caller's version token matches.

use crate::error::{FetchError, StoreError};
use crate::models::{AppConfig, EntrySource, Palette, PaletteEntry};
use crate::services::{IconFetcher, ProgressReporter};
use emoji_match::{BucketIndex, ClusterIndex, ColorFeature, FeatureSet, GridKey, Quantizer, Rgb};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Schema version of the cache file, independent of the palette version
pub const CACHE_FORMAT: u32 = 1;

/// On-disk cache layout
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    format: u32,
    version: String,
    colors: BTreeMap<String, ColorFeature>,
    clusters: Vec<(GridKey, Vec<String>)>,
    color_buckets: Vec<(GridKey, Vec<(String, Rgb)>)>,
    is_gif_flags: BTreeMap<String, bool>,
}

impl CacheFile {
    fn from_features(version: &str, features: &FeatureSet) -> Self {
        Self {
            format: CACHE_FORMAT,
            version: version.to_string(),
            colors: features.features().clone(),
            clusters: features
                .clusters()
                .iter()
                .map(|(key, names)| (*key, names.clone()))
                .collect(),
            color_buckets: features
                .buckets()
                .iter()
                .map(|(key, members)| (*key, members.clone()))
                .collect(),
            is_gif_flags: features.animated_flags().clone(),
        }
    }

    fn into_features(self) -> FeatureSet {
        FeatureSet::from_parts(
            self.colors,
            BucketIndex::from_entries(self.color_buckets),
            ClusterIndex::from_entries(self.clusters),
            self.is_gif_flags,
        )
    }
}

/// What a cache file on disk holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    pub version: String,
    pub features: usize,
    pub animated: usize,
}

/// Feature store settings
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub cache_path: PathBuf,
    /// Color transparent icon pixels are blended against
    pub background: Rgb,
    /// Maximum icons fetched at once
    pub concurrency: usize,
    /// Report progress every N completed icons
    pub progress_every: usize,
    pub exclude_animated: bool,
}

impl StoreOptions {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        let defaults = AppConfig::default();
        Self {
            cache_path: cache_path.into(),
            background: defaults.background_color(),
            concurrency: defaults.fetch.concurrency,
            progress_every: defaults.progress_every,
            exclude_animated: defaults.exclude_animated,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cache_path: config.cache_file.clone(),
            background: config.background_color(),
            concurrency: config.fetch.concurrency,
            progress_every: config.progress_every,
            exclude_animated: config.exclude_animated,
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn exclude_animated(mut self, enabled: bool) -> Self {
        self.exclude_animated = enabled;
        self
    }
}

/// Owns the in-memory feature set of one palette and its cache file
pub struct FeatureStore {
    options: StoreOptions,
    quantizer: Quantizer,
    features: FeatureSet,
}

impl FeatureStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            quantizer: Quantizer::new(),
            features: FeatureSet::new(),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn cache_path(&self) -> &Path {
        &self.options.cache_path
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Drop all in-memory features and indexes
    pub fn reset(&mut self) {
        self.features.clear();
    }

    /// Enable or disable animated-icon filtering.
    ///
    /// Enabling filters the current set immediately. Disabling takes effect
    /// on the next load, since filtered icons are gone from memory.
    pub fn exclude_animated(&mut self, enabled: bool) {
        self.options.exclude_animated = enabled;
        if enabled {
            self.features.exclude_animated();
        }
    }

    /// Replace the in-memory set with the cache file if it matches `version`.
    ///
    /// Returns `false`, leaving state untouched, when the file is missing,
    /// unreadable, of another format or version, or holds no usable feature.
    pub fn load(&mut self, version: &str) -> bool {
        let Some(cache) = self.read_cache() else {
            return false;
        };
        if cache.format != CACHE_FORMAT {
            tracing::debug!(
                format = cache.format,
                expected = CACHE_FORMAT,
                "Cache format mismatch"
            );
            return false;
        }
        if cache.version != version {
            tracing::debug!(
                cached = %cache.version,
                requested = %version,
                "Cache version mismatch"
            );
            return false;
        }

        let mut features = cache.into_features();
        if self.options.exclude_animated {
            features.exclude_animated();
        }
        if features.is_empty() {
            tracing::debug!("Cache holds no usable features");
            return false;
        }

        tracing::info!(
            features = features.len(),
            path = %self.options.cache_path.display(),
            "Loaded emoji features from cache"
        );
        self.features = features;
        true
    }

    /// Version, feature count and animated count of the cache file, if readable
    pub fn cached_summary(&self) -> Option<CacheSummary> {
        let cache = self.read_cache()?;
        Some(CacheSummary {
            animated: cache.is_gif_flags.values().filter(|&&animated| animated).count(),
            features: cache.colors.len(),
            version: cache.version,
        })
    }

    /// Compute features for every palette entry unless the cache for
    /// `version` can be reused.
    ///
    /// Icons are fetched with at most `concurrency` requests in flight and
    /// quantized on the blocking pool. Failed icons are logged and left out.
    /// `progress` receives coalesced percentages.
    pub async fn build_all(
        &mut self,
        palette: &Palette,
        version: &str,
        fetcher: &dyn IconFetcher,
        progress: impl FnMut(u8),
    ) -> Result<(), StoreError> {
        if self.load(version) {
            return Ok(());
        }

        self.features.clear();
        if palette.is_empty() {
            return Err(StoreError::NoFeatures);
        }

        let limit = self.options.concurrency.max(1);
        let background = self.options.background;
        let quantizer = &self.quantizer;
        tracing::info!(
            entries = palette.len(),
            concurrency = limit,
            version,
            "Computing emoji features"
        );

        let mut features = FeatureSet::new();
        let mut failed = 0usize;
        let mut reporter = ProgressReporter::new(palette.len(), self.options.progress_every, progress);
        let mut results = stream::iter(palette.entries())
            .map(|entry| async move {
                let outcome = compute_feature(fetcher, quantizer, entry, background).await;
                (entry, outcome)
            })
            .buffer_unordered(limit);

        while let Some((entry, outcome)) = results.next().await {
            match outcome {
                Ok(feature) => features.insert(entry.name.clone(), feature, entry.is_animated),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(name = %entry.name, error = %e, "Skipping emoji");
                }
            }
            reporter.record();
        }
        drop(results);
        reporter.finish();

        if features.is_empty() {
            tracing::warn!(failed, "No emoji features computed");
            return Err(StoreError::NoFeatures);
        }

        features.rebuild_indexes();
        tracing::info!(computed = features.len(), failed, "Emoji features computed");
        self.save(version, &features)?;

        // Reload so the animated filter applies exactly as for a cached run
        if !self.load(version) {
            tracing::warn!("Reloading the fresh cache failed, using in-memory features");
            if self.options.exclude_animated {
                features.exclude_animated();
            }
            if features.is_empty() {
                return Err(StoreError::NoFeatures);
            }
            self.features = features;
        }
        Ok(())
    }

    fn read_cache(&self) -> Option<CacheFile> {
        let path = &self.options.cache_path;
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No feature cache");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read feature cache");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt feature cache");
                None
            }
        }
    }

    /// Write the cache through a temporary sibling so readers never see a
    /// partial file
    fn save(&self, version: &str, features: &FeatureSet) -> Result<(), StoreError> {
        let path = &self.options.cache_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(&CacheFile::from_features(version, features))?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::info!(
            path = %path.display(),
            features = features.len(),
            "Saved emoji feature cache"
        );
        Ok(())
    }
}

/// Fetch and quantize one entry; flat colors need neither
async fn compute_feature(
    fetcher: &dyn IconFetcher,
    quantizer: &Quantizer,
    entry: &PaletteEntry,
    background: Rgb,
) -> Result<ColorFeature, FetchError> {
    match &entry.source {
        EntrySource::Color(color) => Ok(ColorFeature::solid(*color)),
        EntrySource::Icon(location) => {
            let image = fetcher.fetch(&entry.name, location).await?;
            let quantizer = quantizer.clone();
            tokio::task::spawn_blocking(move || quantizer.quantize(&image, background))
                .await
                .map_err(|e| FetchError::Task(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves solid icons whose color is encoded in the location ("r,g,b")
    struct SolidFetcher {
        calls: AtomicUsize,
    }

    impl SolidFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IconFetcher for SolidFetcher {
        async fn fetch(&self, _name: &str, location: &str) -> Result<RgbaImage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let channels: Vec<u8> = location
                .trim_end_matches(".gif")
                .split(',')
                .map(|c| c.parse().map_err(|_| FetchError::InvalidSource(location.to_string())))
                .collect::<Result<_, _>>()?;
            let [r, g, b] = channels[..] else {
                return Err(FetchError::InvalidSource(location.to_string()));
            };
            Ok(RgbaImage::from_pixel(16, 16, Rgba([r, g, b, 255])))
        }
    }

    fn store_in(dir: &Path) -> FeatureStore {
        FeatureStore::new(StoreOptions::new(dir.join("cache.json")))
    }

    fn palette() -> Palette {
        Palette::from_sources([
            ("red", "255,0,0"),
            ("blue", "0,0,255"),
            ("party", "250,5,5.gif"),
            ("broken", "not-a-color"),
        ])
    }

    #[tokio::test]
    async fn test_build_skips_failures_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        let fetcher = SolidFetcher::new();

        let mut reports = Vec::new();
        store
            .build_all(&palette(), "v1", &fetcher, |p| reports.push(p))
            .await
            .unwrap();

        assert_eq!(store.features().len(), 3);
        assert!(!store.features().contains("broken"));
        assert!(store.features().is_animated("party"));
        assert_eq!(store.features().dominant("red"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(reports.last(), Some(&100));
        assert!(store.cache_path().exists());
        assert_eq!(
            store.cached_summary(),
            Some(CacheSummary {
                version: "v1".to_string(),
                features: 3,
                animated: 1,
            })
        );
    }

    #[tokio::test]
    async fn test_round_trip_reproduces_features() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store
            .build_all(&palette(), "v1", &SolidFetcher::new(), |_| {})
            .await
            .unwrap();
        let built = store.features().clone();

        let mut reloaded = store_in(dir.path());
        assert!(reloaded.load("v1"));
        assert_eq!(reloaded.features(), &built);
    }

    #[tokio::test]
    async fn test_version_gate() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        assert!(!store.load("v1"));

        store
            .build_all(&palette(), "v1", &SolidFetcher::new(), |_| {})
            .await
            .unwrap();

        let mut other = store_in(dir.path());
        assert!(!other.load("v2"));
        assert!(!other.load(""));
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_matching_version_skips_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store
            .build_all(&palette(), "v1", &SolidFetcher::new(), |_| {})
            .await
            .unwrap();

        let fetcher = SolidFetcher::new();
        let changed = Palette::from_sources([("green", "0,255,0")]);
        let mut again = store_in(dir.path());
        again.build_all(&changed, "v1", &fetcher, |_| {}).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(again.features().contains("red"));
        assert!(!again.features().contains("green"));
    }

    #[tokio::test]
    async fn test_empty_palette_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        let result = store
            .build_all(&Palette::new(), "v1", &SolidFetcher::new(), |_| {})
            .await;
        assert!(matches!(result, Err(StoreError::NoFeatures)));
        assert!(!store.cache_path().exists());
    }

    #[tokio::test]
    async fn test_all_failures_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        let palette = Palette::from_sources([("broken", "nope")]);
        let result = store.build_all(&palette, "v1", &SolidFetcher::new(), |_| {}).await;
        assert!(matches!(result, Err(StoreError::NoFeatures)));
    }

    #[tokio::test]
    async fn test_color_entries_need_no_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        let mut palette = Palette::new();
        palette.insert(PaletteEntry::color("white", Rgb::WHITE));

        let fetcher = SolidFetcher::new();
        store.build_all(&palette, "v1", &fetcher, |_| {}).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.features().dominant("white"), Some(Rgb::WHITE));
    }

    #[tokio::test]
    async fn test_exclude_animated_filters_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FeatureStore::new(
            StoreOptions::new(dir.path().join("cache.json")).exclude_animated(true),
        );
        store
            .build_all(&palette(), "v1", &SolidFetcher::new(), |_| {})
            .await
            .unwrap();

        let features = store.features();
        assert!(!features.contains("party"));
        assert!(!features.buckets().contains_name("party"));
        assert!(!features.clusters().contains_name("party"));
        // The file keeps every icon so the filter can be turned off later
        assert_eq!(store.cached_summary().unwrap().features, 3);

        let mut unfiltered = store_in(dir.path());
        assert!(unfiltered.load("v1"));
        assert!(unfiltered.features().contains("party"));
        unfiltered.exclude_animated(true);
        assert!(!unfiltered.features().contains("party"));
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        std::fs::write(store.cache_path(), "{ not json").unwrap();
        assert!(!store.load("v1"));

        store
            .build_all(&palette(), "v1", &SolidFetcher::new(), |_| {})
            .await
            .unwrap();
        assert!(store.load("v1"));
    }

    #[tokio::test]
    async fn test_reset_clears_features() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store
            .build_all(&palette(), "v1", &SolidFetcher::new(), |_| {})
            .await
            .unwrap();
        store.reset();
        assert!(store.is_empty());
        assert!(store.features().buckets().is_empty());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the cache path makes the rename fail
        let cache_path = dir.path().join("cache.json");
        std::fs::create_dir_all(cache_path.join("occupied")).unwrap();
        let mut store = FeatureStore::new(StoreOptions::new(&cache_path));

        let result = store.build_all(&palette(), "v1", &SolidFetcher::new(), |_| {}).await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(!dir.path().join("cache.json.tmp").exists());
    }

    #[test]
    fn test_cache_file_layout() {
        let mut features = FeatureSet::new();
        features.insert("red", ColorFeature::solid(Rgb::new(255, 0, 0)), true);
        features.rebuild_indexes();

        let json = serde_json::to_value(CacheFile::from_features("v1", &features)).unwrap();
        assert_eq!(json["format"], 1);
        assert_eq!(json["version"], "v1");
        assert_eq!(json["colors"]["red"][0]["color"], serde_json::json!([255, 0, 0]));
        assert_eq!(json["clusters"][0][0], serde_json::json!([15, 0, 0]));
        assert_eq!(json["color_buckets"][0][1][0][0], "red");
        assert_eq!(json["is_gif_flags"]["red"], true);
    }
}
