use emoji_match::{MapperOptions, Resampling, Rgb};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Slack dark-mode message background, used to composite transparent icons
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0x22, 0x25, 0x29);

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Where the feature cache is persisted
    pub cache_file: PathBuf,

    /// Background color (hex) that icon transparency is blended against
    pub background: String,

    /// Icon download settings
    pub fetch: FetchConfig,

    /// Report build progress every N completed icons
    pub progress_every: usize,

    /// Drop animated (GIF) icons from the feature set
    pub exclude_animated: bool,

    /// Image conversion defaults
    pub conversion: ConversionConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum simultaneous icon downloads
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConversionConfig {
    pub max_width: u32,
    pub max_height: u32,

    /// Resampling mode name (case-insensitive)
    pub resampling: String,

    pub edge_detection: bool,
    pub edge_threshold: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from("emoji_feature_cache.json"),
            background: DEFAULT_BACKGROUND.to_string(),
            fetch: FetchConfig::default(),
            progress_every: 10,
            exclude_animated: false,
            conversion: ConversionConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 10,
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        let defaults = MapperOptions::default();
        Self {
            max_width: defaults.max_width,
            max_height: defaults.max_height,
            resampling: defaults.resampling.to_string(),
            edge_detection: defaults.edge_detection,
            edge_threshold: defaults.edge_threshold,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        cache_file = %config.cache_file.display(),
                        concurrency = config.fetch.concurrency,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Parsed background color; an invalid value falls back to the default
    pub fn background_color(&self) -> Rgb {
        self.background.parse().unwrap_or_else(|e| {
            tracing::warn!(%e, background = %self.background, "Invalid background color, using default");
            DEFAULT_BACKGROUND
        })
    }
}

impl ConversionConfig {
    /// Parsed resampling mode; an unknown name falls back to nearest
    pub fn resampling_mode(&self) -> Resampling {
        self.resampling.parse().unwrap_or_else(|e| {
            tracing::warn!(%e, "Unknown resampling mode, using nearest");
            Resampling::default()
        })
    }

    pub fn mapper_options(&self) -> MapperOptions {
        MapperOptions::new()
            .max_size(self.max_width, self.max_height)
            .resampling(self.resampling_mode())
            .edge_detection(self.edge_detection)
            .edge_threshold(self.edge_threshold)
    }
}
