pub mod conversion;
pub mod feature_store;
pub mod icon_fetcher;
pub mod progress;

pub use conversion::{edge_preview, ConversionPipeline, ConversionRequest, ConversionResult};
pub use feature_store::{CacheSummary, FeatureStore, StoreOptions, CACHE_FORMAT};
pub use icon_fetcher::{decode_icon, HttpIconFetcher, IconFetcher};
pub use progress::ProgressReporter;
