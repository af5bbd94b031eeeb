use emoji_match::MatchError;
use thiserror::Error;

/// Failure to acquire one icon. Never fatal for a build: the icon is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid icon source: {0}")]
    InvalidSource(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// The blocking quantization task panicked or was cancelled
    #[error("Quantization task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No features computed")]
    NoFeatures,

    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Failed to read palette: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse palette: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Feature store error: {0}")]
    Store(#[from] StoreError),

    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
