pub mod config;
pub mod palette;

pub use config::{AppConfig, ConversionConfig, FetchConfig, DEFAULT_BACKGROUND};
pub use palette::{EntrySource, Palette, PaletteEntry};
