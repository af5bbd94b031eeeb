use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emoji_mosaic::models::{AppConfig, Palette};
use emoji_mosaic::services::{
    edge_preview, ConversionPipeline, ConversionRequest, FeatureStore, HttpIconFetcher,
    StoreOptions,
};

#[derive(Parser)]
#[command(name = "emoji-mosaic")]
#[command(about = "Emoji Mosaic - turn images into grids of chat emoji")]
struct Cli {
    /// Config file (YAML). Falls back to $CONFIG_FILE, then built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute (or reuse) the emoji feature cache for a palette
    Build {
        /// Palette JSON file mapping emoji names to icon URLs or paths
        #[arg(short, long)]
        palette: PathBuf,

        /// Palette version token (default: palette file modification time)
        #[arg(long)]
        palette_version: Option<String>,

        /// Leave animated (GIF) emoji out of the feature set
        #[arg(long)]
        exclude_animated: bool,
    },
    /// Convert an image into a grid of emoji
    Convert {
        /// Palette JSON file mapping emoji names to icon URLs or paths
        #[arg(short, long)]
        palette: PathBuf,

        /// Palette version token (default: palette file modification time)
        #[arg(long)]
        palette_version: Option<String>,

        /// Image to convert
        #[arg(short, long)]
        image: PathBuf,

        /// Grid width in percent of the fitted size (1-100)
        #[arg(long, default_value_t = 100.0)]
        width_pct: f64,

        /// Grid height in percent of the fitted size (1-100)
        #[arg(long, default_value_t = 100.0)]
        height_pct: f64,

        /// Resampling: nearest, box, bilinear, hamming, bicubic or lanczos
        #[arg(long)]
        resampling: Option<String>,

        /// Pixel-art mode: sharpen, context matching and edge contrast pass
        #[arg(long)]
        edge_detection: bool,

        /// Edge detection threshold (1-100)
        #[arg(long)]
        edge_threshold: Option<u8>,

        /// Leave animated (GIF) emoji out of the feature set
        #[arg(long)]
        exclude_animated: bool,

        /// Write the display grid and name mapping as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a PNG preview of the detected edges, one pixel per cell
        #[arg(long)]
        edges_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var("CONFIG_FILE").ok().map(PathBuf::from));

    match cli.command {
        Some(Commands::Build {
            palette,
            palette_version,
            exclude_animated,
        }) => {
            init_logging();
            let config = AppConfig::load(config_path.as_deref());
            run_build_command(&config, &palette, palette_version, exclude_animated).await
        }
        Some(Commands::Convert {
            palette,
            palette_version,
            image,
            width_pct,
            height_pct,
            resampling,
            edge_detection,
            edge_threshold,
            exclude_animated,
            output,
            edges_out,
        }) => {
            init_logging();
            let mut config = AppConfig::load(config_path.as_deref());
            if let Some(resampling) = resampling {
                config.conversion.resampling = resampling;
            }
            if let Some(threshold) = edge_threshold {
                config.conversion.edge_threshold = threshold;
            }
            config.conversion.edge_detection |= edge_detection;
            config.exclude_animated |= exclude_animated;

            let request = ConversionRequest {
                width_pct,
                height_pct,
                options: config.conversion.mapper_options(),
            };
            run_convert_command(
                &config,
                &palette,
                palette_version,
                &image,
                &request,
                output.as_deref(),
                edges_out.as_deref(),
            )
            .await
        }
        None => {
            run_status_command(config_path.as_deref());
            Ok(())
        }
    }
}

/// Logs go to stderr so grid output on stdout stays clean
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emoji_mosaic=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Explicit token, or the palette file's modification time
fn palette_version(palette: &Path, explicit: Option<String>) -> anyhow::Result<String> {
    if let Some(version) = explicit {
        return Ok(version);
    }
    let modified = std::fs::metadata(palette)
        .and_then(|m| m.modified())
        .with_context(|| format!("Cannot read modification time of {}", palette.display()))?;
    Ok(chrono::DateTime::<chrono::Utc>::from(modified).to_rfc3339())
}

fn log_progress(percent: u8) {
    tracing::info!(percent, "Computing emoji features");
}

async fn run_build_command(
    config: &AppConfig,
    palette_path: &Path,
    explicit_version: Option<String>,
    exclude_animated: bool,
) -> anyhow::Result<()> {
    let palette = Palette::load_json(palette_path)?;
    let version = palette_version(palette_path, explicit_version)?;
    let fetcher = HttpIconFetcher::from_config(&config.fetch)?;

    let options =
        StoreOptions::from_config(config).exclude_animated(config.exclude_animated || exclude_animated);
    let mut store = FeatureStore::new(options);
    store
        .build_all(&palette, &version, &fetcher, log_progress)
        .await?;

    println!(
        "{} emoji features ready (version {}, cache {})",
        store.features().len(),
        version,
        store.cache_path().display()
    );
    Ok(())
}

async fn run_convert_command(
    config: &AppConfig,
    palette_path: &Path,
    explicit_version: Option<String>,
    image_path: &Path,
    request: &ConversionRequest,
    output: Option<&Path>,
    edges_out: Option<&Path>,
) -> anyhow::Result<()> {
    let palette = Palette::load_json(palette_path)?;
    let version = palette_version(palette_path, explicit_version)?;
    let fetcher = HttpIconFetcher::from_config(&config.fetch)?;
    let image = image::open(image_path)
        .with_context(|| format!("Failed to open {}", image_path.display()))?;

    if let Some(path) = edges_out {
        edge_preview(&image, request)?
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote edge preview");
    }

    let mut store = FeatureStore::new(StoreOptions::from_config(config));
    let mut pipeline = ConversionPipeline::new(&mut store, &fetcher);
    let result = pipeline
        .convert(&palette, &version, &image, request, log_progress)
        .await?;

    print!("{}", result.grid);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result.display)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote display grid");
    }
    Ok(())
}

fn run_status_command(config_path: Option<&Path>) {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("Emoji Mosaic v{VERSION}");
    println!("Turn images into grids of chat emoji\n");

    let config_source = match config_path {
        Some(path) if path.exists() => path.display().to_string(),
        Some(_) => "defaults (file not found)".to_string(),
        None => "defaults".to_string(),
    };
    let config = AppConfig::load(config_path);

    println!("Configuration:");
    println!("  Config:      {config_source}");
    println!("  Cache file:  {}", config.cache_file.display());
    println!("  Background:  {}", config.background_color());
    println!(
        "  Fetching:    {} concurrent, {}s timeout",
        config.fetch.concurrency, config.fetch.timeout_secs
    );
    println!(
        "  Grid:        {}x{} max, {} resampling",
        config.conversion.max_width,
        config.conversion.max_height,
        config.conversion.resampling_mode()
    );

    println!("\nFeature Cache:");
    let store = FeatureStore::new(StoreOptions::from_config(&config));
    match store.cached_summary() {
        Some(summary) => {
            println!("  Version:     {}", summary.version);
            println!(
                "  Features:    {} ({} animated)",
                summary.features, summary.animated
            );
        }
        None => println!("  (no cache yet, run `emoji-mosaic build --palette <file>`)"),
    }

    println!("\nCommands:");
    println!("  emoji-mosaic build --palette <file>                  Build the feature cache");
    println!("  emoji-mosaic convert --palette <file> --image <img>  Convert an image");
}
