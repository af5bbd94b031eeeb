use crate::error::FetchError;
use crate::models::FetchConfig;
use async_trait::async_trait;
use image::RgbaImage;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on the TCP connect phase, independent of the total timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of decoded icon bitmaps
#[async_trait]
pub trait IconFetcher: Send + Sync {
    /// Fetch and decode one icon. No retries: a failure is final for this run.
    async fn fetch(&self, name: &str, location: &str) -> Result<RgbaImage, FetchError>;
}

/// Where an icon location points
#[derive(Debug, PartialEq, Eq)]
enum IconLocation {
    Http(Url),
    File(PathBuf),
}

/// Locations containing `://` must be valid http(s) or file URLs; anything
/// else is a local path
fn parse_location(location: &str) -> Result<IconLocation, FetchError> {
    let invalid = || FetchError::InvalidSource(location.to_string());
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }
    if !trimmed.contains("://") {
        return Ok(IconLocation::File(PathBuf::from(trimmed)));
    }

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|host| !host.is_empty()) => {
            Ok(IconLocation::Http(url))
        }
        "file" => url.to_file_path().map(IconLocation::File).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Decode icon bytes (first frame for animations) into RGBA
pub fn decode_icon(bytes: &[u8]) -> Result<RgbaImage, FetchError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Fetches icons over HTTP(S) or from the local filesystem
pub struct HttpIconFetcher {
    client: reqwest::Client,
}

impl HttpIconFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .user_agent(concat!("emoji-mosaic/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::new(Duration::from_secs(config.timeout_secs.max(1)))
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl IconFetcher for HttpIconFetcher {
    async fn fetch(&self, name: &str, location: &str) -> Result<RgbaImage, FetchError> {
        let bytes = match parse_location(location)? {
            IconLocation::Http(url) => self.download(url).await?,
            IconLocation::File(path) => tokio::fs::read(&path).await?,
        };
        let image = decode_icon(&bytes)?;
        tracing::trace!(
            name,
            width = image.width(),
            height = image.height(),
            "Fetched icon"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(4, 4, Rgba(color));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_parse_location() {
        assert_eq!(
            parse_location("https://emoji.example/a.png").unwrap(),
            IconLocation::Http(Url::parse("https://emoji.example/a.png").unwrap())
        );
        assert_eq!(
            parse_location("file:///tmp/a.png").unwrap(),
            IconLocation::File(PathBuf::from("/tmp/a.png"))
        );
        assert_eq!(
            parse_location("icons/a.png").unwrap(),
            IconLocation::File(PathBuf::from("icons/a.png"))
        );
    }

    #[test]
    fn test_parse_location_rejects_invalid() {
        for location in [
            "",
            "   ",
            "ftp://emoji.example/a.png",
            "https://",
            "https://exa mple/x.png",
            "file://remote-host/a.png",
        ] {
            assert!(
                matches!(parse_location(location), Err(FetchError::InvalidSource(_))),
                "{location:?}"
            );
        }
    }

    #[test]
    fn test_decode_icon() {
        let image = decode_icon(&png_bytes([1, 2, 3, 255])).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(image.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));

        assert!(matches!(
            decode_icon(b"definitely not an image"),
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        std::fs::write(&path, png_bytes([255, 0, 0, 255])).unwrap();

        let fetcher = HttpIconFetcher::new(Duration::from_secs(2)).unwrap();
        let image = fetcher.fetch("red", path.to_str().unwrap()).await.unwrap();
        assert_eq!(image.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));

        let url = format!("file://{}", path.display());
        assert!(fetcher.fetch("red", &url).await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_url_is_not_requested() {
        let fetcher = HttpIconFetcher::new(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("bad", "https://exa mple/x.png").await;
        assert!(matches!(result, Err(FetchError::InvalidSource(_))));
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let fetcher = HttpIconFetcher::new(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("gone", "/nonexistent/gone.png").await;
        assert!(matches!(result, Err(FetchError::Io(_))));
    }
}
