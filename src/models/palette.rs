use crate::error::PaletteError;
use emoji_match::Rgb;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Where a palette entry's pixels come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// Raster icon: http(s) URL, `file://` URL or filesystem path
    Icon(String),
    /// Flat color, no fetch needed
    Color(Rgb),
}

/// One named icon of the palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub name: String,
    pub source: EntrySource,
    pub is_animated: bool,
}

impl PaletteEntry {
    pub fn icon(name: impl Into<String>, location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            name: name.into(),
            is_animated: is_animated_location(&location),
            source: EntrySource::Icon(location),
        }
    }

    pub fn color(name: impl Into<String>, color: Rgb) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::Color(color),
            is_animated: false,
        }
    }
}

/// GIF icons are treated as animated
fn is_animated_location(location: &str) -> bool {
    location.to_ascii_lowercase().ends_with(".gif")
}

/// Palette file value: a location string or `{"color": [r, g, b]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceSpec {
    Location(String),
    Color { color: Rgb },
}

/// Ordered set of uniquely named palette entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a palette of icon entries from a name -> location map
    pub fn from_sources<I, N, L>(sources: I) -> Self
    where
        I: IntoIterator<Item = (N, L)>,
        N: Into<String>,
        L: Into<String>,
    {
        let mut palette = Self::new();
        for (name, location) in sources {
            palette.insert(PaletteEntry::icon(name, location));
        }
        palette
    }

    /// Load a palette from a JSON object mapping names to sources
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PaletteError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let palette = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            entries = palette.len(),
            "Loaded palette"
        );
        Ok(palette)
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let specs: BTreeMap<String, SourceSpec> = serde_json::from_str(content)?;
        let mut palette = Self::new();
        for (name, spec) in specs {
            palette.insert(match spec {
                SourceSpec::Location(location) => PaletteEntry::icon(name, location),
                SourceSpec::Color { color } => PaletteEntry::color(name, color),
            });
        }
        Ok(palette)
    }

    /// Add an entry; an existing entry with the same name is replaced in place
    pub fn insert(&mut self, entry: PaletteEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
