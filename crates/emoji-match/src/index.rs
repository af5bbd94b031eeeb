//! Fixed-radius spatial grids over dominant colors.
//!
//! Both indexes bucket icons by their dominant color quantized per channel:
//!
//! | Index | Cell width | Used by |
//! |-------|-----------|---------|
//! | [`BucketIndex`] | 4 | closest-icon lookup (3×3×3 neighborhood) |
//! | [`ClusterIndex`] | 16 | edge-contrast refinement fallback |
//!
//! Neighborhood walks use the precomputed offset tables [`NEIGHBORHOOD`]
//! and [`SHELL`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Cell width of the fine bucket grid.
pub const BUCKET_CELL: u8 = 4;

/// Cell width of the coarse cluster grid.
pub const CLUSTER_CELL: u8 = 16;

const fn cube_offsets() -> [[i16; 3]; 27] {
    let mut out = [[0i16; 3]; 27];
    let mut i = 0;
    while i < 27 {
        out[i] = [(i / 9) as i16 - 1, ((i / 3) % 3) as i16 - 1, (i % 3) as i16 - 1];
        i += 1;
    }
    out
}

const fn shell_offsets() -> [[i16; 3]; 26] {
    let cube = cube_offsets();
    let mut out = [[0i16; 3]; 26];
    let mut i = 0;
    let mut j = 0;
    while i < 27 {
        if !(cube[i][0] == 0 && cube[i][1] == 0 && cube[i][2] == 0) {
            out[j] = cube[i];
            j += 1;
        }
        i += 1;
    }
    out
}

/// All 27 offsets of the 3×3×3 cube around a cell, red-major.
pub const NEIGHBORHOOD: [[i16; 3]; 27] = cube_offsets();

/// The 26 offsets of [`NEIGHBORHOOD`] without the center cell.
pub const SHELL: [[i16; 3]; 26] = shell_offsets();

/// Quantized color coordinate of a grid cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridKey(pub [u8; 3]);

impl GridKey {
    /// Cell containing `color` on a grid of the given cell width.
    #[inline]
    pub fn quantize(color: Rgb, cell: u8) -> Self {
        Self([color.r / cell, color.g / cell, color.b / cell])
    }

    /// Neighbor cell, with each channel clamped at zero.
    #[inline]
    pub fn offset_clamped(self, delta: [i16; 3]) -> Self {
        let shift = |v: u8, d: i16| (v as i16 + d).clamp(0, u8::MAX as i16) as u8;
        Self([
            shift(self.0[0], delta[0]),
            shift(self.0[1], delta[1]),
            shift(self.0[2], delta[2]),
        ])
    }

    /// Neighbor cell, or `None` when it falls off the grid.
    #[inline]
    pub fn offset(self, delta: [i16; 3]) -> Option<Self> {
        let shift = |v: u8, d: i16| u8::try_from(v as i16 + d).ok();
        Some(Self([
            shift(self.0[0], delta[0])?,
            shift(self.0[1], delta[1])?,
            shift(self.0[2], delta[2])?,
        ]))
    }
}

/// Index members expose the icon name they refer to.
pub trait Member {
    fn name(&self) -> &str;
}

impl Member for String {
    fn name(&self) -> &str {
        self
    }
}

impl Member for (String, Rgb) {
    fn name(&self) -> &str {
        &self.0
    }
}

/// Map from grid cell to the icons whose dominant color falls in it.
///
/// `CELL` is the per-channel cell width. Cells are never stored empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGrid<T, const CELL: u8> {
    cells: BTreeMap<GridKey, Vec<T>>,
}

/// Fine index: cell width 4, members carry their dominant color.
pub type BucketIndex = ColorGrid<(String, Rgb), BUCKET_CELL>;

/// Coarse index: cell width 16, members are names only.
pub type ClusterIndex = ColorGrid<String, CLUSTER_CELL>;

impl<T, const CELL: u8> Default for ColorGrid<T, CELL> {
    fn default() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }
}

impl<T: Member, const CELL: u8> ColorGrid<T, CELL> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted `(cell, members)` pairs, dropping empty cells.
    pub fn from_entries(entries: impl IntoIterator<Item = (GridKey, Vec<T>)>) -> Self {
        let mut grid = Self::new();
        for (key, members) in entries {
            if !members.is_empty() {
                grid.cells.entry(key).or_default().extend(members);
            }
        }
        grid
    }

    /// Cell a color falls into on this grid.
    #[inline]
    pub fn key_for(color: Rgb) -> GridKey {
        GridKey::quantize(color, CELL)
    }

    pub fn get(&self, key: GridKey) -> &[T] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GridKey, &Vec<T>)> {
        self.cells.iter()
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total number of members across all cells.
    pub fn member_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.cells
            .values()
            .any(|members| members.iter().any(|m| m.name() == name))
    }

    /// Keep only members whose name passes `keep`; cells left empty are removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.cells.retain(|_, members| {
            members.retain(|m| keep(m.name()));
            !members.is_empty()
        });
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    fn push(&mut self, dominant: Rgb, member: T) {
        self.cells
            .entry(Self::key_for(dominant))
            .or_default()
            .push(member);
    }
}

impl BucketIndex {
    pub fn insert(&mut self, name: &str, dominant: Rgb) {
        self.push(dominant, (name.to_string(), dominant));
    }

    /// Members of the 27 cells around `color`'s cell (channels clamped at 0),
    /// in neighborhood order.
    pub fn near(&self, color: Rgb) -> Vec<&(String, Rgb)> {
        let center = Self::key_for(color);
        NEIGHBORHOOD
            .iter()
            .flat_map(|&delta| self.get(center.offset_clamped(delta)))
            .collect()
    }
}

impl ClusterIndex {
    pub fn insert(&mut self, name: &str, dominant: Rgb) {
        self.push(dominant, name.to_string());
    }

    /// Members of `color`'s cell, extended with the 26 surrounding cells
    /// when the center holds fewer than `min_primary` members.
    pub fn candidates(&self, color: Rgb, min_primary: usize) -> Vec<&str> {
        let center = Self::key_for(color);
        let mut found: Vec<&str> = self.get(center).iter().map(String::as_str).collect();
        if found.len() < min_primary {
            for delta in SHELL {
                if let Some(key) = center.offset(delta) {
                    found.extend(self.get(key).iter().map(String::as_str));
                }
            }
        }
        found
    }
}
