//! Mapping output: the grid of chosen names and its indexed display form.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Display name reserved for index 0, the empty cell.
pub const EMPTY_SENTINEL: &str = ":_:";

/// Rows of chosen icon names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct EmojiGrid {
    rows: Vec<Vec<String>>,
}

impl EmojiGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&str> {
        self.rows.get(y)?.get(x).map(String::as_str)
    }

    /// Convert to integer indices.
    ///
    /// Index 0 is [`EMPTY_SENTINEL`]; every other normalized name gets the
    /// next free index the first time it is seen in row-major order.
    pub fn to_display(&self) -> DisplayGrid {
        let mut mapping = BTreeMap::new();
        mapping.insert(EMPTY_SENTINEL.to_string(), 0u32);

        let mut cells = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut indices = Vec::with_capacity(row.len());
            for name in row {
                let next = mapping.len() as u32;
                indices.push(*mapping.entry(normalize_name(name)).or_insert(next));
            }
            cells.push(indices);
        }

        DisplayGrid { cells, mapping }
    }
}

impl fmt::Display for EmojiGrid {
    /// One line per row of `:name:` tokens.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|name| normalize_name(name)).collect();
            writeln!(f, "{}", line.join(""))?;
        }
        Ok(())
    }
}

/// Index grid plus the name-to-index table that decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayGrid {
    #[serde(rename = "grid")]
    pub cells: Vec<Vec<u32>>,
    pub mapping: BTreeMap<String, u32>,
}

impl DisplayGrid {
    /// Look up the display name for an index.
    pub fn name_of(&self, index: u32) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(_, &i)| i == index)
            .map(|(name, _)| name.as_str())
    }
}

/// Wrap a name in colons unless it already has them.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    if !name.starts_with(':') {
        out.push(':');
    }
    out.push_str(name);
    if !out.ends_with(':') {
        out.push(':');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> EmojiGrid {
        EmojiGrid::new(
            rows.iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("smile"), ":smile:");
        assert_eq!(normalize_name(":smile:"), ":smile:");
        assert_eq!(normalize_name(":smile"), ":smile:");
        assert_eq!(normalize_name("smile:"), ":smile:");
        assert_eq!(normalize_name(""), ":");
    }

    #[test]
    fn test_display_indices_in_row_major_order() {
        let display = grid(&[&["b", "a"], &["a", "c"]]).to_display();
        assert_eq!(display.cells, vec![vec![1, 2], vec![2, 3]]);
        assert_eq!(display.mapping[EMPTY_SENTINEL], 0);
        assert_eq!(display.mapping[":b:"], 1);
        assert_eq!(display.mapping[":a:"], 2);
        assert_eq!(display.mapping[":c:"], 3);
        assert_eq!(display.name_of(3), Some(":c:"));
    }

    #[test]
    fn test_colon_variants_share_an_index() {
        let display = grid(&[&["a", ":a:"]]).to_display();
        assert_eq!(display.cells, vec![vec![1, 1]]);
        assert_eq!(display.mapping.len(), 2);
    }

    #[test]
    fn test_sentinel_name_maps_to_zero() {
        let display = grid(&[&["_"]]).to_display();
        assert_eq!(display.cells, vec![vec![0]]);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(grid(&[&["a", "b"], &["c", "d"]]).to_string(), ":a::b:\n:c::d:\n");
    }
}
