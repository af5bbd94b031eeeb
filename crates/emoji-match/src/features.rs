//! Per-icon color features and the in-memory feature set.
//!
//! A [`FeatureSet`] is the in-memory half of the feature cache: one
//! [`ColorFeature`] per successfully analyzed icon, the two spatial indexes
//! derived from their dominant colors, and the animated flag of every icon.
//! All maps are name-ordered so candidate order, and therefore tie-breaking
//! between equally close icons, is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::index::{BucketIndex, ClusterIndex};

/// One representative color of an icon and the share of visible pixels it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swatch {
    pub color: Rgb,
    pub proportion: f64,
}

impl Swatch {
    pub fn new(color: Rgb, proportion: f64) -> Self {
        Self { color, proportion }
    }
}

/// Representative colors of one icon, sorted by descending proportion.
///
/// The first swatch is the dominant color.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorFeature {
    swatches: Vec<Swatch>,
}

impl ColorFeature {
    /// Build a feature, sorting swatches by descending proportion.
    ///
    /// The sort is stable, so equal proportions keep their input order.
    pub fn new(mut swatches: Vec<Swatch>) -> Self {
        swatches.sort_by(|a, b| b.proportion.total_cmp(&a.proportion));
        Self { swatches }
    }

    /// A single color covering the whole icon.
    pub fn solid(color: Rgb) -> Self {
        Self {
            swatches: vec![Swatch::new(color, 1.0)],
        }
    }

    pub fn dominant(&self) -> Option<Rgb> {
        self.swatches.first().map(|s| s.color)
    }

    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn total_proportion(&self) -> f64 {
        self.swatches.iter().map(|s| s.proportion).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }
}

/// Features, spatial indexes and animated flags for a palette.
///
/// Every name present in either index is also present in the feature map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    features: BTreeMap<String, ColorFeature>,
    buckets: BucketIndex,
    clusters: ClusterIndex,
    animated: BTreeMap<String, bool>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a set from persisted parts.
    ///
    /// Index members and flags that name an icon without a feature are dropped.
    pub fn from_parts(
        features: BTreeMap<String, ColorFeature>,
        buckets: BucketIndex,
        clusters: ClusterIndex,
        animated: BTreeMap<String, bool>,
    ) -> Self {
        let mut set = Self {
            features,
            buckets,
            clusters,
            animated,
        };
        let known: BTreeSet<String> = set.features.keys().cloned().collect();
        set.retain(|name| known.contains(name));
        set
    }

    /// Add or replace an icon's feature. Indexes are not touched until
    /// [`rebuild_indexes`](Self::rebuild_indexes).
    pub fn insert(&mut self, name: impl Into<String>, feature: ColorFeature, animated: bool) {
        let name = name.into();
        self.animated.insert(name.clone(), animated);
        self.features.insert(name, feature);
    }

    /// Re-derive both indexes from the dominant colors.
    pub fn rebuild_indexes(&mut self) {
        self.buckets.clear();
        self.clusters.clear();
        for (name, feature) in &self.features {
            if let Some(dominant) = feature.dominant() {
                self.buckets.insert(name, dominant);
                self.clusters.insert(name, dominant);
            }
        }
    }

    /// Keep only icons whose name passes `keep`, in features, flags and both
    /// indexes. Index cells left empty are removed.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.features.retain(|name, _| keep(name.as_str()));
        self.animated.retain(|name, _| keep(name.as_str()));
        self.buckets.retain(&keep);
        self.clusters.retain(&keep);
    }

    /// Remove every icon flagged as animated.
    pub fn exclude_animated(&mut self) {
        let animated: BTreeSet<String> = self
            .animated
            .iter()
            .filter(|(_, &is_animated)| is_animated)
            .map(|(name, _)| name.clone())
            .collect();
        if !animated.is_empty() {
            self.retain(|name| !animated.contains(name));
        }
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.animated.clear();
        self.buckets.clear();
        self.clusters.clear();
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColorFeature> {
        self.features.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Dominant color of an icon, if it has a non-empty feature.
    pub fn dominant(&self, name: &str) -> Option<Rgb> {
        self.features.get(name).and_then(ColorFeature::dominant)
    }

    /// `(name, dominant color)` of every icon, in name order.
    pub fn dominant_colors(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.features
            .iter()
            .filter_map(|(name, feature)| Some((name.as_str(), feature.dominant()?)))
    }

    pub fn is_animated(&self, name: &str) -> bool {
        self.animated.get(name).copied().unwrap_or(false)
    }

    pub fn features(&self) -> &BTreeMap<String, ColorFeature> {
        &self.features
    }

    pub fn buckets(&self) -> &BucketIndex {
        &self.buckets
    }

    pub fn clusters(&self) -> &ClusterIndex {
        &self.clusters
    }

    pub fn animated_flags(&self) -> &BTreeMap<String, bool> {
        &self.animated
    }
}
