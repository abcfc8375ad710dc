//! Engagement readings
//!
//! A sample is one timestamped reading of a video's engagement, summed over
//! every platform it was fetched from. Per-platform figures are kept next to
//! the totals as flat `views_<platform>` / `likes_<platform>` /
//! `comments_<platform>` fields so the persisted file stays human-readable.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::Platform;

/// A `{views, likes, comments}` triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

impl EngagementMetrics {
    pub fn new(views: u64, likes: u64, comments: u64) -> Self {
        Self {
            views,
            likes,
            comments,
        }
    }

    /// views + likes + comments
    pub fn combined(&self) -> u64 {
        self.views
            .saturating_add(self.likes)
            .saturating_add(self.comments)
    }

    pub fn saturating_add(self, other: EngagementMetrics) -> Self {
        Self {
            views: self.views.saturating_add(other.views),
            likes: self.likes.saturating_add(other.likes),
            comments: self.comments.saturating_add(other.comments),
        }
    }
}

/// Per-platform engagement, serialized as flat `<metric>_<platform>` fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformBreakdown(BTreeMap<Platform, EngagementMetrics>);

impl PlatformBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, platform: Platform, metrics: EngagementMetrics) {
        self.0.insert(platform, metrics);
    }

    pub fn get(&self, platform: Platform) -> Option<&EngagementMetrics> {
        self.0.get(&platform)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Platform, &EngagementMetrics)> {
        self.0.iter().map(|(platform, metrics)| (*platform, metrics))
    }

    /// Keep only the platforms for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(Platform) -> bool) {
        self.0.retain(|platform, _| keep(*platform));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of every platform's metrics
    pub fn total(&self) -> EngagementMetrics {
        self.0
            .values()
            .fold(EngagementMetrics::default(), |acc, m| acc.saturating_add(*m))
    }

    /// Copy with every known platform present, zero-filled where absent.
    pub fn complete(&self) -> Self {
        let mut filled = self.clone();
        for platform in Platform::ALL {
            filled.0.entry(platform).or_default();
        }
        filled
    }

    fn set_field(&mut self, field: &str, platform: Platform, value: u64) -> bool {
        if !matches!(field, "views" | "likes" | "comments") {
            return false;
        }
        let entry = self.0.entry(platform).or_default();
        match field {
            "views" => entry.views = value,
            "likes" => entry.likes = value,
            _ => entry.comments = value,
        }
        true
    }
}

impl FromIterator<(Platform, EngagementMetrics)> for PlatformBreakdown {
    fn from_iter<I: IntoIterator<Item = (Platform, EngagementMetrics)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for PlatformBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len() * 3))?;
        for (platform, metrics) in &self.0 {
            map.serialize_entry(&format!("views_{platform}"), &metrics.views)?;
            map.serialize_entry(&format!("likes_{platform}"), &metrics.likes)?;
            map.serialize_entry(&format!("comments_{platform}"), &metrics.comments)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlatformBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut breakdown = PlatformBreakdown::new();

        for (key, value) in raw {
            let Some((field, platform)) = key.split_once('_') else {
                warn!(field = %key, "ignoring unexpected sample field");
                continue;
            };
            let Ok(platform) = platform.parse::<Platform>() else {
                warn!(field = %key, "ignoring sample field for unknown platform");
                continue;
            };
            let Some(count) = json_count(&value) else {
                warn!(field = %key, value = %value, "ignoring non-numeric sample field");
                continue;
            };
            if !breakdown.set_field(field, platform, count) {
                warn!(field = %key, "ignoring unexpected sample field");
            }
        }

        Ok(breakdown)
    }
}

/// Non-negative integer out of a JSON value; whole floats are accepted.
fn json_count(value: &serde_json::Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64)
}

/// One timestamped aggregate reading for a video. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSample {
    /// Unix seconds, shared by every sample appended in the same refresh
    pub timestamp: i64,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    #[serde(flatten)]
    pub platforms: PlatformBreakdown,
}

impl EngagementSample {
    /// Build a sample whose totals are the sum of the breakdown.
    pub fn from_breakdown(timestamp: i64, platforms: PlatformBreakdown) -> Self {
        let total = platforms.total();
        Self {
            timestamp,
            total_views: total.views,
            total_likes: total.likes,
            total_comments: total.comments,
            platforms,
        }
    }

    pub fn totals(&self) -> EngagementMetrics {
        EngagementMetrics::new(self.total_views, self.total_likes, self.total_comments)
    }

    pub fn combined(&self) -> u64 {
        self.totals().combined()
    }
}
