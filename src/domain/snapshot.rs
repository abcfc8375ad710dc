use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Catalog, EngagementSample};

/// Every video's sample history: the whole persisted state.
///
/// Samples are only ever appended; a video's sequence is kept in insertion
/// order, which is also timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    videos: BTreeMap<String, Vec<EngagementSample>>,
}

impl Snapshot {
    /// Every catalog video mapped to an empty history
    pub fn empty_for(catalog: &Catalog) -> Self {
        Self {
            videos: catalog.keys().map(|k| (k.to_string(), Vec::new())).collect(),
        }
    }

    pub fn from_histories(videos: BTreeMap<String, Vec<EngagementSample>>) -> Self {
        Self { videos }
    }

    pub fn histories(&self) -> impl Iterator<Item = (&str, &[EngagementSample])> {
        self.videos.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// History for one video; empty if the video is unknown
    pub fn samples(&self, video_key: &str) -> &[EngagementSample] {
        self.videos
            .get(video_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn latest(&self, video_key: &str) -> Option<&EngagementSample> {
        self.samples(video_key).last()
    }

    /// The sample recorded at exactly `timestamp`, if any
    pub fn sample_at(&self, video_key: &str, timestamp: i64) -> Option<&EngagementSample> {
        self.samples(video_key)
            .iter()
            .find(|s| s.timestamp == timestamp)
    }

    pub fn contains(&self, video_key: &str) -> bool {
        self.videos.contains_key(video_key)
    }

    pub fn append(&mut self, video_key: &str, sample: EngagementSample) {
        self.videos
            .entry(video_key.to_string())
            .or_default()
            .push(sample);
    }

    /// Make sure a video has an (possibly empty) history entry
    pub fn ensure_video(&mut self, video_key: &str) {
        self.videos.entry(video_key.to_string()).or_default();
    }

    /// No videos at all
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn has_samples(&self) -> bool {
        self.videos.values().any(|v| !v.is_empty())
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    pub fn sample_count(&self) -> usize {
        self.videos.values().map(Vec::len).sum()
    }

    /// Newest sample timestamp across every video
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.videos
            .values()
            .flat_map(|samples| samples.iter().map(|s| s.timestamp))
            .max()
    }

    /// Staleness rule: stale when there is nothing to show, or when the newest
    /// sample of any video is older than `refresh_interval_secs`. One fresh
    /// video is enough to call the whole snapshot fresh.
    pub fn is_stale_at(&self, now: i64, refresh_interval_secs: u64) -> bool {
        match self.latest_timestamp() {
            None => true,
            Some(latest) => now.saturating_sub(latest) > refresh_interval_secs as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngagementMetrics, Platform, PlatformBreakdown, VideoSpec};

    fn sample(ts: i64, views: u64) -> EngagementSample {
        let breakdown: PlatformBreakdown = [(Platform::Youtube, EngagementMetrics::new(views, 0, 0))]
            .into_iter()
            .collect();
        EngagementSample::from_breakdown(ts, breakdown)
    }

    fn catalog() -> Catalog {
        Catalog::new(
            ["a", "b"]
                .iter()
                .map(|k| VideoSpec {
                    key: k.to_string(),
                    name: k.to_uppercase(),
                    platforms: Default::default(),
                })
                .collect(),
        )
    }

    #[test]
    fn empty_snapshot_is_stale() {
        assert!(Snapshot::default().is_stale_at(1_000, 60));
        let snapshot = Snapshot::empty_for(&catalog());
        assert_eq!(snapshot.video_count(), 2);
        assert!(!snapshot.has_samples());
        assert!(snapshot.is_stale_at(1_000, 60));
    }

    #[test]
    fn one_fresh_video_keeps_snapshot_fresh() {
        let mut snapshot = Snapshot::empty_for(&catalog());
        snapshot.append("a", sample(100, 1));
        snapshot.append("b", sample(900, 1));

        // a is 900s old, b is 100s old; b alone makes the set fresh
        assert!(!snapshot.is_stale_at(1_000, 300));
        assert!(snapshot.is_stale_at(1_301, 300));
    }

    #[test]
    fn boundary_is_not_stale() {
        let mut snapshot = Snapshot::empty_for(&catalog());
        snapshot.append("a", sample(1_000, 1));
        assert!(!snapshot.is_stale_at(1_060, 60));
        assert!(snapshot.is_stale_at(1_061, 60));
    }

    #[test]
    fn sample_at_matches_exact_timestamp_only() {
        let mut snapshot = Snapshot::empty_for(&catalog());
        snapshot.append("a", sample(100, 1));
        snapshot.append("a", sample(200, 2));

        assert_eq!(snapshot.sample_at("a", 200).map(|s| s.total_views), Some(2));
        assert!(snapshot.sample_at("a", 150).is_none());
        assert_eq!(snapshot.latest("a").map(|s| s.timestamp), Some(200));
        assert!(snapshot.latest("b").is_none());
    }
}
