//! Scorer
//!
//! Read-only projections of a snapshot: latest per-video scores, weighted
//! per-player scores and the full trend series. Weighted sums are kept in
//! `f64` and truncated once per field at the end.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    AttributionEntry, Catalog, EngagementMetrics, PlayerScore, PlayerTrendPoint, Roster,
    Snapshot, TrendSeries, Trends, VideoScore, VideoTrendPoint, WeightedTotals,
};

/// Running weighted sum of one player's engagement
#[derive(Debug, Default, Clone, Copy)]
struct WeightedSum {
    combined: f64,
    views: f64,
    likes: f64,
    comments: f64,
}

impl WeightedSum {
    fn add(&mut self, metrics: EngagementMetrics, weight: f64) {
        self.combined += metrics.combined() as f64 * weight;
        self.views += metrics.views as f64 * weight;
        self.likes += metrics.likes as f64 * weight;
        self.comments += metrics.comments as f64 * weight;
    }

    fn truncate(self) -> WeightedTotals {
        WeightedTotals {
            combined: self.combined.trunc() as u64,
            views: self.views.trunc() as u64,
            likes: self.likes.trunc() as u64,
            comments: self.comments.trunc() as u64,
        }
    }
}

pub struct Scorer<'a> {
    snapshot: &'a Snapshot,
    catalog: &'a Catalog,
    roster: &'a Roster,
}

impl<'a> Scorer<'a> {
    pub fn new(snapshot: &'a Snapshot, catalog: &'a Catalog, roster: &'a Roster) -> Self {
        Self {
            snapshot,
            catalog,
            roster,
        }
    }

    /// Latest sample of every video that has one. Videos without samples are
    /// left out rather than reported as zero.
    pub fn latest_video_scores(&self) -> BTreeMap<String, VideoScore> {
        self.snapshot
            .histories()
            .filter_map(|(key, samples)| {
                let latest = samples.last()?;
                Some((
                    key.to_string(),
                    VideoScore {
                        name: self.catalog.display_name(key).to_string(),
                        combined: latest.combined(),
                        views: latest.total_views,
                        likes: latest.total_likes,
                        comments: latest.total_comments,
                        platforms: latest.platforms.complete(),
                    },
                ))
            })
            .collect()
    }

    /// Weighted totals of every rostered player from the latest video scores
    pub fn player_scores(&self) -> BTreeMap<String, PlayerScore> {
        weighted_player_scores(&self.latest_video_scores(), self.roster)
    }

    /// Full history of every video with samples, plus each player's weighted
    /// series over the timestamps of their attributed videos.
    pub fn trends(&self) -> Trends {
        let videos = self
            .snapshot
            .histories()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(key, samples)| {
                (
                    key.to_string(),
                    TrendSeries {
                        name: self.catalog.display_name(key).to_string(),
                        data: samples.iter().map(VideoTrendPoint::from).collect(),
                    },
                )
            })
            .collect();

        let players = self
            .roster
            .players()
            .iter()
            .map(|player| {
                (
                    player.name.clone(),
                    TrendSeries {
                        name: player.name.clone(),
                        data: self.player_series(&player.attributions),
                    },
                )
            })
            .collect();

        Trends { videos, players }
    }

    fn player_series(&self, attributions: &[AttributionEntry]) -> Vec<PlayerTrendPoint> {
        let timestamps: BTreeSet<i64> = attributions
            .iter()
            .flat_map(|entry| self.snapshot.samples(&entry.video_key))
            .map(|sample| sample.timestamp)
            .collect();

        timestamps
            .into_iter()
            .map(|timestamp| {
                let mut sum = WeightedSum::default();
                for entry in attributions {
                    // no carry-forward: a video without a sample here adds nothing
                    if let Some(sample) = self.snapshot.sample_at(&entry.video_key, timestamp) {
                        sum.add(sample.totals(), entry.weight);
                    }
                }
                PlayerTrendPoint {
                    timestamp,
                    totals: sum.truncate(),
                }
            })
            .collect()
    }
}

/// Weighted per-player totals from precomputed video scores. Attributions to
/// videos absent from `video_scores` contribute nothing.
pub fn weighted_player_scores(
    video_scores: &BTreeMap<String, VideoScore>,
    roster: &Roster,
) -> BTreeMap<String, PlayerScore> {
    roster
        .players()
        .iter()
        .map(|player| {
            let mut sum = WeightedSum::default();
            for entry in &player.attributions {
                if let Some(score) = video_scores.get(&entry.video_key) {
                    sum.add(
                        EngagementMetrics::new(score.views, score.likes, score.comments),
                        entry.weight,
                    );
                }
            }
            (
                player.name.clone(),
                PlayerScore {
                    name: player.name.clone(),
                    totals: sum.truncate(),
                },
            )
        })
        .collect()
}
