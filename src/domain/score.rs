//! Read-side projections served by the API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{EngagementSample, PlatformBreakdown};

/// Latest engagement of one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoScore {
    pub name: String,
    pub combined: u64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    #[serde(flatten)]
    pub platforms: PlatformBreakdown,
}

/// Weighted engagement credited to one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedTotals {
    pub combined: u64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub name: String,
    #[serde(flatten)]
    pub totals: WeightedTotals,
}

/// One point of a video's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTrendPoint {
    pub timestamp: i64,
    pub combined: u64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    #[serde(flatten)]
    pub platforms: PlatformBreakdown,
}

impl From<&EngagementSample> for VideoTrendPoint {
    fn from(sample: &EngagementSample) -> Self {
        Self {
            timestamp: sample.timestamp,
            combined: sample.combined(),
            views: sample.total_views,
            likes: sample.total_likes,
            comments: sample.total_comments,
            platforms: sample.platforms.complete(),
        }
    }
}

/// One point of a player's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTrendPoint {
    pub timestamp: i64,
    #[serde(flatten)]
    pub totals: WeightedTotals,
}

/// A named series of points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries<P> {
    pub name: String,
    pub data: Vec<P>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trends {
    pub videos: BTreeMap<String, TrendSeries<VideoTrendPoint>>,
    pub players: BTreeMap<String, TrendSeries<PlayerTrendPoint>>,
}
