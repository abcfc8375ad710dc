//! Static video catalog and player roster

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::Platform;

/// A tracked video and where it is published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSpec {
    /// Stable key, e.g. `kings`
    pub key: String,
    /// Display name
    pub name: String,
    /// Platform → page locator
    #[serde(default)]
    pub platforms: BTreeMap<Platform, String>,
}

/// Ordered set of tracked videos
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    videos: Vec<VideoSpec>,
}

impl Catalog {
    pub fn new(videos: Vec<VideoSpec>) -> Self {
        Self { videos }
    }

    pub fn videos(&self) -> &[VideoSpec] {
        &self.videos
    }

    pub fn get(&self, key: &str) -> Option<&VideoSpec> {
        self.videos.iter().find(|v| v.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.videos.iter().map(|v| v.key.as_str())
    }

    /// Display name for a video, falling back to its key
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|v| v.name.as_str()).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

/// One credit assignment: a share of a video's engagement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionEntry {
    pub video_key: String,
    pub weight: f64,
}

impl AttributionEntry {
    pub fn new(video_key: impl Into<String>, weight: f64) -> Self {
        Self {
            video_key: video_key.into(),
            weight,
        }
    }

    pub fn full(video_key: impl Into<String>) -> Self {
        Self::new(video_key, 1.0)
    }
}

/// Accepted config shapes: `"kings"` or `{ video = "kings", weight = 0.5 }`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttribution {
    Key(String),
    Weighted {
        #[serde(alias = "video_key")]
        video: String,
        #[serde(default = "default_weight")]
        weight: f64,
    },
}

fn default_weight() -> f64 {
    1.0
}

impl<'de> Deserialize<'de> for AttributionEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawAttribution::deserialize(deserializer)? {
            RawAttribution::Key(video_key) => AttributionEntry::full(video_key),
            RawAttribution::Weighted { video, weight } => AttributionEntry::new(video, weight),
        })
    }
}

/// A player credited with weighted shares of videos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub name: String,
    #[serde(rename = "videos", default)]
    pub attributions: Vec<AttributionEntry>,
}

/// Ordered set of players
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    players: Vec<PlayerSpec>,
}

impl Roster {
    pub fn new(players: Vec<PlayerSpec>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[PlayerSpec] {
        &self.players
    }

    pub fn get(&self, name: &str) -> Option<&PlayerSpec> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
