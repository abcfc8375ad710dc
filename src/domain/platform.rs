use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A social distribution channel a video is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Tumblr,
    Instagram,
    Threads,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Tumblr,
        Platform::Instagram,
        Platform::Threads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Tumblr => "tumblr",
            Self::Instagram => "instagram",
            Self::Threads => "threads",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "youtube" | "yt" => Ok(Self::Youtube),
            "tiktok" => Ok(Self::Tiktok),
            "tumblr" => Ok(Self::Tumblr),
            "instagram" | "ig" => Ok(Self::Instagram),
            "threads" => Ok(Self::Threads),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}
