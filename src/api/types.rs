use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub videos: usize,
    pub players: usize,
    pub uptime_secs: i64,
}
