use axum::{extract::State, Json};
use std::collections::BTreeMap;

use crate::api::state::AppState;
use crate::domain::{PlayerScore, Trends, VideoScore};
use crate::engine::Scorer;

/// GET /api/videos
pub async fn get_videos(State(state): State<AppState>) -> Json<BTreeMap<String, VideoScore>> {
    let snapshot = state.load_snapshot().await;
    Json(Scorer::new(&snapshot, &state.catalog, &state.roster).latest_video_scores())
}

/// GET /api/players
pub async fn get_players(State(state): State<AppState>) -> Json<BTreeMap<String, PlayerScore>> {
    let snapshot = state.load_snapshot().await;
    Json(Scorer::new(&snapshot, &state.catalog, &state.roster).player_scores())
}

/// GET /api/trends
pub async fn get_trends(State(state): State<AppState>) -> Json<Trends> {
    let snapshot = state.load_snapshot().await;
    Json(Scorer::new(&snapshot, &state.catalog, &state.roster).trends())
}
