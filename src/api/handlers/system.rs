use axum::{extract::State, response::Html, Json};
use chrono::Utc;

use crate::api::{state::AppState, types::HealthResponse};
use crate::engine::RefreshStatus;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Engagement Board</title>
</head>
<body>
<h1>Engagement Board</h1>
<ul>
<li><a href="/api/videos">Latest video scores</a></li>
<li><a href="/api/players">Player leaderboard</a></li>
<li><a href="/api/trends">Trends</a></li>
<li><a href="/api/status">Refresh status</a></li>
</ul>
</body>
</html>
"#;

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<RefreshStatus> {
    let snapshot = state.load_snapshot().await;
    Json(RefreshStatus::of(
        &snapshot,
        Utc::now().timestamp(),
        state.refresh_interval,
        state.is_refreshing(),
    ))
}

/// GET /health -- liveness probe
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        videos: state.catalog.len(),
        players: state.roster.len(),
        uptime_secs: state.uptime_seconds(),
    })
}
