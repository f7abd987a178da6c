use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const LEADERBOARD_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    game: Option<String>,
}

pub async fn leaderboards(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Value>> {
    let game = query
        .game
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .ok_or_else(|| ApiError::bad_request("game is required"))?;

    let teams = state.store.top_teams(game, LEADERBOARD_SIZE).await?;
    let players = state.store.top_players(game, LEADERBOARD_SIZE).await?;
    Ok(Json(json!({ "game": game, "teams": teams, "players": players })))
}
