use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::round2;
use crate::state::AppState;
use crate::store::StoreResult;

const TOP_GAMES: i64 = 5;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopGame {
    pub game: String,
    pub active_players: i64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub active_players: i64,
    pub total_prizes_sol: f64,
    /// Whole percent of games won across all profiles.
    pub win_rate: i64,
    pub active_tournaments: i64,
    pub top_games: Vec<TopGame>,
}

async fn collect(state: &AppState) -> StoreResult<PlatformStats> {
    let totals = state.store.win_loss_totals().await?;
    let games = totals.wins + totals.losses;
    let win_rate = if games > 0 {
        (totals.wins as f64 / games as f64 * 100.0).round() as i64
    } else {
        0
    };

    Ok(PlatformStats {
        active_players: state.store.count_profiles().await?,
        total_prizes_sol: round2(state.store.completed_prize_total().await?),
        win_rate,
        active_tournaments: state.store.count_active_tournaments().await?,
        top_games: state
            .store
            .participation_counts_by_game(TOP_GAMES)
            .await?
            .into_iter()
            .map(|g| TopGame { game: g.game, active_players: g.count })
            .collect(),
    })
}

/// Failures still answer with a zeroed payload so dashboards render.
pub async fn platform_stats(State(state): State<AppState>) -> impl IntoResponse {
    match collect(&state).await {
        Ok(stats) => (StatusCode::OK, Json(stats)),
        Err(err) => {
            tracing::error!(error = %err, "failed to compute platform stats");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(PlatformStats::default()))
        }
    }
}
