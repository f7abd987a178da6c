use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, present, require_admin, JsonBody};
use crate::error::{ApiError, ApiResult};
use crate::models::NewAuditLogEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordWinRequest {
    team_id: Option<String>,
    match_id: Option<Value>,
    tournament_id: Option<Value>,
    #[serde(default)]
    payout_amount: f64,
    actor_wallet: Option<String>,
}

/// Credits a match win to a team. Bookkeeping only, nothing moves on chain.
pub async fn record_win(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RecordWinRequest>,
) -> ApiResult<Json<Value>> {
    let admin = require_admin(&state, present(&body.actor_wallet)).await?;
    let team_id = present(&body.team_id).ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    if !body.payout_amount.is_finite() || body.payout_amount < 0.0 {
        return Err(ApiError::bad_request("Payout amount cannot be negative"));
    }
    let id = parse_id(team_id, "Team")?;

    let team = state
        .store
        .record_team_win(id, body.payout_amount)
        .await
        .map_err(|e| ApiError::internal("Failed to update team stats", e))?
        .ok_or_else(|| ApiError::not_found("Team not found"))?;

    state
        .store
        .append_audit_log(NewAuditLogEntry {
            actor_wallet: admin.wallet_address.clone(),
            action: "record_win".into(),
            target_type: "team".into(),
            target_id: team.id.to_string(),
            payload: json!({
                "matchId": body.match_id,
                "tournamentId": body.tournament_id,
                "payoutAmount": body.payout_amount,
            }),
        })
        .await?;
    tracing::info!(
        team = %team.id,
        actor = %admin.wallet_address,
        payout = body.payout_amount,
        total_wins = team.total_wins,
        "win recorded"
    );

    Ok(Json(json!({ "success": true, "message": "Win recorded successfully" })))
}
