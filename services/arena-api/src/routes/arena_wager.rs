use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{internal_as, parse_id, present, require_admin, JsonBody};
use crate::chain::parse_address;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    NewAuditLogEntry, NewWagerParticipant, NewWagerTournament, PaymentKind, WagerCompletion,
    WagerTournament,
};
use crate::payments;
use crate::state::AppState;

const DEFAULT_MAX_PARTICIPANTS: i32 = 100;
const DEFAULT_MATCH_FORMAT: &str = "best_of_7";

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let tournaments = state
        .store
        .list_wager_tournaments()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch tournaments", e))?;
    let tournaments: Vec<Value> = tournaments
        .into_iter()
        .map(|t| {
            let count = t.current_participants;
            let mut value = json!(t);
            if let Some(map) = value.as_object_mut() {
                map.insert("participantCount".into(), json!(count));
            }
            value
        })
        .collect();
    Ok(Json(json!({ "tournaments": tournaments })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWagerRequest {
    name: Option<String>,
    game: Option<String>,
    entry_wager: Option<f64>,
    max_participants: Option<i32>,
    start_time: Option<DateTime<Utc>>,
    escrow_wallet: Option<String>,
    creator_wallet: Option<String>,
    match_format: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateWagerRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(name), Some(game), Some(entry_wager), Some(escrow), Some(creator), Some(start_time)) = (
        present(&body.name),
        present(&body.game),
        body.entry_wager.filter(|w| *w != 0.0),
        present(&body.escrow_wallet),
        present(&body.creator_wallet),
        body.start_time,
    ) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if !entry_wager.is_finite() || entry_wager < 0.0 {
        return Err(ApiError::bad_request("Entry wager must be positive"));
    }
    let max_participants = body
        .max_participants
        .filter(|m| *m != 0)
        .unwrap_or(DEFAULT_MAX_PARTICIPANTS);
    if max_participants < 2 {
        return Err(ApiError::bad_request("maxParticipants must be at least 2"));
    }
    parse_address(escrow)?;
    parse_address(creator)?;

    let tournament = state
        .store
        .insert_wager_tournament(NewWagerTournament {
            name: name.to_string(),
            game: game.to_string(),
            entry_wager,
            max_participants,
            escrow_wallet: escrow.to_string(),
            created_by_wallet: creator.to_string(),
            start_time,
            match_format: present(&body.match_format)
                .unwrap_or(DEFAULT_MATCH_FORMAT)
                .to_string(),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to create tournament", e))?;
    tracing::info!(tournament = %tournament.id, %name, entry_wager, "wager tournament created");

    Ok(Json(json!({ "tournament": tournament })))
}

async fn joinable(state: &AppState, id: &str) -> ApiResult<WagerTournament> {
    let id = parse_id(id, "Tournament")?;
    let tournament = state
        .store
        .get_wager_tournament(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tournament not found"))?;
    if !tournament.status.accepts_registrations() {
        return Err(ApiError::bad_request("Tournament registration is closed"));
    }
    if tournament.is_full() {
        return Err(ApiError::bad_request("Tournament is full"));
    }
    Ok(tournament)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WagerIntentRequest {
    player_wallet: Option<String>,
}

pub async fn join_intent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<WagerIntentRequest>,
) -> ApiResult<Json<payments::PaymentIntentResponse>> {
    let wallet = present(&body.player_wallet)
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    let payer = parse_address(wallet)?;
    let tournament = joinable(&state, &id).await?;
    if state
        .store
        .find_wager_participant(tournament.id, wallet)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Already joined this tournament"));
    }
    let intent = payments::open_arena_wager_intent(&state, &tournament, &payer).await?;
    Ok(Json(intent))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WagerJoinRequest {
    player_wallet: Option<String>,
    wager_amount: Option<f64>,
    wager_tx_signature: Option<String>,
    in_game_username: Option<String>,
    discord_handle: Option<String>,
    team_name: Option<String>,
}

pub async fn join(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<WagerJoinRequest>,
) -> ApiResult<Json<Value>> {
    join_wager(&state, &id, body)
        .await
        .map_err(internal_as("Failed to join tournament"))
}

async fn join_wager(state: &AppState, id: &str, body: WagerJoinRequest) -> ApiResult<Json<Value>> {
    let (Some(wallet), Some(wager_amount), Some(signature), Some(username)) = (
        present(&body.player_wallet),
        body.wager_amount.filter(|w| *w != 0.0),
        present(&body.wager_tx_signature),
        present(&body.in_game_username),
    ) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let tournament = joinable(state, id).await?;
    if (wager_amount - tournament.entry_wager).abs() > f64::EPSILON * tournament.entry_wager.max(1.0) {
        return Err(ApiError::bad_request("Wager amount must equal the entry wager"));
    }
    let profile = state.store.get_profile(wallet).await?;

    let new = NewWagerParticipant {
        tournament_id: tournament.id,
        player_wallet: wallet.to_string(),
        player_id: profile.map(|p| p.id),
        wager_amount: tournament.entry_wager,
        wager_tx_signature: signature.to_string(),
        in_game_username: username.to_string(),
        discord_handle: present(&body.discord_handle).map(str::to_string),
        team_name: present(&body.team_name).map(str::to_string),
    };
    let registration = serde_json::to_value(&new)
        .map_err(|e| ApiError::internal("Failed to join tournament", e))?;
    let intent = payments::confirm_payment(
        state,
        PaymentKind::ArenaWager,
        tournament.id,
        wallet,
        signature,
        registration,
    )
    .await?;

    let (participant, tournament) = state.store.join_wager_tournament(new).await?;
    payments::complete_intent(state, intent.id).await?;
    tracing::info!(
        tournament = %tournament.id,
        wallet,
        total_pot = tournament.total_pot,
        "wager placed"
    );

    Ok(Json(json!({ "participant": participant, "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    winner_wallet: Option<String>,
    burn_tx_signature: Option<String>,
    actor_wallet: Option<String>,
}

pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CompleteRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(winner), Some(burn_signature)) =
        (present(&body.winner_wallet), present(&body.burn_tx_signature))
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let admin = require_admin(&state, present(&body.actor_wallet)).await?;

    let id = parse_id(&id, "Tournament")?;
    if state.store.get_wager_tournament(id).await?.is_none() {
        return Err(ApiError::not_found("Tournament not found"));
    }
    if state.store.find_wager_participant(id, winner).await?.is_none() {
        return Err(ApiError::bad_request("Winner is not a participant of this tournament"));
    }

    let tournament = state
        .store
        .complete_wager_tournament(
            id,
            WagerCompletion {
                winner_wallet: winner.to_string(),
                burn_tx_signature: burn_signature.to_string(),
            },
            Utc::now(),
        )
        .await?
        .ok_or_else(|| ApiError::bad_request("Tournament already completed"))?;

    state
        .store
        .append_audit_log(NewAuditLogEntry {
            actor_wallet: admin.wallet_address.clone(),
            action: "complete_wager_tournament".into(),
            target_type: "arena_wager_tournament".into(),
            target_id: id.to_string(),
            payload: json!({
                "winnerWallet": winner,
                "winnerAmount": tournament.winner_amount,
                "burnTxSignature": burn_signature,
            }),
        })
        .await?;
    tracing::info!(tournament = %id, winner, actor = %admin.wallet_address, "wager tournament completed");

    Ok(Json(json!({ "tournament": tournament, "success": true })))
}
