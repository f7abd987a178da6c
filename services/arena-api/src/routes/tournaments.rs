use anchor_lang::{InstructionData, ToAccountMetas};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::{
    instruction::Instruction,
    native_token::{lamports_to_sol, sol_to_lamports},
    pubkey::Pubkey,
    signature::Signature,
    system_program,
    transaction::Transaction,
};

use super::{internal_as, parse_id, present, round2, JsonBody};
use crate::challonge::NewBracket;
use crate::chain::parse_address;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    NewParticipation, NewTournament, Participation, PaymentKind, Tournament, TournamentStatus,
};
use crate::state::AppState;
use crate::wallet::WalletSigner;
use crate::{payments, pda};

const DEFAULT_MAX_PARTICIPANTS: i32 = 32;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let tournaments = state
        .bracket
        .list_tournaments()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch tournaments", e))?;
    Ok(Json(tournaments))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    name: Option<String>,
    game: Option<String>,
    #[serde(default)]
    entry_fee: f64,
    start_time: Option<DateTime<Utc>>,
    max_participants: Option<i32>,
    banner_url: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTournamentRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(name), Some(game), Some(start_time)) =
        (present(&body.name), present(&body.game), body.start_time)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if !body.entry_fee.is_finite() || body.entry_fee < 0.0 {
        return Err(ApiError::bad_request("Entry fee cannot be negative"));
    }
    let max_participants = body.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS);
    let max_allowed = i32::from(sol_arena::MAX_PARTICIPANTS);
    if !(2..=max_allowed).contains(&max_participants) {
        return Err(ApiError::bad_request(format!(
            "maxParticipants must be between 2 and {max_allowed}"
        )));
    }

    let bracket = state
        .bracket
        .create_tournament(&NewBracket {
            name: name.to_string(),
            game: game.to_string(),
            entry_fee_sol: body.entry_fee,
        })
        .await
        .map_err(|e| ApiError::upstream("Failed to create tournament", e))?;

    let tournament = state
        .store
        .insert_tournament(NewTournament {
            challonge_id: Some(bracket.id.to_string()),
            name: name.to_string(),
            game: game.to_string(),
            entry_fee_sol: body.entry_fee,
            max_participants,
            status: TournamentStatus::Open,
            start_time,
            banner_url: body.banner_url.clone(),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to create tournament", e))?;
    tracing::info!(tournament = %tournament.id, challonge_id = bracket.id, %name, "tournament created");

    let onchain_signature = match &state.server_wallet {
        Some(signer) => match create_onchain(&state, signer.as_ref(), &tournament).await {
            Ok(signature) => Some(signature.to_string()),
            Err(err) => {
                tracing::warn!(tournament = %tournament.id, error = %err, "on-chain tournament creation failed");
                None
            }
        },
        None => None,
    };

    Ok(Json(json!({
        "tournament": tournament,
        "challonge": bracket,
        "onchainSignature": onchain_signature,
    })))
}

/// Creates the escrow-backed tournament account, signed by the server wallet.
async fn create_onchain(
    state: &AppState,
    signer: &dyn WalletSigner,
    tournament: &Tournament,
) -> ApiResult<Signature> {
    let program_id = state.settings.program_id;
    let tournament_id = tournament.onchain_id();
    let authority = signer.address()?;

    let accounts = sol_arena::accounts::CreateTournament {
        tournament: pda::tournament(&program_id, &tournament_id),
        tournament_escrow: pda::tournament_escrow(&program_id, &tournament_id),
        protocol_config: pda::protocol_config(&program_id),
        authority,
        system_program: system_program::ID,
    };
    let args = sol_arena::instruction::CreateTournament {
        tournament_id,
        entry_fee: sol_to_lamports(tournament.entry_fee_sol),
        max_participants: tournament.max_participants as u16,
    };
    let ix = Instruction {
        program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    };

    let signature = send_signed(state, signer, ix).await?;
    tracing::info!(tournament = %tournament.id, %signature, "on-chain tournament created");
    Ok(signature)
}

/// Signs `ix` with the server wallet as fee payer and submits it.
async fn send_signed(
    state: &AppState,
    signer: &dyn WalletSigner,
    ix: Instruction,
) -> ApiResult<Signature> {
    let payer = signer.address()?;
    let (blockhash, _) = state.chain.latest_blockhash().await?;
    let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
    tx.message.recent_blockhash = blockhash;
    let tx = signer.sign_transaction(tx).await?;
    Ok(state.chain.send_transaction(&tx).await?)
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "Tournament")?;
    let tournament = state
        .store
        .get_tournament(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tournament not found"))?;
    let participants = state.store.list_participations(id).await?;

    let challonge = match tournament.challonge_id.as_deref() {
        Some(challonge_id) => match state.bracket.get_tournament(challonge_id).await {
            Ok(bracket) => json!({
                "id": bracket.id,
                "url": bracket.full_challonge_url,
                "state": bracket.state,
            }),
            Err(err) => {
                tracing::warn!(challonge_id, error = %err, "failed to fetch bracket");
                Value::Null
            }
        },
        None => Value::Null,
    };

    let escrow = pda::tournament_escrow(&state.settings.program_id, &tournament.onchain_id());
    let prize_pool = round2(tournament.entry_fee_sol * participants.len() as f64);
    Ok(Json(json!({
        "tournament": {
            "id": tournament.id,
            "name": tournament.name,
            "game": tournament.game,
            "entryFee": tournament.entry_fee_sol,
            "prizePool": prize_pool,
            "maxParticipants": tournament.max_participants,
            "currentParticipants": participants.len(),
            "status": tournament.status,
            "startDate": tournament.start_time,
            "bannerUrl": tournament.banner_url,
            "challonge": challonge,
            "escrowAddress": escrow.to_string(),
        },
        "participants": participants,
    })))
}

pub async fn participants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "Tournament")?;
    let participants = state
        .store
        .list_participations(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch participants", e))?;
    let count = participants.len();
    Ok(Json(json!({ "participants": participants, "count": count })))
}

// ===== JOIN =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinIntentRequest {
    wallet_address: Option<String>,
}

pub async fn join_intent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<JoinIntentRequest>,
) -> ApiResult<Json<payments::PaymentIntentResponse>> {
    let wallet = present(&body.wallet_address)
        .ok_or_else(|| ApiError::Unauthorized("Wallet address required".into()))?;
    let payer = parse_address(wallet)?;
    let tournament = open_tournament(&state, &id, wallet).await?;
    if tournament.is_full() {
        return Err(ApiError::bad_request("Tournament is full"));
    }
    let intent = payments::open_sol_entry_intent(&state, &tournament, &payer).await?;
    Ok(Json(intent))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    wallet_address: Option<String>,
    in_game_username: Option<String>,
    discord_handle: Option<String>,
    team_id: Option<String>,
    tx_signature: Option<String>,
}

pub async fn join(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<JoinRequest>,
) -> ApiResult<Json<Value>> {
    join_tournament(&state, &id, body)
        .await
        .map_err(internal_as("Failed to join tournament"))
}

/// Looks up a tournament the wallet may still register for.
async fn open_tournament(state: &AppState, id: &str, wallet: &str) -> ApiResult<Tournament> {
    let id = parse_id(id, "Tournament")?;
    let tournament = state
        .store
        .get_tournament(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tournament not found"))?;
    if !tournament.status.accepts_registrations() {
        return Err(ApiError::bad_request("Tournament is not open for registration"));
    }
    if state.store.find_participation(id, wallet).await?.is_some() {
        return Err(ApiError::bad_request("Already registered for this tournament"));
    }
    Ok(tournament)
}

async fn join_tournament(state: &AppState, id: &str, body: JoinRequest) -> ApiResult<Json<Value>> {
    let wallet = present(&body.wallet_address)
        .ok_or_else(|| ApiError::Unauthorized("Wallet address required".into()))?;
    let tournament = open_tournament(state, id, wallet).await?;
    let profile = state
        .store
        .get_profile(wallet)
        .await?
        .ok_or_else(|| ApiError::not_found("Player profile not found"))?;
    let in_game_username = present(&body.in_game_username)
        .ok_or_else(|| ApiError::bad_request("In-game username required"))?;

    let new = NewParticipation {
        tournament_uuid: tournament.id,
        player_id: Some(profile.id),
        wallet_address: wallet.to_string(),
        tournament_id: tournament.challonge_id.clone(),
        tournament_name: tournament.name.clone(),
        game: tournament.game.clone(),
        entry_fee: tournament.entry_fee_sol,
        in_game_username: in_game_username.to_string(),
        discord_handle: present(&body.discord_handle).map(str::to_string),
        team_name: present(&body.team_id).map(str::to_string),
        payment_signature: present(&body.tx_signature).map(str::to_string),
    };

    let intent = if sol_to_lamports(tournament.entry_fee_sol) > 0 {
        let signature = new
            .payment_signature
            .clone()
            .ok_or_else(|| ApiError::bad_request("Payment transaction signature required"))?;
        let registration = serde_json::to_value(&new)
            .map_err(|e| ApiError::internal("Failed to join tournament", e))?;
        Some(
            payments::confirm_payment(
                state,
                PaymentKind::SolEntry,
                tournament.id,
                wallet,
                &signature,
                registration,
            )
            .await?,
        )
    } else {
        None
    };

    let participation = state.store.register_participant(new).await?;
    if let Some(intent) = intent {
        payments::complete_intent(state, intent.id).await?;
    }
    tracing::info!(tournament = %tournament.id, wallet, "player registered");

    let participant_count = state.store.list_participations(tournament.id).await?.len();
    Ok(Json(json!({
        "success": true,
        "participation": participation,
        "participantCount": participant_count,
    })))
}

// ===== FINALIZE =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    tournament_id: Value,
}

pub async fn finalize(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<FinalizeRequest>,
) -> ApiResult<Json<Value>> {
    let challonge_id = match &body.tournament_id {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(ApiError::bad_request("Missing required fields")),
    };
    finalize_bracket(&state, &challonge_id)
        .await
        .map_err(|err| match err {
            ApiError::Internal(_) | ApiError::Upstream(_) => {
                ApiError::Internal("Failed to finalize tournament".into())
            }
            other => other,
        })
}

async fn finalize_bracket(state: &AppState, challonge_id: &str) -> ApiResult<Json<Value>> {
    let mut standings = state.bracket.list_participants(challonge_id).await?;
    standings.sort_by_key(|p| p.rank());
    let winner = |place: usize| standings.get(place).and_then(|p| p.name.clone());
    let winners = [winner(0), winner(1), winner(2)];

    let mut payouts = Vec::new();
    let mut onchain_signature = None;
    if let Some(tournament) = state.store.find_tournament_by_challonge_id(challonge_id).await? {
        let completed = state
            .store
            .complete_tournament(tournament.id)
            .await?
            .ok_or_else(|| ApiError::bad_request("Tournament is already completed"))?;

        let places = standings.len().min(3);
        let pool = sol_to_lamports(completed.entry_fee_sol * completed.current_participants as f64);
        let amounts = sol_arena::payout::placement_payouts(pool, places)
            .ok_or_else(|| ApiError::Internal("Failed to finalize tournament".into()))?;
        let participations = state.store.list_participations(tournament.id).await?;

        let mut placed = Vec::new();
        for (place, (name, lamports)) in winners.iter().zip(amounts).enumerate() {
            let Some(name) = name else { continue };
            let Some(participation) = participations.iter().find(|p| &p.wallet_address == name) else {
                continue;
            };
            let prize = lamports_to_sol(lamports);
            state
                .store
                .award_placement(participation.id, place as i32 + 1, prize)
                .await?;
            placed.push((place, participation));
            payouts.push(json!({
                "placement": place + 1,
                "walletAddress": name,
                "amountSol": prize,
            }));
        }
        tracing::info!(tournament = %tournament.id, challonge_id, winners = payouts.len(), "tournament finalized");

        if let Some(signer) = &state.server_wallet {
            match finalize_onchain(state, signer.as_ref(), &completed, &placed, places).await {
                Ok(signature) => onchain_signature = Some(signature.to_string()),
                Err(err) => {
                    tracing::warn!(tournament = %tournament.id, error = %err, "on-chain finalize failed");
                }
            }
        }
    }

    let [first, second, third] = winners;
    Ok(Json(json!({
        "winners": { "first": first, "second": second, "third": third },
        "participants": standings,
        "payouts": payouts,
        "onchainSignature": onchain_signature,
    })))
}

/// Fixes the placements on chain so winners can claim from the escrow.
/// Every paid place must belong to a registered wallet, in order.
async fn finalize_onchain(
    state: &AppState,
    signer: &dyn WalletSigner,
    tournament: &Tournament,
    placed: &[(usize, &Participation)],
    places: usize,
) -> ApiResult<Signature> {
    if placed.len() != places || placed.iter().enumerate().any(|(i, (place, _))| i != *place) {
        return Err(ApiError::bad_request("Winners are not all registered wallets"));
    }
    let winners = placed
        .iter()
        .map(|(_, p)| parse_address(&p.wallet_address))
        .collect::<Result<Vec<Pubkey>, _>>()?;
    let onchain_id = payments::onchain_tournament(state, tournament).await?;
    let authority = signer.address()?;
    let ix = payments::finalize_instruction(&state.settings.program_id, &onchain_id, &authority, &winners)
        .ok_or_else(|| ApiError::bad_request("Tournament has no winners"))?;

    let signature = send_signed(state, signer, ix).await?;
    tracing::info!(tournament = %tournament.id, %signature, places, "on-chain tournament finalized");
    Ok(signature)
}

// ===== CLAIM =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    wallet_address: Option<String>,
}

/// Unsigned `claim_prize` transaction for a placed wallet.
pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ClaimRequest>,
) -> ApiResult<Json<Value>> {
    let wallet = present(&body.wallet_address)
        .ok_or_else(|| ApiError::Unauthorized("Wallet address required".into()))?;
    let winner = parse_address(wallet)?;
    let id = parse_id(&id, "Tournament")?;
    let tournament = state
        .store
        .get_tournament(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tournament not found"))?;
    if tournament.status != TournamentStatus::Completed {
        return Err(ApiError::bad_request("Tournament is not finalized yet"));
    }
    let (placement, prize) = state
        .store
        .find_participation(id, wallet)
        .await?
        .and_then(|p| Some((p.placement?, p.prize_amount.filter(|a| *a > 0.0)?)))
        .ok_or_else(|| ApiError::bad_request("No prize to claim"))?;

    let program_id = state.settings.program_id;
    let onchain_id = payments::onchain_tournament(&state, &tournament).await?;
    let (blockhash, last_valid_block_height) = state.chain.latest_blockhash().await?;
    let tx = payments::claim_prize_transaction(&program_id, &onchain_id, &winner, blockhash);
    tracing::info!(tournament = %id, wallet, placement, "prize claim prepared");

    Ok(Json(json!({
        "placement": placement,
        "amount": sol_to_lamports(prize),
        "escrowAddress": pda::tournament_escrow(&program_id, &onchain_id).to_string(),
        "transaction": payments::encode_transaction(&tx)?,
        "blockhash": blockhash.to_string(),
        "lastValidBlockHeight": last_valid_block_height,
    })))
}
