use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, present, require_admin, JsonBody};
use crate::chain::parse_address;
use crate::error::{ApiError, ApiResult};
use crate::launch::{resolve_logo, LaunchError, PoolParams, TeamMetadata, TEAM_ASSETS_BUCKET};
use crate::models::{NewAuditLogEntry, NewTeam, Team, TeamLaunch, TeamStatus};
use crate::pda;
use crate::staking::{calculate_stake_weight, WeightSchedule};
use crate::state::AppState;

const MAX_TEAM_NAME_BYTES: usize = 32;
const MAX_SYMBOL_BYTES: usize = 10;

async fn load_team(state: &AppState, id: &str) -> ApiResult<Team> {
    let id = parse_id(id, "Team")?;
    state
        .store
        .get_team(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let teams = state.store.list_teams().await?;
    Ok(Json(json!({ "teams": teams })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    name: Option<String>,
    symbol: Option<String>,
    description: Option<String>,
    logo_url: Option<String>,
    game: Option<String>,
    region: Option<String>,
    creator_wallet: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTeamRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(name), Some(symbol)) = (present(&body.name), present(&body.symbol)) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let symbol = symbol.to_uppercase();
    if name.len() > MAX_TEAM_NAME_BYTES {
        return Err(ApiError::bad_request(format!(
            "Team name must be at most {MAX_TEAM_NAME_BYTES} bytes"
        )));
    }
    if symbol.len() > MAX_SYMBOL_BYTES {
        return Err(ApiError::bad_request(format!(
            "Symbol must be 1 to {MAX_SYMBOL_BYTES} bytes"
        )));
    }
    let creator_wallet = present(&body.creator_wallet).map(str::to_string);
    if let Some(wallet) = &creator_wallet {
        parse_address(wallet)?;
    }

    let team = state
        .store
        .insert_team(NewTeam {
            name: name.to_string(),
            symbol,
            description: present(&body.description).map(str::to_string),
            logo_url: present(&body.logo_url).map(str::to_string),
            game: present(&body.game).map(str::to_string),
            region: present(&body.region).map(str::to_string),
            creator_wallet,
        })
        .await?;
    tracing::info!(team = %team.id, name = %team.name, symbol = %team.symbol, "team created");
    Ok(Json(json!({ "team": team })))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let team = load_team(&state, &id).await?;
    let stakes = state.store.list_stakes(team.id).await?;
    let staked: f64 = stakes.iter().map(|s| s.amount).sum();
    Ok(Json(json!({
        "team": team,
        "stakes": stakes,
        "totalStaked": staked,
    })))
}

// ===== LAUNCH =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    wallet_address: Option<String>,
}

/// Prepares the bonding-curve pool transaction for a draft team. The
/// user's wallet pays for and submits it.
pub async fn launch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<LaunchRequest>,
) -> ApiResult<Json<Value>> {
    let wallet = present(&body.wallet_address)
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    let payer = parse_address(wallet)?;

    let team = load_team(&state, &id).await?;
    if team.status != TeamStatus::Draft {
        return Err(ApiError::bad_request("Team has already been launched"));
    }
    if team.creator_wallet.is_none() {
        return Err(ApiError::bad_request("Team has no creator wallet"));
    }

    let config = state.settings.dbc_config;
    match state.chain.account_owner(&config).await? {
        Some(owner) if owner == state.settings.dbc_program_id => {}
        Some(owner) => {
            return Err(ApiError::internal(
                format!("Failed to validate pool configuration: owned by {owner}"),
                LaunchError::ConfigOwner { expected: state.settings.dbc_program_id, actual: owner },
            ))
        }
        None => return Err(config_missing(&config.to_string())),
    }

    let team_id = team.id.to_string();
    let logo_url = resolve_logo(
        state.storage.as_ref(),
        &team_id,
        team.logo_url.as_deref(),
        Utc::now().timestamp_millis(),
    )
    .await;

    let metadata_uri = format!("{}/teams/{team_id}", state.settings.public_base_url);
    let metadata = TeamMetadata::new(&team, logo_url.as_deref(), &metadata_uri);
    match serde_json::to_vec_pretty(&metadata) {
        Ok(bytes) => {
            let path = format!("team-metadata/{team_id}.json");
            if let Err(err) = state
                .storage
                .upload(TEAM_ASSETS_BUCKET, &path, bytes, "application/json")
                .await
            {
                tracing::warn!(team = %team_id, error = %err, "metadata upload failed");
            }
        }
        Err(err) => tracing::warn!(team = %team_id, error = %err, "metadata encoding failed"),
    }

    let prepared = state
        .launcher
        .prepare_pool(&PoolParams {
            name: team.name.clone(),
            symbol: team.symbol.clone(),
            metadata_uri: metadata_uri.clone(),
            payer,
        })
        .await
        .map_err(|err| match err {
            LaunchError::ConfigMissing(config) => config_missing(&config.to_string()),
            other => other.into(),
        })?;
    tracing::info!(team = %team_id, mint = %prepared.mint_address, "team launch prepared");

    Ok(Json(json!({
        "success": true,
        "teamId": team_id,
        "serializedTransaction": prepared.serialized_transaction,
        "mintAddress": prepared.mint_address,
        "poolAddress": prepared.pool_address,
        "bondingCurveAddress": prepared.bonding_curve_address,
        "metadataUri": metadata_uri,
        "logoUrl": logo_url,
        "blockhash": prepared.blockhash,
        "lastValidBlockHeight": prepared.last_valid_block_height,
    })))
}

fn config_missing(config: &str) -> ApiError {
    tracing::error!(config, "DBC pool config account missing");
    ApiError::Detailed {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "DBC pool configuration not found on blockchain. The config address may be invalid."
            .into(),
        details: json!({ "configAddress": config }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmLaunchRequest {
    tx_signature: Option<String>,
    mint_address: Option<String>,
    pool_address: Option<String>,
    bonding_curve_address: Option<String>,
    metadata_uri: Option<String>,
    logo_url: Option<String>,
}

/// Records a launch once the pool account exists on chain.
pub async fn confirm_launch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ConfirmLaunchRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(signature), Some(mint), Some(pool), Some(curve), Some(uri)) = (
        present(&body.tx_signature),
        present(&body.mint_address),
        present(&body.pool_address),
        present(&body.bonding_curve_address),
        present(&body.metadata_uri),
    ) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let team = load_team(&state, &id).await?;
    if team.status != TeamStatus::Draft {
        return Err(ApiError::bad_request("Team has already been launched"));
    }
    parse_address(mint)?;
    let pool_key = parse_address(pool)?;

    if state.chain.account_owner(&pool_key).await?.is_none() {
        tracing::warn!(team = %team.id, pool, "pool account missing on chain");
        return Err(ApiError::Detailed {
            status: StatusCode::BAD_REQUEST,
            message: "Pool verification failed. The pool account was not found on-chain.".into(),
            details: json!({ "poolAddress": pool }),
        });
    }

    let team = state
        .store
        .mark_team_live(
            team.id,
            TeamLaunch {
                team_mint: mint.to_string(),
                pool_address: pool.to_string(),
                bonding_curve_address: curve.to_string(),
                metadata_uri: uri.to_string(),
                launch_tx: signature.to_string(),
                logo_url: present(&body.logo_url).map(str::to_string),
            },
        )
        .await
        .map_err(|e| ApiError::internal("Failed to update team record", e))?
        .ok_or_else(|| ApiError::bad_request("Team has already been launched"))?;
    tracing::info!(team = %team.id, mint, pool, "team launched");

    Ok(Json(json!({ "success": true, "team": team })))
}

// ===== STAKING =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRequest {
    staker_wallet: Option<String>,
    amount: Option<f64>,
    lock_duration_secs: Option<u64>,
}

pub async fn stake(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StakeRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(wallet), Some(amount)) = (present(&body.staker_wallet), body.amount) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let team = load_team(&state, &id).await?;
    if team.status != TeamStatus::Live {
        return Err(ApiError::bad_request("Team token not launched"));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::bad_request("Stake amount must be positive"));
    }
    parse_address(wallet)?;

    let stake = state.store.add_stake(team.id, wallet, amount).await?;
    let weight = calculate_stake_weight(
        body.lock_duration_secs.unwrap_or(0),
        &WeightSchedule::default(),
    );
    tracing::info!(team = %team.id, wallet, amount, "stake recorded");

    Ok(Json(json!({ "success": true, "stake": stake, "weight": weight })))
}

pub async fn stake_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let team = load_team(&state, &id).await?;
    let Some(mint) = team.team_mint.as_deref() else {
        return Err(ApiError::bad_request("Team token not launched"));
    };

    if let Some(address) = &team.stake_pool_address {
        return Ok(Json(json!({
            "stakePoolAddress": address,
            "isCreated": true,
            "teamMint": mint,
            "totalStaked": team.total_staked,
        })));
    }

    let derived = derive_stake_pool(&state, &team, mint, 0)?;
    Ok(Json(json!({
        "stakePoolAddress": derived.to_string(),
        "isCreated": false,
        "teamMint": mint,
    })))
}

/// Streamflow pool PDA of the team mint, with the team creator as authority.
fn derive_stake_pool(
    state: &AppState,
    team: &Team,
    mint: &str,
    nonce: u8,
) -> ApiResult<solana_sdk::pubkey::Pubkey> {
    let authority = team
        .creator_wallet
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Team has no creator wallet"))?;
    Ok(pda::stake_pool(
        &state.settings.staking_program_id,
        &parse_address(mint)?,
        &parse_address(authority)?,
        nonce,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStakePoolRequest {
    actor_wallet: Option<String>,
    #[serde(default)]
    nonce: u8,
    max_weight: Option<f64>,
    min_duration: Option<u64>,
    max_duration: Option<u64>,
}

/// Registers the team's Streamflow pool once its creator has created it
/// on chain.
pub async fn create_stake_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CreateStakePoolRequest>,
) -> ApiResult<Json<Value>> {
    let admin = require_admin(&state, present(&body.actor_wallet)).await?;
    let team = load_team(&state, &id).await?;
    let Some(mint) = team.team_mint.clone() else {
        return Err(ApiError::bad_request("Team token not launched yet"));
    };
    if team.stake_pool_address.is_some() {
        return Err(ApiError::bad_request("Stake pool already exists for this team"));
    }

    let defaults = WeightSchedule::default();
    let schedule = WeightSchedule {
        min_duration_secs: body.min_duration.unwrap_or(defaults.min_duration_secs),
        max_duration_secs: body.max_duration.unwrap_or(defaults.max_duration_secs),
        max_weight: body.max_weight.unwrap_or(defaults.max_weight),
    };
    if schedule.min_duration_secs >= schedule.max_duration_secs || schedule.max_weight < 1.0 {
        return Err(ApiError::bad_request("Invalid stake weight schedule"));
    }

    let address = derive_stake_pool(&state, &team, &mint, body.nonce)?;
    match state.chain.account_owner(&address).await? {
        Some(owner) if owner == state.settings.staking_program_id => {}
        _ => {
            return Err(ApiError::Detailed {
                status: StatusCode::BAD_REQUEST,
                message: "Stake pool account not found on-chain. The team creator must create it first."
                    .into(),
                details: json!({ "stakePoolAddress": address.to_string() }),
            })
        }
    }

    let address = address.to_string();
    state
        .store
        .set_stake_pool(team.id, &address)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))?;
    state
        .store
        .append_audit_log(NewAuditLogEntry {
            actor_wallet: admin.wallet_address.clone(),
            action: "register_stake_pool".into(),
            target_type: "team".into(),
            target_id: team.id.to_string(),
            payload: json!({ "stakePoolAddress": address, "nonce": body.nonce, "schedule": schedule }),
        })
        .await?;
    tracing::info!(team = %team.id, pool = %address, "stake pool registered");

    Ok(Json(json!({
        "success": true,
        "stakePoolAddress": address,
        "weightSchedule": schedule,
    })))
}
