use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{present, JsonBody};
use crate::arena_token::{create_burn_transaction, get_arena_balance};
use crate::chain::parse_address;
use crate::error::{ApiError, ApiResult};
use crate::payments::encode_transaction;
use crate::state::AppState;

pub async fn balance(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<Json<Value>> {
    let owner = parse_address(&wallet)?;
    let balance = get_arena_balance(state.chain.as_ref(), &state.settings.arena_mint, &owner).await;
    Ok(Json(json!({ "wallet": wallet, "balance": balance })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnRequest {
    wallet_address: Option<String>,
    amount: Option<f64>,
}

pub async fn burn_transaction(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<BurnRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(wallet), Some(amount)) = (present(&body.wallet_address), body.amount) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::bad_request("Burn amount must be positive"));
    }
    let owner = parse_address(wallet)?;
    let (tx, blockhash, last_valid_block_height) =
        create_burn_transaction(state.chain.as_ref(), &state.settings.arena_mint, &owner, amount)
            .await?;

    Ok(Json(json!({
        "transaction": encode_transaction(&tx)?,
        "blockhash": blockhash.to_string(),
        "lastValidBlockHeight": last_valid_block_height,
    })))
}
