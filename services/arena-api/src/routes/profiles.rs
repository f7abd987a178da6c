use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{present, JsonBody};
use crate::chain::parse_address;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewPlayerProfile, PlayerProfile, ProfileRole};
use crate::state::AppState;
use crate::store::StoreError;
use crate::wallet::verify_message_signature;

const MAX_USERNAME_LEN: usize = 32;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    wallet_address: Option<String>,
    username: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    #[serde(default)]
    favorite_games: Vec<String>,
    profile_image_url: Option<String>,
    message: Option<String>,
    signature: Option<String>,
}

/// Creates a profile for a wallet that signed the profile message.
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateProfileRequest>,
) -> ApiResult<Json<PlayerProfile>> {
    let (Some(wallet), Some(username), Some(message), Some(signature)) = (
        present(&body.wallet_address),
        present(&body.username),
        body.message.as_deref(),
        present(&body.signature),
    ) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }

    let owner = parse_address(wallet)?;
    let names_signer = message.contains(&format!("Wallet: {wallet}"))
        && message.contains(&format!("Username: {username}"));
    if !names_signer || !verify_message_signature(&owner, message.as_bytes(), signature) {
        tracing::warn!(wallet, "profile signature rejected");
        return Err(ApiError::bad_request("Invalid wallet signature"));
    }

    let profile = state
        .store
        .insert_profile(NewPlayerProfile {
            wallet_address: wallet.to_string(),
            username: username.to_string(),
            bio: present(&body.bio).map(str::to_string),
            location: present(&body.location).map(str::to_string),
            favorite_games: body.favorite_games.clone(),
            profile_image_url: present(&body.profile_image_url).map(str::to_string),
            signature: signature.to_string(),
            role: ProfileRole::Player,
        })
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => ApiError::bad_request("Profile already exists"),
            other => other.into(),
        })?;
    tracing::info!(wallet, username, "profile created");
    Ok(Json(profile))
}

pub async fn get(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<Json<PlayerProfile>> {
    state
        .store
        .get_profile(&wallet)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Player profile not found"))
}

/// Tournament history for the dashboard, newest first.
pub async fn participations(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<Json<Value>> {
    let participations = state.store.list_wallet_participations(&wallet).await?;
    let count = participations.len();
    Ok(Json(json!({ "participations": participations, "count": count })))
}
