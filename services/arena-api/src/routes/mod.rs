//! HTTP routes, one module per route group.

mod admin;
mod arena;
mod arena_wager;
mod leaderboards;
mod profiles;
mod stats;
mod teams;
mod tournaments;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::PlayerProfile;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // tournaments
        .route(
            "/api/tournaments",
            get(tournaments::list).post(tournaments::create),
        )
        .route("/api/tournaments/finalize", post(tournaments::finalize))
        .route("/api/tournaments/:id", get(tournaments::detail))
        .route("/api/tournaments/:id/participants", get(tournaments::participants))
        .route("/api/tournaments/:id/join/intent", post(tournaments::join_intent))
        .route("/api/tournaments/:id/join", post(tournaments::join))
        .route("/api/tournaments/:id/claim", post(tournaments::claim))
        // arena wagers
        .route(
            "/api/arena-wager/tournaments",
            get(arena_wager::list).post(arena_wager::create),
        )
        .route(
            "/api/arena-wager/tournaments/:id/join/intent",
            post(arena_wager::join_intent),
        )
        .route("/api/arena-wager/tournaments/:id/join", post(arena_wager::join))
        .route(
            "/api/arena-wager/tournaments/:id/complete",
            post(arena_wager::complete),
        )
        .route("/api/arena/balance/:wallet", get(arena::balance))
        .route("/api/arena/burn-transaction", post(arena::burn_transaction))
        // teams
        .route("/api/teams", get(teams::list).post(teams::create))
        .route("/api/teams/:id", get(teams::detail))
        .route(
            "/api/teams/:id/launch",
            post(teams::launch).put(teams::confirm_launch),
        )
        .route("/api/teams/:id/stakes", post(teams::stake))
        .route(
            "/api/teams/:id/stake-pool",
            get(teams::stake_pool).post(teams::create_stake_pool),
        )
        // admin, stats, profiles
        .route("/api/admin/record-win", post(admin::record_win))
        .route("/api/stats", get(stats::platform_stats))
        .route("/api/profiles", post(profiles::create))
        .route("/api/profiles/:wallet", get(profiles::get))
        .route(
            "/api/profiles/:wallet/participations",
            get(profiles::participations),
        )
        .route("/api/leaderboards", get(leaderboards::leaderboards))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `Json` whose rejections render as a 400 `{"error": ...}` body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{what} not found")))
}

/// Non-empty trimmed value of an optional request field.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves the acting wallet to an admin profile.
async fn require_admin(state: &AppState, actor: Option<&str>) -> ApiResult<PlayerProfile> {
    let actor = actor.ok_or_else(|| ApiError::Unauthorized("Unauthorized".into()))?;
    match state.store.get_profile(actor).await? {
        Some(profile) if profile.is_admin() => Ok(profile),
        _ => {
            tracing::warn!(actor, "admin action refused");
            Err(ApiError::Forbidden("Unauthorized - admin access required".into()))
        }
    }
}

/// Rounds to two decimals for display amounts.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Replaces the message of a 500 with a route-specific one.
fn internal_as(message: &'static str) -> impl Fn(ApiError) -> ApiError {
    move |err| match err {
        ApiError::Internal(_) => ApiError::Internal(message.into()),
        other => other,
    }
}
