use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::chain::ChainError;
use crate::challonge::ChallongeError;
use crate::launch::LaunchError;
use crate::storage::StorageError;
use crate::store::StoreError;
use crate::wallet::WalletError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by every route handler. Renders as `{"error": msg}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotImplemented(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
    /// Error body with extra fields next to `error`.
    #[error("{message}")]
    Detailed {
        status: StatusCode,
        message: String,
        details: Value,
    },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Log `source` and hide it behind a generic 500 message.
    pub fn internal(msg: impl Into<String>, source: impl Display) -> Self {
        let msg = msg.into();
        tracing::error!(error = %source, "{msg}");
        Self::Internal(msg)
    }

    /// Log `source` and surface a 502 for a failing upstream service.
    pub fn upstream(msg: impl Into<String>, source: impl Display) -> Self {
        let msg = msg.into();
        tracing::error!(error = %source, "{msg}");
        Self::Upstream(msg)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Detailed { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Detailed {
                message,
                mut details,
                ..
            } => {
                if let Some(map) = details.as_object_mut() {
                    map.insert("error".into(), Value::String(message));
                    details
                } else {
                    json!({ "error": message, "details": details })
                }
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => {
                Self::bad_request("Already registered for this tournament")
            }
            StoreError::SignatureInUse => {
                Self::bad_request("Transaction signature already used for another payment")
            }
            StoreError::Full => Self::bad_request("Tournament is full"),
            StoreError::Closed => Self::bad_request("Tournament registration is closed"),
            StoreError::NotFound => Self::not_found("Record not found"),
            other => Self::internal("Database error", other),
        }
    }
}

impl From<ChallongeError> for ApiError {
    fn from(err: ChallongeError) -> Self {
        Self::upstream("Bracket service error", err)
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidAddress(addr) => {
                Self::bad_request(format!("Invalid address: {addr}"))
            }
            other => Self::internal("Solana RPC error", other),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::internal("Storage error", err)
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UserRejected => Self::bad_request("Transaction rejected by wallet"),
            other => Self::internal("Wallet error", other),
        }
    }
}

impl From<LaunchError> for ApiError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::Invalid(msg) => Self::BadRequest(msg),
            other => Self::internal("Failed to prepare team token launch", other),
        }
    }
}
