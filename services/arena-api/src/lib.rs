//! Sol Arena HTTP API: tournaments with SOL entry fees, ARENA token
//! wagers, team token launches and the dashboards built on them.

pub mod arena_token;
pub mod chain;
pub mod challonge;
pub mod config;
pub mod error;
pub mod launch;
pub mod models;
pub mod payments;
pub mod pda;
pub mod routes;
pub mod staking;
pub mod state;
pub mod storage;
pub mod store;
pub mod wallet;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
