//! Persistence for every table the API reads or writes.
//!
//! Both backends give each method the atomicity of a single SQL statement
//! (or transaction), so capacity checks, duplicate checks and completion
//! checks never race with concurrent requests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Duplicate,
    /// A transaction signature may back one payment only.
    #[error("transaction signature already used")]
    SignatureInUse,
    #[error("capacity reached")]
    Full,
    #[error("registration closed")]
    Closed,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // --- tournaments ---
    async fn insert_tournament(&self, new: NewTournament) -> StoreResult<Tournament>;
    async fn get_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>>;
    async fn find_tournament_by_challonge_id(
        &self,
        challonge_id: &str,
    ) -> StoreResult<Option<Tournament>>;
    /// Marks the tournament completed. Returns `None` when it already was.
    async fn complete_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>>;
    async fn count_active_tournaments(&self) -> StoreResult<i64>;

    // --- participations ---
    async fn find_participation(
        &self,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<Participation>>;
    /// Reserves a seat and records the participation in one step.
    /// Fails with `Full`, `Closed`, `Duplicate`, `SignatureInUse` or
    /// `NotFound`.
    async fn register_participant(&self, new: NewParticipation) -> StoreResult<Participation>;
    async fn list_participations(&self, tournament: Uuid) -> StoreResult<Vec<Participation>>;
    async fn list_wallet_participations(&self, wallet: &str) -> StoreResult<Vec<Participation>>;
    async fn award_placement(
        &self,
        participation: Uuid,
        placement: i32,
        prize_amount: f64,
    ) -> StoreResult<()>;
    async fn completed_prize_total(&self) -> StoreResult<f64>;
    async fn participation_counts_by_game(&self, limit: i64) -> StoreResult<Vec<GameCount>>;

    // --- arena wagers ---
    async fn insert_wager_tournament(
        &self,
        new: NewWagerTournament,
    ) -> StoreResult<WagerTournament>;
    async fn get_wager_tournament(&self, id: Uuid) -> StoreResult<Option<WagerTournament>>;
    async fn list_wager_tournaments(&self) -> StoreResult<Vec<WagerTournament>>;
    async fn find_wager_participant(
        &self,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<WagerParticipant>>;
    async fn list_wager_participants(&self, tournament: Uuid)
        -> StoreResult<Vec<WagerParticipant>>;
    /// Reserves a seat, records the wager and recomputes the pot split.
    /// Fails like `register_participant`.
    async fn join_wager_tournament(
        &self,
        new: NewWagerParticipant,
    ) -> StoreResult<(WagerParticipant, WagerTournament)>;
    /// Settles the tournament once. Returns `None` when it was already
    /// completed.
    async fn complete_wager_tournament(
        &self,
        id: Uuid,
        completion: WagerCompletion,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<WagerTournament>>;

    // --- teams ---
    async fn insert_team(&self, new: NewTeam) -> StoreResult<Team>;
    async fn get_team(&self, id: Uuid) -> StoreResult<Option<Team>>;
    async fn list_teams(&self) -> StoreResult<Vec<Team>>;
    /// Records the launch of a draft team. `None` if the team is missing or already live.
    async fn mark_team_live(&self, id: Uuid, launch: TeamLaunch) -> StoreResult<Option<Team>>;
    async fn set_stake_pool(&self, id: Uuid, address: &str) -> StoreResult<Option<Team>>;
    async fn record_team_win(&self, id: Uuid, payout: f64) -> StoreResult<Option<Team>>;
    async fn top_teams(&self, game: &str, limit: i64) -> StoreResult<Vec<Team>>;
    /// Adds `amount` to the wallet's stake and to the team total.
    async fn add_stake(&self, team: Uuid, wallet: &str, amount: f64) -> StoreResult<TeamStake>;
    async fn list_stakes(&self, team: Uuid) -> StoreResult<Vec<TeamStake>>;

    // --- profiles ---
    async fn get_profile(&self, wallet: &str) -> StoreResult<Option<PlayerProfile>>;
    async fn insert_profile(&self, new: NewPlayerProfile) -> StoreResult<PlayerProfile>;
    async fn count_profiles(&self) -> StoreResult<i64>;
    async fn win_loss_totals(&self) -> StoreResult<WinLossTotals>;
    async fn top_players(&self, game: &str, limit: i64) -> StoreResult<Vec<PlayerProfile>>;

    // --- audit log ---
    async fn append_audit_log(&self, entry: NewAuditLogEntry) -> StoreResult<AuditLogEntry>;
    async fn list_audit_log(&self, target_id: &str) -> StoreResult<Vec<AuditLogEntry>>;

    // --- payment intents ---
    async fn insert_payment_intent(&self, new: NewPaymentIntent) -> StoreResult<PaymentIntent>;
    async fn get_payment_intent(&self, id: Uuid) -> StoreResult<Option<PaymentIntent>>;
    /// Latest `pending` or `paid` intent for a wallet and tournament.
    async fn find_open_intent(
        &self,
        kind: PaymentKind,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<PaymentIntent>>;
    /// Fails with `SignatureInUse` when another intent holds the signature.
    async fn update_payment_intent(
        &self,
        id: Uuid,
        update: PaymentIntentUpdate,
    ) -> StoreResult<PaymentIntent>;
    async fn list_payment_intents(&self, status: PaymentStatus)
        -> StoreResult<Vec<PaymentIntent>>;
}
