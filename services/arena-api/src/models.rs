use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// ===== STATUSES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tournament_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Registration,
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    /// Bracket tournaments open as `open`, wager tournaments as
    /// `registration`; both accept new entrants.
    pub fn accepts_registrations(self) -> bool {
        matches!(self, Self::Open | Self::Registration)
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Registered,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "wager_participant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WagerParticipantStatus {
    Registered,
    Winner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Draft,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Player,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    SolEntry,
    ArenaWager,
}

/// Saga state of a join payment.
/// pending -> paid -> completed, or pending -> expired,
/// or paid -> refund_required when the seat can no longer be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Completed,
    Expired,
    RefundRequired,
}

// ===== TOURNAMENTS =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tournament {
    pub id: Uuid,
    pub challonge_id: Option<String>,
    pub name: String,
    pub game: String,
    pub entry_fee_sol: f64,
    pub max_participants: i32,
    pub current_participants: i32,
    pub status: TournamentStatus,
    pub start_time: DateTime<Utc>,
    pub banner_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Id used for the on-chain tournament and escrow seeds: the uuid
    /// without hyphens, which fits the 32 byte seed limit exactly.
    pub fn onchain_id(&self) -> String {
        self.id.simple().to_string()
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }
}

#[derive(Debug, Clone)]
pub struct NewTournament {
    pub challonge_id: Option<String>,
    pub name: String,
    pub game: String,
    pub entry_fee_sol: f64,
    pub max_participants: i32,
    pub status: TournamentStatus,
    pub start_time: DateTime<Utc>,
    pub banner_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participation {
    pub id: Uuid,
    pub tournament_uuid: Uuid,
    pub player_id: Option<Uuid>,
    pub wallet_address: String,
    pub tournament_id: Option<String>,
    pub tournament_name: String,
    pub game: String,
    pub entry_fee: f64,
    pub in_game_username: String,
    pub discord_handle: Option<String>,
    pub team_name: Option<String>,
    pub status: ParticipationStatus,
    pub prize_amount: Option<f64>,
    pub placement: Option<i32>,
    pub payment_signature: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipation {
    pub tournament_uuid: Uuid,
    pub player_id: Option<Uuid>,
    pub wallet_address: String,
    pub tournament_id: Option<String>,
    pub tournament_name: String,
    pub game: String,
    pub entry_fee: f64,
    pub in_game_username: String,
    pub discord_handle: Option<String>,
    pub team_name: Option<String>,
    pub payment_signature: Option<String>,
}

// ===== ARENA WAGERS =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WagerTournament {
    pub id: Uuid,
    pub name: String,
    pub game: String,
    pub entry_wager: f64,
    pub max_participants: i32,
    pub current_participants: i32,
    pub total_pot: f64,
    pub winner_amount: f64,
    pub giveaway_amount: f64,
    pub burn_amount: f64,
    pub escrow_wallet: String,
    pub created_by_wallet: String,
    pub start_time: DateTime<Utc>,
    pub match_format: String,
    pub status: TournamentStatus,
    pub winner_wallet: Option<String>,
    pub prize_distributed_at: Option<DateTime<Utc>>,
    pub burn_tx_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WagerTournament {
    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }
}

#[derive(Debug, Clone)]
pub struct NewWagerTournament {
    pub name: String,
    pub game: String,
    pub entry_wager: f64,
    pub max_participants: i32,
    pub escrow_wallet: String,
    pub created_by_wallet: String,
    pub start_time: DateTime<Utc>,
    pub match_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WagerParticipant {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub player_wallet: String,
    pub player_id: Option<Uuid>,
    pub wager_amount: f64,
    pub wager_tx_signature: String,
    pub in_game_username: String,
    pub discord_handle: Option<String>,
    pub team_name: Option<String>,
    pub status: WagerParticipantStatus,
    pub placement: Option<i32>,
    pub prize_received: Option<f64>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWagerParticipant {
    pub tournament_id: Uuid,
    pub player_wallet: String,
    pub player_id: Option<Uuid>,
    pub wager_amount: f64,
    pub wager_tx_signature: String,
    pub in_game_username: String,
    pub discord_handle: Option<String>,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WagerCompletion {
    pub winner_wallet: String,
    pub burn_tx_signature: String,
}

// ===== TEAMS =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub game: Option<String>,
    pub region: Option<String>,
    pub creator_wallet: Option<String>,
    pub team_mint: Option<String>,
    pub pool_address: Option<String>,
    pub bonding_curve_address: Option<String>,
    pub metadata_uri: Option<String>,
    pub launch_tx: Option<String>,
    pub stake_pool_address: Option<String>,
    pub total_wins: i32,
    pub total_losses: i32,
    pub total_earnings: f64,
    pub total_staked: f64,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub game: Option<String>,
    pub region: Option<String>,
    pub creator_wallet: Option<String>,
}

/// Addresses recorded once a team's bonding-curve pool is live.
#[derive(Debug, Clone)]
pub struct TeamLaunch {
    pub team_mint: String,
    pub pool_address: String,
    pub bonding_curve_address: String,
    pub metadata_uri: String,
    pub launch_tx: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamStake {
    pub id: Uuid,
    pub team_id: Uuid,
    pub staker_wallet: String,
    pub amount: f64,
    pub rewards_claimed: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ===== PROFILES =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlayerProfile {
    pub id: Uuid,
    pub wallet_address: String,
    pub username: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub favorite_games: Vec<String>,
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing)]
    pub signature: String,
    pub role: ProfileRole,
    pub wins: i32,
    pub losses: i32,
    pub total_earnings: f64,
    pub created_at: DateTime<Utc>,
}

impl PlayerProfile {
    pub fn is_admin(&self) -> bool {
        self.role == ProfileRole::Admin
    }
}

#[derive(Debug, Clone)]
pub struct NewPlayerProfile {
    pub wallet_address: String,
    pub username: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub favorite_games: Vec<String>,
    pub profile_image_url: Option<String>,
    pub signature: String,
    pub role: ProfileRole,
}

// ===== AUDIT LOG =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_wallet: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
    pub actor_wallet: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub payload: Value,
}

// ===== PAYMENT INTENTS =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentIntent {
    pub id: Uuid,
    pub kind: PaymentKind,
    pub tournament_id: Uuid,
    pub wallet_address: String,
    /// Lamports for SOL entries, ARENA base units for wagers.
    pub amount: i64,
    pub escrow_address: String,
    pub signature: Option<String>,
    pub status: PaymentStatus,
    /// Join request replayed by reconciliation once the payment is paid.
    pub registration: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub kind: PaymentKind,
    pub tournament_id: Uuid,
    pub wallet_address: String,
    pub amount: i64,
    pub escrow_address: String,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentIntentUpdate {
    pub status: Option<PaymentStatus>,
    pub signature: Option<String>,
    pub registration: Option<Value>,
}

// ===== AGGREGATES =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GameCount {
    pub game: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct WinLossTotals {
    pub wins: i64,
    pub losses: i64,
}
