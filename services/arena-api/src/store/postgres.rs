use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::arena_token::{BURN_PERCENTAGE, GIVEAWAY_PERCENTAGE, WINNER_PERCENTAGE};
use crate::models::*;

/// Postgres (Supabase) backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Unique indexes over transaction signatures, see 0002_signature_uniqueness.sql.
const SIGNATURE_INDEXES: [&str; 3] = [
    "payment_intents_signature_key",
    "tournament_participations_payment_signature_key",
    "arena_wager_participants_wager_tx_signature_key",
];

fn map_unique(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            match db.constraint() {
                Some(name) if SIGNATURE_INDEXES.contains(&name) => StoreError::SignatureInUse,
                _ => StoreError::Duplicate,
            }
        }
        _ => StoreError::Database(err),
    }
}

/// Explains why a guarded capacity update touched no row.
async fn capacity_failure(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    id: Uuid,
) -> StoreError {
    let sql = format!(
        "SELECT status, current_participants, max_participants FROM {table} WHERE id = $1"
    );
    let row: Result<Option<(TournamentStatus, i32, i32)>, _> =
        sqlx::query_as(&sql).bind(id).fetch_optional(&mut **tx).await;
    match row {
        Ok(None) => StoreError::NotFound,
        Ok(Some((status, _, _))) if !status.accepts_registrations() => StoreError::Closed,
        Ok(Some(_)) => StoreError::Full,
        Err(err) => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    // --- tournaments ---

    async fn insert_tournament(&self, new: NewTournament) -> StoreResult<Tournament> {
        let row = sqlx::query_as::<_, Tournament>(
            "INSERT INTO tournaments
                (challonge_id, name, game, entry_fee_sol, max_participants, status, start_time, banner_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(new.challonge_id)
        .bind(new.name)
        .bind(new.game)
        .bind(new.entry_fee_sol)
        .bind(new.max_participants)
        .bind(new.status)
        .bind(new.start_time)
        .bind(new.banner_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query_as::<_, Tournament>("SELECT * FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_tournament_by_challonge_id(
        &self,
        challonge_id: &str,
    ) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query_as::<_, Tournament>(
            "SELECT * FROM tournaments WHERE challonge_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(challonge_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn complete_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query_as::<_, Tournament>(
            "UPDATE tournaments SET status = 'completed'
             WHERE id = $1 AND status <> 'completed'
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        if row.is_none() && self.get_tournament(id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(row)
    }

    async fn count_active_tournaments(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tournaments WHERE status IN ('open', 'in_progress')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // --- participations ---

    async fn find_participation(
        &self,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<Participation>> {
        let row = sqlx::query_as::<_, Participation>(
            "SELECT * FROM tournament_participations
             WHERE tournament_uuid = $1 AND wallet_address = $2",
        )
        .bind(tournament)
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn register_participant(&self, new: NewParticipation) -> StoreResult<Participation> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM tournament_participations
                            WHERE tournament_uuid = $1 AND wallet_address = $2)",
        )
        .bind(new.tournament_uuid)
        .bind(&new.wallet_address)
        .fetch_one(&mut *tx)
        .await?;
        if exists {
            return Err(StoreError::Duplicate);
        }

        // --- reserve a seat ---
        let reserved = sqlx::query_scalar::<_, Uuid>(
            "UPDATE tournaments SET current_participants = current_participants + 1
             WHERE id = $1
               AND status IN ('open', 'registration')
               AND current_participants < max_participants
             RETURNING id",
        )
        .bind(new.tournament_uuid)
        .fetch_optional(&mut *tx)
        .await?;
        if reserved.is_none() {
            return Err(capacity_failure(&mut tx, "tournaments", new.tournament_uuid).await);
        }

        // --- record participation ---
        let row = sqlx::query_as::<_, Participation>(
            "INSERT INTO tournament_participations
                (tournament_uuid, player_id, wallet_address, tournament_id, tournament_name, game,
                 entry_fee, in_game_username, discord_handle, team_name, payment_signature)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(new.tournament_uuid)
        .bind(new.player_id)
        .bind(new.wallet_address)
        .bind(new.tournament_id)
        .bind(new.tournament_name)
        .bind(new.game)
        .bind(new.entry_fee)
        .bind(new.in_game_username)
        .bind(new.discord_handle)
        .bind(new.team_name)
        .bind(new.payment_signature)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique)?;

        tx.commit().await?;
        Ok(row)
    }

    async fn list_participations(&self, tournament: Uuid) -> StoreResult<Vec<Participation>> {
        let rows = sqlx::query_as::<_, Participation>(
            "SELECT * FROM tournament_participations
             WHERE tournament_uuid = $1 ORDER BY registered_at ASC",
        )
        .bind(tournament)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_wallet_participations(&self, wallet: &str) -> StoreResult<Vec<Participation>> {
        let rows = sqlx::query_as::<_, Participation>(
            "SELECT * FROM tournament_participations
             WHERE wallet_address = $1 ORDER BY registered_at DESC",
        )
        .bind(wallet)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn award_placement(
        &self,
        participation: Uuid,
        placement: i32,
        prize_amount: f64,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE tournament_participations
             SET placement = $2, prize_amount = $3, status = 'completed'
             WHERE id = $1",
        )
        .bind(participation)
        .bind(placement)
        .bind(prize_amount)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn completed_prize_total(&self) -> StoreResult<f64> {
        let total = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(prize_amount), 0)::DOUBLE PRECISION
             FROM tournament_participations WHERE status = 'completed'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn participation_counts_by_game(&self, limit: i64) -> StoreResult<Vec<GameCount>> {
        let rows = sqlx::query_as::<_, GameCount>(
            "SELECT game, COUNT(*) AS count FROM tournament_participations
             GROUP BY game ORDER BY count DESC, game ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- arena wagers ---

    async fn insert_wager_tournament(
        &self,
        new: NewWagerTournament,
    ) -> StoreResult<WagerTournament> {
        let row = sqlx::query_as::<_, WagerTournament>(
            "INSERT INTO arena_wager_tournaments
                (name, game, entry_wager, max_participants, escrow_wallet, created_by_wallet,
                 start_time, match_format, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'registration')
             RETURNING *",
        )
        .bind(new.name)
        .bind(new.game)
        .bind(new.entry_wager)
        .bind(new.max_participants)
        .bind(new.escrow_wallet)
        .bind(new.created_by_wallet)
        .bind(new.start_time)
        .bind(new.match_format)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_wager_tournament(&self, id: Uuid) -> StoreResult<Option<WagerTournament>> {
        let row = sqlx::query_as::<_, WagerTournament>(
            "SELECT * FROM arena_wager_tournaments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_wager_tournaments(&self) -> StoreResult<Vec<WagerTournament>> {
        let rows = sqlx::query_as::<_, WagerTournament>(
            "SELECT * FROM arena_wager_tournaments ORDER BY start_time ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_wager_participant(
        &self,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<WagerParticipant>> {
        let row = sqlx::query_as::<_, WagerParticipant>(
            "SELECT * FROM arena_wager_participants
             WHERE tournament_id = $1 AND player_wallet = $2",
        )
        .bind(tournament)
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_wager_participants(
        &self,
        tournament: Uuid,
    ) -> StoreResult<Vec<WagerParticipant>> {
        let rows = sqlx::query_as::<_, WagerParticipant>(
            "SELECT * FROM arena_wager_participants
             WHERE tournament_id = $1 ORDER BY joined_at ASC",
        )
        .bind(tournament)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn join_wager_tournament(
        &self,
        new: NewWagerParticipant,
    ) -> StoreResult<(WagerParticipant, WagerTournament)> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM arena_wager_participants
                            WHERE tournament_id = $1 AND player_wallet = $2)",
        )
        .bind(new.tournament_id)
        .bind(&new.player_wallet)
        .fetch_one(&mut *tx)
        .await?;
        if exists {
            return Err(StoreError::Duplicate);
        }

        // --- reserve a seat and grow the pot ---
        let tournament = sqlx::query_as::<_, WagerTournament>(
            "UPDATE arena_wager_tournaments SET
                current_participants = current_participants + 1,
                total_pot = total_pot + $2,
                winner_amount = (total_pot + $2) * $3,
                giveaway_amount = (total_pot + $2) * $4,
                burn_amount = (total_pot + $2) * $5,
                updated_at = now()
             WHERE id = $1
               AND status IN ('open', 'registration')
               AND current_participants < max_participants
             RETURNING *",
        )
        .bind(new.tournament_id)
        .bind(new.wager_amount)
        .bind(WINNER_PERCENTAGE / 100.0)
        .bind(GIVEAWAY_PERCENTAGE / 100.0)
        .bind(BURN_PERCENTAGE / 100.0)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(tournament) = tournament else {
            return Err(capacity_failure(&mut tx, "arena_wager_tournaments", new.tournament_id).await);
        };

        // --- record wager ---
        let participant = sqlx::query_as::<_, WagerParticipant>(
            "INSERT INTO arena_wager_participants
                (tournament_id, player_wallet, player_id, wager_amount, wager_tx_signature,
                 in_game_username, discord_handle, team_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(new.tournament_id)
        .bind(new.player_wallet)
        .bind(new.player_id)
        .bind(new.wager_amount)
        .bind(new.wager_tx_signature)
        .bind(new.in_game_username)
        .bind(new.discord_handle)
        .bind(new.team_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique)?;

        tx.commit().await?;
        Ok((participant, tournament))
    }

    async fn complete_wager_tournament(
        &self,
        id: Uuid,
        completion: WagerCompletion,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<WagerTournament>> {
        let mut tx = self.pool.begin().await?;

        let tournament = sqlx::query_as::<_, WagerTournament>(
            "UPDATE arena_wager_tournaments SET
                status = 'completed',
                winner_wallet = $2,
                prize_distributed_at = $3,
                burn_tx_signature = $4,
                updated_at = $3
             WHERE id = $1 AND status <> 'completed'
             RETURNING *",
        )
        .bind(id)
        .bind(&completion.winner_wallet)
        .bind(at)
        .bind(&completion.burn_tx_signature)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(tournament) = tournament else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM arena_wager_tournaments WHERE id = $1)",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            return if exists { Ok(None) } else { Err(StoreError::NotFound) };
        };

        sqlx::query(
            "UPDATE arena_wager_participants
             SET status = 'winner', placement = 1, prize_received = $3
             WHERE tournament_id = $1 AND player_wallet = $2",
        )
        .bind(id)
        .bind(&completion.winner_wallet)
        .bind(tournament.winner_amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(tournament))
    }

    // --- teams ---

    async fn insert_team(&self, new: NewTeam) -> StoreResult<Team> {
        let row = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (name, symbol, description, logo_url, game, region, creator_wallet)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(new.name)
        .bind(new.symbol)
        .bind(new.description)
        .bind(new.logo_url)
        .bind(new.game)
        .bind(new.region)
        .bind(new.creator_wallet)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query_as::<_, Team>("SELECT * FROM teams ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn mark_team_live(&self, id: Uuid, launch: TeamLaunch) -> StoreResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            "UPDATE teams SET
                team_mint = $2,
                pool_address = $3,
                bonding_curve_address = $4,
                metadata_uri = $5,
                launch_tx = $6,
                logo_url = COALESCE($7, logo_url),
                status = 'live',
                updated_at = now()
             WHERE id = $1 AND status = 'draft'
             RETURNING *",
        )
        .bind(id)
        .bind(launch.team_mint)
        .bind(launch.pool_address)
        .bind(launch.bonding_curve_address)
        .bind(launch.metadata_uri)
        .bind(launch.launch_tx)
        .bind(launch.logo_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_stake_pool(&self, id: Uuid, address: &str) -> StoreResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            "UPDATE teams SET stake_pool_address = $2, updated_at = now()
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn record_team_win(&self, id: Uuid, payout: f64) -> StoreResult<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            "UPDATE teams SET
                total_wins = total_wins + 1,
                total_earnings = total_earnings + $2,
                updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(payout)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn top_teams(&self, game: &str, limit: i64) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query_as::<_, Team>(
            "SELECT * FROM teams WHERE game = $1 ORDER BY total_wins DESC LIMIT $2",
        )
        .bind(game)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_stake(&self, team: Uuid, wallet: &str, amount: f64) -> StoreResult<TeamStake> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE teams SET total_staked = total_staked + $2, updated_at = now() WHERE id = $1",
        )
        .bind(team)
        .bind(amount)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        let stake = sqlx::query_as::<_, TeamStake>(
            "INSERT INTO team_token_stakes (team_id, staker_wallet, amount)
             VALUES ($1, $2, $3)
             ON CONFLICT (team_id, staker_wallet) DO UPDATE SET
                amount = team_token_stakes.amount + EXCLUDED.amount,
                updated_at = now()
             RETURNING *",
        )
        .bind(team)
        .bind(wallet)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stake)
    }

    async fn list_stakes(&self, team: Uuid) -> StoreResult<Vec<TeamStake>> {
        let rows = sqlx::query_as::<_, TeamStake>(
            "SELECT * FROM team_token_stakes WHERE team_id = $1 ORDER BY amount DESC",
        )
        .bind(team)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- profiles ---

    async fn get_profile(&self, wallet: &str) -> StoreResult<Option<PlayerProfile>> {
        let row = sqlx::query_as::<_, PlayerProfile>(
            "SELECT * FROM player_profiles WHERE wallet_address = $1",
        )
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_profile(&self, new: NewPlayerProfile) -> StoreResult<PlayerProfile> {
        let row = sqlx::query_as::<_, PlayerProfile>(
            "INSERT INTO player_profiles
                (wallet_address, username, bio, location, favorite_games, profile_image_url,
                 signature, role)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(new.wallet_address)
        .bind(new.username)
        .bind(new.bio)
        .bind(new.location)
        .bind(new.favorite_games)
        .bind(new.profile_image_url)
        .bind(new.signature)
        .bind(new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(row)
    }

    async fn count_profiles(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM player_profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn win_loss_totals(&self) -> StoreResult<WinLossTotals> {
        let totals = sqlx::query_as::<_, WinLossTotals>(
            "SELECT COALESCE(SUM(wins), 0)::BIGINT AS wins,
                    COALESCE(SUM(losses), 0)::BIGINT AS losses
             FROM player_profiles",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    async fn top_players(&self, game: &str, limit: i64) -> StoreResult<Vec<PlayerProfile>> {
        let rows = sqlx::query_as::<_, PlayerProfile>(
            "SELECT * FROM player_profiles WHERE $1 = ANY(favorite_games)
             ORDER BY wins DESC LIMIT $2",
        )
        .bind(game)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- audit log ---

    async fn append_audit_log(&self, entry: NewAuditLogEntry) -> StoreResult<AuditLogEntry> {
        let row = sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO admin_audit_log (actor_wallet, action, target_type, target_id, payload)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(entry.actor_wallet)
        .bind(entry.action)
        .bind(entry.target_type)
        .bind(entry.target_id)
        .bind(entry.payload)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_audit_log(&self, target_id: &str) -> StoreResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM admin_audit_log WHERE target_id = $1 ORDER BY created_at ASC",
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- payment intents ---

    async fn insert_payment_intent(&self, new: NewPaymentIntent) -> StoreResult<PaymentIntent> {
        let row = sqlx::query_as::<_, PaymentIntent>(
            "INSERT INTO payment_intents (kind, tournament_id, wallet_address, amount, escrow_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new.kind)
        .bind(new.tournament_id)
        .bind(new.wallet_address)
        .bind(new.amount)
        .bind(new.escrow_address)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_payment_intent(&self, id: Uuid) -> StoreResult<Option<PaymentIntent>> {
        let row = sqlx::query_as::<_, PaymentIntent>("SELECT * FROM payment_intents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_open_intent(
        &self,
        kind: PaymentKind,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<PaymentIntent>> {
        let row = sqlx::query_as::<_, PaymentIntent>(
            "SELECT * FROM payment_intents
             WHERE kind = $1 AND tournament_id = $2 AND wallet_address = $3
               AND status IN ('pending', 'paid')
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(kind)
        .bind(tournament)
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_payment_intent(
        &self,
        id: Uuid,
        update: PaymentIntentUpdate,
    ) -> StoreResult<PaymentIntent> {
        let row = sqlx::query_as::<_, PaymentIntent>(
            "UPDATE payment_intents SET
                status = COALESCE($2, status),
                signature = COALESCE($3, signature),
                registration = COALESCE($4, registration),
                updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(update.status)
        .bind(update.signature)
        .bind(update.registration)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique)?;
        row.ok_or(StoreError::NotFound)
    }

    async fn list_payment_intents(
        &self,
        status: PaymentStatus,
    ) -> StoreResult<Vec<PaymentIntent>> {
        let rows = sqlx::query_as::<_, PaymentIntent>(
            "SELECT * FROM payment_intents WHERE status = $1 ORDER BY created_at ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
