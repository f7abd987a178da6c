use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::arena_token::calculate_prize_distribution;
use crate::models::*;

#[derive(Default)]
struct Tables {
    tournaments: Vec<Tournament>,
    participations: Vec<Participation>,
    wager_tournaments: Vec<WagerTournament>,
    wager_participants: Vec<WagerParticipant>,
    teams: Vec<Team>,
    stakes: Vec<TeamStake>,
    profiles: Vec<PlayerProfile>,
    audit_log: Vec<AuditLogEntry>,
    intents: Vec<PaymentIntent>,
}

/// In-process store for tests and local runs. Every method takes the
/// lock once, so each call is atomic like its SQL counterpart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile with an explicit role, e.g. an admin.
    pub async fn put_profile(&self, profile: PlayerProfile) {
        let mut t = self.tables.write().await;
        t.profiles.retain(|p| p.wallet_address != profile.wallet_address);
        t.profiles.push(profile);
    }

    pub async fn put_team(&self, team: Team) {
        let mut t = self.tables.write().await;
        t.teams.retain(|existing| existing.id != team.id);
        t.teams.push(team);
    }
}

#[async_trait]
impl Store for MemoryStore {
    // --- tournaments ---

    async fn insert_tournament(&self, new: NewTournament) -> StoreResult<Tournament> {
        let tournament = Tournament {
            id: Uuid::new_v4(),
            challonge_id: new.challonge_id,
            name: new.name,
            game: new.game,
            entry_fee_sol: new.entry_fee_sol,
            max_participants: new.max_participants,
            current_participants: 0,
            status: new.status,
            start_time: new.start_time,
            banner_url: new.banner_url,
            created_at: Utc::now(),
        };
        self.tables.write().await.tournaments.push(tournament.clone());
        Ok(tournament)
    }

    async fn get_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let t = self.tables.read().await;
        Ok(t.tournaments.iter().find(|x| x.id == id).cloned())
    }

    async fn find_tournament_by_challonge_id(
        &self,
        challonge_id: &str,
    ) -> StoreResult<Option<Tournament>> {
        let t = self.tables.read().await;
        Ok(t.tournaments
            .iter()
            .find(|x| x.challonge_id.as_deref() == Some(challonge_id))
            .cloned())
    }

    async fn complete_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let mut t = self.tables.write().await;
        let tournament = t
            .tournaments
            .iter_mut()
            .find(|x| x.id == id)
            .ok_or(StoreError::NotFound)?;
        if tournament.status == TournamentStatus::Completed {
            return Ok(None);
        }
        tournament.status = TournamentStatus::Completed;
        Ok(Some(tournament.clone()))
    }

    async fn count_active_tournaments(&self) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.tournaments.iter().filter(|x| x.status.is_active()).count() as i64)
    }

    // --- participations ---

    async fn find_participation(
        &self,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<Participation>> {
        let t = self.tables.read().await;
        Ok(t.participations
            .iter()
            .find(|p| p.tournament_uuid == tournament && p.wallet_address == wallet)
            .cloned())
    }

    async fn register_participant(&self, new: NewParticipation) -> StoreResult<Participation> {
        let mut t = self.tables.write().await;
        if t.participations
            .iter()
            .any(|p| p.tournament_uuid == new.tournament_uuid && p.wallet_address == new.wallet_address)
        {
            return Err(StoreError::Duplicate);
        }
        if new.payment_signature.is_some()
            && t.participations.iter().any(|p| p.payment_signature == new.payment_signature)
        {
            return Err(StoreError::SignatureInUse);
        }
        let tournament = t
            .tournaments
            .iter_mut()
            .find(|x| x.id == new.tournament_uuid)
            .ok_or(StoreError::NotFound)?;
        if !tournament.status.accepts_registrations() {
            return Err(StoreError::Closed);
        }
        if tournament.is_full() {
            return Err(StoreError::Full);
        }
        tournament.current_participants += 1;

        let participation = Participation {
            id: Uuid::new_v4(),
            tournament_uuid: new.tournament_uuid,
            player_id: new.player_id,
            wallet_address: new.wallet_address,
            tournament_id: new.tournament_id,
            tournament_name: new.tournament_name,
            game: new.game,
            entry_fee: new.entry_fee,
            in_game_username: new.in_game_username,
            discord_handle: new.discord_handle,
            team_name: new.team_name,
            status: ParticipationStatus::Registered,
            prize_amount: None,
            placement: None,
            payment_signature: new.payment_signature,
            registered_at: Utc::now(),
        };
        t.participations.push(participation.clone());
        Ok(participation)
    }

    async fn list_participations(&self, tournament: Uuid) -> StoreResult<Vec<Participation>> {
        let t = self.tables.read().await;
        let mut rows: Vec<_> = t
            .participations
            .iter()
            .filter(|p| p.tournament_uuid == tournament)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.registered_at);
        Ok(rows)
    }

    async fn list_wallet_participations(&self, wallet: &str) -> StoreResult<Vec<Participation>> {
        let t = self.tables.read().await;
        let mut rows: Vec<_> = t
            .participations
            .iter()
            .filter(|p| p.wallet_address == wallet)
            .cloned()
            .collect();
        rows.sort_by_key(|p| Reverse(p.registered_at));
        Ok(rows)
    }

    async fn award_placement(
        &self,
        participation: Uuid,
        placement: i32,
        prize_amount: f64,
    ) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let row = t
            .participations
            .iter_mut()
            .find(|p| p.id == participation)
            .ok_or(StoreError::NotFound)?;
        row.placement = Some(placement);
        row.prize_amount = Some(prize_amount);
        row.status = ParticipationStatus::Completed;
        Ok(())
    }

    async fn completed_prize_total(&self) -> StoreResult<f64> {
        let t = self.tables.read().await;
        Ok(t.participations
            .iter()
            .filter(|p| p.status == ParticipationStatus::Completed)
            .filter_map(|p| p.prize_amount)
            .sum())
    }

    async fn participation_counts_by_game(&self, limit: i64) -> StoreResult<Vec<GameCount>> {
        let t = self.tables.read().await;
        let mut counts: Vec<GameCount> = Vec::new();
        for p in &t.participations {
            match counts.iter_mut().find(|c| c.game == p.game) {
                Some(c) => c.count += 1,
                None => counts.push(GameCount { game: p.game.clone(), count: 1 }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.game.cmp(&b.game)));
        counts.truncate(limit.max(0) as usize);
        Ok(counts)
    }

    // --- arena wagers ---

    async fn insert_wager_tournament(
        &self,
        new: NewWagerTournament,
    ) -> StoreResult<WagerTournament> {
        let now = Utc::now();
        let tournament = WagerTournament {
            id: Uuid::new_v4(),
            name: new.name,
            game: new.game,
            entry_wager: new.entry_wager,
            max_participants: new.max_participants,
            current_participants: 0,
            total_pot: 0.0,
            winner_amount: 0.0,
            giveaway_amount: 0.0,
            burn_amount: 0.0,
            escrow_wallet: new.escrow_wallet,
            created_by_wallet: new.created_by_wallet,
            start_time: new.start_time,
            match_format: new.match_format,
            status: TournamentStatus::Registration,
            winner_wallet: None,
            prize_distributed_at: None,
            burn_tx_signature: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.wager_tournaments.push(tournament.clone());
        Ok(tournament)
    }

    async fn get_wager_tournament(&self, id: Uuid) -> StoreResult<Option<WagerTournament>> {
        let t = self.tables.read().await;
        Ok(t.wager_tournaments.iter().find(|x| x.id == id).cloned())
    }

    async fn list_wager_tournaments(&self) -> StoreResult<Vec<WagerTournament>> {
        let t = self.tables.read().await;
        let mut rows = t.wager_tournaments.clone();
        rows.sort_by_key(|x| x.start_time);
        Ok(rows)
    }

    async fn find_wager_participant(
        &self,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<WagerParticipant>> {
        let t = self.tables.read().await;
        Ok(t.wager_participants
            .iter()
            .find(|p| p.tournament_id == tournament && p.player_wallet == wallet)
            .cloned())
    }

    async fn list_wager_participants(
        &self,
        tournament: Uuid,
    ) -> StoreResult<Vec<WagerParticipant>> {
        let t = self.tables.read().await;
        let mut rows: Vec<_> = t
            .wager_participants
            .iter()
            .filter(|p| p.tournament_id == tournament)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.joined_at);
        Ok(rows)
    }

    async fn join_wager_tournament(
        &self,
        new: NewWagerParticipant,
    ) -> StoreResult<(WagerParticipant, WagerTournament)> {
        let mut t = self.tables.write().await;
        if t.wager_participants
            .iter()
            .any(|p| p.tournament_id == new.tournament_id && p.player_wallet == new.player_wallet)
        {
            return Err(StoreError::Duplicate);
        }
        if t.wager_participants
            .iter()
            .any(|p| p.wager_tx_signature == new.wager_tx_signature)
        {
            return Err(StoreError::SignatureInUse);
        }
        let tournament = t
            .wager_tournaments
            .iter_mut()
            .find(|x| x.id == new.tournament_id)
            .ok_or(StoreError::NotFound)?;
        if !tournament.status.accepts_registrations() {
            return Err(StoreError::Closed);
        }
        if tournament.is_full() {
            return Err(StoreError::Full);
        }

        tournament.current_participants += 1;
        tournament.total_pot += new.wager_amount;
        let split = calculate_prize_distribution(tournament.total_pot);
        tournament.winner_amount = split.winner_amount;
        tournament.giveaway_amount = split.giveaway_amount;
        tournament.burn_amount = split.burn_amount;
        tournament.updated_at = Utc::now();
        let tournament = tournament.clone();

        let participant = WagerParticipant {
            id: Uuid::new_v4(),
            tournament_id: new.tournament_id,
            player_wallet: new.player_wallet,
            player_id: new.player_id,
            wager_amount: new.wager_amount,
            wager_tx_signature: new.wager_tx_signature,
            in_game_username: new.in_game_username,
            discord_handle: new.discord_handle,
            team_name: new.team_name,
            status: WagerParticipantStatus::Registered,
            placement: None,
            prize_received: None,
            joined_at: Utc::now(),
        };
        t.wager_participants.push(participant.clone());
        Ok((participant, tournament))
    }

    async fn complete_wager_tournament(
        &self,
        id: Uuid,
        completion: WagerCompletion,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<WagerTournament>> {
        let mut t = self.tables.write().await;
        let tournament = t
            .wager_tournaments
            .iter_mut()
            .find(|x| x.id == id)
            .ok_or(StoreError::NotFound)?;
        if tournament.status == TournamentStatus::Completed {
            return Ok(None);
        }
        tournament.status = TournamentStatus::Completed;
        tournament.winner_wallet = Some(completion.winner_wallet.clone());
        tournament.prize_distributed_at = Some(at);
        tournament.burn_tx_signature = Some(completion.burn_tx_signature);
        tournament.updated_at = at;
        let tournament = tournament.clone();

        if let Some(winner) = t
            .wager_participants
            .iter_mut()
            .find(|p| p.tournament_id == id && p.player_wallet == completion.winner_wallet)
        {
            winner.status = WagerParticipantStatus::Winner;
            winner.placement = Some(1);
            winner.prize_received = Some(tournament.winner_amount);
        }
        Ok(Some(tournament))
    }

    // --- teams ---

    async fn insert_team(&self, new: NewTeam) -> StoreResult<Team> {
        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            name: new.name,
            symbol: new.symbol,
            description: new.description,
            logo_url: new.logo_url,
            game: new.game,
            region: new.region,
            creator_wallet: new.creator_wallet,
            team_mint: None,
            pool_address: None,
            bonding_curve_address: None,
            metadata_uri: None,
            launch_tx: None,
            stake_pool_address: None,
            total_wins: 0,
            total_losses: 0,
            total_earnings: 0.0,
            total_staked: 0.0,
            status: TeamStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.teams.push(team.clone());
        Ok(team)
    }

    async fn get_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        let t = self.tables.read().await;
        Ok(t.teams.iter().find(|x| x.id == id).cloned())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let t = self.tables.read().await;
        let mut rows = t.teams.clone();
        rows.sort_by_key(|x| Reverse(x.created_at));
        Ok(rows)
    }

    async fn mark_team_live(&self, id: Uuid, launch: TeamLaunch) -> StoreResult<Option<Team>> {
        let mut t = self.tables.write().await;
        let Some(team) = t
            .teams
            .iter_mut()
            .find(|x| x.id == id && x.status == TeamStatus::Draft)
        else {
            return Ok(None);
        };
        team.team_mint = Some(launch.team_mint);
        team.pool_address = Some(launch.pool_address);
        team.bonding_curve_address = Some(launch.bonding_curve_address);
        team.metadata_uri = Some(launch.metadata_uri);
        team.launch_tx = Some(launch.launch_tx);
        if launch.logo_url.is_some() {
            team.logo_url = launch.logo_url;
        }
        team.status = TeamStatus::Live;
        team.updated_at = Utc::now();
        Ok(Some(team.clone()))
    }

    async fn set_stake_pool(&self, id: Uuid, address: &str) -> StoreResult<Option<Team>> {
        let mut t = self.tables.write().await;
        let Some(team) = t.teams.iter_mut().find(|x| x.id == id) else {
            return Ok(None);
        };
        team.stake_pool_address = Some(address.to_string());
        team.updated_at = Utc::now();
        Ok(Some(team.clone()))
    }

    async fn record_team_win(&self, id: Uuid, payout: f64) -> StoreResult<Option<Team>> {
        let mut t = self.tables.write().await;
        let Some(team) = t.teams.iter_mut().find(|x| x.id == id) else {
            return Ok(None);
        };
        team.total_wins += 1;
        team.total_earnings += payout;
        team.updated_at = Utc::now();
        Ok(Some(team.clone()))
    }

    async fn top_teams(&self, game: &str, limit: i64) -> StoreResult<Vec<Team>> {
        let t = self.tables.read().await;
        let mut rows: Vec<_> = t
            .teams
            .iter()
            .filter(|x| x.game.as_deref() == Some(game))
            .cloned()
            .collect();
        rows.sort_by_key(|x| Reverse(x.total_wins));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn add_stake(&self, team: Uuid, wallet: &str, amount: f64) -> StoreResult<TeamStake> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let owner = t
            .teams
            .iter_mut()
            .find(|x| x.id == team)
            .ok_or(StoreError::NotFound)?;
        owner.total_staked += amount;
        owner.updated_at = now;

        let existing = t
            .stakes
            .iter()
            .position(|s| s.team_id == team && s.staker_wallet == wallet);
        let stake = match existing {
            Some(i) => {
                let stake = &mut t.stakes[i];
                stake.amount += amount;
                stake.updated_at = now;
                stake.clone()
            }
            None => {
                let stake = TeamStake {
                    id: Uuid::new_v4(),
                    team_id: team,
                    staker_wallet: wallet.to_string(),
                    amount,
                    rewards_claimed: 0.0,
                    created_at: now,
                    updated_at: now,
                };
                t.stakes.push(stake.clone());
                stake
            }
        };
        Ok(stake)
    }

    async fn list_stakes(&self, team: Uuid) -> StoreResult<Vec<TeamStake>> {
        let t = self.tables.read().await;
        let mut rows: Vec<_> = t.stakes.iter().filter(|s| s.team_id == team).cloned().collect();
        rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        Ok(rows)
    }

    // --- profiles ---

    async fn get_profile(&self, wallet: &str) -> StoreResult<Option<PlayerProfile>> {
        let t = self.tables.read().await;
        Ok(t.profiles.iter().find(|p| p.wallet_address == wallet).cloned())
    }

    async fn insert_profile(&self, new: NewPlayerProfile) -> StoreResult<PlayerProfile> {
        let mut t = self.tables.write().await;
        if t.profiles.iter().any(|p| p.wallet_address == new.wallet_address) {
            return Err(StoreError::Duplicate);
        }
        let profile = PlayerProfile {
            id: Uuid::new_v4(),
            wallet_address: new.wallet_address,
            username: new.username,
            bio: new.bio,
            location: new.location,
            favorite_games: new.favorite_games,
            profile_image_url: new.profile_image_url,
            signature: new.signature,
            role: new.role,
            wins: 0,
            losses: 0,
            total_earnings: 0.0,
            created_at: Utc::now(),
        };
        t.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn count_profiles(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.profiles.len() as i64)
    }

    async fn win_loss_totals(&self) -> StoreResult<WinLossTotals> {
        let t = self.tables.read().await;
        Ok(t.profiles.iter().fold(WinLossTotals::default(), |acc, p| WinLossTotals {
            wins: acc.wins + p.wins as i64,
            losses: acc.losses + p.losses as i64,
        }))
    }

    async fn top_players(&self, game: &str, limit: i64) -> StoreResult<Vec<PlayerProfile>> {
        let t = self.tables.read().await;
        let mut rows: Vec<_> = t
            .profiles
            .iter()
            .filter(|p| p.favorite_games.iter().any(|g| g == game))
            .cloned()
            .collect();
        rows.sort_by_key(|p| Reverse(p.wins));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    // --- audit log ---

    async fn append_audit_log(&self, entry: NewAuditLogEntry) -> StoreResult<AuditLogEntry> {
        let row = AuditLogEntry {
            id: Uuid::new_v4(),
            actor_wallet: entry.actor_wallet,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            payload: entry.payload,
            created_at: Utc::now(),
        };
        self.tables.write().await.audit_log.push(row.clone());
        Ok(row)
    }

    async fn list_audit_log(&self, target_id: &str) -> StoreResult<Vec<AuditLogEntry>> {
        let t = self.tables.read().await;
        Ok(t.audit_log
            .iter()
            .filter(|e| e.target_id == target_id)
            .cloned()
            .collect())
    }

    // --- payment intents ---

    async fn insert_payment_intent(&self, new: NewPaymentIntent) -> StoreResult<PaymentIntent> {
        let now = Utc::now();
        let intent = PaymentIntent {
            id: Uuid::new_v4(),
            kind: new.kind,
            tournament_id: new.tournament_id,
            wallet_address: new.wallet_address,
            amount: new.amount,
            escrow_address: new.escrow_address,
            signature: None,
            status: PaymentStatus::Pending,
            registration: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.intents.push(intent.clone());
        Ok(intent)
    }

    async fn get_payment_intent(&self, id: Uuid) -> StoreResult<Option<PaymentIntent>> {
        let t = self.tables.read().await;
        Ok(t.intents.iter().find(|i| i.id == id).cloned())
    }

    async fn find_open_intent(
        &self,
        kind: PaymentKind,
        tournament: Uuid,
        wallet: &str,
    ) -> StoreResult<Option<PaymentIntent>> {
        let t = self.tables.read().await;
        Ok(t.intents
            .iter()
            .filter(|i| {
                i.kind == kind
                    && i.tournament_id == tournament
                    && i.wallet_address == wallet
                    && matches!(i.status, PaymentStatus::Pending | PaymentStatus::Paid)
            })
            .max_by_key(|i| i.created_at)
            .cloned())
    }

    async fn update_payment_intent(
        &self,
        id: Uuid,
        update: PaymentIntentUpdate,
    ) -> StoreResult<PaymentIntent> {
        let mut t = self.tables.write().await;
        if let Some(signature) = &update.signature {
            if t.intents
                .iter()
                .any(|i| i.id != id && i.signature.as_ref() == Some(signature))
            {
                return Err(StoreError::SignatureInUse);
            }
        }
        let intent = t
            .intents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(status) = update.status {
            intent.status = status;
        }
        if update.signature.is_some() {
            intent.signature = update.signature;
        }
        if update.registration.is_some() {
            intent.registration = update.registration;
        }
        intent.updated_at = Utc::now();
        Ok(intent.clone())
    }

    async fn list_payment_intents(
        &self,
        status: PaymentStatus,
    ) -> StoreResult<Vec<PaymentIntent>> {
        let t = self.tables.read().await;
        let mut rows: Vec<_> = t.intents.iter().filter(|i| i.status == status).cloned().collect();
        rows.sort_by_key(|i| i.created_at);
        Ok(rows)
    }
}
