#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use tower::ServiceExt;
use uuid::Uuid;

use arena_api::challonge::{
    BracketService, ChallongeError, ChallongeParticipant, ChallongeTournament, NewBracket,
};
use arena_api::chain::{ChainClient, ChainError, ExpectedPayment, PaymentCheck};
use arena_api::config::Settings;
use arena_api::launch::{LaunchError, PoolLauncher, PoolParams, PreparedPool};
use arena_api::models::*;
use arena_api::storage::MemoryStorage;
use arena_api::pda;
use arena_api::store::{MemoryStore, Store};
use arena_api::wallet::{KeypairWallet, WalletSigner};
use arena_api::AppState;

// ===== STUBS =====

#[derive(Default)]
pub struct StubBracket {
    pub created: Mutex<Vec<NewBracket>>,
    pub participants: Mutex<Vec<ChallongeParticipant>>,
    pub fail: Mutex<bool>,
}

impl StubBracket {
    pub fn set_standings(&self, names: &[(&str, Option<i64>)]) {
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, (name, rank))| ChallongeParticipant {
                id: i as i64 + 1,
                name: Some(name.to_string()),
                final_rank: *rank,
                extra: Map::new(),
            })
            .collect();
        *self.participants.lock().unwrap() = rows;
    }

    fn check(&self) -> Result<(), ChallongeError> {
        if *self.fail.lock().unwrap() {
            return Err(ChallongeError::Status { status: 500, body: "down".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl BracketService for StubBracket {
    async fn list_tournaments(&self) -> Result<Value, ChallongeError> {
        self.check()?;
        Ok(Value::Array(vec![]))
    }

    async fn create_tournament(&self, new: &NewBracket) -> Result<ChallongeTournament, ChallongeError> {
        self.check()?;
        let mut created = self.created.lock().unwrap();
        created.push(new.clone());
        Ok(ChallongeTournament {
            id: 1000 + created.len() as i64,
            name: Some(new.name.clone()),
            full_challonge_url: Some(format!("https://challonge.com/t{}", created.len())),
            state: Some("pending".into()),
            extra: Map::new(),
        })
    }

    async fn get_tournament(&self, id: &str) -> Result<ChallongeTournament, ChallongeError> {
        self.check()?;
        Ok(ChallongeTournament {
            id: id.parse().unwrap_or(0),
            name: None,
            full_challonge_url: Some(format!("https://challonge.com/{id}")),
            state: Some("underway".into()),
            extra: Map::new(),
        })
    }

    async fn list_participants(&self, _: &str) -> Result<Vec<ChallongeParticipant>, ChallongeError> {
        self.check()?;
        Ok(self.participants.lock().unwrap().clone())
    }
}

/// Chain whose accounts and payment outcomes are set by the test.
/// Unknown payments read as pending.
#[derive(Default)]
pub struct StubChain {
    pub owners: Mutex<HashMap<Pubkey, Pubkey>>,
    pub balances: Mutex<HashMap<Pubkey, u64>>,
    pub payments: Mutex<HashMap<Signature, PaymentCheck>>,
    pub checked: Mutex<Vec<ExpectedPayment>>,
    pub sent: Mutex<Vec<Transaction>>,
}

impl StubChain {
    pub fn set_owner(&self, account: Pubkey, owner: Pubkey) {
        self.owners.lock().unwrap().insert(account, owner);
    }

    pub fn set_payment(&self, signature: Signature, check: PaymentCheck) {
        self.payments.lock().unwrap().insert(signature, check);
    }
}

#[async_trait]
impl ChainClient for StubChain {
    async fn account_owner(&self, address: &Pubkey) -> Result<Option<Pubkey>, ChainError> {
        Ok(self.owners.lock().unwrap().get(address).copied())
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<Option<u64>, ChainError> {
        Ok(self.balances.lock().unwrap().get(token_account).copied())
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64), ChainError> {
        Ok((Hash::new_unique(), 1_000))
    }

    async fn check_payment(
        &self,
        signature: &Signature,
        expected: &ExpectedPayment,
    ) -> Result<PaymentCheck, ChainError> {
        self.checked.lock().unwrap().push(expected.clone());
        Ok(self
            .payments
            .lock()
            .unwrap()
            .get(signature)
            .cloned()
            .unwrap_or(PaymentCheck::Pending))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ChainError> {
        self.sent.lock().unwrap().push(tx.clone());
        Ok(Signature::new_unique())
    }
}

pub struct StubLauncher;

#[async_trait]
impl PoolLauncher for StubLauncher {
    async fn prepare_pool(&self, params: &PoolParams) -> Result<PreparedPool, LaunchError> {
        arena_api::launch::validate_token_fields(&params.name, &params.symbol, &params.metadata_uri)?;
        Ok(PreparedPool {
            mint_address: Pubkey::new_unique().to_string(),
            pool_address: Pubkey::new_unique().to_string(),
            bonding_curve_address: Pubkey::new_unique().to_string(),
            serialized_transaction: "AQID".into(),
            blockhash: Hash::new_unique().to_string(),
            last_valid_block_height: 1_000,
        })
    }
}

// ===== APP =====

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub chain: Arc<StubChain>,
    pub bracket: Arc<StubBracket>,
    pub storage: Arc<MemoryStorage>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// App that signs program transactions with its own server wallet.
    pub fn with_server_wallet() -> Self {
        Self::build(Some(Arc::new(KeypairWallet::generate())))
    }

    fn build(server_wallet: Option<Arc<dyn WalletSigner>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let chain = Arc::new(StubChain::default());
        let bracket = Arc::new(StubBracket::default());
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState {
            store: store.clone(),
            bracket: bracket.clone(),
            chain: chain.clone(),
            storage: storage.clone(),
            launcher: Arc::new(StubLauncher),
            server_wallet,
            settings: Arc::new(Settings::default()),
        };
        let router = arena_api::router(state.clone());
        Self { state, store, chain, bracket, storage, router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    // --- seeding ---

    pub async fn seed_profile(&self, wallet: &str, role: ProfileRole) -> PlayerProfile {
        let profile = PlayerProfile {
            id: Uuid::new_v4(),
            wallet_address: wallet.to_string(),
            username: format!("user-{}", &wallet[..6]),
            bio: None,
            location: None,
            favorite_games: vec!["Valorant".into()],
            profile_image_url: None,
            signature: "sig".into(),
            role,
            wins: 0,
            losses: 0,
            total_earnings: 0.0,
            created_at: Utc::now(),
        };
        self.store.put_profile(profile.clone()).await;
        profile
    }

    pub async fn seed_tournament(
        &self,
        entry_fee_sol: f64,
        max_participants: i32,
        status: TournamentStatus,
    ) -> Tournament {
        self.store
            .insert_tournament(NewTournament {
                challonge_id: Some("4242".into()),
                name: "Friday Cup".into(),
                game: "Valorant".into(),
                entry_fee_sol,
                max_participants,
                status,
                start_time: Utc::now() + Duration::days(1),
                banner_url: None,
            })
            .await
            .unwrap()
    }

    /// Marks the tournament's program account as created on chain.
    pub fn deploy(&self, tournament: &Tournament) {
        let program_id = self.state.settings.program_id;
        self.chain
            .set_owner(pda::tournament(&program_id, &tournament.onchain_id()), program_id);
    }

    /// Instructions of every transaction sent through the stub chain.
    pub fn sent_instructions(&self) -> Vec<(Pubkey, Vec<u8>)> {
        self.chain
            .sent
            .lock()
            .unwrap()
            .iter()
            .flat_map(|tx| {
                tx.message.instructions.iter().map(|ix| {
                    (tx.message.account_keys[ix.program_id_index as usize], ix.data.clone())
                })
            })
            .collect()
    }

    pub async fn seed_wager(&self, entry_wager: f64, max_participants: i32) -> WagerTournament {
        self.store
            .insert_wager_tournament(NewWagerTournament {
                name: "Wager Night".into(),
                game: "Valorant".into(),
                entry_wager,
                max_participants,
                escrow_wallet: Pubkey::new_unique().to_string(),
                created_by_wallet: Pubkey::new_unique().to_string(),
                start_time: Utc::now() + Duration::days(1),
                match_format: "best_of_7".into(),
            })
            .await
            .unwrap()
    }

    pub async fn seed_team(&self, creator: Option<String>) -> Team {
        self.store
            .insert_team(NewTeam {
                name: "Night Owls".into(),
                symbol: "OWL".into(),
                description: Some("Late night grinders".into()),
                logo_url: None,
                game: Some("Valorant".into()),
                region: Some("EU".into()),
                creator_wallet: creator,
            })
            .await
            .unwrap()
    }

    /// Registers `wallet` directly through the store.
    pub async fn seed_participant(&self, tournament: &Tournament, wallet: &str) -> Participation {
        self.store
            .register_participant(NewParticipation {
                tournament_uuid: tournament.id,
                player_id: None,
                wallet_address: wallet.to_string(),
                tournament_id: tournament.challonge_id.clone(),
                tournament_name: tournament.name.clone(),
                game: tournament.game.clone(),
                entry_fee: tournament.entry_fee_sol,
                in_game_username: format!("ign-{}", &wallet[..4]),
                discord_handle: None,
                team_name: None,
                payment_signature: None,
            })
            .await
            .unwrap()
    }
}

pub fn wallet() -> String {
    Pubkey::new_unique().to_string()
}
