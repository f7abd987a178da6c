use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arena_api::{
    challonge::ChallongeClient,
    chain::{ChainClient, RpcChain},
    config::{Config, StoreBackend},
    launch::DbcPoolLauncher,
    payments,
    storage::{DisabledStorage, ObjectStorage, SupabaseStorage},
    store::{MemoryStore, PgStore, Store},
    wallet::{KeypairWallet, WalletSigner},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store: Arc<dyn Store> = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let store = PgStore::connect(url).await.context("connecting to postgres")?;
            store.migrate().await.context("running migrations")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let chain: Arc<dyn ChainClient> = Arc::new(RpcChain::new(config.solana_rpc_url.clone()));
    let storage: Arc<dyn ObjectStorage> =
        match (&config.supabase_url, &config.supabase_service_role_key) {
            (Some(url), Some(key)) => Arc::new(SupabaseStorage::new(url, key)),
            _ => {
                tracing::warn!("object storage not configured, team logos fall back to the placeholder");
                Arc::new(DisabledStorage)
            }
        };
    let server_wallet: Option<Arc<dyn WalletSigner>> = match &config.server_keypair_b58 {
        Some(secret) => {
            let wallet = KeypairWallet::from_base58(secret).context("parsing SERVER_KEYPAIR_B58")?;
            tracing::info!(address = %wallet.pubkey(), "server wallet loaded");
            Some(Arc::new(wallet))
        }
        None => None,
    };

    let state = AppState {
        store,
        bracket: Arc::new(ChallongeClient::new(
            &config.challonge_api_url,
            &config.challonge_api_key,
        )),
        launcher: Arc::new(DbcPoolLauncher::new(
            chain.clone(),
            config.dbc_program_id,
            config.dbc_config_address,
        )),
        chain,
        storage,
        server_wallet,
        settings: Arc::new(config.settings()),
    };

    let reconciler = tokio::spawn(payments::run_reconciler(
        state.clone(),
        config.reconcile_interval(),
    ));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, program = %config.tournament_program_id, "arena-api listening");

    axum::serve(listener, arena_api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    reconciler.abort();
    tracing::info!("arena-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
