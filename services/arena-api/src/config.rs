use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Process configuration, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "arena-api", about = "Sol Arena tournament API")]
pub struct Config {
    #[arg(long, env = "ARENA_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "ARENA_STORE", value_enum, default_value_t = StoreBackend::Postgres)]
    pub store: StoreBackend,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_role_key: Option<String>,

    #[arg(long, env = "CHALLONGE_API_KEY", hide_env_values = true, default_value = "")]
    pub challonge_api_key: String,

    #[arg(long, env = "CHALLONGE_API_URL", default_value = "https://api.challonge.com/v1")]
    pub challonge_api_url: String,

    #[arg(long, env = "SOLANA_RPC_URL", default_value = "https://api.devnet.solana.com")]
    pub solana_rpc_url: String,

    #[arg(long, env = "TOURNAMENT_PROGRAM_ID", default_value_t = sol_arena::ID)]
    pub tournament_program_id: Pubkey,

    #[arg(long, env = "ARENA_TOKEN_MINT", default_value = "egimFKq4YU5N2r3B3BCZby5WVoFbbS1EhRLcnqwpump")]
    pub arena_token_mint: Pubkey,

    #[arg(long, env = "DBC_PROGRAM_ID", default_value = "dbcij3LWUppWqq96dh6gJWwBifmcGfLSB5D4DuSMaqN")]
    pub dbc_program_id: Pubkey,

    #[arg(long, env = "DBC_CONFIG_ADDRESS", default_value = "2HUtAHdaWPZfsq4byuQTCDCF7q7zTfVKX8iFrYL6EJJC")]
    pub dbc_config_address: Pubkey,

    #[arg(long, env = "STAKING_PROGRAM_ID", default_value = "stkarvwmSzv2BygN5e2LeTwimTczLWHCKPKGC2zVLiq")]
    pub staking_program_id: Pubkey,

    /// Base58 encoded 64-byte keypair used to create on-chain tournaments.
    #[arg(long, env = "SERVER_KEYPAIR_B58", hide_env_values = true)]
    pub server_keypair_b58: Option<String>,

    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "https://sol-arena.vercel.app")]
    pub public_base_url: String,

    #[arg(long, env = "RECONCILE_INTERVAL_SECS", default_value_t = 60)]
    pub reconcile_interval_secs: u64,

    #[arg(long, env = "INTENT_TTL_SECS", default_value_t = 1800)]
    pub intent_ttl_secs: u64,
}

impl Config {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs.max(1))
    }

    pub fn settings(&self) -> Settings {
        Settings {
            program_id: self.tournament_program_id,
            arena_mint: self.arena_token_mint,
            dbc_program_id: self.dbc_program_id,
            dbc_config: self.dbc_config_address,
            staking_program_id: self.staking_program_id,
            public_base_url: self.public_base_url.trim_end_matches('/').to_string(),
            intent_ttl: chrono::Duration::seconds(self.intent_ttl_secs as i64),
        }
    }
}

/// The slice of configuration route handlers read at request time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub program_id: Pubkey,
    pub arena_mint: Pubkey,
    pub dbc_program_id: Pubkey,
    pub dbc_config: Pubkey,
    pub staking_program_id: Pubkey,
    pub public_base_url: String,
    pub intent_ttl: chrono::Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Config::parse_from(["arena-api"]).settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_override_defaults() {
        let config = Config::parse_from([
            "arena-api",
            "--bind-addr",
            "127.0.0.1:9000",
            "--store",
            "memory",
            "--public-base-url",
            "https://arena.example/",
            "--intent-ttl-secs",
            "60",
        ]);
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.store, StoreBackend::Memory);

        let settings = config.settings();
        assert_eq!(settings.public_base_url, "https://arena.example");
        assert_eq!(settings.intent_ttl, chrono::Duration::seconds(60));
    }

    #[test]
    fn program_id_flag_parses_base58() {
        let id = Pubkey::new_unique();
        let config =
            Config::parse_from(["arena-api", "--tournament-program-id", &id.to_string()]);
        assert_eq!(config.tournament_program_id, id);
    }
}
