//! Team token launches on Meteora's Dynamic Bonding Curve.

use std::sync::Arc;

use anchor_lang::{prelude::borsh, AnchorSerialize, Discriminator, InstructionData};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_program,
    transaction::Transaction,
};
use thiserror::Error;

use crate::chain::{ChainClient, ChainError};
use crate::models::Team;
use crate::pda;
use crate::storage::ObjectStorage;
use crate::wallet::{KeypairWallet, WalletError, WalletSigner};

pub const TEAM_ASSETS_BUCKET: &str = "team-assets";
pub const PLACEHOLDER_LOGO_URL: &str = "https://arweave.net/placeholder-team-logo.png";
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

const MAX_NAME_BYTES: usize = 32;
const MAX_SYMBOL_BYTES: usize = 10;
const MAX_URI_BYTES: usize = 200;
const LOGO_TYPES: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{0}")]
    Invalid(String),
    #[error("pool config {0} does not exist")]
    ConfigMissing(Pubkey),
    #[error("pool config is owned by {actual}, expected {expected}")]
    ConfigOwner { expected: Pubkey, actual: Pubkey },
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("failed to encode: {0}")]
    Encode(String),
}

pub fn validate_token_fields(name: &str, symbol: &str, uri: &str) -> Result<(), LaunchError> {
    if name.len() > MAX_NAME_BYTES {
        return Err(LaunchError::Invalid(format!(
            "Token name exceeds {MAX_NAME_BYTES} bytes: {} bytes",
            name.len()
        )));
    }
    if symbol.len() > MAX_SYMBOL_BYTES {
        return Err(LaunchError::Invalid(format!(
            "Token symbol exceeds {MAX_SYMBOL_BYTES} bytes: {} bytes",
            symbol.len()
        )));
    }
    if uri.len() > MAX_URI_BYTES {
        return Err(LaunchError::Invalid(format!(
            "Metadata URI exceeds {MAX_URI_BYTES} bytes: {} bytes",
            uri.len()
        )));
    }
    Ok(())
}

// ===== LOGOS & METADATA =====

/// Splits `data:image/<ext>;base64,<payload>` into its extension and bytes.
pub fn parse_image_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:image/")?;
    let (ext, payload) = rest.split_once(";base64,")?;
    if !LOGO_TYPES.contains(&ext) || payload.is_empty() {
        return None;
    }
    let bytes = STANDARD.decode(payload).ok()?;
    Some((ext.to_string(), bytes))
}

/// Moves an inline logo into object storage. Hosted URLs are kept as
/// they are; anything that fails falls back to the placeholder.
pub async fn resolve_logo(
    storage: &dyn ObjectStorage,
    team_id: &str,
    logo_url: Option<&str>,
    now_millis: i64,
) -> Option<String> {
    let url = logo_url?;
    if !url.starts_with("data:") {
        return Some(url.to_string());
    }
    let Some((ext, bytes)) = parse_image_data_url(url) else {
        tracing::warn!(team_id, "invalid logo data url");
        return Some(PLACEHOLDER_LOGO_URL.to_string());
    };

    let path = format!("team-logos/{team_id}-{now_millis}.{ext}");
    match storage
        .upload(TEAM_ASSETS_BUCKET, &path, bytes, &format!("image/{ext}"))
        .await
    {
        Ok(()) => Some(storage.public_url(TEAM_ASSETS_BUCKET, &path)),
        Err(err) => {
            tracing::warn!(team_id, error = %err, "logo upload failed");
            Some(PLACEHOLDER_LOGO_URL.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

/// Off-chain token metadata JSON.
#[derive(Debug, Clone, Serialize)]
pub struct TeamMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub external_url: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl TeamMetadata {
    pub fn new(team: &Team, logo_url: Option<&str>, metadata_uri: &str) -> Self {
        let attribute = |trait_type: &str, value: &str| MetadataAttribute {
            trait_type: trait_type.to_string(),
            value: value.to_string(),
        };
        Self {
            name: team.name.clone(),
            symbol: team.symbol.clone(),
            description: team.description.clone().unwrap_or_default(),
            image: logo_url.unwrap_or(PLACEHOLDER_LOGO_URL).to_string(),
            external_url: metadata_uri.to_string(),
            attributes: vec![
                attribute("Game", team.game.as_deref().unwrap_or("Multi-Game")),
                attribute("Region", team.region.as_deref().unwrap_or("Global")),
                attribute("Team ID", &team.id.to_string()),
            ],
        }
    }
}

// ===== POOL LAUNCHER =====

#[derive(Debug, Clone)]
pub struct PoolParams {
    pub name: String,
    pub symbol: String,
    pub metadata_uri: String,
    /// Fee payer and pool creator.
    pub payer: Pubkey,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPool {
    pub mint_address: String,
    pub pool_address: String,
    pub bonding_curve_address: String,
    /// Base64 transaction, signed by the mint and waiting for the payer.
    pub serialized_transaction: String,
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[async_trait]
pub trait PoolLauncher: Send + Sync {
    async fn prepare_pool(&self, params: &PoolParams) -> Result<PreparedPool, LaunchError>;
}

// ===== DBC INSTRUCTION =====

#[derive(AnchorSerialize)]
pub struct InitializePoolParameters {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// Arguments of the DBC `initialize_virtual_pool_with_spl_token` instruction.
#[derive(AnchorSerialize)]
pub struct InitializeVirtualPoolWithSplToken {
    pub params: InitializePoolParameters,
}

impl Discriminator for InitializeVirtualPoolWithSplToken {
    // sha256("global:initialize_virtual_pool_with_spl_token")[..8]
    const DISCRIMINATOR: [u8; 8] = [140, 85, 215, 176, 102, 54, 104, 79];
}

impl InstructionData for InitializeVirtualPoolWithSplToken {}

pub struct DbcPoolLauncher {
    chain: Arc<dyn ChainClient>,
    program_id: Pubkey,
    config: Pubkey,
    quote_mint: Pubkey,
}

impl DbcPoolLauncher {
    pub fn new(chain: Arc<dyn ChainClient>, program_id: Pubkey, config: Pubkey) -> Self {
        Self {
            chain,
            program_id,
            config,
            quote_mint: spl_token::native_mint::id(),
        }
    }

    fn create_pool_instruction(
        &self,
        params: &PoolParams,
        base_mint: &Pubkey,
        pool: &Pubkey,
    ) -> Instruction {
        let data = InitializeVirtualPoolWithSplToken {
            params: InitializePoolParameters {
                name: params.name.clone(),
                symbol: params.symbol.clone(),
                uri: params.metadata_uri.clone(),
            },
        }
        .data();

        let program = self.program_id;
        let accounts = vec![
            AccountMeta::new_readonly(self.config, false),
            AccountMeta::new_readonly(pda::dbc_pool_authority(&program), false),
            AccountMeta::new_readonly(params.payer, true),
            AccountMeta::new(*base_mint, true),
            AccountMeta::new_readonly(self.quote_mint, false),
            AccountMeta::new(*pool, false),
            AccountMeta::new(pda::dbc_token_vault(&program, base_mint, pool), false),
            AccountMeta::new(pda::dbc_token_vault(&program, &self.quote_mint, pool), false),
            AccountMeta::new(pda::token_metadata(&TOKEN_METADATA_PROGRAM_ID, base_mint), false),
            AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
            AccountMeta::new(params.payer, true),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(pda::dbc_event_authority(&program), false),
            AccountMeta::new_readonly(program, false),
        ];
        Instruction { program_id: program, accounts, data }
    }
}

#[async_trait]
impl PoolLauncher for DbcPoolLauncher {
    async fn prepare_pool(&self, params: &PoolParams) -> Result<PreparedPool, LaunchError> {
        validate_token_fields(&params.name, &params.symbol, &params.metadata_uri)?;

        // --- pool config ---
        let owner = self
            .chain
            .account_owner(&self.config)
            .await?
            .ok_or(LaunchError::ConfigMissing(self.config))?;
        if owner != self.program_id {
            return Err(LaunchError::ConfigOwner { expected: self.program_id, actual: owner });
        }

        // --- addresses ---
        let mint = KeypairWallet::generate();
        let base_mint = mint.address()?;
        let pool = pda::dbc_pool(&self.program_id, &self.config, &base_mint);
        let bonding_curve = pda::dbc_bonding_curve(&self.program_id, &pool);

        // --- transaction ---
        let ix = self.create_pool_instruction(params, &base_mint, &pool);
        let (blockhash, last_valid_block_height) = self.chain.latest_blockhash().await?;
        let mut tx = Transaction::new_with_payer(&[ix], Some(&params.payer));
        tx.message.recent_blockhash = blockhash;
        let tx = mint.sign_transaction(tx).await?;
        let bytes = bincode::serialize(&tx).map_err(|e| LaunchError::Encode(e.to_string()))?;

        tracing::info!(
            mint = %base_mint,
            pool = %pool,
            payer = %params.payer,
            "team pool transaction prepared"
        );

        Ok(PreparedPool {
            mint_address: base_mint.to_string(),
            pool_address: pool.to_string(),
            bonding_curve_address: bonding_curve.to_string(),
            serialized_transaction: STANDARD.encode(bytes),
            blockhash: blockhash.to_string(),
            last_valid_block_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DisabledStorage, MemoryStorage};

    #[test]
    fn token_fields_are_byte_limited() {
        assert!(validate_token_fields("Night Owls", "OWL", "https://x/teams/1").is_ok());
        assert!(validate_token_fields(&"n".repeat(33), "OWL", "u").is_err());
        assert!(validate_token_fields("n", "ABCDEFGHIJK", "u").is_err());
        assert!(validate_token_fields("n", "OWL", &"u".repeat(201)).is_err());
        // multi-byte characters count by bytes
        assert!(validate_token_fields(&"é".repeat(17), "OWL", "u").is_err());
    }

    #[test]
    fn data_urls_parse_known_image_types() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode([1u8, 2, 3]));
        assert_eq!(parse_image_data_url(&url), Some(("png".to_string(), vec![1, 2, 3])));
        assert_eq!(parse_image_data_url("data:image/svg+xml;base64,AAAA"), None);
        assert_eq!(parse_image_data_url("https://example.com/logo.png"), None);
    }

    #[tokio::test]
    async fn inline_logos_move_to_storage() {
        let storage = MemoryStorage::new();
        let url = format!("data:image/webp;base64,{}", STANDARD.encode([9u8; 4]));

        let resolved = resolve_logo(&storage, "team-1", Some(&url), 1_700_000_000_000).await;
        assert_eq!(
            resolved.as_deref(),
            Some("memory://team-assets/team-logos/team-1-1700000000000.webp")
        );
        let (bytes, content_type) = storage
            .get(TEAM_ASSETS_BUCKET, "team-logos/team-1-1700000000000.webp")
            .unwrap();
        assert_eq!(bytes, vec![9u8; 4]);
        assert_eq!(content_type, "image/webp");
    }

    #[tokio::test]
    async fn failed_uploads_fall_back_to_placeholder() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode([1u8]));
        let resolved = resolve_logo(&DisabledStorage, "team-1", Some(&url), 0).await;
        assert_eq!(resolved.as_deref(), Some(PLACEHOLDER_LOGO_URL));

        let kept = resolve_logo(&DisabledStorage, "team-1", Some("https://cdn/logo.png"), 0).await;
        assert_eq!(kept.as_deref(), Some("https://cdn/logo.png"));
        assert_eq!(resolve_logo(&DisabledStorage, "team-1", None, 0).await, None);
    }

    #[test]
    fn pool_instruction_encodes_metadata_strings() {
        struct NoChain;
        #[async_trait]
        impl ChainClient for NoChain {
            async fn account_owner(&self, _: &Pubkey) -> Result<Option<Pubkey>, ChainError> {
                Ok(None)
            }
            async fn token_balance(&self, _: &Pubkey) -> Result<Option<u64>, ChainError> {
                Ok(None)
            }
            async fn latest_blockhash(&self) -> Result<(solana_sdk::hash::Hash, u64), ChainError> {
                Ok((solana_sdk::hash::Hash::default(), 0))
            }
            async fn check_payment(
                &self,
                _: &solana_sdk::signature::Signature,
                _: &crate::chain::ExpectedPayment,
            ) -> Result<crate::chain::PaymentCheck, ChainError> {
                Ok(crate::chain::PaymentCheck::Pending)
            }
            async fn send_transaction(
                &self,
                _: &Transaction,
            ) -> Result<solana_sdk::signature::Signature, ChainError> {
                Ok(solana_sdk::signature::Signature::default())
            }
        }

        let launcher = DbcPoolLauncher::new(Arc::new(NoChain), Pubkey::new_unique(), Pubkey::new_unique());
        let params = PoolParams {
            name: "Owls".into(),
            symbol: "OWL".into(),
            metadata_uri: "u".into(),
            payer: Pubkey::new_unique(),
        };
        let mint = Pubkey::new_unique();
        let pool = pda::dbc_pool(&launcher.program_id, &launcher.config, &mint);
        let ix = launcher.create_pool_instruction(&params, &mint, &pool);

        assert_eq!(&ix.data[8..12], &4u32.to_le_bytes());
        assert_eq!(&ix.data[12..16], b"Owls");
        assert_eq!(ix.data.len(), 8 + (4 + 4) + (4 + 3) + (4 + 1));
        assert!(ix.accounts.iter().any(|m| m.pubkey == mint && m.is_signer));
    }

    #[test]
    fn discriminator_matches_anchor_convention() {
        use anchor_lang::solana_program::hash::hash;
        let expected = &hash(b"global:initialize_virtual_pool_with_spl_token").to_bytes()[..8];
        assert_eq!(&InitializeVirtualPoolWithSplToken::discriminator()[..], expected);
    }

    #[test]
    fn pool_parameters_serialize_as_borsh_strings() {
        let params = InitializePoolParameters { name: "Owls".into(), symbol: "OWL".into(), uri: "u".into() };
        let bytes = params.try_to_vec().unwrap();
        assert_eq!(&bytes[..4], &4u32.to_le_bytes());
        assert_eq!(&bytes[4..8], b"Owls");
        assert_eq!(bytes.len(), (4 + 4) + (4 + 3) + (4 + 1));
    }
}
