//! Wallet capability: anything that can name its address and sign
//! transactions or messages, plus verification of wallet signatures.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is not installed")]
    NotInstalled,
    #[error("user rejected the request")]
    UserRejected,
    #[error("wallet is disconnected")]
    Disconnected,
    #[error("signing failed: {0}")]
    Signing(String),
}

#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Result<Pubkey, WalletError>;

    /// Adds this wallet's signature, keeping any signatures already present.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError>;
}

/// Wallet backed by a local keypair: the server signer, or a fresh mint.
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn generate() -> Self {
        Self::new(Keypair::new())
    }

    /// Parses a base58 encoded 64-byte secret key.
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::Signing(format!("invalid base58 keypair: {e}")))?;
        if bytes.len() != 64 {
            return Err(WalletError::Signing(format!(
                "keypair must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| WalletError::Signing(format!("invalid keypair: {e}")))?;
        Ok(Self::new(keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    fn address(&self) -> Result<Pubkey, WalletError> {
        Ok(self.keypair.pubkey())
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(tx)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        Ok(self.keypair.sign_message(message))
    }
}

/// Message a wallet signs to create its profile.
pub fn profile_message(wallet: &str, username: &str, timestamp: &str) -> String {
    format!(
        "Sign this message to create your Sol Arena profile.\n\nWallet: {wallet}\nUsername: {username}\nTimestamp: {timestamp}"
    )
}

/// Checks an ed25519 signature (base64, or base58 as a fallback) of
/// `message` by `wallet`.
pub fn verify_message_signature(wallet: &Pubkey, message: &[u8], signature: &str) -> bool {
    let encoded = signature.trim();
    let decoded = [
        STANDARD.decode(encoded).ok(),
        bs58::decode(encoded).into_vec().ok(),
    ];
    decoded
        .into_iter()
        .flatten()
        .find_map(|bytes| Signature::try_from(bytes.as_slice()).ok())
        .is_some_and(|signature| signature.verify(wallet.as_ref(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, system_instruction};

    #[tokio::test]
    async fn signed_messages_verify_only_for_the_signer() {
        let wallet = KeypairWallet::generate();
        let message = profile_message(&wallet.pubkey().to_string(), "neo", "2025-01-01T00:00:00Z");
        let signature = wallet.sign_message(message.as_bytes()).await.unwrap();
        let encoded = STANDARD.encode(signature.as_ref());

        assert!(verify_message_signature(&wallet.pubkey(), message.as_bytes(), &encoded));
        assert!(verify_message_signature(&wallet.pubkey(), message.as_bytes(), &signature.to_string()));
        assert!(!verify_message_signature(&Pubkey::new_unique(), message.as_bytes(), &encoded));
        assert!(!verify_message_signature(&wallet.pubkey(), b"other", &encoded));
        assert!(!verify_message_signature(&wallet.pubkey(), message.as_bytes(), "garbage"));
    }

    #[tokio::test]
    async fn partial_signing_keeps_the_fee_payer_slot_open() {
        let payer = Pubkey::new_unique();
        let mint = KeypairWallet::generate();
        let ix = system_instruction::create_account(&payer, &mint.pubkey(), 1, 82, &spl_token::id());
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        tx.message.recent_blockhash = Hash::new_unique();

        let tx = mint.sign_transaction(tx).await.unwrap();
        assert_eq!(tx.signatures[0], Signature::default());
        assert_ne!(tx.signatures[1], Signature::default());
    }

    #[test]
    fn base58_keypairs_round_trip() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        let wallet = KeypairWallet::from_base58(&encoded).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
        assert!(KeypairWallet::from_base58("abc").is_err());
    }
}
