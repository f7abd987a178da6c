//! Solana RPC access behind a trait so route handlers can be driven
//! against a stub chain in tests.

mod rpc;

pub use rpc::RpcChain;

use std::str::FromStr;

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(#[from] Box<solana_client::client_error::ClientError>),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("failed to build instruction: {0}")]
    Instruction(String),
    #[error("failed to decode {0}")]
    Decode(String),
}

impl From<solana_client::client_error::ClientError> for ChainError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::Rpc(Box::new(err))
    }
}

pub fn parse_address(value: &str) -> Result<Pubkey, ChainError> {
    Pubkey::from_str(value.trim()).map_err(|_| ChainError::InvalidAddress(value.to_string()))
}

pub fn parse_signature(value: &str) -> Result<Signature, ChainError> {
    Signature::from_str(value.trim()).map_err(|_| ChainError::InvalidSignature(value.to_string()))
}

/// Validator clocks and ours may disagree by this much.
pub const BLOCK_TIME_SKEW_SECS: i64 = 60;

/// Transfer a join payment must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedPayment {
    pub payer: Pubkey,
    /// Lamport recipient, or the owner of the receiving token account.
    pub destination: Pubkey,
    pub amount: u64,
    /// Set for SPL token payments.
    pub mint: Option<Pubkey>,
    /// Unix time the intent was opened. Older transactions paid for
    /// something else.
    pub not_before: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentCheck {
    Confirmed,
    /// Not yet seen at `confirmed` commitment.
    Pending,
    Failed(String),
    /// Landed, but does not move the expected amount to the expected account.
    Mismatch(String),
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Owner program of `address`, or `None` when the account doesn't exist.
    async fn account_owner(&self, address: &Pubkey) -> Result<Option<Pubkey>, ChainError>;

    /// Raw balance of a token account, or `None` when it doesn't exist.
    async fn token_balance(&self, token_account: &Pubkey) -> Result<Option<u64>, ChainError>;

    /// Latest blockhash and its last valid block height.
    async fn latest_blockhash(&self) -> Result<(Hash, u64), ChainError>;

    async fn check_payment(
        &self,
        signature: &Signature,
        expected: &ExpectedPayment,
    ) -> Result<PaymentCheck, ChainError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ChainError>;
}

// ===== BALANCE DELTAS =====

/// Token balance entry of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub account_index: u8,
    pub mint: String,
    pub owner: Option<String>,
    pub amount: u64,
}

/// Lamports gained by `destination` in a transaction.
pub fn lamport_delta(keys: &[Pubkey], pre: &[u64], post: &[u64], destination: &Pubkey) -> u64 {
    keys.iter()
        .position(|k| k == destination)
        .and_then(|i| Some(post.get(i)?.saturating_sub(*pre.get(i)?)))
        .unwrap_or(0)
}

/// Tokens of `mint` gained by accounts owned by `owner`. Accounts created
/// inside the transaction have no pre balance and count from zero.
pub fn token_delta(
    pre: &[TokenBalance],
    post: &[TokenBalance],
    owner: &Pubkey,
    mint: &Pubkey,
) -> u64 {
    let owner = owner.to_string();
    let mint = mint.to_string();
    post.iter()
        .filter(|b| b.mint == mint && b.owner.as_deref() == Some(owner.as_str()))
        .map(|after| {
            let before = pre
                .iter()
                .find(|b| b.account_index == after.account_index)
                .map_or(0, |b| b.amount);
            after.amount.saturating_sub(before)
        })
        .sum()
}

/// Checks that a landed transaction carries the expected payment.
pub fn evaluate_payment(
    block_time: Option<i64>,
    keys: &[Pubkey],
    pre: &[u64],
    post: &[u64],
    pre_tokens: &[TokenBalance],
    post_tokens: &[TokenBalance],
    expected: &ExpectedPayment,
) -> PaymentCheck {
    match block_time {
        None => return PaymentCheck::Pending,
        Some(t) if t < expected.not_before - BLOCK_TIME_SKEW_SECS => {
            return PaymentCheck::Mismatch("transaction predates the payment intent".into());
        }
        Some(_) => {}
    }
    if keys.first() != Some(&expected.payer) {
        return PaymentCheck::Mismatch("payment was not signed by the player wallet".into());
    }
    let received = match &expected.mint {
        None => lamport_delta(keys, pre, post, &expected.destination),
        Some(mint) => token_delta(pre_tokens, post_tokens, &expected.destination, mint),
    };
    if received < expected.amount {
        return PaymentCheck::Mismatch(format!(
            "escrow received {received}, expected {}",
            expected.amount
        ));
    }
    PaymentCheck::Confirmed
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENED: i64 = 1_800_000_000;

    fn expected(player: Pubkey, escrow: Pubkey, amount: u64) -> ExpectedPayment {
        ExpectedPayment { payer: player, destination: escrow, amount, mint: None, not_before: OPENED }
    }

    #[test]
    fn sol_payment_needs_full_amount_at_escrow() {
        let player = Pubkey::new_unique();
        let escrow = Pubkey::new_unique();
        let keys = [player, escrow, solana_sdk::system_program::id()];
        let expected = expected(player, escrow, 500);
        let landed = Some(OPENED + 5);

        let check = evaluate_payment(landed, &keys, &[1_000, 0, 1], &[495, 500, 1], &[], &[], &expected);
        assert_eq!(check, PaymentCheck::Confirmed);

        let check = evaluate_payment(landed, &keys, &[1_000, 0, 1], &[795, 200, 1], &[], &[], &expected);
        assert!(matches!(check, PaymentCheck::Mismatch(_)));
    }

    #[test]
    fn payment_from_another_wallet_is_rejected() {
        let player = Pubkey::new_unique();
        let escrow = Pubkey::new_unique();
        let keys = [Pubkey::new_unique(), escrow];
        let expected = expected(player, escrow, 1);

        let check = evaluate_payment(Some(OPENED), &keys, &[10, 0], &[4, 5], &[], &[], &expected);
        assert!(matches!(check, PaymentCheck::Mismatch(_)));
    }

    #[test]
    fn transfers_older_than_the_intent_do_not_count() {
        let player = Pubkey::new_unique();
        let escrow = Pubkey::new_unique();
        let keys = [player, escrow];
        let expected = expected(player, escrow, 500);
        let (pre, post) = ([1_000, 0], [500, 500]);

        let stale = Some(OPENED - BLOCK_TIME_SKEW_SECS - 1);
        let check = evaluate_payment(stale, &keys, &pre, &post, &[], &[], &expected);
        assert_eq!(check, PaymentCheck::Mismatch("transaction predates the payment intent".into()));

        let skewed = Some(OPENED - BLOCK_TIME_SKEW_SECS);
        let check = evaluate_payment(skewed, &keys, &pre, &post, &[], &[], &expected);
        assert_eq!(check, PaymentCheck::Confirmed);

        let check = evaluate_payment(None, &keys, &pre, &post, &[], &[], &expected);
        assert_eq!(check, PaymentCheck::Pending);
    }

    #[test]
    fn token_delta_counts_new_accounts_from_zero() {
        let escrow = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let post = [TokenBalance {
            account_index: 2,
            mint: mint.to_string(),
            owner: Some(escrow.to_string()),
            amount: 7_000_000,
        }];
        assert_eq!(token_delta(&[], &post, &escrow, &mint), 7_000_000);

        let pre = [TokenBalance { amount: 1_000_000, ..post[0].clone() }];
        assert_eq!(token_delta(&pre, &post, &escrow, &mint), 6_000_000);
        assert_eq!(token_delta(&pre, &post, &escrow, &Pubkey::new_unique()), 0);
    }

    #[test]
    fn addresses_parse_or_report_input() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_address(&format!(" {key} ")).unwrap(), key);
        assert!(matches!(parse_address("nope"), Err(ChainError::InvalidAddress(v)) if v == "nope"));
    }
}
