//! ARENA token helpers: the wager pot split, balances and burn transactions.

use serde::Serialize;
use solana_sdk::{hash::Hash, pubkey::Pubkey, transaction::Transaction};
use spl_associated_token_account::get_associated_token_address;

use crate::chain::{ChainClient, ChainError};

pub const ARENA_DECIMALS: u8 = 6;

pub const WINNER_PERCENTAGE: f64 = 50.0;
pub const GIVEAWAY_PERCENTAGE: f64 = 25.0;
pub const BURN_PERCENTAGE: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeDistribution {
    pub winner_amount: f64,
    pub giveaway_amount: f64,
    pub burn_amount: f64,
    pub total: f64,
}

/// 50% to the winner, 25% to giveaways, 25% burned.
pub fn calculate_prize_distribution(total_pot: f64) -> PrizeDistribution {
    PrizeDistribution {
        winner_amount: total_pot * WINNER_PERCENTAGE / 100.0,
        giveaway_amount: total_pot * GIVEAWAY_PERCENTAGE / 100.0,
        burn_amount: total_pot * BURN_PERCENTAGE / 100.0,
        total: total_pot,
    }
}

/// UI amount to base units, rounded down.
pub fn to_raw_amount(amount: f64, decimals: u8) -> u64 {
    (amount * 10f64.powi(decimals as i32)).floor() as u64
}

pub fn from_raw_amount(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// ARENA balance of `wallet` as a UI amount. A missing token account (or
/// an unreachable RPC) reads as zero.
pub async fn get_arena_balance(chain: &dyn ChainClient, mint: &Pubkey, wallet: &Pubkey) -> f64 {
    let ata = get_associated_token_address(wallet, mint);
    match chain.token_balance(&ata).await {
        Ok(Some(raw)) => from_raw_amount(raw, ARENA_DECIMALS),
        Ok(None) => 0.0,
        Err(err) => {
            tracing::warn!(%wallet, error = %err, "failed to read ARENA balance");
            0.0
        }
    }
}

/// Unsigned burn of `amount` ARENA from the wallet's token account, with
/// the wallet as fee payer.
pub fn burn_transaction(
    mint: &Pubkey,
    wallet: &Pubkey,
    amount: f64,
    blockhash: Hash,
) -> Result<Transaction, ChainError> {
    let ata = get_associated_token_address(wallet, mint);
    let ix = spl_token::instruction::burn_checked(
        &spl_token::id(),
        &ata,
        mint,
        wallet,
        &[],
        to_raw_amount(amount, ARENA_DECIMALS),
        ARENA_DECIMALS,
    )
    .map_err(|e| ChainError::Instruction(e.to_string()))?;

    let mut tx = Transaction::new_with_payer(&[ix], Some(wallet));
    tx.message.recent_blockhash = blockhash;
    Ok(tx)
}

pub async fn create_burn_transaction(
    chain: &dyn ChainClient,
    mint: &Pubkey,
    wallet: &Pubkey,
    amount: f64,
) -> Result<(Transaction, Hash, u64), ChainError> {
    let (blockhash, last_valid_block_height) = chain.latest_blockhash().await?;
    let tx = burn_transaction(mint, wallet, amount, blockhash)?;
    Ok((tx, blockhash, last_valid_block_height))
}
