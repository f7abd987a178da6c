use async_trait::async_trait;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::{UiTransactionEncoding, UiTransactionTokenBalance};

use super::{evaluate_payment, ChainClient, ChainError, ExpectedPayment, PaymentCheck, TokenBalance};

/// `ChainClient` over the Solana JSON-RPC API.
pub struct RpcChain {
    client: RpcClient,
}

impl RpcChain {
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
        }
    }
}

fn token_balances(balances: Option<Vec<UiTransactionTokenBalance>>) -> Vec<TokenBalance> {
    balances
        .unwrap_or_default()
        .into_iter()
        .map(|b| TokenBalance {
            account_index: b.account_index,
            mint: b.mint,
            owner: Option::<String>::from(b.owner),
            amount: b.ui_token_amount.amount.parse().unwrap_or(0),
        })
        .collect()
}

#[async_trait]
impl ChainClient for RpcChain {
    async fn account_owner(&self, address: &Pubkey) -> Result<Option<Pubkey>, ChainError> {
        let account = self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await?
            .value;
        Ok(account.map(|a| a.owner))
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<Option<u64>, ChainError> {
        if self.account_owner(token_account).await?.is_none() {
            return Ok(None);
        }
        let balance = self.client.get_token_account_balance(token_account).await?;
        let raw = balance
            .amount
            .parse::<u64>()
            .map_err(|_| ChainError::Decode(format!("token amount {}", balance.amount)))?;
        Ok(Some(raw))
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64), ChainError> {
        let latest = self
            .client
            .get_latest_blockhash_with_commitment(CommitmentConfig::finalized())
            .await?;
        Ok(latest)
    }

    async fn check_payment(
        &self,
        signature: &Signature,
        expected: &ExpectedPayment,
    ) -> Result<PaymentCheck, ChainError> {
        // --- status ---
        let statuses = self.client.get_signature_statuses(&[*signature]).await?.value;
        let Some(Some(status)) = statuses.into_iter().next() else {
            return Ok(PaymentCheck::Pending);
        };
        if let Some(err) = status.err {
            return Ok(PaymentCheck::Failed(err.to_string()));
        }
        if !status.satisfies_commitment(CommitmentConfig::confirmed()) {
            return Ok(PaymentCheck::Pending);
        }

        // --- balances ---
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let confirmed = self.client.get_transaction_with_config(signature, config).await?;
        let meta = confirmed
            .transaction
            .meta
            .ok_or_else(|| ChainError::Decode(format!("transaction meta for {signature}")))?;
        if let Some(err) = meta.err {
            return Ok(PaymentCheck::Failed(err.to_string()));
        }
        let tx = confirmed
            .transaction
            .transaction
            .decode()
            .ok_or_else(|| ChainError::Decode(format!("transaction {signature}")))?;

        Ok(evaluate_payment(
            confirmed.block_time,
            tx.message.static_account_keys(),
            &meta.pre_balances,
            &meta.post_balances,
            &token_balances(meta.pre_token_balances.into()),
            &token_balances(meta.post_token_balances.into()),
            expected,
        ))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ChainError> {
        let signature = self.client.send_and_confirm_transaction(tx).await?;
        tracing::info!(%signature, "transaction confirmed");
        Ok(signature)
    }
}
