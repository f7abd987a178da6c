//! Join payments as a saga: an intent is opened before the wallet pays,
//! marked `paid` once the transfer is confirmed on chain, and `completed`
//! once the registration row exists. The reconciler finishes or flags
//! whatever a request left half done.

use std::time::Duration;

use anchor_lang::{InstructionData, ToAccountMetas};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use solana_sdk::{
    hash::Hash, instruction::Instruction, native_token::sol_to_lamports, pubkey::Pubkey,
    system_program, transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use uuid::Uuid;

use crate::arena_token::{to_raw_amount, ARENA_DECIMALS};
use crate::chain::{parse_address, parse_signature, ChainError, ExpectedPayment, PaymentCheck};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    NewParticipation, NewPaymentIntent, NewWagerParticipant, PaymentIntent, PaymentIntentUpdate,
    PaymentKind, PaymentStatus, Tournament, WagerTournament,
};
use crate::pda;
use crate::state::AppState;
use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub intent_id: Uuid,
    pub escrow_address: String,
    /// Base units: lamports, or ARENA units for wagers.
    pub amount: u64,
    /// Unsigned base64 transaction for the wallet to sign.
    pub transaction: String,
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

// ===== TRANSACTIONS =====

/// `register_for_tournament` for `payer`. The program moves the entry fee
/// into the tournament escrow and records the registration PDA.
pub fn sol_entry_transaction(
    program_id: &Pubkey,
    tournament_id: &str,
    payer: &Pubkey,
    blockhash: Hash,
) -> Transaction {
    let tournament = pda::tournament(program_id, tournament_id);
    let accounts = sol_arena::accounts::RegisterForTournament {
        tournament,
        registration: pda::registration(program_id, &tournament, payer),
        tournament_escrow: pda::tournament_escrow(program_id, tournament_id),
        protocol_config: pda::protocol_config(program_id),
        player: *payer,
        system_program: system_program::ID,
    };
    let ix = Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: sol_arena::instruction::RegisterForTournament {}.data(),
    };
    let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
    tx.message.recent_blockhash = blockhash;
    tx
}

/// ARENA transfer from the player's token account to the escrow wallet's,
/// creating the escrow account when it doesn't exist yet.
pub fn arena_wager_transaction(
    mint: &Pubkey,
    payer: &Pubkey,
    escrow_wallet: &Pubkey,
    amount: u64,
    blockhash: Hash,
) -> Result<Transaction, ChainError> {
    let source = get_associated_token_address(payer, mint);
    let destination = get_associated_token_address(escrow_wallet, mint);
    let create_ata =
        create_associated_token_account_idempotent(payer, escrow_wallet, mint, &spl_token::id());
    let transfer = spl_token::instruction::transfer_checked(
        &spl_token::id(),
        &source,
        mint,
        &destination,
        payer,
        &[],
        amount,
        ARENA_DECIMALS,
    )
    .map_err(|e| ChainError::Instruction(e.to_string()))?;

    let mut tx = Transaction::new_with_payer(&[create_ata, transfer], Some(payer));
    tx.message.recent_blockhash = blockhash;
    Ok(tx)
}

/// `claim_prize` for `winner`, who signs and pays the fee.
pub fn claim_prize_transaction(
    program_id: &Pubkey,
    tournament_id: &str,
    winner: &Pubkey,
    blockhash: Hash,
) -> Transaction {
    let accounts = sol_arena::accounts::ClaimPrize {
        tournament: pda::tournament(program_id, tournament_id),
        tournament_escrow: pda::tournament_escrow(program_id, tournament_id),
        winner: *winner,
        system_program: system_program::ID,
    };
    let ix = Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: sol_arena::instruction::ClaimPrize {}.data(),
    };
    let mut tx = Transaction::new_with_payer(&[ix], Some(winner));
    tx.message.recent_blockhash = blockhash;
    tx
}

/// `finalize_tournament` with `winners` in placement order (one to three).
/// Each winner's registration PDA is passed alongside.
pub fn finalize_instruction(
    program_id: &Pubkey,
    tournament_id: &str,
    authority: &Pubkey,
    winners: &[Pubkey],
) -> Option<Instruction> {
    let first_place = *winners.first()?;
    let tournament = pda::tournament(program_id, tournament_id);
    let registration = |place: usize| {
        winners
            .get(place)
            .map(|player| pda::registration(program_id, &tournament, player))
    };
    let accounts = sol_arena::accounts::FinalizeTournament {
        tournament,
        first_registration: registration(0)?,
        second_registration: registration(1),
        third_registration: registration(2),
        authority: *authority,
    };
    let args = sol_arena::instruction::FinalizeTournament {
        first_place,
        second_place: winners.get(1).copied(),
        third_place: winners.get(2).copied(),
    };
    Some(Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    })
}

pub fn encode_transaction(tx: &Transaction) -> Result<String, ChainError> {
    let bytes = bincode::serialize(tx).map_err(|e| ChainError::Instruction(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

fn expected_payment(intent: &PaymentIntent, arena_mint: &Pubkey) -> Result<ExpectedPayment, ChainError> {
    Ok(ExpectedPayment {
        payer: parse_address(&intent.wallet_address)?,
        destination: parse_address(&intent.escrow_address)?,
        amount: intent.amount as u64,
        mint: match intent.kind {
            PaymentKind::SolEntry => None,
            PaymentKind::ArenaWager => Some(*arena_mint),
        },
        not_before: intent.created_at.timestamp(),
    })
}

/// On-chain id of a tournament whose program account exists.
pub async fn onchain_tournament(state: &AppState, tournament: &Tournament) -> ApiResult<String> {
    let program_id = state.settings.program_id;
    let onchain_id = tournament.onchain_id();
    let account = pda::tournament(&program_id, &onchain_id);
    if state.chain.account_owner(&account).await? != Some(program_id) {
        return Err(ApiError::bad_request("Tournament is not initialized on chain"));
    }
    Ok(onchain_id)
}

// ===== INTENTS =====

/// Reuses the wallet's pending intent for the tournament or records a new
/// one. A wallet that already paid has nothing left to pay.
async fn open_intent(
    state: &AppState,
    kind: PaymentKind,
    tournament_id: Uuid,
    wallet: &Pubkey,
    escrow: &Pubkey,
    amount: u64,
) -> ApiResult<PaymentIntent> {
    let wallet_address = wallet.to_string();
    match state
        .store
        .find_open_intent(kind, tournament_id, &wallet_address)
        .await?
    {
        Some(intent) if intent.status == PaymentStatus::Paid => Err(ApiError::bad_request(
            "Payment already received for this tournament",
        )),
        Some(intent) if intent.amount == amount as i64 => Ok(intent),
        Some(stale) => {
            state
                .store
                .update_payment_intent(
                    stale.id,
                    PaymentIntentUpdate {
                        status: Some(PaymentStatus::Expired),
                        ..Default::default()
                    },
                )
                .await?;
            insert_intent(state, kind, tournament_id, wallet_address, escrow, amount).await
        }
        None => insert_intent(state, kind, tournament_id, wallet_address, escrow, amount).await,
    }
}

async fn insert_intent(
    state: &AppState,
    kind: PaymentKind,
    tournament_id: Uuid,
    wallet_address: String,
    escrow: &Pubkey,
    amount: u64,
) -> ApiResult<PaymentIntent> {
    let intent = state
        .store
        .insert_payment_intent(NewPaymentIntent {
            kind,
            tournament_id,
            wallet_address,
            amount: amount as i64,
            escrow_address: escrow.to_string(),
        })
        .await?;
    tracing::info!(intent = %intent.id, ?kind, %tournament_id, amount, "payment intent opened");
    Ok(intent)
}

pub async fn open_sol_entry_intent(
    state: &AppState,
    tournament: &Tournament,
    wallet: &Pubkey,
) -> ApiResult<PaymentIntentResponse> {
    let lamports = sol_to_lamports(tournament.entry_fee_sol);
    if lamports == 0 {
        return Err(ApiError::bad_request("Tournament has no entry fee"));
    }
    let program_id = state.settings.program_id;
    let onchain_id = onchain_tournament(state, tournament).await?;
    let escrow = pda::tournament_escrow(&program_id, &onchain_id);
    let intent = open_intent(state, PaymentKind::SolEntry, tournament.id, wallet, &escrow, lamports).await?;

    let (blockhash, last_valid_block_height) = state.chain.latest_blockhash().await?;
    let tx = sol_entry_transaction(&program_id, &onchain_id, wallet, blockhash);
    Ok(PaymentIntentResponse {
        intent_id: intent.id,
        escrow_address: escrow.to_string(),
        amount: lamports,
        transaction: encode_transaction(&tx)?,
        blockhash: blockhash.to_string(),
        last_valid_block_height,
    })
}

pub async fn open_arena_wager_intent(
    state: &AppState,
    tournament: &WagerTournament,
    wallet: &Pubkey,
) -> ApiResult<PaymentIntentResponse> {
    let escrow = parse_address(&tournament.escrow_wallet)?;
    let amount = to_raw_amount(tournament.entry_wager, ARENA_DECIMALS);
    if amount == 0 {
        return Err(ApiError::bad_request("Tournament has no entry wager"));
    }
    let intent = open_intent(state, PaymentKind::ArenaWager, tournament.id, wallet, &escrow, amount).await?;

    let mint = state.settings.arena_mint;
    let (blockhash, last_valid_block_height) = state.chain.latest_blockhash().await?;
    let tx = arena_wager_transaction(&mint, wallet, &escrow, amount, blockhash)?;
    Ok(PaymentIntentResponse {
        intent_id: intent.id,
        escrow_address: escrow.to_string(),
        amount,
        transaction: encode_transaction(&tx)?,
        blockhash: blockhash.to_string(),
        last_valid_block_height,
    })
}

/// Attaches `signature` and the registration payload to the wallet's open
/// intent and checks the transfer on chain. Returns the `paid` intent.
pub async fn confirm_payment(
    state: &AppState,
    kind: PaymentKind,
    tournament_id: Uuid,
    wallet: &str,
    signature: &str,
    registration: Value,
) -> ApiResult<PaymentIntent> {
    let intent = state
        .store
        .find_open_intent(kind, tournament_id, wallet)
        .await?
        .ok_or_else(|| {
            ApiError::bad_request("No pending payment for this tournament. Request a payment intent first.")
        })?;

    if intent.status == PaymentStatus::Paid {
        return match intent.signature.as_deref() {
            Some(paid) if paid == signature => Ok(intent),
            _ => Err(ApiError::bad_request(
                "A different payment is already recorded for this tournament",
            )),
        };
    }

    let parsed = parse_signature(signature)
        .map_err(|_| ApiError::bad_request("Invalid transaction signature"))?;
    let intent = state
        .store
        .update_payment_intent(
            intent.id,
            PaymentIntentUpdate {
                signature: Some(signature.to_string()),
                registration: Some(registration),
                ..Default::default()
            },
        )
        .await?;

    let expected = expected_payment(&intent, &state.settings.arena_mint)?;
    match state.chain.check_payment(&parsed, &expected).await? {
        PaymentCheck::Confirmed => {
            let intent = set_status(state, intent.id, PaymentStatus::Paid).await?;
            tracing::info!(intent = %intent.id, signature, "payment confirmed");
            Ok(intent)
        }
        PaymentCheck::Pending => Err(ApiError::bad_request("Payment not confirmed")),
        PaymentCheck::Failed(reason) => {
            set_status(state, intent.id, PaymentStatus::Expired).await?;
            tracing::warn!(intent = %intent.id, signature, %reason, "payment transaction failed");
            Err(ApiError::bad_request("Payment transaction failed"))
        }
        PaymentCheck::Mismatch(reason) => {
            tracing::warn!(intent = %intent.id, signature, %reason, "payment mismatch");
            Err(ApiError::bad_request(format!("Payment does not match: {reason}")))
        }
    }
}

pub async fn complete_intent(state: &AppState, id: Uuid) -> ApiResult<PaymentIntent> {
    Ok(set_status(state, id, PaymentStatus::Completed).await?)
}

async fn set_status(state: &AppState, id: Uuid, status: PaymentStatus) -> StoreResult<PaymentIntent> {
    state
        .store
        .update_payment_intent(
            id,
            PaymentIntentUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
}

// ===== RECONCILIATION =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub confirmed: usize,
    pub expired: usize,
    pub completed: usize,
    pub refund_required: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

enum Settlement {
    Registered,
    Refund(String),
}

/// Replays the registration stored on a paid intent.
async fn settle(state: &AppState, intent: &PaymentIntent) -> StoreResult<Settlement> {
    let Some(registration) = intent.registration.clone() else {
        return Ok(Settlement::Refund("no registration recorded".into()));
    };
    let outcome = match intent.kind {
        PaymentKind::SolEntry => match serde_json::from_value::<NewParticipation>(registration) {
            Ok(new) => state.store.register_participant(new).await.map(|_| ()),
            Err(err) => return Ok(Settlement::Refund(format!("unreadable registration: {err}"))),
        },
        PaymentKind::ArenaWager => match serde_json::from_value::<NewWagerParticipant>(registration) {
            Ok(new) => state.store.join_wager_tournament(new).await.map(|_| ()),
            Err(err) => return Ok(Settlement::Refund(format!("unreadable registration: {err}"))),
        },
    };
    match outcome {
        Ok(()) | Err(StoreError::Duplicate) => Ok(Settlement::Registered),
        Err(StoreError::Full) => Ok(Settlement::Refund("tournament is full".into())),
        Err(StoreError::Closed) => Ok(Settlement::Refund("registration is closed".into())),
        Err(StoreError::NotFound) => Ok(Settlement::Refund("tournament not found".into())),
        Err(StoreError::SignatureInUse) => {
            Ok(Settlement::Refund("signature already backs another registration".into()))
        }
        Err(err) => Err(err),
    }
}

/// One pass over open intents: re-checks pending payments, expires stale
/// ones and settles paid ones.
pub async fn reconcile_once(state: &AppState, now: DateTime<Utc>) -> StoreResult<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let cutoff = now - state.settings.intent_ttl;

    for intent in state.store.list_payment_intents(PaymentStatus::Pending).await? {
        let check = match intent.signature.as_deref() {
            Some(signature) => {
                let expected = expected_payment(&intent, &state.settings.arena_mint);
                match (parse_signature(signature), expected) {
                    (Ok(sig), Ok(expected)) => match state.chain.check_payment(&sig, &expected).await {
                        Ok(check) => Some(check),
                        Err(err) => {
                            tracing::warn!(intent = %intent.id, error = %err, "payment re-check failed");
                            None
                        }
                    },
                    _ => Some(PaymentCheck::Mismatch("unreadable signature or address".into())),
                }
            }
            None => None,
        };

        match check {
            Some(PaymentCheck::Confirmed) => {
                set_status(state, intent.id, PaymentStatus::Paid).await?;
                report.confirmed += 1;
            }
            Some(PaymentCheck::Failed(reason)) | Some(PaymentCheck::Mismatch(reason)) => {
                tracing::info!(intent = %intent.id, %reason, "expiring payment intent");
                set_status(state, intent.id, PaymentStatus::Expired).await?;
                report.expired += 1;
            }
            Some(PaymentCheck::Pending) | None if intent.created_at < cutoff => {
                set_status(state, intent.id, PaymentStatus::Expired).await?;
                report.expired += 1;
            }
            _ => {}
        }
    }

    for intent in state.store.list_payment_intents(PaymentStatus::Paid).await? {
        match settle(state, &intent).await? {
            Settlement::Registered => {
                set_status(state, intent.id, PaymentStatus::Completed).await?;
                report.completed += 1;
            }
            Settlement::Refund(reason) => {
                tracing::warn!(
                    intent = %intent.id,
                    wallet = %intent.wallet_address,
                    amount = intent.amount,
                    escrow = %intent.escrow_address,
                    %reason,
                    "paid intent needs a manual refund"
                );
                set_status(state, intent.id, PaymentStatus::RefundRequired).await?;
                report.refund_required += 1;
            }
        }
    }

    Ok(report)
}

pub async fn run_reconciler(state: AppState, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match reconcile_once(&state, Utc::now()).await {
            Ok(report) if !report.is_empty() => {
                tracing::info!(?report, "payment intents reconciled");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "reconciliation pass failed"),
        }
    }
}
