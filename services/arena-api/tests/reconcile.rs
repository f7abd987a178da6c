mod common;

use chrono::{Duration, Utc};
use serde_json::Value;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use arena_api::chain::PaymentCheck;
use arena_api::models::*;
use arena_api::payments::{reconcile_once, ReconcileReport};
use arena_api::store::Store;
use common::{wallet, TestApp};

fn registration(tournament: &Tournament, wallet: &str, signature: &str) -> Value {
    serde_json::to_value(NewParticipation {
        tournament_uuid: tournament.id,
        player_id: None,
        wallet_address: wallet.to_string(),
        tournament_id: tournament.challonge_id.clone(),
        tournament_name: tournament.name.clone(),
        game: tournament.game.clone(),
        entry_fee: tournament.entry_fee_sol,
        in_game_username: "late-payer".into(),
        discord_handle: None,
        team_name: None,
        payment_signature: Some(signature.to_string()),
    })
    .unwrap()
}

async fn intent(
    app: &TestApp,
    tournament: &Tournament,
    wallet: &str,
    update: PaymentIntentUpdate,
) -> PaymentIntent {
    let created = app
        .store
        .insert_payment_intent(NewPaymentIntent {
            kind: PaymentKind::SolEntry,
            tournament_id: tournament.id,
            wallet_address: wallet.to_string(),
            amount: 500_000_000,
            escrow_address: Pubkey::new_unique().to_string(),
        })
        .await
        .unwrap();
    app.store.update_payment_intent(created.id, update).await.unwrap()
}

async fn status_of(app: &TestApp, id: uuid::Uuid) -> PaymentStatus {
    app.store.get_payment_intent(id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn paid_intents_register_the_payer() {
    let app = TestApp::new();
    let tournament = app.seed_tournament(0.5, 8, TournamentStatus::Open).await;
    let player = wallet();
    let sig = Signature::new_unique().to_string();
    let paid = intent(
        &app,
        &tournament,
        &player,
        PaymentIntentUpdate {
            status: Some(PaymentStatus::Paid),
            signature: Some(sig.clone()),
            registration: Some(registration(&tournament, &player, &sig)),
        },
    )
    .await;

    let report = reconcile_once(&app.state, Utc::now()).await.unwrap();
    assert_eq!(report, ReconcileReport { completed: 1, ..Default::default() });
    assert_eq!(status_of(&app, paid.id).await, PaymentStatus::Completed);

    let row = app.store.find_participation(tournament.id, &player).await.unwrap().unwrap();
    assert_eq!(row.payment_signature.as_deref(), Some(sig.as_str()));
    assert_eq!(
        app.store.get_tournament(tournament.id).await.unwrap().unwrap().current_participants,
        1
    );

    assert!(reconcile_once(&app.state, Utc::now()).await.unwrap().is_empty());
}

#[tokio::test]
async fn paid_intents_for_full_tournaments_need_a_refund() {
    let app = TestApp::new();
    let tournament = app.seed_tournament(0.5, 2, TournamentStatus::Open).await;
    app.seed_participant(&tournament, &wallet()).await;
    app.seed_participant(&tournament, &wallet()).await;

    let player = wallet();
    let sig = Signature::new_unique().to_string();
    let paid = intent(
        &app,
        &tournament,
        &player,
        PaymentIntentUpdate {
            status: Some(PaymentStatus::Paid),
            signature: Some(sig.clone()),
            registration: Some(registration(&tournament, &player, &sig)),
        },
    )
    .await;

    let report = reconcile_once(&app.state, Utc::now()).await.unwrap();
    assert_eq!(report.refund_required, 1);
    assert_eq!(status_of(&app, paid.id).await, PaymentStatus::RefundRequired);
    assert!(app.store.find_participation(tournament.id, &player).await.unwrap().is_none());
}

#[tokio::test]
async fn stale_pending_intents_expire() {
    let app = TestApp::new();
    let tournament = app.seed_tournament(0.5, 8, TournamentStatus::Open).await;
    let pending = intent(&app, &tournament, &wallet(), PaymentIntentUpdate::default()).await;

    assert!(reconcile_once(&app.state, Utc::now()).await.unwrap().is_empty());
    assert_eq!(status_of(&app, pending.id).await, PaymentStatus::Pending);

    let later = Utc::now() + app.state.settings.intent_ttl + Duration::minutes(1);
    let report = reconcile_once(&app.state, later).await.unwrap();
    assert_eq!(report.expired, 1);
    assert_eq!(status_of(&app, pending.id).await, PaymentStatus::Expired);
}

#[tokio::test]
async fn late_confirmations_are_picked_up() {
    let app = TestApp::new();
    let tournament = app.seed_tournament(0.5, 8, TournamentStatus::Open).await;
    let player = wallet();
    let signature = Signature::new_unique();
    let pending = intent(
        &app,
        &tournament,
        &player,
        PaymentIntentUpdate {
            status: None,
            signature: Some(signature.to_string()),
            registration: Some(registration(&tournament, &player, &signature.to_string())),
        },
    )
    .await;

    assert!(reconcile_once(&app.state, Utc::now()).await.unwrap().is_empty());

    app.chain.set_payment(signature, PaymentCheck::Confirmed);
    let report = reconcile_once(&app.state, Utc::now()).await.unwrap();
    assert_eq!(report.confirmed, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(status_of(&app, pending.id).await, PaymentStatus::Completed);
    assert!(app.store.find_participation(tournament.id, &player).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_payments_expire_without_registering() {
    let app = TestApp::new();
    let tournament = app.seed_tournament(0.5, 8, TournamentStatus::Open).await;
    let player = wallet();
    let signature = Signature::new_unique();
    app.chain.set_payment(signature, PaymentCheck::Failed("InsufficientFunds".into()));
    let pending = intent(
        &app,
        &tournament,
        &player,
        PaymentIntentUpdate {
            signature: Some(signature.to_string()),
            ..Default::default()
        },
    )
    .await;

    let report = reconcile_once(&app.state, Utc::now()).await.unwrap();
    assert_eq!(report, ReconcileReport { expired: 1, ..Default::default() });
    assert_eq!(status_of(&app, pending.id).await, PaymentStatus::Expired);
    assert!(app.store.find_participation(tournament.id, &player).await.unwrap().is_none());
}
