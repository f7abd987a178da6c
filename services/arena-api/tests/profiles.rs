mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;

use arena_api::models::{PlayerProfile, ProfileRole, TournamentStatus};
use arena_api::store::Store;
use arena_api::wallet::{profile_message, KeypairWallet, WalletSigner};
use common::{wallet, TestApp};

async fn signed_profile(signer: &KeypairWallet, username: &str) -> serde_json::Value {
    let address = signer.pubkey().to_string();
    let message = profile_message(&address, username, "2026-10-16T12:00:00Z");
    let signature = signer.sign_message(message.as_bytes()).await.unwrap();
    json!({
        "walletAddress": address,
        "username": username,
        "favoriteGames": ["Valorant"],
        "message": message,
        "signature": STANDARD.encode(signature.as_ref()),
    })
}

#[tokio::test]
async fn profiles_require_a_matching_signature() {
    let app = TestApp::new();
    let signer = KeypairWallet::generate();

    let (status, body) = app.post("/api/profiles", signed_profile(&signer, "ace").await).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["username"], "ace");
    assert_eq!(body["role"], "player");

    let (status, body) = app.post("/api/profiles", signed_profile(&signer, "ace").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Profile already exists");

    let (status, body) = app.get(&format!("/api/profiles/{}", signer.pubkey())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wallet_address"], signer.pubkey().to_string());
}

#[tokio::test]
async fn forged_or_mismatched_messages_are_rejected() {
    let app = TestApp::new();
    let signer = KeypairWallet::generate();
    let other = KeypairWallet::generate();

    let mut forged = signed_profile(&other, "ace").await;
    forged["walletAddress"] = json!(signer.pubkey().to_string());
    let (status, body) = app.post("/api/profiles", forged).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid wallet signature");

    let mut renamed = signed_profile(&signer, "ace").await;
    renamed["username"] = json!("king");
    let (status, _) = app.post("/api/profiles", renamed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/profiles", json!({ "walletAddress": signer.pubkey().to_string(), "username": "ace" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    assert!(app.store.get_profile(&signer.pubkey().to_string()).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_profiles_are_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get(&format!("/api/profiles/{}", wallet())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Player profile not found");
}

#[tokio::test]
async fn participation_history_lists_every_entry() {
    let app = TestApp::new();
    let player = wallet();
    let first = app.seed_tournament(0.0, 8, TournamentStatus::Open).await;
    let second = app.seed_tournament(0.0, 8, TournamentStatus::Open).await;
    app.seed_participant(&first, &player).await;
    app.seed_participant(&second, &player).await;

    let (status, body) = app.get(&format!("/api/profiles/{player}/participations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn stats_summarise_the_platform() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activePlayers"], 0);
    assert_eq!(body["winRate"], 0);

    let mut champ = app.seed_profile(&wallet(), ProfileRole::Player).await;
    champ.wins = 3;
    champ.losses = 1;
    app.store.put_profile(champ).await;
    app.seed_profile(&wallet(), ProfileRole::Player).await;

    let open = app.seed_tournament(0.5, 8, TournamentStatus::Open).await;
    app.seed_tournament(0.5, 8, TournamentStatus::Completed).await;
    let entry = app.seed_participant(&open, &wallet()).await;
    app.seed_participant(&open, &wallet()).await;
    app.store.award_placement(entry.id, 1, 0.456).await.unwrap();

    let (status, body) = app.get("/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activePlayers"], 2);
    assert_eq!(body["winRate"], 75);
    assert_eq!(body["activeTournaments"], 1);
    assert_eq!(body["totalPrizesSol"], 0.46);
    assert_eq!(body["topGames"][0]["game"], "Valorant");
    assert_eq!(body["topGames"][0]["activePlayers"], 2);
}

#[tokio::test]
async fn leaderboards_rank_by_wins_within_a_game() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/leaderboards").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "game is required");

    for wins in [1, 5, 3] {
        let mut profile: PlayerProfile = app.seed_profile(&wallet(), ProfileRole::Player).await;
        profile.wins = wins;
        app.store.put_profile(profile).await;
    }
    let team = app.seed_team(None).await;
    app.store.record_team_win(team.id, 1.0).await.unwrap();

    let (status, body) = app.get("/api/leaderboards?game=Valorant").await;
    assert_eq!(status, StatusCode::OK);
    let wins: Vec<i64> = body["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["wins"].as_i64().unwrap())
        .collect();
    assert_eq!(wins, vec![5, 3, 1]);
    assert_eq!(body["teams"][0]["total_wins"], 1);

    let (_, body) = app.get("/api/leaderboards?game=Dota").await;
    assert!(body["players"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_answers_ok() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
