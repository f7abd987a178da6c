mod common;

use axum::http::StatusCode;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;

use arena_api::launch::TEAM_ASSETS_BUCKET;
use arena_api::models::{ProfileRole, TeamStatus};
use arena_api::pda;
use arena_api::store::Store;
use common::{wallet, TestApp};

#[tokio::test]
async fn record_win_by_a_non_admin_changes_nothing() {
    let app = TestApp::new();
    let team = app.seed_team(Some(wallet())).await;
    let player = wallet();
    app.seed_profile(&player, ProfileRole::Player).await;
    let body = json!({ "teamId": team.id, "payoutAmount": 2.5, "actorWallet": player });

    let (status, resp) = app.post("/api/admin/record-win", body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["error"], "Unauthorized - admin access required");

    let (status, resp) = app
        .post("/api/admin/record-win", json!({ "teamId": team.id, "payoutAmount": 2.5 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["error"], "Unauthorized");

    let stored = app.store.get_team(team.id).await.unwrap().unwrap();
    assert_eq!(stored.total_wins, 0);
    assert_eq!(stored.total_earnings, 0.0);
    assert!(app.store.list_audit_log(&team.id.to_string()).await.unwrap().is_empty());
}

#[tokio::test]
async fn admins_record_wins_with_an_audit_trail() {
    let app = TestApp::new();
    let team = app.seed_team(Some(wallet())).await;
    let admin = wallet();
    app.seed_profile(&admin, ProfileRole::Admin).await;

    let (status, resp) = app
        .post(
            "/api/admin/record-win",
            json!({ "teamId": team.id, "matchId": "m-7", "tournamentId": 4242, "payoutAmount": 2.5, "actorWallet": admin }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["message"], "Win recorded successfully");

    let stored = app.store.get_team(team.id).await.unwrap().unwrap();
    assert_eq!(stored.total_wins, 1);
    assert_eq!(stored.total_earnings, 2.5);

    let log = app.store.list_audit_log(&team.id.to_string()).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action, "record_win");
    assert_eq!(log[0].actor_wallet, admin);
    assert_eq!(log[0].payload["matchId"], "m-7");

    let (status, _) = app
        .post(
            "/api/admin/record-win",
            json!({ "teamId": uuid::Uuid::new_v4(), "payoutAmount": 1, "actorWallet": admin }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn teams_are_created_as_drafts_with_upper_case_symbols() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/teams", json!({ "name": "Night Owls", "symbol": "owl", "creatorWallet": wallet() }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["team"]["symbol"], "OWL");
    assert_eq!(body["team"]["status"], "draft");

    let (status, _) = app
        .post("/api/teams", json!({ "name": "Night Owls", "symbol": "TOOLONGSYMBOL" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/teams").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["teams"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn launch_fails_loudly_when_the_pool_config_is_missing() {
    let app = TestApp::new();
    let team = app.seed_team(Some(wallet())).await;

    let (status, body) = app
        .post(&format!("/api/teams/{}/launch", team.id), json!({ "walletAddress": wallet() }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "DBC pool configuration not found on blockchain. The config address may be invalid."
    );
    assert_eq!(body["configAddress"], app.state.settings.dbc_config.to_string());
}

#[tokio::test]
async fn launch_prepares_the_pool_and_uploads_metadata() {
    let app = TestApp::new();
    let settings = app.state.settings.clone();
    app.chain.set_owner(settings.dbc_config, settings.dbc_program_id);
    let team = app.seed_team(Some(wallet())).await;

    let (status, body) = app
        .post(&format!("/api/teams/{}/launch", team.id), json!({ "walletAddress": wallet() }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    let uri = format!("{}/teams/{}", settings.public_base_url, team.id);
    assert_eq!(body["metadataUri"], uri.as_str());

    let (bytes, content_type) = app
        .storage
        .get(TEAM_ASSETS_BUCKET, &format!("team-metadata/{}.json", team.id))
        .expect("metadata uploaded");
    assert_eq!(content_type, "application/json");
    let metadata: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(metadata["symbol"], "OWL");
    assert_eq!(metadata["attributes"][1]["value"], "EU");

    let (status, body) = app
        .post(&format!("/api/teams/{}/launch", uuid::Uuid::new_v4()), json!({ "walletAddress": wallet() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Team not found");
}

#[tokio::test]
async fn launch_needs_a_creator_wallet() {
    let app = TestApp::new();
    let team = app.seed_team(None).await;
    let (status, body) = app
        .post(&format!("/api/teams/{}/launch", team.id), json!({ "walletAddress": wallet() }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Team has no creator wallet");
}

#[tokio::test]
async fn confirming_a_launch_requires_the_pool_on_chain() {
    let app = TestApp::new();
    let team = app.seed_team(Some(wallet())).await;
    let pool = Pubkey::new_unique();
    let confirm = json!({
        "txSignature": "5ig",
        "mintAddress": Pubkey::new_unique().to_string(),
        "poolAddress": pool.to_string(),
        "bondingCurveAddress": Pubkey::new_unique().to_string(),
        "metadataUri": "https://arena.example/teams/1",
    });
    let uri = format!("/api/teams/{}/launch", team.id);

    let (status, body) = app.put(&uri, confirm.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["poolAddress"], pool.to_string());

    app.chain.set_owner(pool, app.state.settings.dbc_program_id);
    let (status, body) = app.put(&uri, confirm).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["team"]["status"], "live");

    let (status, body) = app
        .post(&format!("/api/teams/{}/launch", team.id), json!({ "walletAddress": wallet() }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Team has already been launched");
}

async fn launched_team(app: &TestApp) -> (arena_api::models::Team, Pubkey, Pubkey) {
    let creator = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let team = app.seed_team(Some(creator.to_string())).await;
    let pool = Pubkey::new_unique();
    app.chain.set_owner(pool, app.state.settings.dbc_program_id);
    let (status, _) = app
        .put(
            &format!("/api/teams/{}/launch", team.id),
            json!({
                "txSignature": "5ig",
                "mintAddress": mint.to_string(),
                "poolAddress": pool.to_string(),
                "bondingCurveAddress": Pubkey::new_unique().to_string(),
                "metadataUri": "https://arena.example/teams/1",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    (team, creator, mint)
}

#[tokio::test]
async fn stake_pool_is_derived_until_registered() {
    let app = TestApp::new();
    let draft = app.seed_team(Some(wallet())).await;
    let (status, body) = app.get(&format!("/api/teams/{}/stake-pool", draft.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Team token not launched");

    let (team, creator, mint) = launched_team(&app).await;
    let staking = app.state.settings.staking_program_id;
    let expected = pda::stake_pool(&staking, &mint, &creator, 0);

    let (status, body) = app.get(&format!("/api/teams/{}/stake-pool", team.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isCreated"], false);
    assert_eq!(body["stakePoolAddress"], expected.to_string());

    let admin = wallet();
    app.seed_profile(&admin, ProfileRole::Admin).await;
    let uri = format!("/api/teams/{}/stake-pool", team.id);

    let (status, body) = app.post(&uri, json!({ "actorWallet": admin })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["stakePoolAddress"], expected.to_string());

    app.chain.set_owner(expected, staking);
    let (status, body) = app.post(&uri, json!({ "actorWallet": admin })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["weightSchedule"]["maxDurationSecs"], 2_592_000);

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isCreated"], true);

    let (status, body) = app.post(&uri, json!({ "actorWallet": admin })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Stake pool already exists for this team");
}

#[tokio::test]
async fn stakes_accumulate_on_live_teams() {
    let app = TestApp::new();
    let draft = app.seed_team(Some(wallet())).await;
    let staker = wallet();
    let (status, _) = app
        .post(&format!("/api/teams/{}/stakes", draft.id), json!({ "stakerWallet": staker, "amount": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (team, _, _) = launched_team(&app).await;
    let uri = format!("/api/teams/{}/stakes", team.id);
    app.post(&uri, json!({ "stakerWallet": staker, "amount": 5 })).await;
    let (status, body) = app
        .post(&uri, json!({ "stakerWallet": staker, "amount": 2.5, "lockDurationSecs": 2_592_000 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["stake"]["amount"], 7.5);
    assert_eq!(body["weight"], 2.0);

    let (_, detail) = app.get(&format!("/api/teams/{}", team.id)).await;
    assert_eq!(detail["totalStaked"], 7.5);
    assert_eq!(detail["team"]["status"], "live");
    let stored = app.store.get_team(team.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TeamStatus::Live);
}

#[tokio::test]
async fn a_live_team_keeps_its_first_launch() {
    let app = TestApp::new();
    let (team, _, mint) = launched_team(&app).await;
    let other_pool = Pubkey::new_unique();
    app.chain.set_owner(other_pool, app.state.settings.dbc_program_id);

    let (status, body) = app
        .put(
            &format!("/api/teams/{}/launch", team.id),
            json!({
                "txSignature": "6ig",
                "mintAddress": Pubkey::new_unique().to_string(),
                "poolAddress": other_pool.to_string(),
                "bondingCurveAddress": Pubkey::new_unique().to_string(),
                "metadataUri": "https://arena.example/teams/2",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Team has already been launched");

    let stored = app.store.get_team(team.id).await.unwrap().unwrap();
    assert_eq!(stored.team_mint, Some(mint.to_string()));
    assert_eq!(stored.launch_tx.as_deref(), Some("5ig"));
}
