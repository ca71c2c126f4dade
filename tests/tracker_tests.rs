use pocket_tracker::auth::{Session, User};
use pocket_tracker::config::ClientOptions;
use pocket_tracker::error::Error;
use pocket_tracker::matching::MatchOptions;
use pocket_tracker::progress::{overall, ALL_PACKS};
use pocket_tracker::Tracker;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(user_id: &str) -> Session {
    Session {
        access_token: "test_access_token".to_string(),
        refresh_token: "test_refresh_token".to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: Some(4102444800), // 2100-01-01
        user: User {
            id: user_id.to_string(),
            email: None,
            role: None,
            created_at: None,
            updated_at: None,
        },
    }
}

fn catalog_body() -> serde_json::Value {
    json!([
        { "id": "A", "name": "Card A", "pack": "P1", "type": "Grass", "rarity": "◊" },
        { "id": "B", "name": "Card B", "pack": "P1", "type": "Fire", "rarity": "◊◊" },
        { "id": "C", "name": "Card C", "pack": "P2", "type": "Water", "rarity": "◊" }
    ])
}

fn tracker_for(mock_server: &MockServer, user_id: &str) -> Tracker {
    let options = ClientOptions::default()
        .with_catalog_url(&format!("{}/catalog/v4.json", mock_server.uri()));
    let tracker = Tracker::new_with_options(&mock_server.uri(), "test_anon_key", options);
    tracker.auth().set_session(session_for(user_id));
    tracker
}

fn profile_row(id: &str, username: Option<&str>, friend_code: &str) -> serde_json::Value {
    json!({
        "id": id,
        "username": username,
        "friend_code": friend_code,
        "created_at": "2024-03-01T12:00:00Z"
    })
}

async fn mount_match_fixtures(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/catalog/v4.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .mount(mock_server)
        .await;

    // My missing set: only B
    Mock::given(method("GET"))
        .and(path("/rest/v1/missing_cards"))
        .and(query_param("select", "card_id"))
        .and(query_param("user_id", "eq.me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "card_id": "B" }
        ])))
        .mount(mock_server)
        .await;

    // Everyone else's records: x is missing C, y has none
    Mock::given(method("GET"))
        .and(path("/rest/v1/missing_cards"))
        .and(query_param("select", "user_id,card_id"))
        .and(query_param("user_id", "neq.me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user_id": "x", "card_id": "C" }
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "neq.me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_row("x", Some("Xavier"), "1111-1111-1111-1111"),
            profile_row("y", None, "2222-2222-2222-2222")
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn trade_matches_in_unrestricted_mode_counts_everyone() {
    let mock_server = MockServer::start().await;
    mount_match_fixtures(&mock_server).await;

    let tracker = tracker_for(&mock_server, "me");
    let matches = tracker.trade_matches(MatchOptions::default()).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].card.id, "B");
    let holders: Vec<&str> = matches[0]
        .users_with_card
        .iter()
        .map(|u| u.user_id.as_str())
        .collect();
    assert_eq!(holders, vec!["x", "y"]);
    assert_eq!(matches[0].users_with_card[0].display_name, "Xavier");
    assert_eq!(
        matches[0].users_with_card[1].display_name,
        "User 2222-2222-2222-2222"
    );
}

#[tokio::test]
async fn trade_matches_in_active_only_mode_drops_recordless_users() {
    let mock_server = MockServer::start().await;
    mount_match_fixtures(&mock_server).await;

    let tracker = tracker_for(&mock_server, "me");
    let matches = tracker
        .trade_matches(MatchOptions {
            active_only: true,
            ..MatchOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    let holders: Vec<&str> = matches[0]
        .users_with_card
        .iter()
        .map(|u| u.user_id.as_str())
        .collect();
    assert_eq!(holders, vec!["x"]);
}

#[tokio::test]
async fn trade_matches_attach_reciprocal_offers_on_request() {
    let mock_server = MockServer::start().await;
    mount_match_fixtures(&mock_server).await;

    let tracker = tracker_for(&mock_server, "me");
    let matches = tracker
        .trade_matches(MatchOptions {
            include_offers: true,
            ..MatchOptions::default()
        })
        .await
        .unwrap();

    // x is missing C and I own it (I only miss B), so C is what I can offer
    let x = &matches[0].users_with_card[0];
    let offers: Vec<&str> = x.offers.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(offers, vec!["C"]);

    // y needs nothing I have
    assert!(matches[0].users_with_card[1].offers.is_empty());
}

#[tokio::test]
async fn trade_matches_require_a_session() {
    let tracker = Tracker::new("http://localhost:1", "test_anon_key");
    let result = tracker.trade_matches(MatchOptions::default()).await;
    assert!(matches!(result, Err(Error::AuthRequired)));
}

#[tokio::test]
async fn collection_progress_reports_packs_and_overall() {
    let mock_server = MockServer::start().await;
    mount_match_fixtures(&mock_server).await;

    let tracker = tracker_for(&mock_server, "me");
    let rows = tracker.collection_progress().await.unwrap();

    // P1 has 1/2 owned, P2 is complete, overall is 2/3
    let order: Vec<(&str, u8)> = rows
        .iter()
        .map(|r| (r.pack.as_str(), r.percentage))
        .collect();
    assert_eq!(order, vec![("P2", 100), (ALL_PACKS, 66), ("P1", 50)]);
    assert_eq!(overall(&rows).unwrap().owned, 2);
}

#[tokio::test]
async fn community_pairs_profiles_with_missing_counts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "neq.me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_row("x", Some("Xavier"), "1111-1111-1111-1111"),
            profile_row("y", None, "2222-2222-2222-2222")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/missing_cards"))
        .and(query_param("user_id", "in.(x,y)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user_id": "x" },
            { "user_id": "x" }
        ])))
        .mount(&mock_server)
        .await;

    let tracker = tracker_for(&mock_server, "me");
    let community = tracker.community().await.unwrap();

    assert_eq!(community.len(), 2);
    assert_eq!(community[0].profile.id, "x");
    assert_eq!(community[0].missing_count, 2);
    assert_eq!(community[1].missing_count, 0);
}

#[tokio::test]
async fn sign_up_with_friend_code_rejects_malformed_codes() {
    let tracker = Tracker::new("http://localhost:1", "test_anon_key");
    let result = tracker
        .sign_up_with_friend_code("new@example.com", "password123", "1234123412341234")
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn sign_up_with_friend_code_rejects_a_taken_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("friend_code", "eq.1234-1234-1234-1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "other" }])))
        .mount(&mock_server)
        .await;

    let tracker = Tracker::new(&mock_server.uri(), "test_anon_key");
    let result = tracker
        .sign_up_with_friend_code("new@example.com", "password123", "1234-1234-1234-1234")
        .await;

    assert!(matches!(result, Err(Error::DuplicateFriendCode)));
}

#[tokio::test]
async fn sign_up_with_friend_code_creates_the_account_and_claims_the_code() {
    let mock_server = MockServer::start().await;
    let user_id = uuid::Uuid::new_v4().to_string();

    // Pre-signup availability check: nobody holds the code
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("friend_code", "eq.1234-1234-1234-1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_token",
            "refresh_token": "new_refresh",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": user_id, "email": "new@example.com" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The signup trigger already created a profile row
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_row(&user_id, None, "0000-0000-0000-0000")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .and(body_partial_json(json!({ "friend_code": "1234-1234-1234-1234" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_row(&user_id, None, "1234-1234-1234-1234")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tracker = Tracker::new(&mock_server.uri(), "test_anon_key");
    let response = tracker
        .sign_up_with_friend_code("new@example.com", "password123", "1234-1234-1234-1234")
        .await
        .unwrap();

    assert_eq!(response.user.id, user_id);
    assert!(tracker.auth().current_session().is_some());
}

#[tokio::test]
async fn sign_in_lazily_creates_a_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "deadbeef-0000-0000-0000-000000000000" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/user_profiles"))
        .and(body_partial_json(json!({ "username": "user_deadbeef" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tracker = Tracker::new(&mock_server.uri(), "test_anon_key");
    let response = tracker.sign_in("back@example.com", "password123").await.unwrap();

    assert_eq!(response.user.id, "deadbeef-0000-0000-0000-000000000000");
}
