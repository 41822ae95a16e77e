//! API integration tests
//!
//! These run against a live server started with the demo seed:
//! `RUN_MODE=development cargo run`, then `cargo test -- --ignored`.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000/api/v1";

async fn get_as(client: &Client, path: &str, user: &str) -> reqwest::Response {
    client
        .get(format!("{}{}", BASE_URL, path))
        .header("X-User-Id", user)
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_profile() {
    let client = Client::new();
    let response = get_as(&client, "/me", "user1").await;

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"], "user1");
    assert!(body["inventory"].is_array());
    assert!(body["wishlist"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_missing_identity_is_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/matches", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_matches_for_seeded_user() {
    let client = Client::new();
    let response = get_as(&client, "/matches", "user1").await;

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let matches = body["matches"].as_array().expect("No matches array");
    for entry in matches {
        let give = entry["give_books"].as_array().expect("No give_books");
        let receive = entry["receive_books"].as_array().expect("No receive_books");
        assert!(!give.is_empty());
        assert_eq!(give.len(), receive.len());
    }
}

#[tokio::test]
#[ignore]
async fn test_matches_for_unknown_user() {
    let client = Client::new();
    let response = get_as(&client, "/matches", "no-such-user").await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_execute_trade() {
    let client = Client::new();

    let response = client
        .post(format!("{}/trades", BASE_URL))
        .header("X-User-Id", "user3")
        .json(&json!({
            "counterparty_id": "user4",
            "mode": "wishlist"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["mode"], "wishlist");
    assert!(body["trade_id"].is_string());

    // Set semantics: the counterparty wishlist is now owned
    let profile: Value = get_as(&client, "/me", "user3")
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let owned: Vec<&str> = profile["inventory"]
        .as_array()
        .expect("No inventory")
        .iter()
        .filter_map(|book| book["id"].as_str())
        .collect();
    for wanted in body["received"].as_array().expect("No received list") {
        assert!(owned.contains(&wanted.as_str().unwrap_or_default()));
    }
}

#[tokio::test]
#[ignore]
async fn test_trade_with_self_is_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/trades", BASE_URL))
        .header("X-User-Id", "user1")
        .json(&json!({ "counterparty_id": "user1" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}
