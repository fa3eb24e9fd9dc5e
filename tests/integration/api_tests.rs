//! API integration tests
//!
//! Run against a live server with: cargo test -- --ignored
//! `JWT_SECRET` must match the server's secret.

use chrono::Utc;
use injoyplan_server::models::{UserClaims, UserType};
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:4201/api/v1";

/// Sign a token the way the authentication service does
fn token_for(user_type: UserType) -> String {
    let secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".into());
    let now = Utc::now().timestamp();
    UserClaims {
        sub: Uuid::new_v4(),
        user_type,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
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
async fn test_ready_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_anonymous_search() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/public/search?page=1&limit=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["results"].is_array());
    assert!(body["results"].as_array().unwrap().len() <= 5);
    assert_eq!(body["page"], 1);
    assert!(body["total"].is_number());
    assert!(body["totalPages"].is_number());

    let today = Utc::now().date_naive().pred_opt().unwrap().to_string();
    for row in body["results"].as_array().unwrap() {
        assert_eq!(row["favorite"], false);
        let dates = row["dates"].as_array().unwrap();
        assert_eq!(dates.len(), 1);
        assert!(dates[0]["date"].as_str().unwrap() >= today.as_str());
    }
}

#[tokio::test]
#[ignore]
async fn test_grouped_search() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/public/search?expandDates=false", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let ids: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(ids.len(), unique.len());
}

#[tokio::test]
#[ignore]
async fn test_search_rejects_bad_flag() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/public/search?esGratis=quizas", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("esGratis"));
}

#[tokio::test]
#[ignore]
async fn test_search_rejects_bad_page() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/public/search?page=0", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_search_rejects_invalid_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/public/search", BASE_URL))
        .bearer_auth("not-a-token")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_featured_is_single_page() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/featured", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["page"], 1);
    assert_eq!(body["totalPages"], 1);
    for row in body["results"].as_array().unwrap() {
        assert_eq!(row["isFeatured"], true);
    }
}

#[tokio::test]
#[ignore]
async fn test_unknown_event_is_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/{}", BASE_URL, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_create_event_requires_company() {
    let client = Client::new();

    let response = client
        .post(format!("{}/events", BASE_URL))
        .bearer_auth(token_for(UserType::User))
        .json(&json!({
            "title": "Concierto",
            "description": "Rock en vivo",
            "category": "Música",
            "dates": [{ "date": "2030-02-05", "startTime": "21:00" }]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_favorites_require_auth() {
    let client = Client::new();

    let response = client
        .get(format!("{}/favorites", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_favorite_on_unknown_event() {
    let client = Client::new();

    let response = client
        .post(format!("{}/favorites", BASE_URL))
        .bearer_auth(token_for(UserType::User))
        .json(&json!({ "eventId": Uuid::new_v4() }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_register_complaint() {
    let client = Client::new();

    let response = client
        .post(format!("{}/complaints", BASE_URL))
        .json(&json!({
            "consumerName": "Ana Quispe",
            "consumerDocType": "DNI",
            "consumerDocNumber": "45678912",
            "consumerEmail": "",
            "goodType": "SERVICIO",
            "claimAmount": 50,
            "goodDescription": "Entrada general",
            "claimType": "RECLAMO",
            "claimDetail": "No se respetó la ubicación comprada",
            "orderRequest": "Reembolso"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["id"].is_string());
    assert!(body["message"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_complaint_validation() {
    let client = Client::new();

    let response = client
        .post(format!("{}/complaints", BASE_URL))
        .json(&json!({
            "consumerName": "",
            "consumerDocType": "DNI",
            "consumerDocNumber": "45678912",
            "goodType": "SERVICIO",
            "claimAmount": 50,
            "goodDescription": "Entrada general",
            "claimType": "SUGERENCIA",
            "claimDetail": "x",
            "orderRequest": "y"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_list_events_defaults_to_active() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events?limit=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    for row in body["results"].as_array().unwrap() {
        assert_eq!(row["isActive"], true);
    }
}

#[tokio::test]
#[ignore]
async fn test_list_events_rejects_bad_status() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events?status=archived", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_text_search_returns_upcoming_groups() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/search?q=a", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    for row in body["results"].as_array().unwrap() {
        assert!(!row["dates"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
#[ignore]
async fn test_events_by_category() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/category/Teatro?page=1&limit=3", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["results"].as_array().unwrap().len() <= 3);
}

#[tokio::test]
#[ignore]
async fn test_comments_of_unknown_event() {
    let client = Client::new();

    let response = client
        .get(format!("{}/events/{}/comments", BASE_URL, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_commenting_requires_auth() {
    let client = Client::new();

    let response = client
        .post(format!("{}/events/{}/comments", BASE_URL, Uuid::new_v4()))
        .json(&json!({ "content": "Hola" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_follow_unknown_user() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users/{}/follow", BASE_URL, Uuid::new_v4()))
        .bearer_auth(token_for(UserType::User))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
