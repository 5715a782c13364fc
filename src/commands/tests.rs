//! Router Tests
//!
//! Drive the full router (admin gate, handlers, registry) against a
//! temporary database and the static test key set.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use super::router;
use crate::domain::{DomainError, DomainResult, ItemKind, ItemStatus, Match, MatchView, NewMatch};
use crate::repository::MatchStore;
use crate::test_support::{
    admin_token, claims_with_roles, sign_token, student_token, test_verifier, Fixture,
};
use crate::AppState;

fn app_for(fx: &Fixture) -> Router {
    app_with(fx.match_store())
}

fn app_with(matches: Arc<dyn MatchStore>) -> Router {
    router(AppState {
        matches,
        verifier: Arc::new(test_verifier()),
    })
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

/// Admin user 2, lost 5, found 9
async fn seeded() -> Fixture {
    let fx = Fixture::new().await;
    fx.exec(
        "INSERT INTO users (id, first_name, second_name, email, role)
             VALUES (2, 'Amina', 'Okafor', 'amina@example.com', 'admin');
         INSERT INTO lost_items (id, name, category, place, date_lost, image_url, posted_by)
             VALUES (5, 'Blue Backpack', 'bags', 'Library', '2024-05-02', '/uploads/1-backpack.jpg', 2);
         INSERT INTO found_items (id, name, category, place, date_found, image_url, submitted_by)
             VALUES (9, 'Backpack', 'bags', 3, '2024-05-03', '/uploads/found-2-backpack.jpg', 2);",
    )
    .await;
    fx
}

async fn seeded_with_match() -> Fixture {
    let fx = seeded().await;
    fx.exec(
        "INSERT INTO matches (id, lost_item_id, found_item_id, matched_by, matched_at)
             VALUES (7, 5, 9, 2, 1700000000000);
         UPDATE lost_items SET status = 'matched' WHERE id = 5;
         UPDATE found_items SET status = 'matched' WHERE id = 9;",
    )
    .await;
    fx
}

fn pair() -> Value {
    json!({"lost_item_id": 5, "found_item_id": 9, "matched_by": 2})
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let fx = seeded_with_match().await;
    let before = fx.snapshot().await;

    let cases = [
        request(Method::GET, "/matches", None, None),
        request(Method::POST, "/matches", None, Some(pair())),
        request(Method::DELETE, "/matches/7", None, None),
    ];
    for req in cases {
        let (status, body) = send(app_for(&fx), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Invalid or missing credentials"}));
    }
    assert_eq!(fx.snapshot().await, before);
}

#[tokio::test]
async fn test_invalid_tokens_are_unauthorized() {
    let fx = seeded().await;
    let mut expired = claims_with_roles("auth0|admin", &["admin"]);
    expired["exp"] = json!(chrono::Utc::now().timestamp() - 3600);

    for token in ["not-a-jwt".to_string(), sign_token(&expired)] {
        let (status, _) = send(app_for(&fx), request(Method::GET, "/matches", Some(&token), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_non_admin_is_forbidden_and_nothing_changes() {
    let fx = seeded_with_match().await;
    let before = fx.snapshot().await;
    let token = student_token();

    let cases = [
        request(Method::GET, "/matches", Some(&token), None),
        request(Method::POST, "/matches", Some(&token), Some(pair())),
        request(Method::DELETE, "/matches/7", Some(&token), None),
    ];
    for req in cases {
        let (status, body) = send(app_for(&fx), req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Admins only"}));
    }
    assert_eq!(fx.snapshot().await, before);
}

#[tokio::test]
async fn test_token_without_roles_claim_is_forbidden() {
    let fx = seeded().await;
    let mut claims = claims_with_roles("auth0|nobody", &[]);
    claims
        .as_object_mut()
        .unwrap()
        .remove("http://foundit.example.com/roles");

    let token = sign_token(&claims);
    let (status, _) = send(app_for(&fx), request(Method::GET, "/matches", Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_match() {
    let fx = seeded().await;
    let token = admin_token();

    let (status, body) =
        send(app_for(&fx), request(Method::POST, "/matches", Some(&token), Some(pair()))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["lost_item_id"], 5);
    assert_eq!(body["found_item_id"], 9);
    assert_eq!(body["matched_by"], 2);
    assert!(body["matched_at"].is_string());

    assert_eq!(fx.status(ItemKind::Lost, 5).await, ItemStatus::Matched);
    assert_eq!(fx.status(ItemKind::Found, 9).await, ItemStatus::Matched);
}

#[tokio::test]
async fn test_admin_deletes_match() {
    let fx = seeded_with_match().await;
    let token = admin_token();

    let (status, body) =
        send(app_for(&fx), request(Method::DELETE, "/matches/7", Some(&token), None)).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert!(fx.snapshot().await.matches.is_empty());
    assert_eq!(fx.status(ItemKind::Lost, 5).await, ItemStatus::Pending);
    assert_eq!(fx.status(ItemKind::Found, 9).await, ItemStatus::Pending);
}

#[tokio::test]
async fn test_delete_unknown_match_is_404() {
    let fx = seeded_with_match().await;
    let before = fx.snapshot().await;
    let token = admin_token();

    let (status, body) =
        send(app_for(&fx), request(Method::DELETE, "/matches/999", Some(&token), None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Match not found"}));
    assert_eq!(fx.snapshot().await, before);
}

#[tokio::test]
async fn test_delete_with_non_numeric_id_is_json_404() {
    let fx = seeded_with_match().await;
    let before = fx.snapshot().await;
    let token = admin_token();

    for uri in ["/matches/abc", "/api/matches/7x", "/matches/99999999999999999999"] {
        let (status, body) = send(app_for(&fx), request(Method::DELETE, uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({"error": "Match not found"}));
    }
    assert_eq!(fx.snapshot().await, before);

    // The gate still answers first for callers without a token.
    let (status, _) = send(app_for(&fx), request(Method::DELETE, "/matches/abc", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_with_bad_body_is_400() {
    let fx = seeded().await;
    let before = fx.snapshot().await;
    let token = admin_token();

    let bodies = [
        json!({"lost_item_id": 5, "found_item_id": 9}),
        json!({"lost_item_id": "five", "found_item_id": 9, "matched_by": 2}),
        json!([]),
    ];
    for body in bodies {
        let (status, response) =
            send(app_for(&fx), request(Method::POST, "/matches", Some(&token), Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"error": "Invalid request body"}));
    }
    assert_eq!(fx.snapshot().await, before);
}

#[tokio::test]
async fn test_create_with_missing_item_is_generic_500() {
    let fx = seeded().await;
    let before = fx.snapshot().await;
    let token = admin_token();

    let (status, body) = send(
        app_for(&fx),
        request(
            Method::POST,
            "/matches",
            Some(&token),
            Some(json!({"lost_item_id": 404, "found_item_id": 9, "matched_by": 2})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Could not create match"}));
    assert_eq!(fx.snapshot().await, before);
}

#[tokio::test]
async fn test_list_returns_enriched_matches_newest_first() {
    let fx = seeded().await;
    fx.exec(
        "INSERT INTO matches (id, lost_item_id, found_item_id, matched_by, matched_at)
             VALUES (1, 5, 9, 2, 1700000000000),
                    (2, 5, 9, 2, 1700000500000);",
    )
    .await;
    let token = admin_token();

    let (status, body) = send(app_for(&fx), request(Method::GET, "/matches", Some(&token), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "id": 2,
                "lost_item_id": 5,
                "found_item_id": 9,
                "matched_by": 2,
                "matched_at": "2023-11-14T22:21:40Z",
                "lost_name": "Blue Backpack",
                "found_name": "Backpack",
                "matched_by_name": "Amina Okafor"
            },
            {
                "id": 1,
                "lost_item_id": 5,
                "found_item_id": 9,
                "matched_by": 2,
                "matched_at": "2023-11-14T22:13:20Z",
                "lost_name": "Blue Backpack",
                "found_name": "Backpack",
                "matched_by_name": "Amina Okafor"
            }
        ])
    );
}

#[tokio::test]
async fn test_routes_served_under_api_prefix() {
    let fx = seeded().await;
    let token = admin_token();

    let (status, created) =
        send(app_for(&fx), request(Method::POST, "/api/matches", Some(&token), Some(pair()))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, listed) = send(app_for(&fx), request(Method::GET, "/api/matches", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let uri = format!("/api/matches/{}", created["id"]);
    let (status, _) = send(app_for(&fx), request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_health_is_public() {
    let fx = Fixture::new().await;
    let (status, body) = send(app_for(&fx), request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

/// Store whose every operation fails like a lost database
struct BrokenStore;

#[async_trait]
impl MatchStore for BrokenStore {
    async fn list_matches(&self) -> DomainResult<Vec<MatchView>> {
        Err(DomainError::Internal("disk I/O error at /var/lib/foundit.db".to_string()))
    }

    async fn find_match(&self, _id: i64) -> DomainResult<Option<Match>> {
        Err(DomainError::Internal("disk I/O error".to_string()))
    }

    async fn create_match(&self, _new_match: NewMatch) -> DomainResult<Match> {
        Err(DomainError::Internal("disk I/O error".to_string()))
    }

    async fn delete_match(&self, _id: i64) -> DomainResult<Match> {
        Err(DomainError::Internal("disk I/O error".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failures_return_generic_messages() {
    let token = admin_token();
    let app = || app_with(Arc::new(BrokenStore));

    let (status, body) = send(app(), request(Method::GET, "/matches", Some(&token), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Could not fetch matches"}));

    let (status, body) = send(app(), request(Method::POST, "/matches", Some(&token), Some(pair()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Could not create match"}));

    let (status, body) = send(app(), request(Method::DELETE, "/matches/7", Some(&token), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Could not delete match"}));
}
