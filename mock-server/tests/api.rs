use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, PASSWORD, USERNAME};
use serde_json::{json, Value};
use tower::ServiceExt;

const ORG: &str = "/api/v1/organizations/org-1";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn empty_request(method: &str, uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

async fn login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/tokens",
            None,
            json!({"username": USERNAME, "password": PASSWORD, "client_id": "cloud", "grant_type": "password"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["access_token"].as_str().unwrap().to_string()
}

async fn create_asset(app: &Router, token: &str) -> Value {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("{ORG}/assets"),
            Some(token),
            json!({"name": "Tower 1", "uid": "u-1", "model": "CR1000X"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- tokens ---

#[tokio::test]
async fn token_exchange_issues_access_token() {
    let app = app();
    let token = login(&app).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn token_exchange_rejects_wrong_password() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/tokens",
            None,
            json!({"username": USERNAME, "password": "nope", "client_id": "cloud", "grant_type": "password"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert!(body.get("access_token").is_none());
}

// --- auth ---

#[tokio::test]
async fn assets_require_a_known_token() {
    let resp = app()
        .oneshot(empty_request("GET", &format!("{ORG}/assets"), "forged"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({"message": "Unauthorized"}));
}

// --- assets ---

#[tokio::test]
async fn create_then_get_asset() {
    let app = app();
    let token = login(&app).await;
    let created = create_asset(&app, &token).await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["status"], "inactive");

    let resp = app
        .clone()
        .oneshot(empty_request("GET", &format!("{ORG}/assets/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, created);
}

#[tokio::test]
async fn create_asset_without_uid_returns_400() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(json_request("POST", &format!("{ORG}/assets"), Some(&token), json!({"name": "x"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"message": "uid is required"}));
}

#[tokio::test]
async fn delete_asset_returns_204_without_body() {
    let app = app();
    let token = login(&app).await;
    let created = create_asset(&app, &token).await;
    let id = created["id"].as_str().unwrap();

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("{ORG}/assets/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app
        .oneshot(empty_request("GET", &format!("{ORG}/assets/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unchanged_status_returns_304() {
    let app = app();
    let token = login(&app).await;
    let created = create_asset(&app, &token).await;
    let uri = format!("{ORG}/assets/{}/status", created["id"].as_str().unwrap());

    let resp = app
        .clone()
        .oneshot(json_request("PUT", &uri, Some(&token), json!({"status": "active"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(json_request("PUT", &uri, Some(&token), json!({"status": "active"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(resp).await.is_empty());
}

// --- station groups ---

#[tokio::test]
async fn delete_station_group_returns_200_without_body() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("{ORG}/station-groups"),
            Some(&token),
            json!({"name": "North ridge"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["id"].as_str().unwrap().to_string();

    let resp = app
        .oneshot(empty_request("DELETE", &format!("{ORG}/station-groups/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- fallback ---

#[tokio::test]
async fn unknown_route_reports_no_route() {
    let resp = app()
        .oneshot(empty_request("GET", &format!("{ORG}/datapoints"), "any"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({"message": "no Route matched with those values"}));
}
