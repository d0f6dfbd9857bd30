//! In-memory stand-in for the slice of Campbell Cloud the client tests use:
//! the token exchange, assets, and station groups.
//!
//! Behavior copies the real service where it is irregular: deleting an
//! asset answers 204 with no body, deleting a station group answers 200 with
//! no body, an unchanged asset status answers 304, and unknown routes answer
//! 404 `{"message": "no Route matched with those values"}`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const USERNAME: &str = "ada";
pub const PASSWORD: &str = "lovelace";

#[derive(Default)]
pub struct Store {
    tokens: RwLock<HashSet<String>>,
    assets: RwLock<HashMap<String, Value>>,
    station_groups: RwLock<HashMap<String, Value>>,
}

pub type Db = Arc<Store>;

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub grant_type: String,
}

pub fn app() -> Router {
    let db: Db = Arc::new(Store::default());
    Router::new()
        .route("/api/v1/tokens", post(create_token))
        .route("/api/v1/organizations/{org}/assets", get(list_assets).post(create_asset))
        .route(
            "/api/v1/organizations/{org}/assets/{id}",
            get(get_asset).put(update_asset).delete(delete_asset),
        )
        .route("/api/v1/organizations/{org}/assets/{id}/status", put(update_asset_status))
        .route("/api/v1/organizations/{org}/station-groups", post(create_station_group))
        .route(
            "/api/v1/organizations/{org}/station-groups/{id}",
            get(get_station_group).delete(delete_station_group),
        )
        .fallback(no_route)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn authorize(db: &Db, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let known = match token {
        Some(token) => db.tokens.read().await.contains(token),
        None => false,
    };
    if known {
        Ok(())
    } else {
        Err(message(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

async fn no_route() -> Response {
    message(StatusCode::NOT_FOUND, "no Route matched with those values")
}

async fn create_token(State(db): State<Db>, Json(input): Json<TokenRequest>) -> Response {
    if input.username != USERNAME
        || input.password != PASSWORD
        || input.client_id != "cloud"
        || input.grant_type != "password"
    {
        return message(StatusCode::UNAUTHORIZED, "Invalid authentication credentials");
    }
    let token = Uuid::new_v4().simple().to_string();
    db.tokens.write().await.insert(token.clone());
    info!(username = %input.username, "issued token");
    Json(json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": 3600,
    }))
    .into_response()
}

async fn list_assets(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    let assets = db.assets.read().await;
    Json(assets.values().cloned().collect::<Vec<_>>()).into_response()
}

async fn create_asset(State(db): State<Db>, headers: HeaderMap, Json(mut input): Json<Value>) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    let Some(fields) = input.as_object_mut() else {
        return message(StatusCode::BAD_REQUEST, "request body must be an object");
    };
    for required in ["name", "uid"] {
        if !fields.contains_key(required) {
            return message(StatusCode::BAD_REQUEST, &format!("{required} is required"));
        }
    }
    let id = Uuid::new_v4().to_string();
    fields.insert("id".to_string(), json!(id));
    fields.entry("status").or_insert(json!("inactive"));
    db.assets.write().await.insert(id.clone(), input.clone());
    debug!(%id, "created asset");
    (StatusCode::CREATED, Json(input)).into_response()
}

async fn get_asset(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((_org, id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    match db.assets.read().await.get(&id) {
        Some(asset) => Json(asset.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn update_asset(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((_org, id)): Path<(String, String)>,
    Json(mut input): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    let mut assets = db.assets.write().await;
    if !assets.contains_key(&id) {
        return message(StatusCode::NOT_FOUND, "Not found");
    }
    if let Some(fields) = input.as_object_mut() {
        fields.insert("id".to_string(), json!(id));
    }
    assets.insert(id, input.clone());
    Json(input).into_response()
}

async fn delete_asset(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((_org, id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    match db.assets.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

async fn update_asset_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((_org, id)): Path<(String, String)>,
    Json(input): Json<StatusUpdate>,
) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    let mut assets = db.assets.write().await;
    let Some(asset) = assets.get_mut(&id) else {
        return message(StatusCode::NOT_FOUND, "Not found");
    };
    if asset["status"] == json!(input.status) {
        return StatusCode::NOT_MODIFIED.into_response();
    }
    asset["status"] = json!(input.status);
    StatusCode::NO_CONTENT.into_response()
}

async fn create_station_group(State(db): State<Db>, headers: HeaderMap, Json(mut input): Json<Value>) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    if input.get("name").is_none() {
        return message(StatusCode::BAD_REQUEST, "name is required");
    }
    let id = Uuid::new_v4().to_string();
    input["id"] = json!(id);
    db.station_groups.write().await.insert(id, input.clone());
    (StatusCode::CREATED, Json(input)).into_response()
}

async fn get_station_group(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((_org, id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    match db.station_groups.read().await.get(&id) {
        Some(group) => Json(group.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn delete_station_group(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((_org, id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = authorize(&db, &headers).await {
        return denied;
    }
    match db.station_groups.write().await.remove(&id) {
        Some(_) => StatusCode::OK.into_response(),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}
