//! HTTP routes for the keeper surface
//!
//! Thin translation layer: each route calls one `WalletKeeper` operation and
//! maps the error taxonomy onto status codes. Unsupported operations come
//! back as 501 so upstream callers can tell "this backend cannot" from
//! "this backend failed".

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::keeper::{Account, KeeperError, WalletKeeper};

#[derive(Clone)]
pub struct AppState {
    pub keeper: Arc<dyn WalletKeeper>,
    pub service: String,
}

#[derive(Deserialize)]
pub struct MinConfQuery {
    #[serde(default)]
    min_conf: u32,
}

#[derive(Deserialize)]
pub struct SendRequest {
    address: String,
    amount: f64,
}

#[derive(Deserialize)]
pub struct SendFromRequest {
    account: String,
    address: String,
    amount: f64,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    from: String,
    to: String,
    amount: f64,
}

type HandlerError = (StatusCode, Json<Value>);

pub fn create_router(keeper: Arc<dyn WalletKeeper>) -> Router {
    create_router_with_name(keeper, "wallet-keeper")
}

pub fn create_router_with_name(keeper: Arc<dyn WalletKeeper>, service: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/height", get(height))
        .route("/account/:name", post(create_account))
        .route("/account/:name/address", get(account_address).post(new_address))
        .route("/account/:name/addresses", get(account_addresses))
        .route("/address/:address", get(account_info))
        .route("/balances", get(balances))
        .route("/unspent", get(unspent))
        .route("/send", post(send_to_address))
        .route("/sendfrom", post(send_from))
        .route("/move", post(move_balance))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            keeper,
            service: service.to_string(),
        })
}

fn reject(err: KeeperError) -> HandlerError {
    let status = match &err {
        KeeperError::NotFound(_) => StatusCode::NOT_FOUND,
        KeeperError::AlreadyExists(_) => StatusCode::CONFLICT,
        KeeperError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        KeeperError::Transport(_) | KeeperError::Decode(_) => StatusCode::BAD_GATEWAY,
        KeeperError::KeyGen(_) | KeeperError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

async fn health(State(s): State<AppState>) -> Result<impl IntoResponse, HandlerError> {
    s.keeper.ping().await.map_err(reject)?;
    Ok(Json(json!({ "status": "ok", "service": s.service })))
}

async fn height(State(s): State<AppState>) -> Result<Json<Value>, HandlerError> {
    let height = s.keeper.block_height().await.map_err(reject)?;
    Ok(Json(json!({ "height": height })))
}

async fn create_account(
    State(s): State<AppState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<Account>), HandlerError> {
    let account = s.keeper.create_account(&name).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn account_address(
    State(s): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let address = s.keeper.address(&name).await.map_err(reject)?;
    Ok(Json(json!({ "account": name, "address": address })))
}

async fn new_address(
    State(s): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let address = s.keeper.new_address(&name).await.map_err(reject)?;
    Ok(Json(json!({ "account": name, "address": address })))
}

async fn account_addresses(
    State(s): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let addresses = s.keeper.addresses_by_account(&name).await.map_err(reject)?;
    Ok(Json(json!({ "account": name, "addresses": addresses })))
}

async fn account_info(
    State(s): State<AppState>,
    Path(address): Path<String>,
    Query(q): Query<MinConfQuery>,
) -> Result<Json<Account>, HandlerError> {
    let info = s.keeper.account_info(&address, q.min_conf).await.map_err(reject)?;
    Ok(Json(info))
}

async fn balances(
    State(s): State<AppState>,
    Query(q): Query<MinConfQuery>,
) -> Result<Json<Value>, HandlerError> {
    let balances = s.keeper.account_balances(q.min_conf).await.map_err(reject)?;
    Ok(Json(json!({ "balances": balances })))
}

async fn unspent(
    State(s): State<AppState>,
    Query(q): Query<MinConfQuery>,
) -> Result<Json<Value>, HandlerError> {
    let outputs = s.keeper.list_unspent(q.min_conf).await.map_err(reject)?;
    Ok(Json(json!({ "unspent": outputs })))
}

async fn send_to_address(
    State(s): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<Value>, HandlerError> {
    s.keeper
        .send_to_address(&req.address, req.amount)
        .await
        .map_err(reject)?;
    Ok(Json(json!({ "accepted": true })))
}

async fn send_from(
    State(s): State<AppState>,
    Json(req): Json<SendFromRequest>,
) -> Result<Json<Value>, HandlerError> {
    s.keeper
        .send_from(&req.account, &req.address, req.amount)
        .await
        .map_err(reject)?;
    Ok(Json(json!({ "accepted": true })))
}

async fn move_balance(
    State(s): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Value>, HandlerError> {
    let moved = s
        .keeper
        .move_balance(&req.from, &req.to, req.amount)
        .await
        .map_err(reject)?;
    Ok(Json(json!({ "moved": moved })))
}
