//! HTTP API handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rps_escrow_core::{
    generate_commitment, Amount, ContractError, ErrorKind, GameId, HostError, Identity, Move,
    PaymentError, Secret,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::state::AppState;

pub const IDENTITY_HEADER: &str = "X-Identity";

// ============ Errors ============

#[derive(Debug)]
pub enum ApiError {
    MissingIdentity,
    BadRequest(String),
    Host(HostError),
}

impl From<HostError> for ApiError {
    fn from(e: HostError) -> Self {
        ApiError::Host(e)
    }
}

fn contract_status(e: &ContractError) -> StatusCode {
    match e.kind() {
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Phase | ErrorKind::Gate => StatusCode::CONFLICT,
        ErrorKind::ValueMismatch
        | ErrorKind::Timing
        | ErrorKind::Ledger
        | ErrorKind::Arithmetic => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                json!({"error": format!("Missing {} header", IDENTITY_HEADER)}),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            ApiError::Host(HostError::Contract(e)) => (
                contract_status(&e),
                json!({"error": e.to_string(), "kind": e.kind()}),
            ),
            ApiError::Host(HostError::Payment(e)) => {
                let status = match e {
                    PaymentError::UnknownWallet(_) | PaymentError::InsufficientFunds { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    PaymentError::CustodyShortfall { .. } | PaymentError::Rejected(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, json!({"error": e.to_string(), "kind": "payment"}))
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

// ============ Request/Response types ============

#[derive(Deserialize)]
pub struct CommitmentRequest {
    pub identity: Identity,
    pub game_move: Move,
    pub secret: Secret,
}

#[derive(Deserialize)]
pub struct CommitRequest {
    pub game_id: GameId,
    pub player2: Identity,
    #[serde(with = "rps_escrow_core::protocol::amount")]
    pub deposit: Amount,
}

#[derive(Deserialize)]
pub struct PlayRequest {
    pub game_move: Move,
    #[serde(with = "rps_escrow_core::protocol::amount")]
    pub deposit: Amount,
}

#[derive(Deserialize)]
pub struct RevealRequest {
    pub game_move: Move,
    pub secret: Secret,
}

#[derive(Deserialize)]
pub struct TickRequest {
    pub seconds: i64,
}

/// A game as stored; all-zero when the id is not live
#[derive(Serialize)]
pub struct GameResponse {
    pub game_id: GameId,
    pub player1: Option<Identity>,
    pub player2: Option<Identity>,
    pub move2: Move,
    #[serde(with = "rps_escrow_core::protocol::amount")]
    pub deposit: Amount,
    pub expiration: Option<String>,
}

// ============ Helpers ============

fn caller(headers: &HeaderMap) -> Result<Identity, ApiError> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .ok_or(ApiError::MissingIdentity)
}

fn parse_game_id(raw: &str) -> Result<GameId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid game id: {}", raw)))
}

// ============ Wallet handlers ============

pub async fn register_wallet(State(state): State<AppState>) -> impl IntoResponse {
    let identity = state.register_wallet();
    tracing::info!(identity = %identity, "Wallet registered");
    Json(json!({
        "identity": identity,
        "wallet": state.rail().wallet(&identity).unwrap_or(0).to_string(),
    }))
}

pub async fn get_wallet(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let who = caller(&headers)?;
    let wallet = state
        .rail()
        .wallet(&who)
        .ok_or_else(|| ApiError::BadRequest(format!("No wallet for {}", who)))?;
    Ok(Json(json!({
        "identity": who,
        "wallet": wallet.to_string(),
        "balance": state.host().balance_of(&who).to_string(),
    })))
}

// ============ Game handlers ============

pub async fn create_commitment(Json(req): Json<CommitmentRequest>) -> ApiResult {
    let game_id = generate_commitment(&req.identity, req.game_move, &req.secret);
    Ok(Json(json!({ "game_id": game_id })))
}

pub async fn commit_move(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CommitRequest>,
) -> ApiResult {
    let who = caller(&headers)?;
    state
        .host()
        .commit_move(who, req.game_id, req.player2, req.deposit)
        .await?;
    Ok(Json(json!({
        "game_id": req.game_id,
        "wait_period_secs": state.host().wait_period().as_secs(),
    })))
}

pub async fn play_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PlayRequest>,
) -> ApiResult {
    let who = caller(&headers)?;
    let game_id = parse_game_id(&id)?;
    state
        .host()
        .play_move(who, game_id, req.game_move, req.deposit)
        .await?;
    Ok(Json(json!({ "game_id": game_id, "status": "played" })))
}

pub async fn reveal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RevealRequest>,
) -> ApiResult {
    let who = caller(&headers)?;
    let outcome = state.host().reveal(who, req.game_move, &req.secret)?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn reclaim_funds(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult {
    let who = caller(&headers)?;
    let amount = state.host().reclaim_funds(who, parse_game_id(&id)?)?;
    Ok(Json(json!({ "credited": amount.to_string() })))
}

pub async fn claim_funds(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult {
    let who = caller(&headers)?;
    let amount = state.host().claim_funds(who, parse_game_id(&id)?)?;
    Ok(Json(json!({ "credited": amount.to_string() })))
}

pub async fn get_game(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let game_id = parse_game_id(&id)?;
    let response = match state.host().game(&game_id) {
        Some(game) => GameResponse {
            game_id,
            player1: Some(game.player1),
            player2: Some(game.player2),
            move2: game.move2,
            deposit: game.deposit,
            expiration: Some(game.expiration.to_rfc3339()),
        },
        None => GameResponse {
            game_id,
            player1: None,
            player2: None,
            move2: Move::None,
            deposit: 0,
            expiration: None,
        },
    };
    Ok(Json(json!(response)))
}

pub async fn withdraw(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let who = caller(&headers)?;
    let amount = state.host().withdraw(who).await?;
    Ok(Json(json!({ "withdrawn": amount.to_string() })))
}

// ============ Admin handlers ============

pub async fn pause(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let who = caller(&headers)?;
    state.host().pause(who)?;
    Ok(Json(json!({ "paused": true })))
}

pub async fn resume(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let who = caller(&headers)?;
    state.host().resume(who)?;
    Ok(Json(json!({ "paused": false })))
}

// ============ System handlers ============

pub async fn list_events(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "events": state.host().events() }))
}

pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let host = state.host();
    Json(json!({
        "wait_period_secs": host.wait_period().as_secs(),
        "paused": host.is_paused(),
        "owner": host.owner(),
        "now": state.now().to_rfc3339(),
    }))
}

pub async fn tick(
    State(state): State<AppState>,
    Json(req): Json<TickRequest>,
) -> impl IntoResponse {
    state.advance_time(req.seconds);
    tracing::info!(seconds = req.seconds, "Simulated clock advanced");
    Json(json!({ "now": state.now().to_rfc3339() }))
}

pub async fn health() -> &'static str {
    "ok"
}
