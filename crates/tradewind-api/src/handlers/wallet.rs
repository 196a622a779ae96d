//! Wallet handlers
//!
//! Deposits, withdrawals, and transfers. All three honor an optional
//! Idempotency-Key header; a replayed key returns the original
//! transaction without a second balance effect.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use tradewind_types::{Transaction, Wallet};

use crate::dto::{parse_money, AmountRequest, TransferRequest};
use crate::error::ApiResult;
use crate::handlers::{idempotency_key, wallet_id};
use crate::state::AppState;

pub async fn get_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Wallet>> {
    let wallet = state.ledger.get_wallet(wallet_id(&id)?).await?;
    Ok(Json(wallet))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let id = wallet_id(&id)?;
    state.ledger.get_wallet(id).await?;
    Ok(Json(state.ledger.transactions_for_wallet(id).await))
}

pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AmountRequest>,
) -> ApiResult<Json<Transaction>> {
    let amount = parse_money(&req.amount, &req.currency)?;
    let tx = state
        .engine
        .deposit(wallet_id(&id)?, amount, idempotency_key(&headers))
        .await?;
    Ok(Json(tx))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AmountRequest>,
) -> ApiResult<Json<Transaction>> {
    let amount = parse_money(&req.amount, &req.currency)?;
    let tx = state
        .engine
        .withdraw(wallet_id(&id)?, amount, idempotency_key(&headers))
        .await?;
    Ok(Json(tx))
}

pub async fn transfer(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> ApiResult<Json<Transaction>> {
    let amount = parse_money(&req.amount, &req.currency)?;
    let tx = state
        .engine
        .transfer(
            wallet_id(&from)?,
            wallet_id(&to)?,
            amount,
            req.description.as_deref().unwrap_or("transfer"),
            idempotency_key(&headers),
        )
        .await?;
    Ok(Json(tx))
}
