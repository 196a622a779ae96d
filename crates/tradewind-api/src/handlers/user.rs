//! User and KYC handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::str::FromStr;
use tradewind_types::{Contract, Currency, Transaction, User, Wallet};

use crate::dto::{CreateUserRequest, CreateWalletRequest, KycReviewRequest};
use crate::error::ApiResult;
use crate::handlers::user_id;
use crate::state::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .accounts
        .register(req.username, req.wallet_address)
        .await?;
    Ok(Json(user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state.accounts.get(user_id(&id)?).await?;
    Ok(Json(user))
}

pub async fn submit_basic_kyc(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state.accounts.submit_basic_kyc(user_id(&id)?).await?;
    Ok(Json(user))
}

pub async fn submit_advanced_kyc(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state.accounts.submit_advanced_kyc(user_id(&id)?).await?;
    Ok(Json(user))
}

pub async fn review_advanced_kyc(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<KycReviewRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .accounts
        .review_advanced_kyc(user_id(&id)?, req.approve, req.risk_score.unwrap_or(0))
        .await?;
    Ok(Json(user))
}

/// Get or create the user's MAIN wallet in the requested currency
pub async fn create_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreateWalletRequest>,
) -> ApiResult<Json<Wallet>> {
    let user = user_id(&id)?;
    state.accounts.get(user).await?;
    let currency = Currency::from_str(&req.currency)?;
    let wallet = state.ledger.get_or_create_main_wallet(user, currency).await?;
    Ok(Json(wallet))
}

pub async fn list_wallets(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Wallet>>> {
    let user = user_id(&id)?;
    state.accounts.get(user).await?;
    Ok(Json(state.ledger.wallets_for_user(user).await))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let user = user_id(&id)?;
    state.accounts.get(user).await?;
    Ok(Json(state.ledger.transactions_for_user(user).await))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Contract>>> {
    let user = user_id(&id)?;
    state.accounts.get(user).await?;
    Ok(Json(state.contracts.list_for_user(user).await))
}
