//! Request handlers

pub mod contract;
pub mod health;
pub mod user;
pub mod wallet;

use axum::http::HeaderMap;
use tradewind_types::{ContractId, UserId, WalletId};

use crate::error::{ApiError, ApiResult};

/// Header carrying the caller-supplied idempotency key
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

pub(crate) fn user_id(s: &str) -> ApiResult<UserId> {
    UserId::parse(s).map_err(|_| ApiError::InvalidPath(s.to_string()))
}

pub(crate) fn wallet_id(s: &str) -> ApiResult<WalletId> {
    WalletId::parse(s).map_err(|_| ApiError::InvalidPath(s.to_string()))
}

pub(crate) fn contract_id(s: &str) -> ApiResult<ContractId> {
    ContractId::parse(s).map_err(|_| ApiError::InvalidPath(s.to_string()))
}

/// The Idempotency-Key header value, if present and valid UTF-8
pub(crate) fn idempotency_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(IDEMPOTENCY_HEADER).and_then(|v| v.to_str().ok())
}
