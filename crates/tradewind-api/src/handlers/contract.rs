//! Contract lifecycle handlers
//!
//! Fund and release delegate to the transaction engine (which moves
//! the money and then advances the contract); the other transitions go
//! straight to the contract registry.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use tradewind_types::{Contract, Party, PartyRole, TradeTerms};

use crate::dto::{
    parse_money, ActorRequest, CreateContractRequest, DisputeRequest, FundRequest,
    ReleaseRequest, ShipRequest,
};
use crate::error::ApiResult;
use crate::handlers::{contract_id, idempotency_key, user_id, wallet_id};
use crate::state::AppState;

pub async fn create_contract(
    State(state): State<AppState>,
    Json(req): Json<CreateContractRequest>,
) -> ApiResult<Json<Contract>> {
    let buyer = user_id(&req.buyer_id)?;
    let seller = user_id(&req.seller_id)?;
    state.accounts.get(buyer).await?;
    state.accounts.get(seller).await?;

    let mut parties = vec![
        Party { user: buyer, role: PartyRole::Buyer },
        Party { user: seller, role: PartyRole::Seller },
    ];
    if let Some(mediator) = &req.mediator_id {
        let mediator = user_id(mediator)?;
        state.accounts.get(mediator).await?;
        parties.push(Party { user: mediator, role: PartyRole::Mediator });
    }

    let terms = TradeTerms {
        amount: parse_money(&req.amount, &req.currency)?,
        delivery_terms: req.delivery_terms,
        payment_terms: req.payment_terms,
    };
    let contract = state
        .contracts
        .create(req.title, req.description, parties, terms)
        .await?;
    Ok(Json(contract))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contract>> {
    let contract = state.contracts.get(contract_id(&id)?).await?;
    Ok(Json(contract))
}

pub async fn finalize(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts
        .finalize(contract_id(&id)?, user_id(&req.actor_id)?)
        .await?;
    Ok(Json(contract))
}

/// Fund the contract: escrow-lock the trade amount from the given
/// wallet, advancing AWAITING_FUNDS -> FUNDED
pub async fn fund(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<FundRequest>,
) -> ApiResult<Json<Contract>> {
    let id = contract_id(&id)?;
    state
        .engine
        .escrow_lock(id, wallet_id(&req.from_wallet_id)?, idempotency_key(&headers))
        .await?;
    Ok(Json(state.contracts.get(id).await?))
}

pub async fn ship(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ShipRequest>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts
        .mark_shipped(contract_id(&id)?, user_id(&req.actor_id)?, &req.logistics_ref)
        .await?;
    Ok(Json(contract))
}

pub async fn receive(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts
        .confirm_received(contract_id(&id)?, user_id(&req.actor_id)?)
        .await?;
    Ok(Json(contract))
}

pub async fn dispute(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DisputeRequest>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts
        .raise_dispute(contract_id(&id)?, user_id(&req.actor_id)?, &req.reason)
        .await?;
    Ok(Json(contract))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts
        .cancel(contract_id(&id)?, user_id(&req.actor_id)?)
        .await?;
    Ok(Json(contract))
}

/// Release the escrow to the named beneficiary, settling the contract
pub async fn release(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ReleaseRequest>,
) -> ApiResult<Json<Contract>> {
    let id = contract_id(&id)?;
    state
        .engine
        .escrow_release(
            id,
            wallet_id(&req.to_wallet_id)?,
            req.beneficiary,
            idempotency_key(&headers),
        )
        .await?;
    Ok(Json(state.contracts.get(id).await?))
}
