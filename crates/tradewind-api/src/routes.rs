//! Route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// All /api routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/users", user_routes())
        .nest("/wallets", wallet_routes())
        .nest("/contracts", contract_routes())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::user::create_user))
        .route("/:id", get(handlers::user::get_user))
        .route("/:id/kyc/basic", post(handlers::user::submit_basic_kyc))
        .route("/:id/kyc/advanced", post(handlers::user::submit_advanced_kyc))
        .route("/:id/kyc/review", post(handlers::user::review_advanced_kyc))
        .route(
            "/:id/wallets",
            get(handlers::user::list_wallets).post(handlers::user::create_wallet),
        )
        .route("/:id/transactions", get(handlers::user::list_transactions))
        .route("/:id/contracts", get(handlers::user::list_contracts))
}

fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(handlers::wallet::get_wallet))
        .route("/:id/transactions", get(handlers::wallet::list_transactions))
        .route("/:id/deposit", post(handlers::wallet::deposit))
        .route("/:id/withdraw", post(handlers::wallet::withdraw))
        .route("/:from_id/transfer/:to_id", post(handlers::wallet::transfer))
}

fn contract_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::contract::create_contract))
        .route("/:id", get(handlers::contract::get_contract))
        .route("/:id/finalize", post(handlers::contract::finalize))
        .route("/:id/fund", post(handlers::contract::fund))
        .route("/:id/ship", post(handlers::contract::ship))
        .route("/:id/receive", post(handlers::contract::receive))
        .route("/:id/dispute", post(handlers::contract::dispute))
        .route("/:id/cancel", post(handlers::contract::cancel))
        .route("/:id/release", post(handlers::contract::release))
}
