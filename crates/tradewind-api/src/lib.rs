//! Tradewind REST API
//!
//! HTTP surface over the escrow ledger service, consumed by the trade
//! desk front end.
//!
//! # API structure
//!
//! ```text
//! /api/
//! ├── /health                 - liveness
//! ├── /users                  - registration, KYC, per-user views
//! ├── /wallets                - balances, deposits, withdrawals, transfers
//! └── /contracts              - lifecycle, funding, escrow release
//! ```
//!
//! Monetary amounts are decimal strings on the wire. Mutating
//! endpoints accept an `Idempotency-Key` header; a replayed key
//! returns the original result instead of re-applying the mutation.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;

/// Build the service router with tracing and CORS middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
