//! Domain error taxonomy for Tradewind
//!
//! Every fallible operation across the ledger, engine, accounts, and
//! contract crates returns one of these kinds. Callers pattern-match on
//! the kind; nothing crosses the ledger/engine boundary as a panic or a
//! stringly-typed error.

use thiserror::Error;

/// Result type for Tradewind domain operations
pub type Result<T> = std::result::Result<T, DomainError>;

/// Tradewind domain errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input shape or range
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Amount was zero, negative, or otherwise unusable
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// A debit would drive the wallet balance negative
    #[error("Insufficient funds in wallet {wallet}: requested {requested}, available {available}")]
    InsufficientFunds {
        wallet: String,
        requested: String,
        available: String,
    },

    /// Operation mixed two currencies
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Transfer source and destination are the same wallet
    #[error("Transfer source and destination wallets are the same")]
    SameWallet,

    /// Requested contract status change is not a legal edge
    #[error("Invalid contract transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Contract already has an escrow wallet
    #[error("Contract {contract} already has an escrow wallet")]
    DuplicateEscrow { contract: String },

    /// Contract has no escrow wallet
    #[error("No escrow wallet exists for contract {contract}")]
    EscrowNotFound { contract: String },

    /// Escrow funds for this contract were already released
    #[error("Escrow for contract {contract} has already been released")]
    EscrowAlreadyReleased { contract: String },

    /// Escrow lock attempted while the contract is not collecting funds
    #[error("Contract {contract} is not awaiting funds (status {status})")]
    ContractNotAwaitingFunds { contract: String, status: String },

    /// Entity lookup failed
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// User's KYC status does not permit the operation
    #[error("User {user} may not transact with KYC status {status}")]
    KycRequired { user: String, status: String },

    /// A per-resource lock could not be acquired within the bound
    #[error("Timed out waiting for serialized access to {resource}")]
    ConcurrencyTimeout { resource: String },

    /// Infrastructure failure (store unavailable)
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },
}

impl DomainError {
    /// Stable machine-readable code for this error kind, exposed over
    /// the API so clients can branch without parsing messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::SameWallet => "SAME_WALLET",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::DuplicateEscrow { .. } => "DUPLICATE_ESCROW",
            Self::EscrowNotFound { .. } => "ESCROW_NOT_FOUND",
            Self::EscrowAlreadyReleased { .. } => "ESCROW_ALREADY_RELEASED",
            Self::ContractNotAwaitingFunds { .. } => "CONTRACT_NOT_AWAITING_FUNDS",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::KycRequired { .. } => "KYC_REQUIRED",
            Self::ConcurrencyTimeout { .. } => "CONCURRENCY_TIMEOUT",
            Self::Unavailable { .. } => "UNAVAILABLE",
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a lookup failure
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
