//! Tradewind Types - Canonical domain types for the escrow ledger service
//!
//! This crate contains all foundational types for Tradewind with zero
//! dependencies on other tradewind crates:
//!
//! - Identity types (UserId, WalletId, TransactionId, ContractId)
//! - Currency and fixed-point money types
//! - User and KYC status types
//! - Wallet and transaction types
//! - Trade contract and milestone types
//! - The domain error taxonomy
//!
//! # Invariants encoded here
//!
//! 1. Wallet balances are never negative
//! 2. A transaction is immutable once COMPLETED or FAILED
//! 3. Contract status is a closed enum; illegal states are unrepresentable
//! 4. Amounts are fixed-point decimals, serialized as strings on the wire

pub mod contract;
pub mod error;
pub mod identity;
pub mod money;
pub mod transaction;
pub mod user;
pub mod wallet;

pub use contract::*;
pub use error::*;
pub use identity::*;
pub use money::*;
pub use transaction::*;
pub use user::*;
pub use wallet::*;
