//! Tradewind Ledger - wallet and transaction store
//!
//! The ledger is:
//! - Wallet-keyed, with one MAIN wallet per user and at most one
//!   ESCROW wallet per contract
//! - Append-only (transactions never change once COMPLETED or FAILED)
//! - Atomic (balance changes and status flips are one critical section)
//! - Serialized per wallet via the lock table, with ordered two-wallet
//!   acquisition for transfers and escrow moves
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. A COMPLETED transaction's balance effects are visible; a FAILED
//!    transaction never moved money
//! 3. Escrow wallets are destroyed only when drained and their
//!    contract is terminal

pub mod locks;
pub mod store;

pub use locks::{LockTable, ResourceGuard, DEFAULT_LOCK_TIMEOUT};
pub use store::LedgerStore;
