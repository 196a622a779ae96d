//! Wallet types

use crate::{ContractId, Currency, Money, UserId, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletKind {
    /// The user's single spending wallet
    Main,
    /// Funds held in trust for one contract until release
    Escrow,
}

/// A wallet in the ledger
///
/// Invariants, enforced by the ledger store:
/// - `balance` is never negative
/// - `contract` is `Some` iff `kind` is `Escrow`
/// - one `Main` wallet per user; one `Escrow` wallet per contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,
    pub owner: UserId,
    pub kind: WalletKind,
    pub contract: Option<ContractId>,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a main wallet with a zero balance
    pub fn main(owner: UserId, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            owner,
            kind: WalletKind::Main,
            contract: None,
            balance: Money::zero(currency),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an escrow wallet bound to a contract, zero balance
    pub fn escrow(owner: UserId, contract: ContractId, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            owner,
            kind: WalletKind::Escrow,
            contract: Some(contract),
            balance: Money::zero(currency),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn currency(&self) -> Currency {
        self.balance.currency
    }
}
