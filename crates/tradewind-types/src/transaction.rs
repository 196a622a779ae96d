//! Ledger transaction types
//!
//! Transactions form an append-only ledger. A transaction is created
//! PENDING and flipped to COMPLETED or FAILED exactly once, atomically
//! with any balance changes it describes. Terminal transactions are
//! immutable.

use crate::{ContractId, Money, TransactionId, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key under which a caller-supplied idempotency key is stored
pub const IDEMPOTENCY_KEY_META: &str = "idempotency_key";

/// The five balance-affecting operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
    EscrowLock,
    EscrowRelease,
}

/// Lifecycle status of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Recorded, balance effects not yet applied
    Pending,
    /// Balance effects applied; immutable from here
    Completed,
    /// No balance effect occurred; immutable from here
    Failed { reason: String },
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub from_wallet: Option<WalletId>,
    pub to_wallet: Option<WalletId>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub contract: Option<ContractId>,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The idempotency key stored at creation, if any
    pub fn idempotency_key(&self) -> Option<&str> {
        self.metadata.get(IDEMPOTENCY_KEY_META).map(String::as_str)
    }

    /// Whether this transaction touches the given wallet on either side
    pub fn touches(&self, wallet: WalletId) -> bool {
        self.from_wallet == Some(wallet) || self.to_wallet == Some(wallet)
    }
}

/// Draft of a transaction, recorded PENDING by the ledger store
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub from_wallet: Option<WalletId>,
    pub to_wallet: Option<WalletId>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub contract: Option<ContractId>,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
}

impl TransactionDraft {
    pub fn new(kind: TransactionKind, amount: Money) -> Self {
        Self {
            from_wallet: None,
            to_wallet: None,
            amount,
            kind,
            contract: None,
            description: String::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn from_wallet(mut self, wallet: WalletId) -> Self {
        self.from_wallet = Some(wallet);
        self
    }

    pub fn to_wallet(mut self, wallet: WalletId) -> Self {
        self.to_wallet = Some(wallet);
        self
    }

    pub fn contract(mut self, contract: ContractId) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn idempotency_key(mut self, key: Option<&str>) -> Self {
        if let Some(key) = key {
            self.metadata
                .insert(IDEMPOTENCY_KEY_META.to_string(), key.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Currency, Money};
    use rust_decimal_macros::dec;

    #[test]
    fn terminal_statuses() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed {
            reason: "x".into()
        }
        .is_terminal());
    }

    #[test]
    fn draft_builder_records_idempotency_key() {
        let draft = TransactionDraft::new(
            TransactionKind::Deposit,
            Money::new(dec!(10), Currency::USD),
        )
        .idempotency_key(Some("key-1"));
        assert_eq!(
            draft.metadata.get(IDEMPOTENCY_KEY_META).map(String::as_str),
            Some("key-1")
        );
    }
}
