//! The ledger store: wallets, balances, and the append-only
//! transaction log
//!
//! Balance mutation and transaction status flips happen together in
//! [`LedgerStore::commit`] under a single write critical section, so a
//! reader never observes a debit without its credit or a COMPLETED
//! transaction whose balances have not moved.
//!
//! Callers that mutate balances must hold the per-wallet guards from
//! [`LedgerStore::wallet_locks`] for every wallet they touch; the
//! transaction engine is the only such caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tradewind_types::{
    ContractId, Currency, DomainError, Money, Result, Transaction, TransactionDraft,
    TransactionId, TransactionStatus, UserId, Wallet, WalletId,
};

use crate::locks::{LockTable, DEFAULT_LOCK_TIMEOUT};

/// Append-only transaction log with an id index
#[derive(Default)]
struct TxLog {
    entries: Vec<Transaction>,
    index: HashMap<TransactionId, usize>,
}

impl TxLog {
    fn push(&mut self, tx: Transaction) {
        self.index.insert(tx.id, self.entries.len());
        self.entries.push(tx);
    }

    fn get_mut(&mut self, id: TransactionId) -> Option<&mut Transaction> {
        let idx = *self.index.get(&id)?;
        self.entries.get_mut(idx)
    }

    fn get(&self, id: TransactionId) -> Option<&Transaction> {
        let idx = *self.index.get(&id)?;
        self.entries.get(idx)
    }
}

/// The Tradewind ledger store
///
/// In-memory, thread-safe, cheap to clone (clones share state). The
/// store also plays wallet manager: it owns the one-MAIN-wallet-per-
/// user and one-ESCROW-wallet-per-contract indexes.
#[derive(Clone)]
pub struct LedgerStore {
    wallets: Arc<RwLock<HashMap<WalletId, Wallet>>>,
    transactions: Arc<RwLock<TxLog>>,
    /// user -> their MAIN wallet
    main_wallets: Arc<RwLock<HashMap<UserId, WalletId>>>,
    /// contract -> its ESCROW wallet
    escrow_wallets: Arc<RwLock<HashMap<ContractId, WalletId>>>,
    wallet_locks: Arc<LockTable<WalletId>>,
}

impl LedgerStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            wallets: Arc::new(RwLock::new(HashMap::new())),
            transactions: Arc::new(RwLock::new(TxLog::default())),
            main_wallets: Arc::new(RwLock::new(HashMap::new())),
            escrow_wallets: Arc::new(RwLock::new(HashMap::new())),
            wallet_locks: Arc::new(LockTable::new(lock_timeout)),
        }
    }

    /// Per-wallet serialization table shared with the engine
    pub fn wallet_locks(&self) -> Arc<LockTable<WalletId>> {
        self.wallet_locks.clone()
    }

    // ── Wallet management ────────────────────────────────────────────

    pub async fn get_wallet(&self, id: WalletId) -> Result<Wallet> {
        let wallets = self.wallets.read().await;
        wallets
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Wallet", id))
    }

    /// All wallets owned by a user, MAIN first
    pub async fn wallets_for_user(&self, user: UserId) -> Vec<Wallet> {
        let wallets = self.wallets.read().await;
        let mut owned: Vec<Wallet> = wallets
            .values()
            .filter(|w| w.owner == user)
            .cloned()
            .collect();
        owned.sort_by_key(|w| (w.kind != tradewind_types::WalletKind::Main, w.created_at));
        owned
    }

    /// Get the user's MAIN wallet, creating it with a zero balance on
    /// first use. Idempotent: later calls return the existing wallet
    /// regardless of the currency argument.
    pub async fn get_or_create_main_wallet(
        &self,
        user: UserId,
        currency: Currency,
    ) -> Result<Wallet> {
        let mut mains = self.main_wallets.write().await;
        let mut wallets = self.wallets.write().await;

        if let Some(id) = mains.get(&user) {
            return wallets
                .get(id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("Wallet", *id));
        }

        let wallet = Wallet::main(user, currency);
        tracing::info!(wallet = %wallet.id, user = %user, %currency, "created main wallet");
        mains.insert(user, wallet.id);
        wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    /// Create the escrow wallet for a contract
    pub async fn create_escrow_wallet(
        &self,
        contract: ContractId,
        owner: UserId,
        currency: Currency,
    ) -> Result<Wallet> {
        let mut escrows = self.escrow_wallets.write().await;
        if escrows.contains_key(&contract) {
            return Err(DomainError::DuplicateEscrow {
                contract: contract.to_string(),
            });
        }

        let wallet = Wallet::escrow(owner, contract, currency);
        tracing::info!(wallet = %wallet.id, %contract, "created escrow wallet");
        escrows.insert(contract, wallet.id);
        self.wallets.write().await.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    /// The contract's escrow wallet, if one was ever created
    pub async fn escrow_wallet_for_contract(&self, contract: ContractId) -> Option<Wallet> {
        let id = *self.escrow_wallets.read().await.get(&contract)?;
        self.wallets.read().await.get(&id).cloned()
    }

    /// Destroy a drained escrow wallet once its contract is terminal
    pub async fn close_escrow_wallet(&self, contract: ContractId) -> Result<()> {
        let mut escrows = self.escrow_wallets.write().await;
        let id = escrows
            .get(&contract)
            .copied()
            .ok_or_else(|| DomainError::EscrowNotFound {
                contract: contract.to_string(),
            })?;

        let mut wallets = self.wallets.write().await;
        let wallet = wallets
            .get(&id)
            .ok_or_else(|| DomainError::not_found("Wallet", id))?;
        if !wallet.balance.is_zero() {
            return Err(DomainError::validation(format!(
                "escrow wallet {id} still holds {}",
                wallet.balance
            )));
        }

        tracing::info!(wallet = %id, %contract, "closed escrow wallet");
        wallets.remove(&id);
        escrows.remove(&contract);
        Ok(())
    }

    // ── Transaction log ──────────────────────────────────────────────

    /// Persist a draft with status PENDING
    pub async fn record_pending(&self, draft: TransactionDraft) -> Transaction {
        let tx = Transaction {
            id: TransactionId::new(),
            from_wallet: draft.from_wallet,
            to_wallet: draft.to_wallet,
            amount: draft.amount,
            kind: draft.kind,
            status: TransactionStatus::Pending,
            contract: draft.contract,
            description: draft.description,
            metadata: draft.metadata,
            created_at: Utc::now(),
        };
        self.transactions.write().await.push(tx.clone());
        tx
    }

    /// Apply a set of balance postings and complete the transaction,
    /// all-or-nothing.
    ///
    /// Each posting is a signed delta against one wallet. Validation
    /// (wallet exists, currency matches, result non-negative) runs over
    /// every posting before anything is applied; any failure marks the
    /// transaction FAILED, applies nothing, and returns the error.
    pub async fn commit(
        &self,
        tx_id: TransactionId,
        postings: &[(WalletId, Money)],
    ) -> Result<Vec<Wallet>> {
        let mut wallets = self.wallets.write().await;
        let mut log = self.transactions.write().await;

        let tx = log
            .get_mut(tx_id)
            .ok_or_else(|| DomainError::not_found("Transaction", tx_id))?;
        if tx.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "transaction {tx_id} is already settled"
            )));
        }

        // Validate every posting before touching any balance
        let mut new_balances: Vec<(WalletId, Money)> = Vec::with_capacity(postings.len());
        for (wallet_id, delta) in postings {
            let wallet = match wallets.get(wallet_id) {
                Some(w) => w,
                None => {
                    let err = DomainError::not_found("Wallet", *wallet_id);
                    tx.status = TransactionStatus::Failed {
                        reason: err.to_string(),
                    };
                    return Err(err);
                }
            };
            let next = match wallet.balance.checked_add(*delta) {
                Ok(b) => b,
                Err(err) => {
                    tx.status = TransactionStatus::Failed {
                        reason: err.to_string(),
                    };
                    return Err(err);
                }
            };
            if next.is_negative() {
                let err = DomainError::InsufficientFunds {
                    wallet: wallet_id.to_string(),
                    requested: delta.negated().amount.to_string(),
                    available: wallet.balance.amount.to_string(),
                };
                tx.status = TransactionStatus::Failed {
                    reason: err.to_string(),
                };
                return Err(err);
            }
            new_balances.push((*wallet_id, next));
        }

        // Apply and complete as one unit
        let now = Utc::now();
        let mut updated = Vec::with_capacity(new_balances.len());
        for (wallet_id, balance) in new_balances {
            let wallet = wallets.get_mut(&wallet_id).expect("validated above");
            wallet.balance = balance;
            wallet.updated_at = now;
            updated.push(wallet.clone());
        }
        tx.status = TransactionStatus::Completed;
        tracing::debug!(tx = %tx_id, postings = postings.len(), "committed transaction");
        Ok(updated)
    }

    /// Mark a PENDING transaction FAILED with no balance effect
    pub async fn fail(&self, tx_id: TransactionId, reason: impl Into<String>) -> Result<Transaction> {
        let mut log = self.transactions.write().await;
        let tx = log
            .get_mut(tx_id)
            .ok_or_else(|| DomainError::not_found("Transaction", tx_id))?;
        if tx.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "transaction {tx_id} is already settled"
            )));
        }
        tx.status = TransactionStatus::Failed {
            reason: reason.into(),
        };
        Ok(tx.clone())
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction> {
        let log = self.transactions.read().await;
        log.get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Transaction", id))
    }

    /// Transactions touching a wallet, newest first
    pub async fn transactions_for_wallet(&self, wallet: WalletId) -> Vec<Transaction> {
        let log = self.transactions.read().await;
        log.entries
            .iter()
            .rev()
            .filter(|t| t.touches(wallet))
            .cloned()
            .collect()
    }

    /// Transactions touching any wallet owned by the user, newest first
    pub async fn transactions_for_user(&self, user: UserId) -> Vec<Transaction> {
        let owned: Vec<WalletId> = self
            .wallets_for_user(user)
            .await
            .into_iter()
            .map(|w| w.id)
            .collect();
        let log = self.transactions.read().await;
        log.entries
            .iter()
            .rev()
            .filter(|t| owned.iter().any(|w| t.touches(*w)))
            .cloned()
            .collect()
    }

    /// Sweep PENDING transactions older than `max_age` into FAILED.
    ///
    /// A caller that vanished mid-operation (client disconnect before
    /// commit) must not leave a PENDING row forever; the server runs
    /// this on an interval. Returns the number of expired transactions.
    pub async fn expire_pending(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - chrono::Duration::from_std(max_age).unwrap_or_default();
        let mut log = self.transactions.write().await;
        let mut expired = 0;
        for tx in log.entries.iter_mut() {
            if !tx.status.is_terminal() && tx.created_at < cutoff {
                tx.status = TransactionStatus::Failed {
                    reason: "operation abandoned before settlement".into(),
                };
                expired += 1;
            }
        }
        if expired > 0 {
            tracing::warn!(expired, "expired stale pending transactions");
        }
        expired
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradewind_types::{TransactionDraft, TransactionKind};

    fn usd(v: rust_decimal::Decimal) -> Money {
        Money::new(v, Currency::USD)
    }

    #[tokio::test]
    async fn main_wallet_is_idempotent_per_user() {
        let store = LedgerStore::default();
        let user = UserId::new();

        let a = store.get_or_create_main_wallet(user, Currency::USD).await.unwrap();
        let b = store.get_or_create_main_wallet(user, Currency::EUR).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.currency(), Currency::USD);
        assert_eq!(store.wallets_for_user(user).await.len(), 1);
    }

    #[tokio::test]
    async fn one_escrow_wallet_per_contract() {
        let store = LedgerStore::default();
        let contract = ContractId::new();
        let owner = UserId::new();

        store.create_escrow_wallet(contract, owner, Currency::USD).await.unwrap();
        let err = store
            .create_escrow_wallet(contract, owner, Currency::USD)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_ESCROW");
    }

    #[tokio::test]
    async fn commit_applies_all_postings() {
        let store = LedgerStore::default();
        let a = store.get_or_create_main_wallet(UserId::new(), Currency::USD).await.unwrap();
        let b = store.get_or_create_main_wallet(UserId::new(), Currency::USD).await.unwrap();

        let seed = store
            .record_pending(TransactionDraft::new(TransactionKind::Deposit, usd(dec!(100))).to_wallet(a.id))
            .await;
        store.commit(seed.id, &[(a.id, usd(dec!(100)))]).await.unwrap();

        let tx = store
            .record_pending(
                TransactionDraft::new(TransactionKind::Transfer, usd(dec!(40)))
                    .from_wallet(a.id)
                    .to_wallet(b.id),
            )
            .await;
        store
            .commit(tx.id, &[(a.id, usd(dec!(40)).negated()), (b.id, usd(dec!(40)))])
            .await
            .unwrap();

        assert_eq!(store.get_wallet(a.id).await.unwrap().balance, usd(dec!(60)));
        assert_eq!(store.get_wallet(b.id).await.unwrap().balance, usd(dec!(40)));
        assert!(store.get_transaction(tx.id).await.unwrap().status.is_completed());
    }

    #[tokio::test]
    async fn commit_rejects_overdraft_and_fails_transaction() {
        let store = LedgerStore::default();
        let a = store.get_or_create_main_wallet(UserId::new(), Currency::USD).await.unwrap();
        let b = store.get_or_create_main_wallet(UserId::new(), Currency::USD).await.unwrap();

        let tx = store
            .record_pending(
                TransactionDraft::new(TransactionKind::Transfer, usd(dec!(10)))
                    .from_wallet(a.id)
                    .to_wallet(b.id),
            )
            .await;
        let err = store
            .commit(tx.id, &[(a.id, usd(dec!(10)).negated()), (b.id, usd(dec!(10)))])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        // Nothing moved, transaction is FAILED
        assert!(store.get_wallet(a.id).await.unwrap().balance.is_zero());
        assert!(store.get_wallet(b.id).await.unwrap().balance.is_zero());
        let tx = store.get_transaction(tx.id).await.unwrap();
        assert!(matches!(tx.status, TransactionStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn commit_rejects_currency_mismatch() {
        let store = LedgerStore::default();
        let a = store.get_or_create_main_wallet(UserId::new(), Currency::USD).await.unwrap();

        let tx = store
            .record_pending(
                TransactionDraft::new(TransactionKind::Deposit, Money::new(dec!(5), Currency::EUR))
                    .to_wallet(a.id),
            )
            .await;
        let err = store
            .commit(tx.id, &[(a.id, Money::new(dec!(5), Currency::EUR))])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CURRENCY_MISMATCH");
    }

    #[tokio::test]
    async fn settled_transactions_are_immutable() {
        let store = LedgerStore::default();
        let a = store.get_or_create_main_wallet(UserId::new(), Currency::USD).await.unwrap();

        let tx = store
            .record_pending(TransactionDraft::new(TransactionKind::Deposit, usd(dec!(5))).to_wallet(a.id))
            .await;
        store.commit(tx.id, &[(a.id, usd(dec!(5)))]).await.unwrap();

        assert!(store.commit(tx.id, &[(a.id, usd(dec!(5)))]).await.is_err());
        assert!(store.fail(tx.id, "late").await.is_err());
        assert_eq!(store.get_wallet(a.id).await.unwrap().balance, usd(dec!(5)));
    }

    #[tokio::test]
    async fn escrow_close_requires_zero_balance() {
        let store = LedgerStore::default();
        let contract = ContractId::new();
        let escrow = store
            .create_escrow_wallet(contract, UserId::new(), Currency::USD)
            .await
            .unwrap();

        let tx = store
            .record_pending(TransactionDraft::new(TransactionKind::Deposit, usd(dec!(1))).to_wallet(escrow.id))
            .await;
        store.commit(tx.id, &[(escrow.id, usd(dec!(1)))]).await.unwrap();
        assert!(store.close_escrow_wallet(contract).await.is_err());

        let tx = store
            .record_pending(TransactionDraft::new(TransactionKind::Withdrawal, usd(dec!(1))).from_wallet(escrow.id))
            .await;
        store.commit(tx.id, &[(escrow.id, usd(dec!(1)).negated())]).await.unwrap();
        store.close_escrow_wallet(contract).await.unwrap();
        assert!(store.get_wallet(escrow.id).await.is_err());
    }

    #[tokio::test]
    async fn expire_pending_sweeps_stale_rows() {
        let store = LedgerStore::default();
        let a = store.get_or_create_main_wallet(UserId::new(), Currency::USD).await.unwrap();
        let tx = store
            .record_pending(TransactionDraft::new(TransactionKind::Deposit, usd(dec!(5))).to_wallet(a.id))
            .await;

        // Not old enough yet
        assert_eq!(store.expire_pending(Duration::from_secs(60)).await, 0);
        // Zero age: everything pending expires
        assert_eq!(store.expire_pending(Duration::ZERO).await, 1);
        let tx = store.get_transaction(tx.id).await.unwrap();
        assert!(matches!(tx.status, TransactionStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let store = LedgerStore::default();
        let user = UserId::new();
        let a = store.get_or_create_main_wallet(user, Currency::USD).await.unwrap();

        for v in [dec!(1), dec!(2), dec!(3)] {
            let tx = store
                .record_pending(TransactionDraft::new(TransactionKind::Deposit, usd(v)).to_wallet(a.id))
                .await;
            store.commit(tx.id, &[(a.id, usd(v))]).await.unwrap();
        }

        let history = store.transactions_for_wallet(a.id).await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].amount, usd(dec!(3)));
        assert_eq!(store.transactions_for_user(user).await.len(), 3);
    }
}
