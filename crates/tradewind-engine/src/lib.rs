//! Tradewind Engine - the five compound ledger operations
//!
//! Deposit, withdrawal, transfer, escrow lock, and escrow release are
//! executed here as atomic units over the ledger store: per-wallet
//! guards are held for every wallet touched (two-wallet operations
//! acquire in ascending wallet-id order), the transaction row is
//! recorded PENDING, and the balance postings plus the COMPLETED flip
//! land in one store commit. A failed operation leaves a FAILED row
//! and no balance effect.
//!
//! Escrow operations additionally hold the per-contract guard across
//! the whole flow, then drive the contract state machine once the
//! money has moved.
//!
//! # Idempotency
//!
//! Every operation takes an optional caller-supplied idempotency key.
//! A key is remembered only when its operation completes; replaying it
//! returns the original transaction instead of applying the operation
//! again. The cache is consulted once up front and again after the
//! operation's guards are held, so a concurrent retry carrying the
//! same key waits on the guard and then replays. A failed attempt does
//! not consume the key, so the caller may retry after fixing the
//! cause.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tradewind_accounts::AccountRegistry;
use tradewind_contracts::ContractRegistry;
use tradewind_ledger::{LedgerStore, LockTable, DEFAULT_LOCK_TIMEOUT};
use tradewind_types::{
    Contract, ContractId, ContractStatus, DomainError, Money, PartyRole, Result, Transaction,
    TransactionDraft, TransactionId, TransactionKind, Wallet, WalletId, WalletKind,
};

/// Who receives the escrow funds on release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Beneficiary {
    Seller,
    Buyer,
}

impl Beneficiary {
    fn role(&self) -> PartyRole {
        match self {
            Self::Seller => PartyRole::Seller,
            Self::Buyer => PartyRole::Buyer,
        }
    }
}

/// The Tradewind transaction engine
#[derive(Clone)]
pub struct TransactionEngine {
    ledger: LedgerStore,
    contracts: ContractRegistry,
    accounts: AccountRegistry,
    wallet_locks: Arc<LockTable<WalletId>>,
    contract_locks: Arc<LockTable<ContractId>>,
    idempotency: Arc<DashMap<String, TransactionId>>,
}

impl TransactionEngine {
    pub fn new(
        ledger: LedgerStore,
        contracts: ContractRegistry,
        accounts: AccountRegistry,
    ) -> Self {
        let wallet_locks = ledger.wallet_locks();
        Self {
            ledger,
            contracts,
            accounts,
            wallet_locks,
            contract_locks: Arc::new(LockTable::new(DEFAULT_LOCK_TIMEOUT)),
            idempotency: Arc::new(DashMap::new()),
        }
    }

    /// Credit a wallet
    pub async fn deposit(
        &self,
        wallet_id: WalletId,
        amount: Money,
        key: Option<&str>,
    ) -> Result<Transaction> {
        require_positive(amount)?;
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }

        let _guard = self.wallet_locks.acquire(&wallet_id).await?;
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }
        let wallet = self.ledger.get_wallet(wallet_id).await?;
        require_main(&wallet)?;

        let tx = self
            .ledger
            .record_pending(
                TransactionDraft::new(TransactionKind::Deposit, amount)
                    .to_wallet(wallet_id)
                    .description("deposit")
                    .idempotency_key(key),
            )
            .await;
        self.ledger.commit(tx.id, &[(wallet_id, amount)]).await?;
        self.remember(key, tx.id);
        self.ledger.get_transaction(tx.id).await
    }

    /// Debit a wallet; requires a transact-capable KYC status
    pub async fn withdraw(
        &self,
        wallet_id: WalletId,
        amount: Money,
        key: Option<&str>,
    ) -> Result<Transaction> {
        require_positive(amount)?;
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }

        let _guard = self.wallet_locks.acquire(&wallet_id).await?;
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }
        let wallet = self.ledger.get_wallet(wallet_id).await?;
        require_main(&wallet)?;
        self.accounts.require_transactor(wallet.owner).await?;

        let tx = self
            .ledger
            .record_pending(
                TransactionDraft::new(TransactionKind::Withdrawal, amount)
                    .from_wallet(wallet_id)
                    .description("withdrawal")
                    .idempotency_key(key),
            )
            .await;
        self.ledger
            .commit(tx.id, &[(wallet_id, amount.negated())])
            .await?;
        self.remember(key, tx.id);
        self.ledger.get_transaction(tx.id).await
    }

    /// Move funds between two wallets as one atomic unit
    pub async fn transfer(
        &self,
        from: WalletId,
        to: WalletId,
        amount: Money,
        description: &str,
        key: Option<&str>,
    ) -> Result<Transaction> {
        require_positive(amount)?;
        if from == to {
            return Err(DomainError::SameWallet);
        }
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }

        let _guards = self.wallet_locks.acquire_pair(&from, &to).await?;
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }
        let source = self.ledger.get_wallet(from).await?;
        let destination = self.ledger.get_wallet(to).await?;
        require_main(&source)?;
        require_main(&destination)?;
        self.accounts.require_transactor(source.owner).await?;

        let tx = self
            .ledger
            .record_pending(
                TransactionDraft::new(TransactionKind::Transfer, amount)
                    .from_wallet(from)
                    .to_wallet(to)
                    .description(description)
                    .idempotency_key(key),
            )
            .await;
        self.ledger
            .commit(tx.id, &[(from, amount.negated()), (to, amount)])
            .await?;
        self.remember(key, tx.id);
        self.ledger.get_transaction(tx.id).await
    }

    /// Lock the contract's trade amount into its escrow wallet and
    /// advance the contract AWAITING_FUNDS -> FUNDED.
    ///
    /// On insufficient funds the ESCROW_LOCK row is FAILED and the
    /// contract stays AWAITING_FUNDS (the empty escrow wallet, if it
    /// was just created, is reused on retry).
    pub async fn escrow_lock(
        &self,
        contract_id: ContractId,
        from_wallet: WalletId,
        key: Option<&str>,
    ) -> Result<Transaction> {
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }

        let _contract_guard = self.contract_locks.acquire(&contract_id).await?;
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }
        let contract = self.contracts.get(contract_id).await?;
        if contract.status != ContractStatus::AwaitingFunds {
            return Err(DomainError::ContractNotAwaitingFunds {
                contract: contract_id.to_string(),
                status: contract.status.to_string(),
            });
        }
        let amount = contract.terms.amount;

        let funding = self.ledger.get_wallet(from_wallet).await?;
        require_main(&funding)?;
        self.accounts.require_transactor(funding.owner).await?;

        let escrow = match self.ledger.escrow_wallet_for_contract(contract_id).await {
            Some(w) => w,
            None => {
                self.ledger
                    .create_escrow_wallet(contract_id, funding.owner, amount.currency)
                    .await?
            }
        };

        let _guards = self
            .wallet_locks
            .acquire_pair(&from_wallet, &escrow.id)
            .await?;
        let tx = self
            .ledger
            .record_pending(
                TransactionDraft::new(TransactionKind::EscrowLock, amount)
                    .from_wallet(from_wallet)
                    .to_wallet(escrow.id)
                    .contract(contract_id)
                    .description(format!("escrow lock for {}", contract.title))
                    .idempotency_key(key),
            )
            .await;
        self.ledger
            .commit(
                tx.id,
                &[(from_wallet, amount.negated()), (escrow.id, amount)],
            )
            .await?;

        self.contracts
            .mark_funded(contract_id, funding.owner, escrow.id)
            .await?;
        self.remember(key, tx.id);
        self.ledger.get_transaction(tx.id).await
    }

    /// Release the full escrow balance to the beneficiary's wallet and
    /// settle the contract (COMPLETED for a seller release, CANCELLED
    /// for a buyer refund out of a dispute).
    pub async fn escrow_release(
        &self,
        contract_id: ContractId,
        to_wallet: WalletId,
        beneficiary: Beneficiary,
        key: Option<&str>,
    ) -> Result<Transaction> {
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }

        let _contract_guard = self.contract_locks.acquire(&contract_id).await?;
        if let Some(tx) = self.replay(key).await? {
            return Ok(tx);
        }
        let contract = self.contracts.get(contract_id).await?;

        let escrow = self.escrow_for_release(&contract).await?;
        let to_status = release_target(&contract, beneficiary)?;

        let destination = self.ledger.get_wallet(to_wallet).await?;
        require_main(&destination)?;
        let expected = contract.party(beneficiary.role()).ok_or_else(|| {
            DomainError::validation(format!(
                "contract has no {:?} party",
                beneficiary.role()
            ))
        })?;
        if destination.owner != expected {
            return Err(DomainError::validation(
                "destination wallet is not owned by the beneficiary",
            ));
        }

        let amount = escrow.balance;
        let _guards = self
            .wallet_locks
            .acquire_pair(&escrow.id, &to_wallet)
            .await?;
        let tx = self
            .ledger
            .record_pending(
                TransactionDraft::new(TransactionKind::EscrowRelease, amount)
                    .from_wallet(escrow.id)
                    .to_wallet(to_wallet)
                    .contract(contract_id)
                    .description(format!("escrow release for {}", contract.title))
                    .idempotency_key(key),
            )
            .await;
        self.ledger
            .commit(tx.id, &[(escrow.id, amount.negated()), (to_wallet, amount)])
            .await?;

        let settle_actor = match contract.status {
            ContractStatus::Disputed => contract
                .party(PartyRole::Mediator)
                .unwrap_or(destination.owner),
            _ => destination.owner,
        };
        let details = match beneficiary {
            Beneficiary::Seller => "escrow released to seller",
            Beneficiary::Buyer => "escrow refunded to buyer",
        };
        self.contracts
            .settle(contract_id, settle_actor, to_status, details)
            .await?;
        self.ledger.close_escrow_wallet(contract_id).await?;

        self.remember(key, tx.id);
        self.ledger.get_transaction(tx.id).await
    }

    /// Resolve the contract's escrow wallet for a release attempt,
    /// distinguishing "never funded" from "already released".
    async fn escrow_for_release(
        &self,
        contract: &Contract,
    ) -> Result<Wallet> {
        match self.ledger.escrow_wallet_for_contract(contract.id).await {
            Some(w) if w.balance.is_positive() => Ok(w),
            Some(_) => Err(DomainError::EscrowAlreadyReleased {
                contract: contract.id.to_string(),
            }),
            None if contract.escrow_wallet.is_some() => Err(DomainError::EscrowAlreadyReleased {
                contract: contract.id.to_string(),
            }),
            None => Err(DomainError::EscrowNotFound {
                contract: contract.id.to_string(),
            }),
        }
    }

    async fn replay(&self, key: Option<&str>) -> Result<Option<Transaction>> {
        let Some(key) = key else { return Ok(None) };
        let Some(tx_id) = self.idempotency.get(key).map(|e| *e.value()) else {
            return Ok(None);
        };
        let tx = self.ledger.get_transaction(tx_id).await?;
        tracing::debug!(%key, tx = %tx.id, "idempotent replay");
        Ok(Some(tx))
    }

    fn remember(&self, key: Option<&str>, tx_id: TransactionId) {
        if let Some(key) = key {
            self.idempotency.insert(key.to_string(), tx_id);
        }
    }
}

/// Which terminal status a release drives the contract to, or why the
/// release is illegal from the contract's current status
fn release_target(contract: &Contract, beneficiary: Beneficiary) -> Result<ContractStatus> {
    match (contract.status, beneficiary) {
        (ContractStatus::GoodsReceived, Beneficiary::Seller) => Ok(ContractStatus::Completed),
        (ContractStatus::Disputed, Beneficiary::Seller) => Ok(ContractStatus::Completed),
        (ContractStatus::Disputed, Beneficiary::Buyer) => Ok(ContractStatus::Cancelled),
        (from, _) if from.is_terminal() => Err(DomainError::EscrowAlreadyReleased {
            contract: contract.id.to_string(),
        }),
        (from, Beneficiary::Seller) => Err(DomainError::InvalidTransition {
            from: from.to_string(),
            to: ContractStatus::Completed.to_string(),
        }),
        (from, Beneficiary::Buyer) => Err(DomainError::InvalidTransition {
            from: from.to_string(),
            to: ContractStatus::Cancelled.to_string(),
        }),
    }
}

/// Escrow wallet balances move only through escrow lock and release;
/// the plain wallet operations must never touch them, or the owner
/// could drain funds held in trust.
fn require_main(wallet: &Wallet) -> Result<()> {
    if wallet.kind == WalletKind::Escrow {
        return Err(DomainError::validation(format!(
            "wallet {} is an escrow wallet; its balance moves only through escrow operations",
            wallet.id
        )));
    }
    Ok(())
}

fn require_positive(amount: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(DomainError::InvalidAmount {
            message: format!("amount must be positive, got {}", amount.amount),
        });
    }
    Ok(())
}
