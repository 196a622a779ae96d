//! Application state shared across handlers

use tradewind_accounts::AccountRegistry;
use tradewind_contracts::ContractRegistry;
use tradewind_engine::TransactionEngine;
use tradewind_ledger::LedgerStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountRegistry,
    pub ledger: LedgerStore,
    pub contracts: ContractRegistry,
    pub engine: TransactionEngine,
}

impl AppState {
    /// Wire up a fresh service: empty stores, one engine over them
    pub fn new(ledger: LedgerStore) -> Self {
        let accounts = AccountRegistry::new();
        let contracts = ContractRegistry::new();
        let engine = TransactionEngine::new(ledger.clone(), contracts.clone(), accounts.clone());
        Self {
            accounts,
            ledger,
            contracts,
            engine,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(LedgerStore::default())
    }
}
