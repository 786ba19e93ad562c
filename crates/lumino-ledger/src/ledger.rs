use lumino_types::{AccountId, Amount, Result};
use std::collections::BTreeMap;

/// Escrow ledger the protocol rewards and penalizes against.
/// Custody rules (deposits, withdraw locks) live behind this interface.
pub trait Ledger: Send {
    /// Current escrow balance of an account
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Credit an account
    fn increase_balance(&mut self, account: &AccountId, amount: Amount) -> Result<()>;

    /// Debit an account by at most its balance; returns the amount actually removed
    fn decrease_balance(&mut self, account: &AccountId, amount: Amount) -> Result<Amount>;

    /// Check that an account holds at least `minimum`
    fn has_minimum_balance(&self, account: &AccountId, minimum: Amount) -> bool {
        self.balance_of(account) >= minimum
    }

    /// Remove the entire balance; returns what was removed
    fn zero_balance(&mut self, account: &AccountId) -> Result<Amount> {
        let balance = self.balance_of(account);
        self.decrease_balance(account, balance)
    }

    /// List all accounts
    fn list_accounts(&self) -> Vec<AccountId>;

    /// Get a snapshot of all balances (for rollback)
    fn snapshot(&self) -> LedgerSnapshot;

    /// Restore from a snapshot
    fn restore(&mut self, snapshot: &LedgerSnapshot) -> Result<()>;
}

/// Snapshot of ledger state for checkpoint/restore
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LedgerSnapshot {
    pub balances: BTreeMap<AccountId, Amount>,
}
