use lumino_types::{AccountId, Amount, Result};
use std::collections::BTreeMap;

use crate::ledger::{Ledger, LedgerSnapshot};

/// In-memory ledger implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: BTreeMap<AccountId, Amount>,
}

impl MemoryLedger {
    /// Create a new empty in-memory ledger
    pub fn new() -> Self {
        MemoryLedger {
            balances: BTreeMap::new(),
        }
    }

    /// Initialize with pre-funded accounts
    pub fn with_balances(balances: BTreeMap<AccountId, Amount>) -> Self {
        MemoryLedger { balances }
    }

    /// Credit an account directly (stands in for an external deposit)
    pub fn deposit(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        self.increase_balance(account, amount)
    }
}

impl Ledger for MemoryLedger {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    fn increase_balance(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        let current = self.balance_of(account);
        let updated = current.checked_add(amount)?;
        self.balances.insert(account.clone(), updated);
        Ok(())
    }

    fn decrease_balance(&mut self, account: &AccountId, amount: Amount) -> Result<Amount> {
        let current = self.balance_of(account);
        let actual = amount.min(current);
        if actual.is_zero() {
            return Ok(Amount::ZERO);
        }
        self.balances.insert(account.clone(), current.saturating_sub(actual));
        Ok(actual)
    }

    fn list_accounts(&self) -> Vec<AccountId> {
        self.balances.keys().cloned().collect()
    }

    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balances: self.balances.clone(),
        }
    }

    fn restore(&mut self, snapshot: &LedgerSnapshot) -> Result<()> {
        self.balances = snapshot.balances.clone();
        Ok(())
    }
}
