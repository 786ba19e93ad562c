use lumino_ledger::Ledger;
use lumino_types::{AccountId, Amount, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::params::CounterAfterSlash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Reward,
    Penalty,
    Slash,
}

/// One balance change made by the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub account: AccountId,
    pub kind: AdjustmentKind,
    pub requested: Amount,
    /// What actually moved; penalties stop at the current balance
    pub applied: Amount,
    pub reason: String,
}

/// Penalty counters per account plus a record of every adjustment
#[derive(Debug, Clone, Default)]
pub struct PenaltyBook {
    counters: BTreeMap<AccountId, u32>,
    history: Vec<Adjustment>,
}

impl PenaltyBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take `min(amount, balance)` from the account
    pub fn apply_penalty(
        &mut self,
        ledger: &mut dyn Ledger,
        account: &AccountId,
        amount: Amount,
        reason: &str,
    ) -> Result<Adjustment> {
        let applied = ledger.decrease_balance(account, amount)?;
        tracing::warn!(account = %account, amount = %applied, reason, "penalty applied");
        Ok(self.record(account, AdjustmentKind::Penalty, amount, applied, reason))
    }

    pub fn apply_reward(
        &mut self,
        ledger: &mut dyn Ledger,
        account: &AccountId,
        amount: Amount,
        reason: &str,
    ) -> Result<Adjustment> {
        ledger.increase_balance(account, amount)?;
        tracing::info!(account = %account, amount = %amount, reason, "reward applied");
        Ok(self.record(account, AdjustmentKind::Reward, amount, amount, reason))
    }

    /// Bump the counter; at `max` the balance is zeroed. Returns the slash
    /// adjustment when one happened.
    pub fn increment_penalty_counter(
        &mut self,
        ledger: &mut dyn Ledger,
        account: &AccountId,
        max: u32,
        after_slash: CounterAfterSlash,
    ) -> Result<Option<Adjustment>> {
        let counter = self.counters.entry(account.clone()).or_insert(0);
        *counter = counter.saturating_add(1);
        let count = *counter;
        if count < max {
            tracing::debug!(account = %account, count, "penalty counter incremented");
            return Ok(None);
        }

        let slashed = self.apply_slash(ledger, account)?;
        if after_slash == CounterAfterSlash::Reset {
            self.counters.insert(account.clone(), 0);
        }
        Ok(Some(slashed))
    }

    fn apply_slash(&mut self, ledger: &mut dyn Ledger, account: &AccountId) -> Result<Adjustment> {
        let balance = ledger.balance_of(account);
        let taken = ledger.zero_balance(account)?;
        tracing::warn!(account = %account, amount = %taken, "account slashed");
        Ok(self.record(
            account,
            AdjustmentKind::Slash,
            balance,
            taken,
            "penalty limit reached",
        ))
    }

    fn record(
        &mut self,
        account: &AccountId,
        kind: AdjustmentKind,
        requested: Amount,
        applied: Amount,
        reason: &str,
    ) -> Adjustment {
        let adjustment = Adjustment {
            account: account.clone(),
            kind,
            requested,
            applied,
            reason: reason.to_string(),
        };
        self.history.push(adjustment.clone());
        adjustment
    }

    pub fn penalty_count(&self, account: &AccountId) -> u32 {
        self.counters.get(account).copied().unwrap_or(0)
    }

    pub fn history(&self) -> &[Adjustment] {
        &self.history
    }
}
