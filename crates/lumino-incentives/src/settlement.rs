use lumino_clock::PhaseInfo;
use lumino_jobs::JobScheduler;
use lumino_ledger::{Ledger, NodeRegistry};
use lumino_leader::LeaderElection;
use lumino_types::{AccountId, EpochId, LuminoError, NodeId, Phase, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::params::IncentiveParams;
use crate::penalty::{Adjustment, AdjustmentKind, PenaltyBook};

/// Every adjustment made while settling one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub epoch: EpochId,
    pub disputer: AccountId,
    /// None when the epoch never produced an election result
    pub leader: Option<NodeId>,
    pub assignment_round_started: bool,
    pub adjustments: Vec<Adjustment>,
}

impl SettlementReport {
    pub fn slashed(&self) -> Vec<&AccountId> {
        self.adjustments
            .iter()
            .filter(|adj| adj.kind == AdjustmentKind::Slash)
            .map(|adj| &adj.account)
            .collect()
    }

    pub fn penalties(&self) -> impl Iterator<Item = &Adjustment> {
        self.adjustments
            .iter()
            .filter(|adj| adj.kind == AdjustmentKind::Penalty)
    }
}

/// Once-per-epoch application of rewards and penalties
#[derive(Debug, Clone, Default)]
pub struct IncentiveSettlement {
    params: IncentiveParams,
    book: PenaltyBook,
    processed: BTreeSet<EpochId>,
}

impl IncentiveSettlement {
    pub fn new(params: IncentiveParams) -> Self {
        Self {
            params,
            book: PenaltyBook::new(),
            processed: BTreeSet::new(),
        }
    }

    pub fn params(&self) -> &IncentiveParams {
        &self.params
    }

    pub fn set_params(&mut self, params: IncentiveParams) {
        self.params = params;
    }

    pub fn book(&self) -> &PenaltyBook {
        &self.book
    }

    pub fn is_processed(&self, epoch: EpochId) -> bool {
        self.processed.contains(&epoch)
    }

    pub fn processed_epochs(&self) -> impl Iterator<Item = EpochId> + '_ {
        self.processed.iter().copied()
    }

    /// Settle `epoch` on behalf of `disputer`. Allowed once DISPUTE of
    /// `epoch` has been reached; a second call fails with the benign
    /// `EpochAlreadyProcessed`. Either every adjustment lands or none does.
    #[allow(clippy::too_many_arguments)]
    pub fn settle(
        &mut self,
        at: &PhaseInfo,
        epoch: EpochId,
        disputer: &AccountId,
        election: &LeaderElection,
        scheduler: &JobScheduler,
        registry: &dyn NodeRegistry,
        ledger: &mut dyn Ledger,
    ) -> Result<SettlementReport> {
        if !at.has_reached(epoch, Phase::Dispute) {
            return Err(at.invalid(epoch, Phase::Dispute));
        }
        if self.processed.contains(&epoch) {
            return Err(LuminoError::EpochAlreadyProcessed(epoch));
        }

        let snapshot = ledger.snapshot();
        let mut book = self.book.clone();

        match self.apply(&mut book, epoch, disputer, election, scheduler, registry, ledger) {
            Ok(report) => {
                self.book = book;
                self.processed.insert(epoch);
                tracing::info!(
                    epoch,
                    disputer = %disputer,
                    adjustments = report.adjustments.len(),
                    "epoch settled"
                );
                Ok(report)
            }
            Err(err) => {
                ledger.restore(&snapshot)?;
                tracing::warn!(epoch, error = %err, "settlement rolled back");
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        book: &mut PenaltyBook,
        epoch: EpochId,
        disputer: &AccountId,
        election: &LeaderElection,
        scheduler: &JobScheduler,
        registry: &dyn NodeRegistry,
        ledger: &mut dyn Ledger,
    ) -> Result<SettlementReport> {
        let params = &self.params;
        let assignment_round_started = scheduler.assignment_round_started(epoch);
        let leader = election.election_result(epoch).map(|result| result.leader);
        let mut adjustments = Vec::new();
        // Counters are bumped after every reward so a slash leaves exactly zero.
        let mut penalized = Vec::new();

        // Leader
        if let Some(node) = leader {
            let owner = registry
                .owner_of(node)
                .ok_or(LuminoError::NodeNotFound(node))?;
            if assignment_round_started {
                adjustments.push(book.apply_reward(
                    ledger,
                    &owner,
                    params.leader_reward,
                    "leader executed assignment round",
                )?);
            } else {
                adjustments.push(book.apply_penalty(
                    ledger,
                    &owner,
                    params.leader_not_executed_penalty,
                    "leader did not execute assignment round",
                )?);
                penalized.push(owner);
            }
        }

        // Availability
        for node in election.revealed_nodes(epoch) {
            match registry.owner_of(*node) {
                Some(owner) => adjustments.push(book.apply_reward(
                    ledger,
                    &owner,
                    params.job_availability_reward,
                    "node available",
                )?),
                None => tracing::warn!(epoch, node_id = node.get(), "revealed node has no owner"),
            }
        }

        // Unconfirmed jobs
        for job in scheduler.unconfirmed_jobs(epoch) {
            let Some(owner) = job.assigned_node.and_then(|node| registry.owner_of(node)) else {
                tracing::warn!(epoch, job_id = job.id.get(), "unconfirmed job has no node owner");
                continue;
            };
            adjustments.push(book.apply_penalty(
                ledger,
                &owner,
                params.job_not_confirmed_penalty,
                "job not confirmed",
            )?);
            penalized.push(owner);
        }

        adjustments.push(book.apply_reward(
            ledger,
            disputer,
            params.disputer_reward,
            "settled epoch",
        )?);

        for account in &penalized {
            self.count_penalty(book, ledger, account, &mut adjustments)?;
        }

        Ok(SettlementReport {
            epoch,
            disputer: disputer.clone(),
            leader,
            assignment_round_started,
            adjustments,
        })
    }

    fn count_penalty(
        &self,
        book: &mut PenaltyBook,
        ledger: &mut dyn Ledger,
        account: &AccountId,
        adjustments: &mut Vec<Adjustment>,
    ) -> Result<()> {
        let slash = book.increment_penalty_counter(
            ledger,
            account,
            self.params.max_penalties_before_slash,
            self.params.counter_after_slash,
        )?;
        adjustments.extend(slash);
        Ok(())
    }
}
