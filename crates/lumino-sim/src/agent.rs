use lumino_coordinator::{Coordinator, Result};
use lumino_leader::compute_commitment;
use lumino_types::{AccountId, EpochId, JobId, JobStatus, NodeId};
use serde::{Deserialize, Serialize};

/// How an operator deviates from the protocol, if at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Honest,
    /// Commits every epoch but never reveals
    WithholdReveal,
    /// Skips the assignment round when elected
    LazyLeader,
    /// Never confirms assigned jobs; hands stale ones back the next epoch
    NeverConfirm,
}

/// A node operator driving one node through each phase
#[derive(Debug, Clone)]
pub struct NodeAgent {
    pub account: AccountId,
    pub node: NodeId,
    pub behavior: Behavior,
}

impl NodeAgent {
    pub fn new(account: AccountId, node: NodeId, behavior: Behavior) -> Self {
        NodeAgent {
            account,
            node,
            behavior,
        }
    }

    /// Deterministic per-epoch secret
    pub fn secret(&self, epoch: EpochId) -> Vec<u8> {
        format!("{}:{}:{}", self.account, self.node, epoch).into_bytes()
    }

    pub fn on_commit(&self, coordinator: &mut Coordinator, epoch: EpochId) -> Result<()> {
        if self.behavior == Behavior::NeverConfirm {
            self.hand_back_stale_jobs(coordinator, epoch)?;
        }
        let hash = compute_commitment(&self.secret(epoch));
        coordinator.submit_commitment(&self.account, epoch, self.node, hash)
    }

    /// Returns whether a reveal was sent
    pub fn on_reveal(&self, coordinator: &mut Coordinator, epoch: EpochId) -> Result<bool> {
        if self.behavior == Behavior::WithholdReveal {
            tracing::debug!(epoch, node_id = self.node.get(), "withholding reveal");
            return Ok(false);
        }
        coordinator.reveal_secret(&self.account, epoch, self.node, &self.secret(epoch))?;
        Ok(true)
    }

    /// Run the assignment round when this agent's node leads the epoch.
    /// Returns the number of jobs assigned, or None when it did not run.
    pub fn on_execute(&self, coordinator: &mut Coordinator) -> Result<Option<usize>> {
        if coordinator.current_leader() != Some(self.node) {
            return Ok(None);
        }
        if self.behavior == Behavior::LazyLeader {
            tracing::debug!(node_id = self.node.get(), "lazy leader skips assignment");
            return Ok(None);
        }
        let report = coordinator.start_assignment_round(&self.account)?;
        Ok(Some(report.assigned.len()))
    }

    /// Confirm and complete this epoch's assignments. Returns the completed jobs.
    pub fn on_confirm(&self, coordinator: &mut Coordinator, epoch: EpochId) -> Result<Vec<JobId>> {
        if self.behavior == Behavior::NeverConfirm {
            return Ok(Vec::new());
        }
        let jobs = self.jobs_in(coordinator, |status, assigned| {
            status == JobStatus::Assigned && assigned == Some(epoch)
        });
        for job in &jobs {
            coordinator.confirm_job(&self.account, *job)?;
            coordinator.complete_job(&self.account, *job)?;
        }
        Ok(jobs)
    }

    fn hand_back_stale_jobs(&self, coordinator: &mut Coordinator, epoch: EpochId) -> Result<()> {
        let stale = self.jobs_in(coordinator, |status, assigned| {
            status == JobStatus::Assigned && assigned.map(|e| e < epoch).unwrap_or(false)
        });
        for job in stale {
            coordinator.reject_job(&self.account, job, "not confirmed in time")?;
        }
        Ok(())
    }

    fn jobs_in(
        &self,
        coordinator: &Coordinator,
        keep: impl Fn(JobStatus, Option<EpochId>) -> bool,
    ) -> Vec<JobId> {
        coordinator
            .jobs_by_node(self.node)
            .into_iter()
            .filter(|job| keep(job.status, job.assigned_epoch))
            .map(|job| job.id)
            .collect()
    }
}
