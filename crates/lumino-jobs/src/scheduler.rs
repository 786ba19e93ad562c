use lumino_clock::PhaseInfo;
use lumino_ledger::{Ledger, NodeRegistry};
use lumino_leader::ElectionResult;
use lumino_types::{
    AccountId, Amount, EpochId, JobId, JobStatus, LuminoError, NodeId, Phase, PoolId, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::job::Job;
use crate::queue::JobQueue;

/// When the assigned node may confirm or complete a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmWindow {
    /// Only in CONFIRM or DISPUTE of the epoch the job was assigned in
    #[default]
    AssignmentEpoch,
    /// Any time after assignment
    Anytime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerParams {
    pub max_jobs_per_node: usize,
    pub confirm_window: ConfirmWindow,
    pub job_fee: Amount,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            max_jobs_per_node: 1,
            confirm_window: ConfirmWindow::AssignmentEpoch,
            job_fee: Amount::from_units(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub job: JobId,
    pub node: NodeId,
    pub epoch: EpochId,
}

/// Outcome of one assignment round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentReport {
    pub epoch: EpochId,
    pub assigned: Vec<Assignment>,
    /// NEW jobs left waiting because their pool had no node with spare capacity
    pub skipped: Vec<JobId>,
}

/// Fee transfer for a completed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub job: JobId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

/// Job lifecycle: NEW -> ASSIGNED -> CONFIRMED -> COMPLETE, with
/// ASSIGNED -> NEW on rejection.
#[derive(Debug, Clone, Default)]
pub struct JobScheduler {
    params: SchedulerParams,
    queue: JobQueue,
    assignment_rounds: BTreeSet<EpochId>,
}

impl JobScheduler {
    pub fn new(params: SchedulerParams) -> Self {
        Self {
            params,
            queue: JobQueue::new(),
            assignment_rounds: BTreeSet::new(),
        }
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SchedulerParams) {
        self.params = params;
    }

    /// Create a NEW job in `pool`. Allowed in any phase as long as the
    /// submitter holds at least `min_balance` in escrow.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_job(
        &mut self,
        at: &PhaseInfo,
        submitter: &AccountId,
        pool: PoolId,
        model_name: impl Into<String>,
        payload: impl Into<String>,
        ledger: &dyn Ledger,
        min_balance: Amount,
        now: u64,
    ) -> Result<JobId> {
        if !ledger.has_minimum_balance(submitter, min_balance) {
            return Err(LuminoError::InsufficientBalance {
                account: submitter.clone(),
                required: min_balance.to_string(),
                available: ledger.balance_of(submitter).to_string(),
            });
        }

        let id = self.queue.allocate_id();
        let job = Job::new(
            id,
            submitter.clone(),
            pool,
            model_name.into(),
            payload.into(),
            now,
            at.epoch,
        );
        self.queue.insert(job);

        tracing::info!(job_id = id.get(), pool = pool.get(), submitter = %submitter, "job submitted");
        Ok(id)
    }

    /// Assign every pending job that has an eligible node. The caller must
    /// already be validated as the leader behind `leader`; requires EXECUTE.
    /// Repeat calls in the same epoch re-scan whatever is still NEW.
    pub fn start_assignment_round(
        &mut self,
        at: &PhaseInfo,
        leader: &ElectionResult,
        registry: &dyn NodeRegistry,
        now: u64,
    ) -> Result<AssignmentReport> {
        at.require_current(Phase::Execute)?;
        if leader.epoch != at.epoch {
            return Err(LuminoError::NoElectionResult(at.epoch));
        }

        let epoch = at.epoch;
        self.assignment_rounds.insert(epoch);

        let mut report = AssignmentReport {
            epoch,
            ..AssignmentReport::default()
        };

        for (pool, pending) in self.queue.pending_snapshot() {
            for job_id in pending {
                match self.pick_node(pool, job_id, leader, registry) {
                    Ok(node) => {
                        self.assign(job_id, node, epoch, now)?;
                        report.assigned.push(Assignment {
                            job: job_id,
                            node,
                            epoch,
                        });
                    }
                    Err(err) => {
                        tracing::debug!(job_id = job_id.get(), error = %err, "job left pending");
                        report.skipped.push(job_id);
                    }
                }
            }
        }

        tracing::info!(
            epoch,
            assigned = report.assigned.len(),
            skipped = report.skipped.len(),
            "assignment round complete"
        );
        Ok(report)
    }

    fn pick_node(
        &self,
        pool: PoolId,
        job_id: JobId,
        leader: &ElectionResult,
        registry: &dyn NodeRegistry,
    ) -> Result<NodeId> {
        let eligible: Vec<NodeId> = registry
            .nodes_in_pool(pool)
            .into_iter()
            .filter(|node| self.queue.load(*node) < self.params.max_jobs_per_node)
            .collect();

        if eligible.is_empty() {
            return Err(LuminoError::InsufficientEligibleCapacity { job: job_id, pool });
        }

        let index = leader
            .random_value
            .mix(&job_id.to_be_bytes())
            .reduce(eligible.len());
        Ok(eligible[index])
    }

    fn assign(&mut self, job_id: JobId, node: NodeId, epoch: EpochId, now: u64) -> Result<()> {
        let job = self
            .queue
            .get_mut(job_id)
            .ok_or(LuminoError::JobNotFound(job_id))?;
        job.transition(JobStatus::Assigned, now)?;
        job.assigned_node = Some(node);
        job.assigned_epoch = Some(epoch);
        job.reject_reason = None;
        self.queue.mark_assigned(job_id, node, epoch);

        tracing::info!(job_id = job_id.get(), node_id = node.get(), epoch, "job assigned");
        Ok(())
    }

    /// ASSIGNED -> CONFIRMED, by the owner of the assigned node
    pub fn confirm_job(
        &mut self,
        at: &PhaseInfo,
        job_id: JobId,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
        now: u64,
    ) -> Result<()> {
        self.advance(at, job_id, caller, registry, JobStatus::Confirmed, now)
    }

    /// CONFIRMED -> COMPLETE, by the owner of the assigned node
    pub fn complete_job(
        &mut self,
        at: &PhaseInfo,
        job_id: JobId,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
        now: u64,
    ) -> Result<()> {
        self.advance(at, job_id, caller, registry, JobStatus::Complete, now)?;
        if let Some(job) = self.queue.get(job_id) {
            if let Some(node) = job.assigned_node {
                self.queue.release(job_id, node, None);
            }
        }
        Ok(())
    }

    fn advance(
        &mut self,
        at: &PhaseInfo,
        job_id: JobId,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
        next: JobStatus,
        now: u64,
    ) -> Result<()> {
        let window = self.params.confirm_window;
        let job = self.authorized_job(job_id, caller, registry, next)?;

        if window == ConfirmWindow::AssignmentEpoch {
            let assigned_epoch = job.assigned_epoch.unwrap_or(at.epoch);
            let in_window = at.epoch == assigned_epoch
                && matches!(at.phase, Phase::Confirm | Phase::Dispute);
            if !in_window {
                return Err(at.invalid(assigned_epoch, Phase::Confirm));
            }
        }
        job.check_transition(next)?;

        let job = self
            .queue
            .get_mut(job_id)
            .ok_or(LuminoError::JobNotFound(job_id))?;
        let previous = job.status;
        job.transition(next, now)?;

        tracing::info!(job_id = job_id.get(), from = %previous, to = %next, "job status changed");
        Ok(())
    }

    /// ASSIGNED -> NEW, by the owner of the assigned node. The job goes to
    /// the back of its pool's pending queue.
    pub fn reject_job(
        &mut self,
        job_id: JobId,
        reason: impl Into<String>,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
        now: u64,
    ) -> Result<()> {
        let job = self.authorized_job(job_id, caller, registry, JobStatus::New)?;
        job.check_transition(JobStatus::New)?;
        let node = job.assigned_node;
        let pool = job.pool;

        let reason = reason.into();
        let job = self
            .queue
            .get_mut(job_id)
            .ok_or(LuminoError::JobNotFound(job_id))?;
        job.transition(JobStatus::New, now)?;
        job.assigned_node = None;
        job.reject_reason = Some(reason.clone());
        if let Some(node) = node {
            self.queue.release(job_id, node, Some(pool));
        }

        tracing::warn!(job_id = job_id.get(), reason = %reason, "job rejected");
        Ok(())
    }

    /// Look up a job and check that `caller` owns its assigned node.
    /// An unassigned job has no owner, so any attempt is a bad transition.
    fn authorized_job(
        &self,
        job_id: JobId,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
        attempted: JobStatus,
    ) -> Result<&Job> {
        let job = self
            .queue
            .get(job_id)
            .ok_or(LuminoError::JobNotFound(job_id))?;
        let node = job
            .assigned_node
            .ok_or(LuminoError::InvalidJobStatusTransition {
                current: job.status,
                attempted,
            })?;
        match registry.owner_of(node) {
            Some(owner) if &owner == caller => Ok(job),
            _ => Err(LuminoError::NotAuthorized(
                caller.clone(),
                format!("does not own assigned node {}", node),
            )),
        }
    }

    /// Jobs assigned in `epoch` that are still ASSIGNED
    pub fn unconfirmed_jobs(&self, epoch: EpochId) -> Vec<&Job> {
        self.queue
            .assigned_in(epoch)
            .into_iter()
            .filter(|job| job.status == JobStatus::Assigned && job.assigned_epoch == Some(epoch))
            .collect()
    }

    pub fn assignment_round_started(&self, epoch: EpochId) -> bool {
        self.assignment_rounds.contains(&epoch)
    }

    /// Charge the fee of a COMPLETE job: the submitter pays the node owner
    /// `job_fee`, or whatever is left if the balance is lower.
    pub fn process_payment(
        &mut self,
        job_id: JobId,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
        ledger: &mut dyn Ledger,
    ) -> Result<Payment> {
        let job = self
            .queue
            .get(job_id)
            .ok_or(LuminoError::JobNotFound(job_id))?;
        if job.status != JobStatus::Complete {
            return Err(LuminoError::JobNotComplete(job_id));
        }
        if job.is_paid() {
            return Err(LuminoError::JobAlreadyPaid(job_id));
        }

        let node = job.assigned_node.ok_or(LuminoError::JobNotComplete(job_id))?;
        let node_owner = registry
            .owner_of(node)
            .ok_or(LuminoError::NodeNotFound(node))?;
        if caller != &job.submitter && caller != &node_owner {
            return Err(LuminoError::NotAuthorized(
                caller.clone(),
                format!("is neither submitter nor node owner of {}", job_id),
            ));
        }

        let submitter = job.submitter.clone();
        let snapshot = ledger.snapshot();
        let transfer = ledger
            .decrease_balance(&submitter, self.params.job_fee)
            .and_then(|amount| {
                ledger
                    .increase_balance(&node_owner, amount)
                    .map(|_| amount)
            });
        let amount = match transfer {
            Ok(amount) => amount,
            Err(err) => {
                ledger.restore(&snapshot)?;
                return Err(err);
            }
        };

        if let Some(job) = self.queue.get_mut(job_id) {
            job.fee = Some(amount);
        }

        tracing::info!(job_id = job_id.get(), amount = %amount, to = %node_owner, "job paid");
        Ok(Payment {
            job: job_id,
            from: submitter,
            to: node_owner,
            amount,
        })
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.queue.get(job_id)
    }

    pub fn assigned_node(&self, job_id: JobId) -> Option<NodeId> {
        self.queue.get(job_id).and_then(|job| job.assigned_node)
    }

    pub fn jobs_by_submitter(&self, submitter: &AccountId) -> Vec<&Job> {
        self.queue.jobs_by_submitter(submitter)
    }

    /// Jobs the node currently holds (ASSIGNED or CONFIRMED)
    pub fn jobs_by_node(&self, node: NodeId) -> Vec<&Job> {
        self.queue.active_jobs(node)
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }
}
