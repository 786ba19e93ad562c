use lumino_clock::{PhaseClock, PhaseInfo, TimeSource};
use lumino_incentives::{AdjustmentKind, IncentiveSettlement, SettlementReport};
use lumino_jobs::{AssignmentReport, Job, JobScheduler, Payment};
use lumino_ledger::{AccessControl, Ledger, NodeRegistry, Role, Whitelist};
use lumino_leader::{CommitmentHash, ElectionResult, LeaderElection, RandomValue};
use lumino_types::{AccountId, Amount, EpochId, JobId, JobStatus, LuminoError, NodeId, Phase, PoolId};

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::events::{EventLog, ProtocolEvent};
use crate::status::StatusSnapshot;

/// External systems the coordinator consults
pub struct Collaborators {
    pub time: Box<dyn TimeSource>,
    pub ledger: Box<dyn Ledger>,
    pub registry: Box<dyn NodeRegistry>,
    pub whitelist: Box<dyn Whitelist>,
    pub access: Box<dyn AccessControl>,
}

/// Single-writer protocol engine.
///
/// Owns every piece of epoch, job and settlement state. Each mutating call
/// reads the clock, checks all of its guards and then applies its changes as
/// one unit; a failed call leaves state as it was. Successful calls are
/// appended to the hash-chained [`EventLog`].
pub struct Coordinator {
    config: ProtocolConfig,
    clock: PhaseClock,
    time: Box<dyn TimeSource>,
    ledger: Box<dyn Ledger>,
    registry: Box<dyn NodeRegistry>,
    whitelist: Box<dyn Whitelist>,
    access: Box<dyn AccessControl>,
    election: LeaderElection,
    scheduler: JobScheduler,
    settlement: IncentiveSettlement,
    events: EventLog,
}

impl Coordinator {
    pub fn new(config: ProtocolConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        let clock = PhaseClock::new(config.phases)?;

        tracing::info!(
            epoch_length = clock.epoch_length(),
            max_jobs_per_node = config.scheduler.max_jobs_per_node,
            "coordinator created"
        );

        Ok(Self {
            scheduler: JobScheduler::new(config.scheduler.clone()),
            settlement: IncentiveSettlement::new(config.incentives.clone()),
            election: LeaderElection::new(),
            events: EventLog::new(),
            clock,
            config,
            time: collaborators.time,
            ledger: collaborators.ledger,
            registry: collaborators.registry,
            whitelist: collaborators.whitelist,
            access: collaborators.access,
        })
    }

    fn now(&self) -> u64 {
        self.time.now()
    }

    pub fn clock(&self) -> &PhaseClock {
        &self.clock
    }

    /// Where the clock is right now
    pub fn phase_info(&self) -> PhaseInfo {
        self.clock.phase_of(self.now())
    }

    fn record(&mut self, event: ProtocolEvent) {
        let now = self.now();
        self.events.append(event, now);
    }

    fn record_all(&mut self, events: impl IntoIterator<Item = ProtocolEvent>) {
        for event in events {
            self.record(event);
        }
    }

    // Nodes

    /// Register a node for a whitelisted caller holding enough stake for
    /// `compute_rating`
    pub fn register_node(
        &mut self,
        caller: &AccountId,
        pool: PoolId,
        compute_rating: u64,
    ) -> Result<NodeId> {
        if !self.whitelist.is_eligible(caller) {
            return Err(LuminoError::NotWhitelisted(caller.clone()).into());
        }
        let required = self
            .config
            .escrow
            .stake_per_compute_unit
            .checked_mul_int(compute_rating)?;
        if !self.ledger.has_minimum_balance(caller, required) {
            return Err(LuminoError::InsufficientStake {
                account: caller.clone(),
                compute_rating,
            }
            .into());
        }

        let node = self.registry.register_node(caller, pool, compute_rating)?;
        self.record(ProtocolEvent::NodeRegistered {
            node,
            owner: caller.clone(),
            pool,
            compute_rating,
        });
        Ok(node)
    }

    pub fn unregister_node(&mut self, caller: &AccountId, node: NodeId) -> Result<()> {
        self.registry.require_owner(node, caller)?;
        self.registry.unregister_node(node)?;
        self.record(ProtocolEvent::NodeUnregistered { node });
        Ok(())
    }

    // Election

    pub fn submit_commitment(
        &mut self,
        caller: &AccountId,
        epoch: EpochId,
        node: NodeId,
        hash: CommitmentHash,
    ) -> Result<()> {
        let at = self.phase_info();
        let now = self.now();
        self.election.submit_commitment(
            &at,
            epoch,
            node,
            hash.clone(),
            caller,
            self.registry.as_ref(),
            self.whitelist.as_ref(),
            now,
        )?;
        self.record_all([
            ProtocolEvent::CommitmentSubmitted { epoch, node, hash },
            ProtocolEvent::NodeLive { epoch, node },
        ]);
        Ok(())
    }

    pub fn reveal_secret(
        &mut self,
        caller: &AccountId,
        epoch: EpochId,
        node: NodeId,
        secret: &[u8],
    ) -> Result<()> {
        let at = self.phase_info();
        self.election
            .reveal_secret(&at, epoch, node, secret, caller, self.registry.as_ref())?;
        self.record(ProtocolEvent::SecretRevealed { epoch, node });
        Ok(())
    }

    /// Elect (or return the already elected) leader of the current epoch
    pub fn elect_leader(&mut self) -> Result<ElectionResult> {
        let at = self.phase_info();
        let fresh = self.election.election_result(at.epoch).is_none();
        let result = self.election.elect_leader(&at)?;
        if fresh {
            self.record(ProtocolEvent::LeaderElected {
                epoch: result.epoch,
                leader: result.leader,
                random_value: result.random_value,
            });
        }
        Ok(result)
    }

    pub fn validate_leader(&self, caller: &AccountId) -> Result<ElectionResult> {
        let at = self.phase_info();
        Ok(self
            .election
            .validate_leader(&at, caller, self.registry.as_ref())?)
    }

    pub fn current_leader(&self) -> Option<NodeId> {
        let epoch = self.phase_info().epoch;
        self.election.election_result(epoch).map(|r| r.leader)
    }

    pub fn election_result(&self, epoch: EpochId) -> Option<&ElectionResult> {
        self.election.election_result(epoch)
    }

    pub fn final_random_value(&self, epoch: EpochId) -> Option<RandomValue> {
        self.election.final_random_value(epoch)
    }

    pub fn revealed_nodes(&self, epoch: EpochId) -> &[NodeId] {
        self.election.revealed_nodes(epoch)
    }

    pub fn committed_nodes(&self, epoch: EpochId) -> &[NodeId] {
        self.election.committed_nodes(epoch)
    }

    // Jobs

    pub fn submit_job(
        &mut self,
        caller: &AccountId,
        pool: PoolId,
        model_name: &str,
        payload: &str,
    ) -> Result<JobId> {
        let at = self.phase_info();
        let now = self.now();
        let job = self.scheduler.submit_job(
            &at,
            caller,
            pool,
            model_name,
            payload,
            self.ledger.as_ref(),
            self.config.escrow.min_job_balance,
            now,
        )?;
        self.record(ProtocolEvent::JobSubmitted {
            job,
            submitter: caller.clone(),
            pool,
        });
        Ok(job)
    }

    /// Leader-only; requires EXECUTE of the current epoch
    pub fn start_assignment_round(&mut self, caller: &AccountId) -> Result<AssignmentReport> {
        let at = self.phase_info();
        at.require_current(Phase::Execute)?;
        let leader = self
            .election
            .validate_leader(&at, caller, self.registry.as_ref())?;

        let now = self.now();
        let report = self
            .scheduler
            .start_assignment_round(&at, &leader, self.registry.as_ref(), now)?;

        let mut events = vec![ProtocolEvent::AssignmentRoundStarted {
            epoch: at.epoch,
            leader: leader.leader,
        }];
        events.extend(report.assigned.iter().map(|a| ProtocolEvent::JobAssigned {
            job: a.job,
            node: a.node,
            epoch: a.epoch,
        }));
        self.record_all(events);
        Ok(report)
    }

    pub fn confirm_job(&mut self, caller: &AccountId, job: JobId) -> Result<()> {
        let at = self.phase_info();
        let now = self.now();
        self.scheduler
            .confirm_job(&at, job, caller, self.registry.as_ref(), now)?;
        self.record(ProtocolEvent::JobStatusChanged {
            job,
            from: JobStatus::Assigned,
            to: JobStatus::Confirmed,
        });
        Ok(())
    }

    pub fn complete_job(&mut self, caller: &AccountId, job: JobId) -> Result<()> {
        let at = self.phase_info();
        let now = self.now();
        self.scheduler
            .complete_job(&at, job, caller, self.registry.as_ref(), now)?;
        self.record(ProtocolEvent::JobStatusChanged {
            job,
            from: JobStatus::Confirmed,
            to: JobStatus::Complete,
        });
        Ok(())
    }

    pub fn reject_job(&mut self, caller: &AccountId, job: JobId, reason: &str) -> Result<()> {
        let node = self
            .scheduler
            .assigned_node(job)
            .ok_or_else(|| match self.scheduler.job(job) {
                Some(found) => LuminoError::InvalidJobStatusTransition {
                    current: found.status,
                    attempted: JobStatus::New,
                },
                None => LuminoError::JobNotFound(job),
            })?;
        let now = self.now();
        self.scheduler
            .reject_job(job, reason, caller, self.registry.as_ref(), now)?;
        self.record(ProtocolEvent::JobRejected {
            job,
            node,
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub fn process_payment(&mut self, caller: &AccountId, job: JobId) -> Result<Payment> {
        let payment = self.scheduler.process_payment(
            job,
            caller,
            self.registry.as_ref(),
            self.ledger.as_mut(),
        )?;
        self.record(payment.clone().into());
        Ok(payment)
    }

    pub fn job(&self, job: JobId) -> Option<&Job> {
        self.scheduler.job(job)
    }

    pub fn jobs_by_submitter(&self, submitter: &AccountId) -> Vec<&Job> {
        self.scheduler.jobs_by_submitter(submitter)
    }

    pub fn jobs_by_node(&self, node: NodeId) -> Vec<&Job> {
        self.scheduler.jobs_by_node(node)
    }

    pub fn assigned_node(&self, job: JobId) -> Option<NodeId> {
        self.scheduler.assigned_node(job)
    }

    /// NEW jobs waiting in `pool`
    pub fn pending_jobs(&self, pool: PoolId) -> usize {
        self.scheduler.queue().pending_count(pool)
    }

    pub fn unconfirmed_jobs(&self, epoch: EpochId) -> Vec<&Job> {
        self.scheduler.unconfirmed_jobs(epoch)
    }

    // Settlement

    /// Settle an elapsed epoch; the caller is rewarded as disputer.
    /// A repeat call fails with the benign `EpochAlreadyProcessed`.
    pub fn settle(&mut self, caller: &AccountId, epoch: EpochId) -> Result<SettlementReport> {
        let at = self.phase_info();
        let report = self.settlement.settle(
            &at,
            epoch,
            caller,
            &self.election,
            &self.scheduler,
            self.registry.as_ref(),
            self.ledger.as_mut(),
        )?;

        let mut events: Vec<ProtocolEvent> = report
            .adjustments
            .iter()
            .map(|adj| match adj.kind {
                AdjustmentKind::Reward => ProtocolEvent::RewardApplied {
                    epoch,
                    account: adj.account.clone(),
                    amount: adj.applied,
                    reason: adj.reason.clone(),
                },
                AdjustmentKind::Penalty => ProtocolEvent::PenaltyApplied {
                    epoch,
                    account: adj.account.clone(),
                    amount: adj.applied,
                    reason: adj.reason.clone(),
                },
                AdjustmentKind::Slash => ProtocolEvent::Slashed {
                    epoch,
                    account: adj.account.clone(),
                    amount: adj.applied,
                },
            })
            .collect();
        events.push(ProtocolEvent::EpochSettled {
            epoch,
            disputer: caller.clone(),
        });
        self.record_all(events);
        Ok(report)
    }

    pub fn penalty_count(&self, account: &AccountId) -> u32 {
        self.settlement.book().penalty_count(account)
    }

    pub fn is_settled(&self, epoch: EpochId) -> bool {
        self.settlement.is_processed(epoch)
    }

    // Configuration

    /// Replace the configuration; admin only.
    ///
    /// New phase durations take effect at once and open the next epoch, so
    /// an epoch number is never reused.
    pub fn update_config(&mut self, caller: &AccountId, config: ProtocolConfig) -> Result<()> {
        if !self.access.has_role(caller, Role::Admin) {
            return Err(LuminoError::NotAuthorized(caller.clone(), "requires admin role".to_string()).into());
        }
        config.validate()?;
        let now = self.now();
        let clock = self.clock.rebased(config.phases, now)?;

        if clock != self.clock {
            tracing::info!(
                from_epoch = self.clock.phase_of(now).epoch,
                to_epoch = clock.base_epoch(),
                epoch_length = clock.epoch_length(),
                "phase schedule rebased"
            );
        }
        self.clock = clock;
        self.scheduler.set_params(config.scheduler.clone());
        self.settlement.set_params(config.incentives.clone());
        self.config = config;

        tracing::info!(by = %caller, epoch_length = self.clock.epoch_length(), "config updated");
        self.record(ProtocolEvent::ConfigUpdated { by: caller.clone() });
        Ok(())
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    // Collaborators and state

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    /// Direct ledger access, standing in for external escrow deposits
    pub fn ledger_mut(&mut self) -> &mut dyn Ledger {
        self.ledger.as_mut()
    }

    pub fn registry(&self) -> &dyn NodeRegistry {
        self.registry.as_ref()
    }

    pub fn election(&self) -> &LeaderElection {
        &self.election
    }

    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    pub fn settlement(&self) -> &IncentiveSettlement {
        &self.settlement
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn status(&self) -> StatusSnapshot {
        let at = self.phase_info();
        StatusSnapshot {
            now: self.now(),
            epoch: at.epoch,
            phase: at.phase,
            time_left: at.time_left,
            leader: self.election.election_result(at.epoch).map(|r| r.leader),
            committed_nodes: self.election.committed_nodes(at.epoch).len(),
            revealed_nodes: self.election.revealed_nodes(at.epoch).len(),
            total_jobs: self.scheduler.queue().len(),
            last_settled_epoch: self.settlement.processed_epochs().last(),
            event_count: self.events.len(),
            head_hash: self.events.head_hash().to_string(),
        }
    }
}
