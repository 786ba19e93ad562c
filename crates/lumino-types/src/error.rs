use thiserror::Error;

use crate::{AccountId, EpochId, JobId, JobStatus, NodeId, Phase, PoolId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LuminoError {
    #[error("Invalid phase: expected {expected} of epoch {expected_epoch}, now {actual} of epoch {actual_epoch}")]
    InvalidPhase {
        expected: Phase,
        expected_epoch: EpochId,
        actual: Phase,
        actual_epoch: EpochId,
    },

    #[error("Commitment already submitted for epoch {epoch}, {node}")]
    AlreadyCommitted { epoch: EpochId, node: NodeId },

    #[error("Secret already revealed for epoch {epoch}, {node}")]
    AlreadyRevealed { epoch: EpochId, node: NodeId },

    #[error("No commitment found for epoch {epoch}, {node}")]
    NoCommitmentFound { epoch: EpochId, node: NodeId },

    #[error("Invalid secret revealed for {node}")]
    InvalidSecret { node: NodeId },

    #[error("No secrets revealed for epoch {0}")]
    NoRevealsSubmitted(EpochId),

    #[error("No leader elected for epoch {0}")]
    NoElectionResult(EpochId),

    #[error("Account {caller} is not the current leader (leader is {leader})")]
    NotCurrentLeader { caller: AccountId, leader: NodeId },

    #[error("Account {0} is not authorized: {1}")]
    NotAuthorized(AccountId, String),

    #[error("Invalid job status transition from {current} to {attempted}")]
    InvalidJobStatusTransition {
        current: JobStatus,
        attempted: JobStatus,
    },

    #[error("No eligible node in {pool} for {job}")]
    InsufficientEligibleCapacity { job: JobId, pool: PoolId },

    #[error("Epoch incentives already processed for epoch {0}")]
    EpochAlreadyProcessed(EpochId),

    #[error("Account {0} is not whitelisted")]
    NotWhitelisted(AccountId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node is not active: {0}")]
    NodeNotActive(NodeId),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job {0} is not complete")]
    JobNotComplete(JobId),

    #[error("Job {0} has already been paid")]
    JobAlreadyPaid(JobId),

    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        required: String,
        available: String,
    },

    #[error("Insufficient stake for {account} with compute rating {compute_rating}")]
    InsufficientStake {
        account: AccountId,
        compute_rating: u64,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid commitment: {0}")]
    InvalidCommitment(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LuminoError {
    /// Failure that carries no reason to retry: the work was already done.
    pub fn is_benign(&self) -> bool {
        matches!(self, LuminoError::EpochAlreadyProcessed(_))
    }
}

pub type Result<T> = std::result::Result<T, LuminoError>;
