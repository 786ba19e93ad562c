use lumino_types::{AccountId, Amount, EpochId, JobId, JobStatus, LuminoError, NodeId, PoolId, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub submitter: AccountId,
    pub pool: PoolId,
    pub model_name: String,
    /// Opaque job arguments, never interpreted by the protocol
    pub payload: String,
    pub status: JobStatus,
    pub assigned_node: Option<NodeId>,
    /// Epoch of the most recent assignment
    pub assigned_epoch: Option<EpochId>,
    pub created_at: u64,
    pub created_epoch: EpochId,
    pub updated_at: u64,
    pub reject_reason: Option<String>,
    /// Fee charged once the job is paid
    pub fee: Option<Amount>,
}

impl Job {
    pub fn new(
        id: JobId,
        submitter: AccountId,
        pool: PoolId,
        model_name: String,
        payload: String,
        created_at: u64,
        created_epoch: EpochId,
    ) -> Self {
        Self {
            id,
            submitter,
            pool,
            model_name,
            payload,
            status: JobStatus::New,
            assigned_node: None,
            assigned_epoch: None,
            created_at,
            created_epoch,
            updated_at: created_at,
            reject_reason: None,
            fee: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.fee.is_some()
    }

    /// Fail unless the state machine allows `self.status -> next`
    pub fn check_transition(&self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(LuminoError::InvalidJobStatusTransition {
                current: self.status,
                attempted: next,
            });
        }
        Ok(())
    }

    pub(crate) fn transition(&mut self, next: JobStatus, now: u64) -> Result<()> {
        self.check_transition(next)?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}
