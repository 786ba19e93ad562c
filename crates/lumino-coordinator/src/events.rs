use lumino_jobs::Payment;
use lumino_leader::{CommitmentHash, RandomValue};
use lumino_types::{AccountId, Amount, EpochId, JobId, JobStatus, NodeId, PoolId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hash of the empty log
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A state change applied by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolEvent {
    NodeRegistered {
        node: NodeId,
        owner: AccountId,
        pool: PoolId,
        compute_rating: u64,
    },
    NodeUnregistered {
        node: NodeId,
    },
    CommitmentSubmitted {
        epoch: EpochId,
        node: NodeId,
        hash: CommitmentHash,
    },
    NodeLive {
        epoch: EpochId,
        node: NodeId,
    },
    SecretRevealed {
        epoch: EpochId,
        node: NodeId,
    },
    LeaderElected {
        epoch: EpochId,
        leader: NodeId,
        random_value: RandomValue,
    },
    AssignmentRoundStarted {
        epoch: EpochId,
        leader: NodeId,
    },
    JobSubmitted {
        job: JobId,
        submitter: AccountId,
        pool: PoolId,
    },
    JobAssigned {
        job: JobId,
        node: NodeId,
        epoch: EpochId,
    },
    JobStatusChanged {
        job: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    JobRejected {
        job: JobId,
        node: NodeId,
        reason: String,
    },
    JobPaid {
        job: JobId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    RewardApplied {
        epoch: EpochId,
        account: AccountId,
        amount: Amount,
        reason: String,
    },
    PenaltyApplied {
        epoch: EpochId,
        account: AccountId,
        amount: Amount,
        reason: String,
    },
    Slashed {
        epoch: EpochId,
        account: AccountId,
        amount: Amount,
    },
    EpochSettled {
        epoch: EpochId,
        disputer: AccountId,
    },
    ConfigUpdated {
        by: AccountId,
    },
}

impl From<Payment> for ProtocolEvent {
    fn from(payment: Payment) -> Self {
        ProtocolEvent::JobPaid {
            job: payment.job,
            from: payment.from,
            to: payment.to,
            amount: payment.amount,
        }
    }
}

/// One entry of the log, chained to its predecessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: u64,
    pub event: ProtocolEvent,
    pub prev_hash: String,
    pub hash: String,
}

/// Append-only, hash-chained record of every applied mutation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl ProtocolEvent {
    /// JSON bytes of the event. Every field has a derived impl and string
    /// keys, so encoding does not fail; the Debug form keeps this total.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| format!("{:?}", self).into_bytes())
    }
}

/// sha256(prev_hash || json(event)), hex-encoded
pub fn chain_hash(prev_hash: &str, event: &ProtocolEvent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(event.encode());
    hex::encode(hasher.finalize())
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: ProtocolEvent, timestamp: u64) -> &EventRecord {
        let prev_hash = self.head_hash().to_string();
        let hash = chain_hash(&prev_hash, &event);
        let seq = self.records.len() as u64;
        self.records.push(EventRecord {
            seq,
            timestamp,
            event,
            prev_hash,
            hash,
        });
        &self.records[self.records.len() - 1]
    }

    pub fn head_hash(&self) -> &str {
        self.records
            .last()
            .map(|record| record.hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records from `seq` onwards
    pub fn since(&self, seq: u64) -> &[EventRecord] {
        let start = (seq as usize).min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute the chain and check every link
    pub fn verify(&self) -> bool {
        let mut prev = GENESIS_HASH.to_string();
        for (i, record) in self.records.iter().enumerate() {
            if record.seq != i as u64 || record.prev_hash != prev {
                return false;
            }
            let hash = chain_hash(&prev, &record.event);
            if hash != record.hash {
                return false;
            }
            prev = hash;
        }
        true
    }
}
