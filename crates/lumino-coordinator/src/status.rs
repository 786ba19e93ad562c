use lumino_types::{EpochId, NodeId, Phase};
use serde::{Deserialize, Serialize};

/// Consistent read-only view published after every applied command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub now: u64,
    pub epoch: EpochId,
    pub phase: Phase,
    pub time_left: u64,
    /// Leader of `epoch`, once elected
    pub leader: Option<NodeId>,
    pub committed_nodes: usize,
    pub revealed_nodes: usize,
    pub total_jobs: usize,
    pub last_settled_epoch: Option<EpochId>,
    pub event_count: usize,
    pub head_hash: String,
}
