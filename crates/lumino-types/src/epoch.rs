use serde::{Deserialize, Serialize};
use std::fmt;

/// Epoch identifier, derived from wall-clock time
pub type EpochId = u64;

/// Phase within an epoch. Phases are visited in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Nodes submit hashed secrets
    Commit,
    /// Nodes disclose secrets matching their commitments
    Reveal,
    /// Leader is derived from the revealed secrets
    Elect,
    /// Leader assigns pending jobs
    Execute,
    /// Assigned nodes confirm and complete jobs
    Confirm,
    /// Epoch outcome can be settled
    Dispute,
}

impl Phase {
    /// All phases in epoch order
    pub const ALL: [Phase; 6] = [
        Phase::Commit,
        Phase::Reveal,
        Phase::Elect,
        Phase::Execute,
        Phase::Confirm,
        Phase::Dispute,
    ];

    pub const fn index(&self) -> usize {
        match self {
            Phase::Commit => 0,
            Phase::Reveal => 1,
            Phase::Elect => 2,
            Phase::Execute => 3,
            Phase::Confirm => 4,
            Phase::Dispute => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Phase> {
        Phase::ALL.get(index).copied()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Commit => "COMMIT",
            Phase::Reveal => "REVEAL",
            Phase::Elect => "ELECT",
            Phase::Execute => "EXECUTE",
            Phase::Confirm => "CONFIRM",
            Phase::Dispute => "DISPUTE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
