mod commitment;
mod randomness;
mod election;

pub use commitment::{compute_commitment, verify_commitment, CommitmentHash};
pub use randomness::RandomValue;
pub use election::{ElectionResult, LeaderElection};
