use serde::{Deserialize, Serialize};
use std::fmt;

/// Job lifecycle status. A rejected job returns to `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    New,
    Assigned,
    Confirmed,
    Complete,
}

impl JobStatus {
    /// Whether the state machine allows moving from `self` to `next`
    pub const fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::New, JobStatus::Assigned)
                | (JobStatus::Assigned, JobStatus::Confirmed)
                | (JobStatus::Assigned, JobStatus::New)
                | (JobStatus::Confirmed, JobStatus::Complete)
        )
    }

    /// Job occupies a slot on its assigned node
    pub const fn is_active(&self) -> bool {
        matches!(self, JobStatus::Assigned | JobStatus::Confirmed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::New => write!(f, "NEW"),
            JobStatus::Assigned => write!(f, "ASSIGNED"),
            JobStatus::Confirmed => write!(f, "CONFIRMED"),
            JobStatus::Complete => write!(f, "COMPLETE"),
        }
    }
}
