use lumino_clock::PhaseDurations;
use lumino_incentives::IncentiveParams;
use lumino_jobs::SchedulerParams;
use lumino_types::{Amount, LuminoError};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Escrow requirements enforced by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowParams {
    /// Balance a submitter must hold to submit a job
    pub min_job_balance: Amount,
    /// Stake required per unit of a node's compute rating
    pub stake_per_compute_unit: Amount,
}

impl Default for EscrowParams {
    fn default() -> Self {
        Self {
            min_job_balance: Amount::from_units(1),
            stake_per_compute_unit: Amount::from_units(10),
        }
    }
}

/// Full protocol configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Seconds per phase
    #[serde(default)]
    pub phases: PhaseDurations,

    #[serde(default)]
    pub incentives: IncentiveParams,

    #[serde(default)]
    pub scheduler: SchedulerParams,

    #[serde(default)]
    pub escrow: EscrowParams,
}

impl ProtocolConfig {
    /// Load and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ProtocolConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> lumino_types::Result<()> {
        self.phases.validate()?;
        self.incentives.validate()?;
        if self.scheduler.max_jobs_per_node == 0 {
            return Err(LuminoError::Config(
                "max_jobs_per_node must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
