use lumino_types::{Amount, LuminoError, Result};
use serde::{Deserialize, Serialize};

/// What happens to an account's penalty counter once it has been slashed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterAfterSlash {
    /// Start counting from zero again
    #[default]
    Reset,
    /// Keep accumulating; every further penalty slashes again
    Keep,
}

/// Reward and penalty amounts applied by settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveParams {
    pub leader_reward: Amount,
    pub job_availability_reward: Amount,
    pub disputer_reward: Amount,
    pub leader_not_executed_penalty: Amount,
    pub job_not_confirmed_penalty: Amount,
    pub max_penalties_before_slash: u32,
    #[serde(default)]
    pub counter_after_slash: CounterAfterSlash,
}

impl Default for IncentiveParams {
    fn default() -> Self {
        IncentiveParams {
            leader_reward: Amount::from_units(5),
            job_availability_reward: Amount::from_units(1),
            disputer_reward: Amount::from_units(1),
            leader_not_executed_penalty: Amount::from_units(15),
            job_not_confirmed_penalty: Amount::from_units(10),
            max_penalties_before_slash: 5,
            counter_after_slash: CounterAfterSlash::Reset,
        }
    }
}

impl IncentiveParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_penalties_before_slash == 0 {
            return Err(LuminoError::Config(
                "max_penalties_before_slash must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
