use lumino_clock::PhaseDurations;
use lumino_coordinator::ProtocolConfig;
use lumino_incentives::CounterAfterSlash;
use lumino_types::EpochId;
use serde::{Deserialize, Serialize};

use crate::agent::Behavior;

/// One simulated node operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub behavior: Behavior,
    pub compute_rating: u64,
    /// Starting escrow, in whole units
    pub initial_balance: u64,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, behavior: Behavior) -> Self {
        AgentSpec {
            name: name.into(),
            behavior,
            compute_rating: 1,
            initial_balance: 100,
        }
    }
}

/// Scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub description: String,

    /// First simulated epoch
    pub start_epoch: EpochId,

    /// Number of epochs to simulate
    pub num_epochs: u64,

    pub agents: Vec<AgentSpec>,

    /// Jobs the client submits at the start of every epoch
    pub jobs_per_epoch: usize,

    pub protocol: ProtocolConfig,

    /// Expected outcomes for validation
    pub expected_outcomes: Option<ExpectedOutcomes>,
}

/// Expected outcomes for scenario validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedOutcomes {
    /// Min epochs that elected a leader
    pub min_elected_epochs: Option<usize>,

    /// Max penalties across the run
    pub max_penalties: Option<usize>,

    /// Min penalties across the run
    pub min_penalties: Option<usize>,

    /// Min slashes across the run
    pub min_slashes: Option<usize>,
}

fn sim_protocol() -> ProtocolConfig {
    let mut protocol = ProtocolConfig {
        phases: PhaseDurations::uniform(10),
        ..ProtocolConfig::default()
    };
    protocol.incentives.max_penalties_before_slash = 3;
    protocol.incentives.counter_after_slash = CounterAfterSlash::Reset;
    protocol
}

fn agents(count: usize, behavior: Behavior) -> Vec<AgentSpec> {
    (1..=count)
        .map(|i| AgentSpec::new(format!("operator-{}", i), behavior))
        .collect()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            name: "default".to_string(),
            description: "Three honest operators".to_string(),
            start_epoch: 1,
            num_epochs: 3,
            agents: agents(3, Behavior::Honest),
            jobs_per_epoch: 2,
            protocol: sim_protocol(),
            expected_outcomes: None,
        }
    }
}

/// Scenario for simulation
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: ScenarioConfig,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Scenario { config }
    }

    pub fn default_scenario() -> Self {
        Scenario::new(ScenarioConfig::default())
    }

    /// Every operator follows the protocol; nobody is penalized
    pub fn honest_network() -> Self {
        Self::new(ScenarioConfig {
            name: "honest_network".to_string(),
            description: "All operators commit, reveal, assign and confirm".to_string(),
            num_epochs: 5,
            jobs_per_epoch: 3,
            expected_outcomes: Some(ExpectedOutcomes {
                min_elected_epochs: Some(5),
                max_penalties: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// Elected leaders never run the assignment round
    pub fn lazy_leaders() -> Self {
        Self::new(ScenarioConfig {
            name: "lazy_leaders".to_string(),
            description: "Every operator skips the assignment round when elected".to_string(),
            num_epochs: 4,
            agents: agents(2, Behavior::LazyLeader),
            jobs_per_epoch: 1,
            expected_outcomes: Some(ExpectedOutcomes {
                min_elected_epochs: Some(4),
                min_penalties: Some(4),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// One operator commits but never reveals and so is never elected
    pub fn withheld_reveals() -> Self {
        let mut agents = agents(2, Behavior::Honest);
        agents.push(AgentSpec::new("withholder", Behavior::WithholdReveal));
        Self::new(ScenarioConfig {
            name: "withheld_reveals".to_string(),
            description: "A withholding operator is excluded from election and availability rewards"
                .to_string(),
            num_epochs: 6,
            agents,
            jobs_per_epoch: 0,
            expected_outcomes: Some(ExpectedOutcomes {
                min_elected_epochs: Some(6),
                max_penalties: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// Workers accept jobs but never confirm them, until slashed
    pub fn unreliable_workers() -> Self {
        let mut agents = vec![AgentSpec::new("operator-1", Behavior::NeverConfirm)];
        agents.push(AgentSpec::new("operator-2", Behavior::NeverConfirm));
        Self::new(ScenarioConfig {
            name: "unreliable_workers".to_string(),
            description: "Assigned jobs are never confirmed, driving penalties into a slash"
                .to_string(),
            num_epochs: 3,
            agents,
            jobs_per_epoch: 2,
            expected_outcomes: Some(ExpectedOutcomes {
                min_elected_epochs: Some(3),
                min_penalties: Some(6),
                min_slashes: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// Look up a preset by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default_scenario()),
            "honest" | "honest_network" => Some(Self::honest_network()),
            "lazy" | "lazy_leaders" => Some(Self::lazy_leaders()),
            "withheld" | "withheld_reveals" => Some(Self::withheld_reveals()),
            "unreliable" | "unreliable_workers" => Some(Self::unreliable_workers()),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::honest_network(),
            Self::lazy_leaders(),
            Self::withheld_reveals(),
            Self::unreliable_workers(),
        ]
    }
}
