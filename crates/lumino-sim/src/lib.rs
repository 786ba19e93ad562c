mod agent;
mod runner;
mod scenario;

pub use agent::{Behavior, NodeAgent};
pub use runner::{EpochResult, SimResult, SimRunner, SimSummary};
pub use scenario::{AgentSpec, ExpectedOutcomes, Scenario, ScenarioConfig};
