use lumino_clock::ManualTime;
use lumino_coordinator::{Collaborators, Coordinator, Result};
use lumino_incentives::AdjustmentKind;
use lumino_ledger::{Ledger, MemoryAccess, MemoryLedger, MemoryRegistry, MemoryWhitelist};
use lumino_types::{AccountId, Amount, EpochId, LuminoError, NodeId, Phase, PoolId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agent::NodeAgent;
use crate::scenario::Scenario;

const POOL: PoolId = PoolId(1);
const CLIENT_BALANCE: u64 = 1_000;

/// Result of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimResult {
    pub scenario_name: String,
    pub epochs: Vec<EpochResult>,
    pub summary: SimSummary,
}

/// Result of a single epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochResult {
    pub epoch: EpochId,
    pub leader: Option<NodeId>,
    pub revealed: usize,
    pub assigned: usize,
    pub completed: usize,
    /// Jobs still waiting for a node when the epoch closed
    pub backlog: usize,
    pub penalties: Vec<(AccountId, Amount)>,
    pub slashed: Vec<AccountId>,
}

/// Summary across all epochs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSummary {
    pub total_epochs: usize,
    pub elected_epochs: usize,
    pub total_penalties: usize,
    pub total_slashes: usize,
    pub final_balances: BTreeMap<AccountId, Amount>,
    pub penalty_counters: BTreeMap<AccountId, u32>,
    pub event_count: usize,
    pub log_verified: bool,
    pub passed: bool,
    pub failure_reasons: Vec<String>,
}

/// Drives a scenario's agents through a coordinator on manual time
#[derive(Debug, Default)]
pub struct SimRunner;

impl SimRunner {
    pub fn new() -> Self {
        SimRunner
    }

    /// Run a scenario and collect per-epoch outcomes
    pub fn run_scenario(&self, scenario: &Scenario) -> Result<SimResult> {
        let config = &scenario.config;
        let time = ManualTime::new(0);
        let client = AccountId::new("client");
        let disputer = AccountId::new("disputer");

        let mut ledger = MemoryLedger::new();
        let mut whitelist = MemoryWhitelist::new();
        for spec in &config.agents {
            let account = AccountId::new(spec.name.clone());
            ledger.deposit(&account, Amount::from_units(spec.initial_balance))?;
            whitelist.add(account);
        }
        ledger.deposit(&client, Amount::from_units(CLIENT_BALANCE))?;

        let mut coordinator = Coordinator::new(
            config.protocol.clone(),
            Collaborators {
                time: Box::new(time.clone()),
                ledger: Box::new(ledger),
                registry: Box::new(MemoryRegistry::new()),
                whitelist: Box::new(whitelist),
                access: Box::new(MemoryAccess::new()),
            },
        )?;

        let mut agents = Vec::new();
        for spec in &config.agents {
            let account = AccountId::new(spec.name.clone());
            let node = coordinator.register_node(&account, POOL, spec.compute_rating)?;
            agents.push(NodeAgent::new(account, node, spec.behavior));
        }

        tracing::info!(
            scenario = %config.name,
            agents = agents.len(),
            epochs = config.num_epochs,
            "simulation started"
        );

        let mut epochs = Vec::new();
        for epoch in config.start_epoch..config.start_epoch + config.num_epochs {
            let result = self.run_epoch(
                &mut coordinator,
                &time,
                &agents,
                epoch,
                scenario,
                &client,
                &disputer,
            )?;
            epochs.push(result);
        }

        let summary = self.calculate_summary(scenario, &coordinator, &epochs);
        Ok(SimResult {
            scenario_name: config.name.clone(),
            epochs,
            summary,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_epoch(
        &self,
        coordinator: &mut Coordinator,
        time: &ManualTime,
        agents: &[NodeAgent],
        epoch: EpochId,
        scenario: &Scenario,
        client: &AccountId,
        disputer: &AccountId,
    ) -> Result<EpochResult> {
        let clock = *coordinator.clock();
        let goto = |phase: Phase| time.set(clock.phase_start(epoch, phase));

        goto(Phase::Commit);
        for _ in 0..scenario.config.jobs_per_epoch {
            coordinator.submit_job(client, POOL, "llm-7b", &format!("{{\"epoch\":{}}}", epoch))?;
        }
        for agent in agents {
            agent.on_commit(coordinator, epoch)?;
        }

        goto(Phase::Reveal);
        let mut revealed = 0;
        for agent in agents {
            if agent.on_reveal(coordinator, epoch)? {
                revealed += 1;
            }
        }

        goto(Phase::Elect);
        let leader = match coordinator.elect_leader() {
            Ok(result) => Some(result.leader),
            Err(err) if err.protocol() == Some(&LuminoError::NoRevealsSubmitted(epoch)) => {
                tracing::warn!(epoch, "no reveals, epoch has no leader");
                None
            }
            Err(err) => return Err(err),
        };

        goto(Phase::Execute);
        let mut assigned = 0;
        for agent in agents {
            if let Some(count) = agent.on_execute(coordinator)? {
                assigned += count;
            }
        }

        goto(Phase::Confirm);
        let mut completed = Vec::new();
        for agent in agents {
            completed.extend(agent.on_confirm(coordinator, epoch)?);
        }
        for job in &completed {
            coordinator.process_payment(client, *job)?;
        }

        goto(Phase::Dispute);
        let report = coordinator.settle(disputer, epoch)?;

        Ok(EpochResult {
            epoch,
            leader,
            revealed,
            assigned,
            completed: completed.len(),
            backlog: coordinator.pending_jobs(POOL),
            penalties: report
                .penalties()
                .map(|adj| (adj.account.clone(), adj.applied))
                .collect(),
            slashed: report.slashed().into_iter().cloned().collect(),
        })
    }

    /// Calculate summary statistics
    fn calculate_summary(
        &self,
        scenario: &Scenario,
        coordinator: &Coordinator,
        epochs: &[EpochResult],
    ) -> SimSummary {
        let ledger = coordinator.ledger();
        let final_balances: BTreeMap<AccountId, Amount> = ledger
            .list_accounts()
            .into_iter()
            .map(|account| {
                let balance = ledger.balance_of(&account);
                (account, balance)
            })
            .collect();
        let penalty_counters = final_balances
            .keys()
            .map(|account| (account.clone(), coordinator.penalty_count(account)))
            .filter(|(_, count)| *count > 0)
            .collect();

        let elected_epochs = epochs.iter().filter(|e| e.leader.is_some()).count();
        let total_penalties = epochs.iter().map(|e| e.penalties.len()).sum();
        let total_slashes = coordinator
            .settlement()
            .book()
            .history()
            .iter()
            .filter(|adj| adj.kind == AdjustmentKind::Slash)
            .count();

        // Check expected outcomes
        let mut failure_reasons = Vec::new();
        if let Some(expected) = &scenario.config.expected_outcomes {
            if let Some(min) = expected.min_elected_epochs {
                if elected_epochs < min {
                    failure_reasons.push(format!("Elected epochs {} < expected {}", elected_epochs, min));
                }
            }
            if let Some(max) = expected.max_penalties {
                if total_penalties > max {
                    failure_reasons.push(format!("Penalties {} > expected {}", total_penalties, max));
                }
            }
            if let Some(min) = expected.min_penalties {
                if total_penalties < min {
                    failure_reasons.push(format!("Penalties {} < expected {}", total_penalties, min));
                }
            }
            if let Some(min) = expected.min_slashes {
                if total_slashes < min {
                    failure_reasons.push(format!("Slashes {} < expected {}", total_slashes, min));
                }
            }
        }

        let log_verified = coordinator.events().verify();
        if !log_verified {
            failure_reasons.push("Event log failed verification".to_string());
        }

        SimSummary {
            total_epochs: epochs.len(),
            elected_epochs,
            total_penalties,
            total_slashes,
            final_balances,
            penalty_counters,
            event_count: coordinator.events().len(),
            log_verified,
            passed: failure_reasons.is_empty(),
            failure_reasons,
        }
    }
}
