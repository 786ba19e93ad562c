#![allow(dead_code)]

use lumino_clock::{ManualTime, PhaseDurations};
use lumino_coordinator::{Collaborators, Coordinator, ProtocolConfig};
use lumino_incentives::{CounterAfterSlash, IncentiveParams};
use lumino_leader::compute_commitment;
use lumino_ledger::{MemoryAccess, MemoryLedger, MemoryRegistry, MemoryWhitelist, NodeRegistry};
use lumino_types::{AccountId, Amount, EpochId, NodeId, Phase, PoolId};

pub const POOL: PoolId = PoolId(1);

pub fn units(n: u64) -> Amount {
    Amount::from_units(n)
}

pub fn test_config() -> ProtocolConfig {
    ProtocolConfig {
        phases: PhaseDurations::uniform(10),
        incentives: IncentiveParams {
            leader_reward: units(5),
            job_availability_reward: units(1),
            disputer_reward: units(2),
            leader_not_executed_penalty: units(15),
            job_not_confirmed_penalty: units(10),
            max_penalties_before_slash: 3,
            counter_after_slash: CounterAfterSlash::Reset,
        },
        ..ProtocolConfig::default()
    }
}

pub struct Harness {
    pub time: ManualTime,
    pub coordinator: Coordinator,
    pub owners: Vec<AccountId>,
    pub nodes: Vec<NodeId>,
    pub user: AccountId,
    pub admin: AccountId,
    pub disputer: AccountId,
}

/// `node_count` whitelisted owners with 100 units each, one node apiece in POOL
pub fn harness(node_count: usize) -> Harness {
    harness_with(node_count, test_config())
}

pub fn harness_with(node_count: usize, config: ProtocolConfig) -> Harness {
    let owners: Vec<AccountId> = (1..=node_count)
        .map(|i| AccountId::new(format!("cp{}", i)))
        .collect();
    let user = AccountId::new("user");
    let admin = AccountId::new("admin");

    let mut ledger = MemoryLedger::new();
    let mut whitelist = MemoryWhitelist::new();
    for owner in &owners {
        ledger.deposit(owner, units(100)).unwrap();
        whitelist.add(owner.clone());
    }
    ledger.deposit(&user, units(100)).unwrap();

    let time = ManualTime::new(0);
    let mut coordinator = Coordinator::new(
        config,
        Collaborators {
            time: Box::new(time.clone()),
            ledger: Box::new(ledger),
            registry: Box::new(MemoryRegistry::new()),
            whitelist: Box::new(whitelist),
            access: Box::new(MemoryAccess::with_admin(admin.clone())),
        },
    )
    .unwrap();

    let nodes = owners
        .iter()
        .map(|owner| coordinator.register_node(owner, POOL, 1).unwrap())
        .collect();

    Harness {
        time,
        coordinator,
        owners,
        nodes,
        user,
        admin,
        disputer: AccountId::new("disputer"),
    }
}

pub fn secret(epoch: EpochId, i: usize) -> Vec<u8> {
    format!("secret-{}-{}", epoch, i).into_bytes()
}

impl Harness {
    /// Jump to the start of `phase` under the coordinator's current schedule
    pub fn goto(&self, epoch: EpochId, phase: Phase) {
        self.time.set(self.coordinator.clock().phase_start(epoch, phase));
    }

    pub fn commit(&mut self, epoch: EpochId, i: usize, secret: &[u8]) {
        self.goto(epoch, Phase::Commit);
        self.coordinator
            .submit_commitment(&self.owners[i], epoch, self.nodes[i], compute_commitment(secret))
            .unwrap();
    }

    pub fn reveal(&mut self, epoch: EpochId, i: usize, secret: &[u8]) {
        self.goto(epoch, Phase::Reveal);
        self.coordinator
            .reveal_secret(&self.owners[i], epoch, self.nodes[i], secret)
            .unwrap();
    }

    /// All nodes commit, `revealers` reveal, leader elected. Returns the leader.
    pub fn run_election(&mut self, epoch: EpochId, revealers: &[usize]) -> NodeId {
        for i in 0..self.nodes.len() {
            self.commit(epoch, i, &secret(epoch, i));
        }
        for &i in revealers {
            self.reveal(epoch, i, &secret(epoch, i));
        }
        self.goto(epoch, Phase::Elect);
        self.coordinator.elect_leader().unwrap().leader
    }

    pub fn owner_of(&self, node: NodeId) -> AccountId {
        self.coordinator.registry().owner_of(node).unwrap()
    }

    pub fn index_of(&self, node: NodeId) -> usize {
        self.nodes.iter().position(|n| *n == node).unwrap()
    }

    pub fn balance(&self, account: &AccountId) -> Amount {
        self.coordinator.balance_of(account)
    }
}
