use lumino_clock::PhaseInfo;
use lumino_ledger::{NodeRegistry, Whitelist};
use lumino_types::{AccountId, EpochId, LuminoError, NodeId, Phase, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::commitment::{verify_commitment, CommitmentHash};
use crate::randomness::RandomValue;

/// Outcome of the election for one epoch. Fixed once computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResult {
    pub epoch: EpochId,
    pub random_value: RandomValue,
    pub leader: NodeId,
    /// Size of the revealed set the leader was drawn from
    pub candidates: usize,
}

#[derive(Debug, Clone)]
struct CommitRecord {
    hash: CommitmentHash,
    committed_at: u64,
}

/// Commit/reveal/result namespace of a single epoch
#[derive(Debug, Clone, Default)]
struct EpochRound {
    commits: BTreeMap<NodeId, CommitRecord>,
    /// Nodes in commitment order; doubles as the epoch's liveness record
    committed: Vec<NodeId>,
    secrets: BTreeMap<NodeId, Vec<u8>>,
    /// Nodes in reveal order
    revealed: Vec<NodeId>,
    result: Option<ElectionResult>,
}

/// Per-epoch commit -> reveal -> elect state machine
#[derive(Debug, Clone, Default)]
pub struct LeaderElection {
    rounds: BTreeMap<EpochId, EpochRound>,
}

impl LeaderElection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `node` to a secret for `epoch`. Requires COMMIT of `epoch`,
    /// an active node owned by a whitelisted `caller`, and no prior commitment.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_commitment(
        &mut self,
        at: &PhaseInfo,
        epoch: EpochId,
        node: NodeId,
        hash: CommitmentHash,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
        whitelist: &dyn Whitelist,
        now: u64,
    ) -> Result<()> {
        at.require(epoch, Phase::Commit)?;
        registry.require_owner(node, caller)?;
        if !whitelist.is_eligible(caller) {
            return Err(LuminoError::NotWhitelisted(caller.clone()));
        }
        if !registry.is_active(node) {
            return Err(LuminoError::NodeNotActive(node));
        }

        let round = self.rounds.entry(epoch).or_default();
        if round.commits.contains_key(&node) {
            return Err(LuminoError::AlreadyCommitted { epoch, node });
        }

        round.commits.insert(
            node,
            CommitRecord {
                hash,
                committed_at: now,
            },
        );
        round.committed.push(node);

        tracing::info!(epoch, node_id = node.get(), "commitment submitted");
        Ok(())
    }

    /// Disclose the secret behind `node`'s commitment. Requires REVEAL of `epoch`.
    pub fn reveal_secret(
        &mut self,
        at: &PhaseInfo,
        epoch: EpochId,
        node: NodeId,
        secret: &[u8],
        caller: &AccountId,
        registry: &dyn NodeRegistry,
    ) -> Result<()> {
        at.require(epoch, Phase::Reveal)?;
        registry.require_owner(node, caller)?;

        let round = self
            .rounds
            .get_mut(&epoch)
            .ok_or(LuminoError::NoCommitmentFound { epoch, node })?;
        let record = round
            .commits
            .get(&node)
            .ok_or(LuminoError::NoCommitmentFound { epoch, node })?;

        if round.secrets.contains_key(&node) {
            return Err(LuminoError::AlreadyRevealed { epoch, node });
        }
        if !verify_commitment(&record.hash, secret) {
            return Err(LuminoError::InvalidSecret { node });
        }

        round.secrets.insert(node, secret.to_vec());
        round.revealed.push(node);

        tracing::info!(epoch, node_id = node.get(), revealed = round.revealed.len(), "secret revealed");
        Ok(())
    }

    /// Elect the leader of the current epoch. Requires ELECT; computed on the
    /// first call and returned unchanged afterwards.
    pub fn elect_leader(&mut self, at: &PhaseInfo) -> Result<ElectionResult> {
        at.require_current(Phase::Elect)?;
        let epoch = at.epoch;

        let round = self
            .rounds
            .get_mut(&epoch)
            .ok_or(LuminoError::NoRevealsSubmitted(epoch))?;

        if let Some(result) = &round.result {
            return Ok(result.clone());
        }
        if round.revealed.is_empty() {
            return Err(LuminoError::NoRevealsSubmitted(epoch));
        }

        let random_value = RandomValue::from_reveals(
            round
                .revealed
                .iter()
                .filter_map(|node| round.secrets.get(node))
                .map(|secret| secret.as_slice()),
        );
        let index = random_value.reduce(round.revealed.len());
        let result = ElectionResult {
            epoch,
            random_value,
            leader: round.revealed[index],
            candidates: round.revealed.len(),
        };
        round.result = Some(result.clone());

        tracing::info!(
            epoch,
            leader = result.leader.get(),
            candidates = result.candidates,
            random = %result.random_value,
            "leader elected"
        );
        Ok(result)
    }

    /// Resolve the current epoch's result and check that `caller` owns the leader node
    pub fn validate_leader(
        &self,
        at: &PhaseInfo,
        caller: &AccountId,
        registry: &dyn NodeRegistry,
    ) -> Result<ElectionResult> {
        let result = self
            .election_result(at.epoch)
            .ok_or(LuminoError::NoElectionResult(at.epoch))?;

        match registry.owner_of(result.leader) {
            Some(owner) if &owner == caller => Ok(result.clone()),
            _ => Err(LuminoError::NotCurrentLeader {
                caller: caller.clone(),
                leader: result.leader,
            }),
        }
    }

    pub fn election_result(&self, epoch: EpochId) -> Option<&ElectionResult> {
        self.rounds.get(&epoch).and_then(|round| round.result.as_ref())
    }

    pub fn final_random_value(&self, epoch: EpochId) -> Option<RandomValue> {
        self.election_result(epoch).map(|result| result.random_value)
    }

    /// Nodes with a valid reveal, in reveal order
    pub fn revealed_nodes(&self, epoch: EpochId) -> &[NodeId] {
        self.rounds
            .get(&epoch)
            .map(|round| round.revealed.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes that committed (and so reported liveness), in commitment order
    pub fn committed_nodes(&self, epoch: EpochId) -> &[NodeId] {
        self.rounds
            .get(&epoch)
            .map(|round| round.committed.as_slice())
            .unwrap_or(&[])
    }

    pub fn commitment(&self, epoch: EpochId, node: NodeId) -> Option<&CommitmentHash> {
        self.rounds
            .get(&epoch)
            .and_then(|round| round.commits.get(&node))
            .map(|record| &record.hash)
    }

    pub fn committed_at(&self, epoch: EpochId, node: NodeId) -> Option<u64> {
        self.rounds
            .get(&epoch)
            .and_then(|round| round.commits.get(&node))
            .map(|record| record.committed_at)
    }

    pub fn has_revealed(&self, epoch: EpochId, node: NodeId) -> bool {
        self.rounds
            .get(&epoch)
            .map(|round| round.secrets.contains_key(&node))
            .unwrap_or(false)
    }
}
