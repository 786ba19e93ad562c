use lumino_types::{AccountId, EpochId, JobId, NodeId, PoolId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::job::Job;

/// Job storage plus the indices the scheduler maintains over it.
/// Jobs are never removed; completed jobs stay queryable.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    jobs: BTreeMap<JobId, Job>,
    next_id: u64,
    /// NEW jobs waiting for assignment, per pool, in arrival order
    pending: BTreeMap<PoolId, VecDeque<JobId>>,
    by_submitter: BTreeMap<AccountId, Vec<JobId>>,
    /// ASSIGNED or CONFIRMED jobs per node
    active_by_node: BTreeMap<NodeId, BTreeSet<JobId>>,
    assigned_in_epoch: BTreeMap<EpochId, BTreeSet<JobId>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocate_id(&mut self) -> JobId {
        self.next_id += 1;
        JobId::new(self.next_id)
    }

    pub(crate) fn insert(&mut self, job: Job) {
        self.by_submitter
            .entry(job.submitter.clone())
            .or_default()
            .push(job.id);
        self.pending.entry(job.pool).or_default().push_back(job.id);
        self.jobs.insert(job.id, job);
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    /// Snapshot of the pending queues, pool by pool
    pub(crate) fn pending_snapshot(&self) -> Vec<(PoolId, Vec<JobId>)> {
        self.pending
            .iter()
            .map(|(pool, queue)| (*pool, queue.iter().copied().collect()))
            .collect()
    }

    pub fn pending_count(&self, pool: PoolId) -> usize {
        self.pending.get(&pool).map(|q| q.len()).unwrap_or(0)
    }

    pub(crate) fn mark_assigned(&mut self, id: JobId, node: NodeId, epoch: EpochId) {
        for queue in self.pending.values_mut() {
            queue.retain(|queued| *queued != id);
        }
        self.active_by_node.entry(node).or_default().insert(id);
        self.assigned_in_epoch.entry(epoch).or_default().insert(id);
    }

    /// Drop the job from its node's active set, optionally re-queueing it
    pub(crate) fn release(&mut self, id: JobId, node: NodeId, requeue_pool: Option<PoolId>) {
        if let Some(active) = self.active_by_node.get_mut(&node) {
            active.remove(&id);
        }
        if let Some(pool) = requeue_pool {
            self.pending.entry(pool).or_default().push_back(id);
        }
    }

    /// Number of jobs currently occupying the node
    pub fn load(&self, node: NodeId) -> usize {
        self.active_by_node.get(&node).map(|s| s.len()).unwrap_or(0)
    }

    pub fn active_jobs(&self, node: NodeId) -> Vec<&Job> {
        self.active_by_node
            .get(&node)
            .map(|ids| ids.iter().filter_map(|id| self.jobs.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn jobs_by_submitter(&self, submitter: &AccountId) -> Vec<&Job> {
        self.by_submitter
            .get(submitter)
            .map(|ids| ids.iter().filter_map(|id| self.jobs.get(id)).collect())
            .unwrap_or_default()
    }

    /// Jobs that received an assignment during `epoch`
    pub fn assigned_in(&self, epoch: EpochId) -> Vec<&Job> {
        self.assigned_in_epoch
            .get(&epoch)
            .map(|ids| ids.iter().filter_map(|id| self.jobs.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
