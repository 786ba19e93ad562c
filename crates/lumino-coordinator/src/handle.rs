use lumino_incentives::SettlementReport;
use lumino_jobs::{AssignmentReport, Payment};
use lumino_leader::{CommitmentHash, ElectionResult};
use lumino_types::{AccountId, EpochId, JobId, NodeId, PoolId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::ProtocolConfig;
use crate::coordinator::Coordinator;
use crate::error::{CoordinatorError, Result};
use crate::status::StatusSnapshot;

const COMMAND_BUFFER: usize = 100;

pub type Reply<T> = oneshot::Sender<Result<T>>;
pub type QueryFn = Box<dyn FnOnce(&Coordinator) + Send>;

/// Requests applied one at a time by the coordinator task
pub enum Command {
    RegisterNode {
        caller: AccountId,
        pool: PoolId,
        compute_rating: u64,
        reply: Reply<NodeId>,
    },
    UnregisterNode {
        caller: AccountId,
        node: NodeId,
        reply: Reply<()>,
    },
    SubmitCommitment {
        caller: AccountId,
        epoch: EpochId,
        node: NodeId,
        hash: CommitmentHash,
        reply: Reply<()>,
    },
    RevealSecret {
        caller: AccountId,
        epoch: EpochId,
        node: NodeId,
        secret: Vec<u8>,
        reply: Reply<()>,
    },
    ElectLeader {
        reply: Reply<ElectionResult>,
    },
    StartAssignmentRound {
        caller: AccountId,
        reply: Reply<AssignmentReport>,
    },
    SubmitJob {
        caller: AccountId,
        pool: PoolId,
        model_name: String,
        payload: String,
        reply: Reply<JobId>,
    },
    ConfirmJob {
        caller: AccountId,
        job: JobId,
        reply: Reply<()>,
    },
    CompleteJob {
        caller: AccountId,
        job: JobId,
        reply: Reply<()>,
    },
    RejectJob {
        caller: AccountId,
        job: JobId,
        reason: String,
        reply: Reply<()>,
    },
    ProcessPayment {
        caller: AccountId,
        job: JobId,
        reply: Reply<Payment>,
    },
    Settle {
        caller: AccountId,
        epoch: EpochId,
        reply: Reply<SettlementReport>,
    },
    UpdateConfig {
        caller: AccountId,
        config: Box<ProtocolConfig>,
        reply: Reply<()>,
    },
    /// Read-only access from inside the writer task
    Query(QueryFn),
}

impl Coordinator {
    fn apply(&mut self, command: Command) {
        // A dropped receiver means the caller gave up waiting.
        match command {
            Command::RegisterNode { caller, pool, compute_rating, reply } => {
                let _ = reply.send(self.register_node(&caller, pool, compute_rating));
            }
            Command::UnregisterNode { caller, node, reply } => {
                let _ = reply.send(self.unregister_node(&caller, node));
            }
            Command::SubmitCommitment { caller, epoch, node, hash, reply } => {
                let _ = reply.send(self.submit_commitment(&caller, epoch, node, hash));
            }
            Command::RevealSecret { caller, epoch, node, secret, reply } => {
                let _ = reply.send(self.reveal_secret(&caller, epoch, node, &secret));
            }
            Command::ElectLeader { reply } => {
                let _ = reply.send(self.elect_leader());
            }
            Command::StartAssignmentRound { caller, reply } => {
                let _ = reply.send(self.start_assignment_round(&caller));
            }
            Command::SubmitJob { caller, pool, model_name, payload, reply } => {
                let _ = reply.send(self.submit_job(&caller, pool, &model_name, &payload));
            }
            Command::ConfirmJob { caller, job, reply } => {
                let _ = reply.send(self.confirm_job(&caller, job));
            }
            Command::CompleteJob { caller, job, reply } => {
                let _ = reply.send(self.complete_job(&caller, job));
            }
            Command::RejectJob { caller, job, reason, reply } => {
                let _ = reply.send(self.reject_job(&caller, job, &reason));
            }
            Command::ProcessPayment { caller, job, reply } => {
                let _ = reply.send(self.process_payment(&caller, job));
            }
            Command::Settle { caller, epoch, reply } => {
                let _ = reply.send(self.settle(&caller, epoch));
            }
            Command::UpdateConfig { caller, config, reply } => {
                let _ = reply.send(self.update_config(&caller, *config));
            }
            Command::Query(query) => query(self),
        }
    }
}

async fn run(
    mut coordinator: Coordinator,
    mut commands: mpsc::Receiver<Command>,
    status: watch::Sender<StatusSnapshot>,
) -> Coordinator {
    while let Some(command) = commands.recv().await {
        coordinator.apply(command);
        let _ = status.send(coordinator.status());
    }
    tracing::info!(events = coordinator.events().len(), "coordinator task stopped");
    coordinator
}

/// Cloneable async front end to a [`Coordinator`] running on its own task.
///
/// Mutations are serialized through a channel; the latest [`StatusSnapshot`]
/// can be read at any time without waiting for the writer.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<StatusSnapshot>,
}

impl CoordinatorHandle {
    /// Move the coordinator onto a tokio task. The task ends, returning the
    /// coordinator, once every handle has been dropped.
    pub fn spawn(coordinator: Coordinator) -> (Self, JoinHandle<Coordinator>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(coordinator.status());
        let task = tokio::spawn(run(coordinator, command_rx, status_tx));
        (
            Self {
                commands: command_tx,
                status: status_rx,
            },
            task,
        )
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        rx.await.map_err(|_| CoordinatorError::ChannelClosed)?
    }

    /// Latest published status
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    /// Run a read-only closure against the coordinator, in command order
    pub async fn query<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&Coordinator) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let query: QueryFn = Box::new(move |coordinator| {
            let _ = tx.send(f(coordinator));
        });
        self.commands
            .send(Command::Query(query))
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        rx.await.map_err(|_| CoordinatorError::ChannelClosed)
    }

    pub async fn register_node(&self, caller: AccountId, pool: PoolId, compute_rating: u64) -> Result<NodeId> {
        self.request(|reply| Command::RegisterNode { caller, pool, compute_rating, reply })
            .await
    }

    pub async fn unregister_node(&self, caller: AccountId, node: NodeId) -> Result<()> {
        self.request(|reply| Command::UnregisterNode { caller, node, reply }).await
    }

    pub async fn submit_commitment(
        &self,
        caller: AccountId,
        epoch: EpochId,
        node: NodeId,
        hash: CommitmentHash,
    ) -> Result<()> {
        self.request(|reply| Command::SubmitCommitment { caller, epoch, node, hash, reply })
            .await
    }

    pub async fn reveal_secret(
        &self,
        caller: AccountId,
        epoch: EpochId,
        node: NodeId,
        secret: Vec<u8>,
    ) -> Result<()> {
        self.request(|reply| Command::RevealSecret { caller, epoch, node, secret, reply })
            .await
    }

    pub async fn elect_leader(&self) -> Result<ElectionResult> {
        self.request(|reply| Command::ElectLeader { reply }).await
    }

    pub async fn start_assignment_round(&self, caller: AccountId) -> Result<AssignmentReport> {
        self.request(|reply| Command::StartAssignmentRound { caller, reply }).await
    }

    pub async fn submit_job(
        &self,
        caller: AccountId,
        pool: PoolId,
        model_name: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<JobId> {
        let model_name = model_name.into();
        let payload = payload.into();
        self.request(|reply| Command::SubmitJob { caller, pool, model_name, payload, reply })
            .await
    }

    pub async fn confirm_job(&self, caller: AccountId, job: JobId) -> Result<()> {
        self.request(|reply| Command::ConfirmJob { caller, job, reply }).await
    }

    pub async fn complete_job(&self, caller: AccountId, job: JobId) -> Result<()> {
        self.request(|reply| Command::CompleteJob { caller, job, reply }).await
    }

    pub async fn reject_job(&self, caller: AccountId, job: JobId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        self.request(|reply| Command::RejectJob { caller, job, reason, reply }).await
    }

    pub async fn process_payment(&self, caller: AccountId, job: JobId) -> Result<Payment> {
        self.request(|reply| Command::ProcessPayment { caller, job, reply }).await
    }

    pub async fn settle(&self, caller: AccountId, epoch: EpochId) -> Result<SettlementReport> {
        self.request(|reply| Command::Settle { caller, epoch, reply }).await
    }

    pub async fn update_config(&self, caller: AccountId, config: ProtocolConfig) -> Result<()> {
        let config = Box::new(config);
        self.request(|reply| Command::UpdateConfig { caller, config, reply }).await
    }
}
