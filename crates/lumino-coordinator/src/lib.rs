mod config;
mod coordinator;
mod error;
mod events;
mod handle;
mod status;

pub use config::{EscrowParams, ProtocolConfig};
pub use coordinator::{Collaborators, Coordinator};
pub use error::{CoordinatorError, Result};
pub use events::{chain_hash, EventLog, EventRecord, ProtocolEvent, GENESIS_HASH};
pub use handle::{Command, CoordinatorHandle};
pub use status::StatusSnapshot;

#[cfg(test)]
mod tests;
