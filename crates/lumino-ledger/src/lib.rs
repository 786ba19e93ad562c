mod ledger;
mod memory;
mod registry;
mod admission;

pub use ledger::{Ledger, LedgerSnapshot};
pub use memory::MemoryLedger;
pub use registry::{MemoryRegistry, NodeInfo, NodeRegistry};
pub use admission::{AccessControl, MemoryAccess, MemoryWhitelist, Role, Whitelist};

#[cfg(test)]
mod tests;
