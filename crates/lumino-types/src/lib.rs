mod account;
mod amount;
mod epoch;
mod ids;
mod job_status;
mod error;

pub use account::AccountId;
pub use amount::Amount;
pub use epoch::{EpochId, Phase};
pub use ids::{JobId, NodeId, PoolId};
pub use job_status::JobStatus;
pub use error::{LuminoError, Result};
