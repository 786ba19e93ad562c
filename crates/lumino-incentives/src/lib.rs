mod params;
mod penalty;
mod settlement;

pub use params::{CounterAfterSlash, IncentiveParams};
pub use penalty::{Adjustment, AdjustmentKind, PenaltyBook};
pub use settlement::{IncentiveSettlement, SettlementReport};
