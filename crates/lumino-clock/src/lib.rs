mod phase_clock;
mod time_source;

pub use phase_clock::{PhaseClock, PhaseDurations, PhaseInfo};
pub use time_source::{ManualTime, SystemTime, TimeSource};
