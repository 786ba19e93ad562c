use lumino_types::{EpochId, LuminoError, Phase, Result};
use serde::{Deserialize, Serialize};

/// Fixed duration of each phase, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub commit: u64,
    pub reveal: u64,
    pub elect: u64,
    pub execute: u64,
    pub confirm: u64,
    pub dispute: u64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        PhaseDurations {
            commit: 10,
            reveal: 10,
            elect: 10,
            execute: 60,
            confirm: 20,
            dispute: 10,
        }
    }
}

impl PhaseDurations {
    /// Same duration for every phase
    pub const fn uniform(seconds: u64) -> Self {
        PhaseDurations {
            commit: seconds,
            reveal: seconds,
            elect: seconds,
            execute: seconds,
            confirm: seconds,
            dispute: seconds,
        }
    }

    pub const fn of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Commit => self.commit,
            Phase::Reveal => self.reveal,
            Phase::Elect => self.elect,
            Phase::Execute => self.execute,
            Phase::Confirm => self.confirm,
            Phase::Dispute => self.dispute,
        }
    }

    pub fn epoch_length(&self) -> u64 {
        Phase::ALL.iter().map(|p| self.of(*p)).sum()
    }

    /// Every phase must have a non-zero duration
    pub fn validate(&self) -> Result<()> {
        for phase in Phase::ALL {
            if self.of(phase) == 0 {
                return Err(LuminoError::Config(format!(
                    "{} phase duration must be positive",
                    phase
                )));
            }
        }
        Ok(())
    }
}

/// Position of an instant within the epoch schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub epoch: EpochId,
    pub phase: Phase,
    /// Seconds until the phase ends
    pub time_left: u64,
}

impl PhaseInfo {
    /// Gate an operation on being in `phase` of `epoch`
    pub fn require(&self, epoch: EpochId, phase: Phase) -> Result<()> {
        if self.epoch != epoch || self.phase != phase {
            return Err(self.invalid(epoch, phase));
        }
        Ok(())
    }

    /// Gate on the current epoch being in `phase`
    pub fn require_current(&self, phase: Phase) -> Result<()> {
        self.require(self.epoch, phase)
    }

    /// True once `phase` of `epoch` has been reached (any later epoch counts)
    pub fn has_reached(&self, epoch: EpochId, phase: Phase) -> bool {
        self.epoch > epoch || (self.epoch == epoch && self.phase >= phase)
    }

    pub fn invalid(&self, expected_epoch: EpochId, expected: Phase) -> LuminoError {
        LuminoError::InvalidPhase {
            expected,
            expected_epoch,
            actual: self.phase,
            actual_epoch: self.epoch,
        }
    }
}

/// Maps wall-clock seconds to `(epoch, phase, time_left)`.
///
/// Holds no mutable state; every caller asks again on every operation.
/// Epoch `base_epoch` starts at `genesis`; a fresh clock has both at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseClock {
    durations: PhaseDurations,
    #[serde(default)]
    genesis: u64,
    #[serde(default)]
    base_epoch: EpochId,
}

impl PhaseClock {
    pub fn new(durations: PhaseDurations) -> Result<Self> {
        Self::anchored(durations, 0, 0)
    }

    /// Clock whose epoch `base_epoch` begins at second `genesis`
    pub fn anchored(durations: PhaseDurations, genesis: u64, base_epoch: EpochId) -> Result<Self> {
        durations.validate()?;
        Ok(PhaseClock {
            durations,
            genesis,
            base_epoch,
        })
    }

    /// Switch to `durations` at `now`.
    ///
    /// Unchanged durations keep this clock. Otherwise the next epoch number
    /// starts immediately, so epoch numbers never repeat across the change.
    pub fn rebased(&self, durations: PhaseDurations, now: u64) -> Result<Self> {
        if durations == self.durations {
            return Ok(*self);
        }
        let next = self.phase_of(now).epoch.saturating_add(1);
        Self::anchored(durations, now.max(self.genesis), next)
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    pub fn epoch_length(&self) -> u64 {
        self.durations.epoch_length()
    }

    pub fn genesis(&self) -> u64 {
        self.genesis
    }

    pub fn base_epoch(&self) -> EpochId {
        self.base_epoch
    }

    pub fn phase_of(&self, now: u64) -> PhaseInfo {
        let length = self.epoch_length();
        let elapsed = now.saturating_sub(self.genesis);
        let epoch = self.base_epoch + elapsed / length;
        let offset = elapsed % length;

        let mut phase_end = 0;
        for phase in Phase::ALL {
            phase_end += self.durations.of(phase);
            if offset < phase_end {
                return PhaseInfo {
                    epoch,
                    phase,
                    time_left: phase_end - offset,
                };
            }
        }

        PhaseInfo {
            epoch,
            phase: Phase::Dispute,
            time_left: length - offset,
        }
    }

    /// First second of `epoch`; epochs before the base map to `genesis`
    pub fn epoch_start(&self, epoch: EpochId) -> u64 {
        self.genesis + epoch.saturating_sub(self.base_epoch) * self.epoch_length()
    }

    /// First second of `phase` within `epoch`
    pub fn phase_start(&self, epoch: EpochId, phase: Phase) -> u64 {
        let preceding: u64 = Phase::ALL[..phase.index()]
            .iter()
            .map(|p| self.durations.of(*p))
            .sum();
        self.epoch_start(epoch) + preceding
    }
}
