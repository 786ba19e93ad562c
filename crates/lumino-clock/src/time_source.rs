use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of wall-clock seconds
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

/// Unix time from the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Manually driven time, shared between clones. Used by tests and the simulator.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    seconds: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new(start: u64) -> Self {
        ManualTime {
            seconds: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, seconds: u64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }
}
