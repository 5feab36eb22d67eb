use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide "output volume is full" flag.
///
/// Set by the first worker that hits a disk-full error; doubles as a stop signal for every
/// other worker. Only the orchestrator clears it, after the volume swap and reconciliation.
#[derive(Clone, Debug, Default)]
pub struct DeviceFullSignal {
    flag: Arc<AtomicBool>,
}

impl DeviceFullSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns true only for the caller that actually flipped it.
    pub fn set(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
