//! Copier context: the primitives shared between the orchestrator and workers.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::sync::Arc;

use crate::CopyRecord;

use super::queue::JobQueue;
use super::signal::DeviceFullSignal;
use super::transfer::Transfer;

/// Worker side of the result channels.
#[derive(Clone)]
pub struct ResultSenders {
    pub started: Sender<Arc<CopyRecord>>,
    pub completed: Sender<Arc<CopyRecord>>,
    pub error: Sender<Arc<CopyRecord>>,
}

/// Orchestrator side of the result channels.
pub struct ResultReceivers {
    pub started: Receiver<Arc<CopyRecord>>,
    pub completed: Receiver<Arc<CopyRecord>>,
    pub error: Receiver<Arc<CopyRecord>>,
}

/// Everything a worker needs. Cloned once per spawned worker.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: JobQueue,
    pub senders: ResultSenders,
    pub device_full: DeviceFullSignal,
    pub transfer: Arc<dyn Transfer>,
}

/// Build the started/completed/error channels.
pub fn create_result_channels() -> (ResultSenders, ResultReceivers) {
    let (started_tx, started_rx) = unbounded();
    let (completed_tx, completed_rx) = unbounded();
    let (error_tx, error_rx) = unbounded();
    (
        ResultSenders {
            started: started_tx,
            completed: completed_tx,
            error: error_tx,
        },
        ResultReceivers {
            started: started_rx,
            completed: completed_rx,
            error: error_rx,
        },
    )
}

/// Take everything currently buffered on `rx` without blocking.
pub fn drain_available<T>(rx: &Receiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(item) => items.push(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return items,
        }
    }
}
