//! Worker-pool copier: queue, workers, pool, and the orchestrating control loop.

pub mod channels;
pub mod orchestrator;
pub mod pool;
pub mod queue;
pub mod signal;
pub mod state;
pub mod transfer;
pub mod worker;

pub use channels::{ResultReceivers, ResultSenders, WorkerContext, create_result_channels};
pub use orchestrator::{Copier, requeue_started};
pub use pool::WorkerPool;
pub use queue::{Job, JobQueue};
pub use signal::DeviceFullSignal;
pub use state::ProgressState;
pub use transfer::{FsTransfer, Transfer, TransferOutcome};
pub use worker::{CopyWorker, WorkerExit};
