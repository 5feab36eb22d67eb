//! Copy worker: pops jobs, copies, reports. Never retries; requeueing belongs to the orchestrator.

use log::{debug, error, info};
use std::io;
use std::sync::Arc;

use crate::utils::config::PollConsts;
use crate::volume::is_device_full_error;

use super::channels::WorkerContext;
use super::queue::Job;
use super::transfer::TransferOutcome;

/// Why a worker returned normally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// Task budget used up; the pool replaces the worker.
    Budget,
    /// Popped a poison pill.
    PoisonPill,
    /// Device-full signal observed (or raised by this worker).
    DeviceFull,
}

pub struct CopyWorker {
    id: usize,
    ctx: WorkerContext,
    max_tasks: usize,
}

impl CopyWorker {
    pub fn new(id: usize, ctx: WorkerContext, max_tasks: usize) -> Self {
        Self { id, ctx, max_tasks }
    }

    /// Process jobs until a poison pill, the device-full signal, or the task budget.
    /// Only a non-space I/O error escapes as `Err`, after the record went out on the error channel.
    pub fn run(self) -> io::Result<WorkerExit> {
        let ctx = &self.ctx;
        let mut done = 0_usize;
        while done < self.max_tasks {
            if ctx.device_full.is_set() {
                debug!("worker {}: exit, device full", self.id);
                return Ok(WorkerExit::DeviceFull);
            }

            let Some(job) = ctx.queue.pop_front_timeout(PollConsts::WORKER_POP_TIMEOUT) else {
                continue;
            };
            let record = match job {
                Job::Stop => {
                    debug!("worker {}: exit, stop requested", self.id);
                    return Ok(WorkerExit::PoisonPill);
                }
                Job::Copy(record) => record,
            };
            // signal raised while we waited: hand the job back untouched
            if ctx.device_full.is_set() {
                ctx.queue.push_front(Job::Copy(record));
                return Ok(WorkerExit::DeviceFull);
            }

            let _ = ctx.senders.started.send(Arc::clone(&record));
            match ctx.transfer.transfer(&record) {
                Ok(outcome) => {
                    if outcome == TransferOutcome::Skipped {
                        debug!("worker {}: kept existing {}", self.id, record.dst.display());
                    }
                    let _ = ctx.senders.completed.send(record);
                }
                Err(e) if is_device_full_error(&e) => {
                    if ctx.device_full.set() {
                        info!(
                            "Output volume full while writing {} (index {})",
                            record.dst.display(),
                            record.index
                        );
                    }
                    return Ok(WorkerExit::DeviceFull);
                }
                Err(e) => {
                    error!(
                        "Unable to copy {} to {}: {}",
                        record.src.display(),
                        record.dst.display(),
                        e
                    );
                    let _ = ctx.senders.error.send(record);
                    return Err(e);
                }
            }
            done += 1;
        }
        debug!("worker {}: task budget reached, exiting", self.id);
        Ok(WorkerExit::Budget)
    }
}
