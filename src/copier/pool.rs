//! Worker pool: keeps `num_workers` copy workers alive, replacing any that exited.
//!
//! Liveness is polled (`build_workers` reaps finished threads and spawns replacements), so a
//! worker leaving on its task budget, a poison pill, the device-full signal or an I/O error
//! all look the same to the pool; only the last one is reported as abnormal.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::utils::config::PollConsts;

use super::channels::WorkerContext;
use super::queue::Job;
use super::worker::{CopyWorker, WorkerExit};

type WorkerHandle = JoinHandle<io::Result<WorkerExit>>;

pub struct WorkerPool {
    ctx: WorkerContext,
    num_workers: usize,
    max_tasks: usize,
    workers: Vec<WorkerHandle>,
    next_id: usize,
    abnormal_exits: usize,
}

impl WorkerPool {
    pub fn new(ctx: WorkerContext, num_workers: usize, max_tasks: usize) -> Self {
        Self {
            ctx,
            num_workers,
            max_tasks,
            workers: Vec::new(),
            next_id: 0,
            abnormal_exits: 0,
        }
    }

    /// Spawn workers until `num_workers` are alive. Returns how many were spawned.
    pub fn build_workers(&mut self) -> Result<usize> {
        self.reap();
        let mut spawned = 0_usize;
        while self.workers.len() < self.num_workers {
            let id = self.next_id;
            self.next_id += 1;
            let worker = CopyWorker::new(id, self.ctx.clone(), self.max_tasks);
            let handle = thread::Builder::new()
                .name(format!("{}-worker-{}", env!("CARGO_PKG_NAME"), id))
                .spawn(move || worker.run())
                .context("spawn copy worker")?;
            self.workers.push(handle);
            spawned += 1;
        }
        if spawned > 0 {
            debug!("Spawned {} workers ({} alive)", spawned, self.workers.len());
        }
        Ok(spawned)
    }

    /// Join every finished worker, logging how it left.
    fn reap(&mut self) {
        let (finished, alive): (Vec<_>, Vec<_>) =
            self.workers.drain(..).partition(|h| h.is_finished());
        self.workers = alive;
        for handle in finished {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            match handle.join() {
                Ok(Ok(exit)) => debug!("{} exited: {:?}", name, exit),
                Ok(Err(e)) => {
                    self.abnormal_exits += 1;
                    warn!("{} exited after an I/O error: {}", name, e);
                }
                Err(_) => {
                    self.abnormal_exits += 1;
                    warn!("{} panicked", name);
                }
            }
        }
    }

    /// Workers still running.
    pub fn active_workers(&mut self) -> usize {
        self.reap();
        self.workers.len()
    }

    /// Total workers that died on an I/O error or panic.
    pub fn abnormal_exits(&self) -> usize {
        self.abnormal_exits
    }

    /// Ask every active worker to exit after its current file: one poison pill each, at the front.
    pub fn stop(&mut self) {
        let active = self.active_workers();
        debug!("Stopping {} workers...", active);
        for _ in 0..active {
            self.ctx.queue.push_front(Job::Stop);
        }
    }

    /// Abandon workers that are still running. Threads cannot be killed; detached workers exit
    /// at their next signal or queue check. Only for abnormal shutdown after a failed join.
    pub fn terminate(&mut self) {
        self.reap();
        if self.workers.is_empty() {
            return;
        }
        warn!("Abandoning {} workers that did not stop", self.workers.len());
        self.workers.clear();
    }

    /// Wait until every worker exited or `timeout` passed. Returns true if all exited.
    pub fn join(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.active_workers() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                warn!(
                    "{} workers still running after {:?}",
                    self.workers.len(),
                    timeout
                );
                return false;
            }
            thread::sleep(PollConsts::JOIN_POLL);
        }
    }
}
