//! The copy orchestrator: a single-threaded control loop over a pool of copy workers.
//!
//! Each iteration drains the worker channels (started, then error, then completed), updates
//! progress, and either finishes, handles a full volume, or tops the pool back up. When a volume
//! fills, workers are stopped and joined, files that were in flight are pushed back onto the
//! front of the queue in ascending order, the operator is asked to swap volumes, and the new
//! volume is reconciled before copying resumes.

use anyhow::{Result, bail};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::engine::progress::CopyProgress;
use crate::engine::tools::absolutize;
use crate::reconcile::{self, Reconciler};
use crate::resolve::{Resolver, ResumePoint, remove_resume_point, write_jobfile, write_resume_point};
use crate::utils::config::PollConsts;
use crate::utils::prompt::{CommandlinePrompt, Prompt, SwapReply, parse_swap_reply};
use crate::volume::mount_point;
use crate::{AbortReason, CopyOptions, CopyOutcome, CopyRecord};

use super::channels::{ResultReceivers, WorkerContext, create_result_channels, drain_available};
use super::pool::WorkerPool;
use super::queue::{Job, JobQueue};
use super::signal::DeviceFullSignal;
use super::state::ProgressState;
use super::transfer::{FsTransfer, Transfer};

/// Multi-volume copier. Configure with the `with_*` builders, then call [`Copier::start`].
pub struct Copier {
    resolver: Box<dyn Resolver>,
    options: CopyOptions,
    reconciler: Option<Box<dyn Reconciler>>,
    prompt: Box<dyn Prompt>,
    transfer: Arc<dyn Transfer>,
    cancel: Arc<AtomicBool>,
    queue: JobQueue,
    device_full: DeviceFullSignal,
}

/// Everything that lives for one `start()` call.
struct Run {
    records: Vec<CopyRecord>,
    state: ProgressState,
    progress: CopyProgress,
    pool: WorkerPool,
    receivers: ResultReceivers,
    device_start_index: usize,
    /// Failures carried over from an earlier run, until they are copied.
    retry: BTreeSet<usize>,
    saved: Option<ResumePoint>,
}

impl Run {
    fn resume_point(&self) -> ResumePoint {
        let copied = self.state.copied();
        let errors: BTreeSet<usize> = self
            .state
            .errors()
            .iter()
            .chain(self.retry.iter().filter(|i| !copied.contains(*i)))
            .copied()
            .collect();
        ResumePoint {
            device_start_index: self.device_start_index,
            next_index: self.state.next_unprocessed(),
            errors: errors.into_iter().collect(),
        }
    }
}

impl Copier {
    /// Copier with the real filesystem transfer, stdin prompt and the reconciler `options` select.
    pub fn new(resolver: Box<dyn Resolver>, options: CopyOptions) -> Self {
        let transfer = Arc::new(FsTransfer::new(options.compare));
        Self {
            resolver,
            options,
            reconciler: None,
            prompt: Box::new(CommandlinePrompt),
            transfer,
            cancel: Arc::new(AtomicBool::new(false)),
            queue: JobQueue::new(),
            device_full: DeviceFullSignal::new(),
        }
    }

    pub fn with_reconciler(mut self, reconciler: Box<dyn Reconciler>) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    pub fn with_prompt(mut self, prompt: Box<dyn Prompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_transfer(mut self, transfer: Arc<dyn Transfer>) -> Self {
        self.transfer = transfer;
        self
    }

    /// Flag checked every iteration; setting it stops the run with `Aborted(Interrupted)`.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle to the job queue (for inspection; the copier owns its contents).
    pub fn queue(&self) -> JobQueue {
        self.queue.clone()
    }

    pub fn device_full_signal(&self) -> DeviceFullSignal {
        self.device_full.clone()
    }

    /// Run the copy to completion, abort, or error. Workers are always stopped before returning.
    pub fn start(&mut self) -> Result<CopyOutcome> {
        self.options.validate()?;
        let mut run = self.seed()?;
        let result = self.event_loop(&mut run);
        self.shutdown(&mut run);
        result
    }

    fn seed(&mut self) -> Result<Run> {
        let dsi = self.options.device_start_index;
        let si = self.options.start_index;

        let all = self.resolver.resolve()?;
        write_jobfile(&self.options.jobfile, &all)?;
        let total = all.len();
        if si > total {
            bail!("start index {} is past the last record ({} records)", si, total);
        }

        let output = absolutize(&self.options.output)?;
        let retry: BTreeSet<usize> = self.options.retry_indexes.iter().copied().collect();
        let records: Vec<CopyRecord> = all
            .into_iter()
            .filter(|r| r.index >= dsi || retry.contains(&r.index))
            .collect();
        if let Some(stray) = records.iter().find(|r| !r.dst.starts_with(&output)) {
            bail!(
                "destination {} is outside the output directory {}",
                stray.dst.display(),
                output.display()
            );
        }
        info!(
            "{} files to copy ({} for this and later volumes, starting at index {})",
            total,
            records.len(),
            si
        );

        let asserted: BTreeSet<usize> = (dsi..si).filter(|i| !retry.contains(i)).collect();
        self.reconcile(&records, &BTreeSet::new(), &asserted)?;

        // an asserted file that is not on the volume gets copied after all
        let present: BTreeSet<usize> = records
            .iter()
            .filter(|r| asserted.contains(&r.index) && r.dst.is_file())
            .map(|r| r.index)
            .collect();
        if present.len() < asserted.len() {
            warn!(
                "{} files before index {} are missing from {} and will be copied",
                asserted.len() - present.len(),
                si,
                output.display()
            );
        }

        let mut state = ProgressState::new(dsi, records.len());
        state.mark_present(present.iter().copied());
        for record in records.iter().filter(|r| !present.contains(&r.index)) {
            self.queue.push_back(Job::Copy(Arc::new(record.clone())));
        }

        let (senders, receivers) = create_result_channels();
        let ctx = WorkerContext {
            queue: self.queue.clone(),
            senders,
            device_full: self.device_full.clone(),
            transfer: Arc::clone(&self.transfer),
        };
        let pool = WorkerPool::new(ctx, self.options.num_workers, self.options.max_worker_tasks);
        let progress = CopyProgress::new(self.options.show_progress, records.len());

        let mut run = Run {
            records,
            state,
            progress,
            pool,
            receivers,
            device_start_index: dsi,
            retry,
            saved: None,
        };
        self.save_resume_point(&mut run);
        Ok(run)
    }

    fn event_loop(&mut self, run: &mut Run) -> Result<CopyOutcome> {
        loop {
            let changed = self.evaluate_channels(run);
            if changed {
                run.progress
                    .render(run.state.processed(), run.state.errors().len());
                self.save_resume_point(run);
            }

            if run.state.is_finished() {
                return Ok(self.finish(run));
            }
            if self.cancel.load(Ordering::SeqCst) {
                return Ok(self.interrupted(run));
            }
            if self.device_full.is_set() {
                if let Some(outcome) = self.handle_device_full(run)? {
                    return Ok(outcome);
                }
                continue;
            }

            run.pool.build_workers()?;
            if !changed {
                thread::sleep(PollConsts::LOOP_INTERVAL);
            }
        }
    }

    /// Drain every channel once. Returns true if anything arrived.
    fn evaluate_channels(&mut self, run: &mut Run) -> bool {
        let mut changed = false;
        for record in drain_available(&run.receivers.started) {
            if !run.state.record_started(record.index) {
                debug!("late start for index {} ignored", record.index);
            }
            changed = true;
        }
        for record in drain_available(&run.receivers.error) {
            run.state.record_error(record.index);
            run.progress.set_last_file(&record.src);
            changed = true;
        }
        for record in drain_available(&run.receivers.completed) {
            run.state.record_completed(record.index);
            run.progress.set_last_file(&record.src);
            changed = true;
        }
        changed
    }

    /// Device-full: stop, requeue in-flight work, prompt, reconcile. `Some` ends the run.
    fn handle_device_full(&mut self, run: &mut Run) -> Result<Option<CopyOutcome>> {
        run.progress.suspend();
        info!("Output volume is full, stopping workers...");
        self.stop_workers(run);
        self.evaluate_channels(run);
        if run.state.is_finished() {
            return Ok(Some(self.finish(run)));
        }

        let requeued = requeue_started(&self.queue, &mut run.state, &run.records);
        info!("{} in-flight files requeued", requeued);
        self.save_resume_point(run);

        let next_device_start = run.state.next_unprocessed();
        if self.ask_for_new_volume(next_device_start)? == SwapReply::Abort {
            info!("Copy aborted by user");
            return Ok(Some(CopyOutcome::Aborted(AbortReason::User)));
        }

        self.device_full.clear();
        run.device_start_index = next_device_start;
        self.reconcile(&run.records, run.state.copied(), &BTreeSet::new())?;
        self.save_resume_point(run);
        run.progress.refresh();
        Ok(None)
    }

    fn ask_for_new_volume(&mut self, next_index: usize) -> Result<SwapReply> {
        let mount = mount_point(&self.options.output);
        let message = format!(
            "Volume {} is full. Mount a new volume (continuing from index {}), then enter 'c' to continue or 'q' to quit: ",
            mount.display(),
            next_index
        );
        loop {
            let Some(reply) = self.prompt.input(&message)? else {
                warn!("No more input; aborting");
                return Ok(SwapReply::Abort);
            };
            match parse_swap_reply(&reply) {
                Some(answer) => return Ok(answer),
                None => debug!("unrecognized reply {:?}", reply),
            }
        }
    }

    fn reconcile(
        &mut self,
        records: &[CopyRecord],
        copied: &BTreeSet<usize>,
        present: &BTreeSet<usize>,
    ) -> Result<()> {
        if self.reconciler.is_none() {
            self.reconciler = Some(reconcile::for_options(&self.options)?);
        }
        if let Some(reconciler) = self.reconciler.as_ref() {
            info!("Reconciling {}...", reconciler.output().display());
            reconciler.reconcile_with_present(records, copied, present)?;
        }
        Ok(())
    }

    /// Poison-pill every worker, wait for them, and clean up pills nobody took.
    fn stop_workers(&mut self, run: &mut Run) {
        run.pool.stop();
        if !run.pool.join(PollConsts::JOIN_TIMEOUT) {
            run.pool.terminate();
        }
        let discarded = self.queue.discard_stops();
        if discarded > 0 {
            debug!("Discarded {} unused stop requests", discarded);
        }
    }

    fn interrupted(&mut self, run: &mut Run) -> CopyOutcome {
        run.progress.suspend();
        warn!("Interrupted, stopping workers...");
        self.stop_workers(run);
        self.evaluate_channels(run);
        self.save_resume_point(run);
        let point = run.resume_point();
        info!(
            "Resume with --resume (device start index {}, next index {})",
            point.device_start_index, point.next_index
        );
        CopyOutcome::Aborted(AbortReason::Interrupted)
    }

    fn finish(&mut self, run: &mut Run) -> CopyOutcome {
        run.progress
            .render(run.state.processed(), run.state.errors().len());
        run.progress.suspend();
        let copied: Vec<usize> = run.state.copied().iter().copied().collect();
        let errors: Vec<usize> = run.state.errors().iter().copied().collect();
        if errors.is_empty() {
            if let Err(e) = remove_resume_point(&self.options.indexfile) {
                warn!("{:#}", e);
            }
        } else {
            self.save_resume_point(run);
            warn!("{} files could not be copied: {:?}", errors.len(), errors);
        }
        info!("Copy finished: {} files copied", copied.len());
        CopyOutcome::Finished { copied, errors }
    }

    fn shutdown(&mut self, run: &mut Run) {
        if run.pool.active_workers() > 0 {
            self.stop_workers(run);
        }
        if run.pool.abnormal_exits() > 0 {
            warn!(
                "{} workers exited abnormally during the run",
                run.pool.abnormal_exits()
            );
        }
    }

    /// Persist the resume point when it moved. Write failures are logged, not fatal.
    fn save_resume_point(&self, run: &mut Run) {
        let point = run.resume_point();
        if run.saved.as_ref() == Some(&point) {
            return;
        }
        match write_resume_point(&self.options.indexfile, &point) {
            Ok(()) => run.saved = Some(point),
            Err(e) => warn!("Unable to write index file: {:#}", e),
        }
    }
}

/// Move every in-flight index back onto the front of `queue`, lowest index served first.
/// `records` must be sorted by index. Returns how many were requeued.
pub fn requeue_started(queue: &JobQueue, state: &mut ProgressState, records: &[CopyRecord]) -> usize {
    let requeue: Vec<Arc<CopyRecord>> = state
        .take_started()
        .into_iter()
        .filter_map(|index| {
            records
                .binary_search_by_key(&index, |r| r.index)
                .ok()
                .map(|pos| Arc::new(records[pos].clone()))
        })
        .collect();
    let count = requeue.len();
    queue.push_front_all(requeue);
    count
}
