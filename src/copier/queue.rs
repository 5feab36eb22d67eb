//! Shared double-ended job queue.
//!
//! Normal work is served front to back in ascending record index. Jobs that were in flight when
//! a volume filled are pushed back onto the front so they are retried before anything untouched.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::CopyRecord;

/// One queue slot: a record to copy, or a poison pill telling exactly one worker to exit.
#[derive(Clone, Debug)]
pub enum Job {
    Copy(Arc<CopyRecord>),
    Stop,
}

/// Thread-safe deque shared by the orchestrator and all workers. Cheap to clone.
#[derive(Clone, Default)]
pub struct JobQueue {
    inner: Arc<(Mutex<VecDeque<Job>>, Condvar)>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        // A worker panicking mid-push cannot leave the deque half-modified.
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_front(&self, job: Job) {
        self.lock().push_front(job);
        self.inner.1.notify_one();
    }

    pub fn push_back(&self, job: Job) {
        self.lock().push_back(job);
        self.inner.1.notify_one();
    }

    /// Take the front job without waiting.
    pub fn pop_front(&self) -> Option<Job> {
        self.lock().pop_front()
    }

    /// Take the front job, waiting up to `timeout` for one to arrive.
    pub fn pop_front_timeout(&self, timeout: Duration) -> Option<Job> {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (mut guard, _) = cvar
            .wait_timeout_while(guard, timeout, |q| q.is_empty())
            .unwrap_or_else(|e| e.into_inner());
        guard.pop_front()
    }

    /// Push `records` onto the front keeping their order: the first element is served first.
    pub fn push_front_all<I>(&self, records: I)
    where
        I: IntoIterator<Item = Arc<CopyRecord>>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut queue = self.lock();
        for record in records.into_iter().rev() {
            queue.push_front(Job::Copy(record));
        }
        drop(queue);
        self.inner.1.notify_all();
    }

    /// Drop poison pills nobody consumed (workers that left on the device-full signal). Returns how many.
    pub fn discard_stops(&self) -> usize {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|job| matches!(job, Job::Copy(_)));
        before - queue.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Record indexes in queue order; poison pills show as `None`.
    pub fn snapshot_indexes(&self) -> Vec<Option<usize>> {
        self.lock()
            .iter()
            .map(|job| match job {
                Job::Copy(record) => Some(record.index),
                Job::Stop => None,
            })
            .collect()
    }
}
