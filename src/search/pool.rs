//! Bounded, per-batch worker pool with early exit.
//!
//! Every search phase and every probe batch builds its own [`WorkerPool`],
//! sized to the batch up to a ceiling, and drops it when the batch is done.
//! Jobs are independent closures that return a value; the caller receives
//! results on its own thread in completion order and may stop the batch at
//! any point by returning [`ControlFlow::Break`].
//!
//! Stopping early cancels the batch's [`CancelToken`] and returns without
//! waiting. Jobs already running finish in the background (a filesystem
//! call in flight cannot be interrupted) and their results are discarded.
//!
//! ```
//! use ocrfind::search::pool::WorkerPool;
//! use ocrfind::signal::CancelToken;
//! use std::ops::ControlFlow;
//!
//! let pool = WorkerPool::sized_for(4, 16);
//! let jobs: Vec<_> = (1..=4u32).map(|n| move |_: &CancelToken| n * 10).collect();
//!
//! let mut total = 0;
//! pool.run(jobs, &CancelToken::new(), |v| {
//!     total += v;
//!     ControlFlow::Continue(())
//! });
//! assert_eq!(total, 100);
//! ```

use std::ops::ControlFlow;
use std::sync::mpsc;

use crate::signal::CancelToken;

/// Recommended upper bound on threads per batch.
pub const DEFAULT_POOL_CEILING: usize = 16;

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Jobs submitted.
    pub submitted: usize,
    /// Results delivered to the caller.
    pub delivered: usize,
    /// The caller stopped the batch before all results arrived.
    pub stopped_early: bool,
}

/// A rayon thread pool scoped to one batch of jobs.
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
    threads: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("inline", &self.pool.is_none())
            .finish()
    }
}

impl WorkerPool {
    /// Build a pool with `min(jobs, ceiling)` threads (at least one).
    ///
    /// If the OS refuses to spawn threads the pool runs jobs inline on the
    /// caller's thread instead of failing the search.
    #[must_use]
    pub fn sized_for(jobs: usize, ceiling: usize) -> Self {
        let threads = jobs.min(ceiling).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ocrfind-worker-{i}"))
            .build();
        match pool {
            Ok(pool) => Self {
                pool: Some(pool),
                threads,
            },
            Err(e) => {
                log::warn!("Failed to create worker pool ({}), running jobs inline", e);
                Self {
                    pool: None,
                    threads: 1,
                }
            }
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `jobs`, feeding each result to `on_result` as it completes.
    ///
    /// Each job receives a child of `cancel`; it should check it between
    /// filesystem calls. Returning `Break` from `on_result` cancels that
    /// child and returns immediately. If `cancel` itself is cancelled the
    /// batch also stops once the next result (or no result) arrives.
    pub fn run<T, F, C>(&self, jobs: Vec<F>, cancel: &CancelToken, mut on_result: C) -> BatchOutcome
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> T + Send + 'static,
        C: FnMut(T) -> ControlFlow<()>,
    {
        let batch = cancel.child();
        let mut outcome = BatchOutcome {
            submitted: jobs.len(),
            ..Default::default()
        };
        if jobs.is_empty() {
            return outcome;
        }

        let Some(pool) = &self.pool else {
            for job in jobs {
                if batch.is_cancelled() {
                    outcome.stopped_early = true;
                    break;
                }
                outcome.delivered += 1;
                if on_result(job(&batch)).is_break() {
                    batch.cancel();
                    outcome.stopped_early = true;
                    break;
                }
            }
            return outcome;
        };

        let (tx, rx) = mpsc::channel();
        for job in jobs {
            let tx = tx.clone();
            let token = batch.clone();
            pool.spawn(move || {
                if token.is_cancelled() {
                    return;
                }
                let result = job(&token);
                // the receiver is gone once the caller stopped early
                let _ = tx.send(result);
            });
        }
        drop(tx);

        // Jobs skipped after cancellation drop their sender, so this loop
        // ends once every job has either reported or bailed out.
        for result in rx {
            outcome.delivered += 1;
            if on_result(result).is_break() {
                batch.cancel();
                outcome.stopped_early = true;
                break;
            }
            if batch.is_cancelled() {
                outcome.stopped_early = true;
                break;
            }
        }
        outcome.stopped_early |= outcome.delivered < outcome.submitted;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_pool_size_is_bounded() {
        assert_eq!(WorkerPool::sized_for(0, 16).threads(), 1);
        assert_eq!(WorkerPool::sized_for(3, 16).threads(), 3);
        assert_eq!(WorkerPool::sized_for(400, 16).threads(), 16);
    }

    #[test]
    fn test_run_collects_all_results() {
        let pool = WorkerPool::sized_for(8, 4);
        let jobs: Vec<_> = (0..8usize).map(|i| move |_: &CancelToken| i).collect();

        let mut seen = Vec::new();
        let outcome = pool.run(jobs, &CancelToken::new(), |i| {
            seen.push(i);
            ControlFlow::Continue(())
        });

        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert_eq!(outcome.delivered, 8);
        assert!(!outcome.stopped_early);
    }

    #[test]
    fn test_empty_batch() {
        let pool = WorkerPool::sized_for(0, 4);
        let jobs: Vec<fn(&CancelToken) -> u8> = Vec::new();
        let outcome = pool.run(jobs, &CancelToken::new(), |_| ControlFlow::Continue(()));
        assert_eq!(outcome, BatchOutcome::default());
    }

    #[test]
    fn test_break_cancels_stragglers_without_waiting() {
        let pool = WorkerPool::sized_for(2, 2);
        let observed_cancel = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&observed_cancel);

        let fast = Box::new(|_: &CancelToken| true) as Box<dyn FnOnce(&CancelToken) -> bool + Send>;
        let slow = Box::new(move |token: &CancelToken| {
            for _ in 0..200 {
                if token.is_cancelled() {
                    flag.fetch_add(1, Ordering::SeqCst);
                    return false;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            false
        }) as Box<dyn FnOnce(&CancelToken) -> bool + Send>;

        let parent = CancelToken::new();
        let outcome = pool.run(vec![fast, slow], &parent, |found| {
            if found {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert!(outcome.stopped_early);
        assert_eq!(outcome.delivered, 1);
        assert!(!parent.is_cancelled());

        // the slow job notices the batch token shortly after
        for _ in 0..200 {
            if observed_cancel.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(observed_cancel.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parent_cancel_stops_batch() {
        let pool = WorkerPool::sized_for(4, 4);
        let parent = CancelToken::new();
        parent.cancel();

        let jobs: Vec<_> = (0..4usize).map(|i| move |_: &CancelToken| i).collect();
        let outcome = pool.run(jobs, &parent, |_| ControlFlow::Continue(()));

        assert_eq!(outcome.submitted, 4);
        assert_eq!(outcome.delivered, 0);
    }
}
