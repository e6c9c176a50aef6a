//! engine::pool
//!
//! Bounded worker pool with blocking, order-preserving gather.
//!
//! # Semantics
//!
//! - `submit` never waits; the task is spawned immediately and parks on a
//!   semaphore until one of the `workers` slots is free.
//! - `join_all` waits for **every** submitted task. There is no early exit on
//!   failure, no timeout and no cancellation.
//! - Results come back in submission order regardless of completion order.
//! - A panicking task is reported as [`PoolError::Panicked`] in its own slot.
//!
//! The pool must be used from inside a tokio runtime.
//!
//! # Example
//!
//! ```
//! use reposync::engine::pool::{PoolError, WorkerPool};
//!
//! # tokio_test::block_on(async {
//! let mut pool: WorkerPool<u32, PoolError> = WorkerPool::new(2);
//! for n in 0..5u32 {
//!     pool.submit(async move { Ok(n * 10) }).unwrap();
//! }
//! let results: Vec<u32> = pool.join_all().await.into_iter().map(Result::unwrap).collect();
//! assert_eq!(results, vec![0, 10, 20, 30, 40]);
//! # });
//! ```

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};

/// Errors raised by the pool itself rather than by a task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Submission after [`WorkerPool::close`].
    #[error("worker pool is closed")]
    Closed,

    /// The task panicked.
    #[error("task #{index} panicked: {message}")]
    Panicked {
        /// Submission index
        index: usize,
        /// Panic payload, if it was a string
        message: String,
    },

    /// The task was cancelled by the runtime (e.g. during shutdown).
    #[error("task #{index} was cancelled")]
    Cancelled {
        /// Submission index
        index: usize,
    },
}

/// Handle to a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle {
    index: usize,
}

impl TaskHandle {
    /// Submission index; also the task's position in [`WorkerPool::join_all`].
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A bounded pool of async workers.
pub struct WorkerPool<T, E> {
    semaphore: Arc<Semaphore>,
    workers: usize,
    handles: Vec<JoinHandle<Result<T, E>>>,
    closed: bool,
}

impl<T, E> std::fmt::Debug for WorkerPool<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("submitted", &self.handles.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl<T, E> WorkerPool<T, E>
where
    T: Send + 'static,
    E: From<PoolError> + Send + 'static,
{
    /// Create a pool running at most `workers` tasks at once (minimum 1).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            handles: Vec::new(),
            closed: false,
        }
    }

    /// Maximum number of concurrently running tasks.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of tasks submitted so far.
    pub fn submitted(&self) -> usize {
        self.handles.len()
    }

    /// Submit a task without waiting for a free worker.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Closed` after [`WorkerPool::close`].
    pub fn submit<F>(&mut self, task: F) -> Result<TaskHandle, PoolError>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        if self.closed {
            return Err(PoolError::Closed);
        }
        Ok(self.spawn(task))
    }

    fn spawn<F>(&mut self, task: F) -> TaskHandle
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let index = self.handles.len();
        let semaphore = Arc::clone(&self.semaphore);
        let handle = tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only fails if that changes.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return Err(E::from(PoolError::Closed));
            };
            task.await
        });

        self.handles.push(handle);
        TaskHandle { index }
    }

    /// Stop accepting submissions.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the pool has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Wait for every submitted task and return results in submission order.
    pub async fn join_all(self) -> Vec<Result<T, E>> {
        let mut results = Vec::with_capacity(self.handles.len());
        for (index, handle) in self.handles.into_iter().enumerate() {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => Err(E::from(join_failure(index, err))),
            };
            results.push(result);
        }
        results
    }
}

/// Run every task on a fresh pool and gather all results in order.
pub async fn run_all<T, E, F, I>(workers: usize, tasks: I) -> Vec<Result<T, E>>
where
    T: Send + 'static,
    E: From<PoolError> + Send + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    I: IntoIterator<Item = F>,
{
    let mut pool = WorkerPool::new(workers);
    for task in tasks {
        pool.spawn(task);
    }
    pool.join_all().await
}

fn join_failure(index: usize, err: JoinError) -> PoolError {
    if err.is_cancelled() {
        return PoolError::Cancelled { index };
    }

    let payload = err.into_panic();
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    PoolError::Panicked { index, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Task(String),
        Pool(PoolError),
    }

    impl From<PoolError> for TestError {
        fn from(err: PoolError) -> Self {
            TestError::Pool(err)
        }
    }

    #[tokio::test]
    async fn preserves_submission_order_despite_completion_order() {
        // Earlier tasks sleep longer, so they finish last.
        let tasks = (0..8u64).map(|n| async move {
            tokio::time::sleep(Duration::from_millis((8 - n) * 15)).await;
            Ok::<u64, TestError>(n)
        });

        let results = run_all(3, tasks).await;
        let values: Vec<u64> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_worker_count() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..12).map(|_| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), TestError>(())
            }
        });

        let results = run_all(3, tasks).await;
        assert_eq!(results.len(), 12);
        assert!(results.iter().all(Result::is_ok));
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn failure_does_not_stop_other_tasks() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut pool: WorkerPool<usize, TestError> = WorkerPool::new(2);

        for n in 0..5usize {
            let finished = Arc::clone(&finished);
            pool.submit(async move {
                if n == 0 {
                    return Err(TestError::Task("first fails".into()));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(n)
            })
            .unwrap();
        }

        let results = pool.join_all().await;
        assert_eq!(results[0], Err(TestError::Task("first fails".into())));
        assert_eq!(finished.load(Ordering::SeqCst), 4);
        assert_eq!(results[4], Ok(4));
    }

    fn explode() -> Result<u8, TestError> {
        panic!("worker blew up")
    }

    #[tokio::test]
    async fn panic_is_reported_in_its_slot() {
        let mut pool: WorkerPool<u8, TestError> = WorkerPool::new(2);
        pool.submit(async { Ok(1) }).unwrap();
        pool.submit(async { explode() }).unwrap();
        pool.submit(async { Ok(3) }).unwrap();

        let results = pool.join_all().await;
        assert_eq!(results[0], Ok(1));
        assert_eq!(
            results[1],
            Err(TestError::Pool(PoolError::Panicked {
                index: 1,
                message: "worker blew up".into()
            }))
        );
        assert_eq!(results[2], Ok(3));
    }

    #[tokio::test]
    async fn closed_pool_rejects_submissions() {
        let mut pool: WorkerPool<u8, TestError> = WorkerPool::new(1);
        let handle = pool.submit(async { Ok(1) }).unwrap();
        assert_eq!(handle.index(), 0);

        pool.close();
        assert!(pool.is_closed());
        assert_eq!(pool.submit(async { Ok(2) }).unwrap_err(), PoolError::Closed);
        assert_eq!(pool.submitted(), 1);

        assert_eq!(pool.join_all().await, vec![Ok(1)]);
    }

    #[tokio::test]
    async fn empty_pool_joins_to_nothing() {
        let pool: WorkerPool<u8, TestError> = WorkerPool::new(4);
        assert!(pool.join_all().await.is_empty());
    }

    #[test]
    fn zero_workers_clamped_to_one() {
        let pool: WorkerPool<u8, TestError> = WorkerPool::new(0);
        assert_eq!(pool.workers(), 1);
    }
}
