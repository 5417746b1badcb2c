use course_core::{CoreError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

pub const DEFAULT_WORKERS: usize = 2;

/// Bounded pool for independent jobs such as model calls.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job with at most `workers` in flight. Results come back in
    /// the order the jobs were given; the first failing job fails the batch.
    ///
    /// Jobs still running when the batch ends early (a failure, or the
    /// caller dropping this future on a deadline) are aborted.
    pub async fn run_all<T, F, Fut>(&self, jobs: Vec<F>) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut results: Vec<Option<T>> = jobs.iter().map(|_| None).collect();
        let mut set = JoinSet::new();

        for (index, job) in jobs.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        debug!(job = index, "Worker started");
                        job().await
                    }
                    Err(e) => Err(CoreError::InvalidState(format!("worker pool closed: {}", e))),
                };
                (index, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            let (index, result) = joined
                .map_err(|e| CoreError::InvalidState(format!("worker panicked: {}", e)))?;
            results[index] = Some(result?);
        }

        results
            .into_iter()
            .map(|slot| slot.ok_or_else(|| CoreError::InvalidState("job result missing".into())))
            .collect()
    }
}
