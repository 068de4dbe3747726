//! Bounded-concurrency worker pool for page audits.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::warn;

/// Caps how many jobs run at once. A limit of 1 is strictly serial.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    /// A zero limit is treated as 1.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `job` over every item, at most `limit` at a time.
    ///
    /// Output order matches input order. A job that panics is logged and
    /// left out.
    pub async fn run_all<T, R, F, Fut>(&self, items: Vec<T>, job: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let job = Arc::new(job);
        let handles = items.into_iter().map(|item| {
            let semaphore = self.semaphore.clone();
            let job = job.clone();
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                Some(job(item).await)
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Worker task failed: {}", e);
                    None
                }
            })
            .collect()
    }
}
