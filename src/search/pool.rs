//! Bounded worker pool for blocking jobs
//!
//! Jobs run on tokio's blocking threads, at most `size` at a time. Once
//! [`WorkerPool::shutdown`] is called, new submissions fail and jobs still
//! waiting for a slot give up with [`PoolError::ShutDown`]; jobs already
//! running finish normally.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::PoolError;

/// Default number of concurrent jobs
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl WorkerPool {
    /// Create a pool running up to `size` jobs at once (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }

    /// Queue a blocking job
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F, T>(&self, job: F) -> Result<JoinHandle<Result<T, PoolError>>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_shut_down() {
            return Err(PoolError::ShutDown);
        }
        let permits = Arc::clone(&self.permits);
        Ok(tokio::spawn(async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PoolError::ShutDown)?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job()
            })
            .await
            .map_err(|e| PoolError::JobFailed(e.to_string()))
        }))
    }

    /// Stop accepting jobs
    pub fn shutdown(&self) {
        if !self.is_shut_down() {
            tracing::debug!(size = self.size, "shutting down worker pool");
        }
        self.permits.close();
    }
}
