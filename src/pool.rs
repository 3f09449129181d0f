//! Bounded fan-out for blocking FFmpeg work.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::AppError;
use crate::ffmpeg::AssemblyOptions;

/// Caps how many transcoding jobs run at once. Clones share the same permits.
#[derive(Debug, Clone)]
pub struct TranscodePool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl TranscodePool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn from_options(options: &AssemblyOptions) -> Self {
        Self::new(options.effective_max_concurrent_transcodes())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Run one blocking job once a permit is free.
    pub async fn run<T, F>(&self, job: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| AppError::from(format!("Transcode pool closed: {}", e)))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| AppError::from(format!("Transcode job panicked: {}", e)))?
    }

    /// Start every job and wait for all of them. One job failing does not
    /// cancel the others; results come back in input order.
    pub async fn run_all<T, F>(&self, jobs: Vec<F>) -> Vec<Result<T, AppError>>
    where
        F: FnOnce() -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let pool = self.clone();
                tokio::spawn(async move { pool.run(job).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(AppError::from(format!("Transcode task failed: {}", e))),
            });
        }
        results
    }
}
