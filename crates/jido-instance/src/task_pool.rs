//! Task pool — bounded concurrency for the async work directive executors
//! hand off (delayed delivery, spawn follow-ups, emit fan-out) so one busy
//! agent can't starve the others (spec §4.1 "Task pool").

use jido_core::TaskPool;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A `tokio::spawn`-backed pool gated by a semaphore, the same bounded-
/// concurrency shape as the teacher's per-layer `Semaphore::new(1)` gates in
/// `agenticlaw-consciousness`, generalized from a fixed gate-of-one to a
/// configurable capacity.
pub struct SemaphoreTaskPool {
    permits: Arc<Semaphore>,
}

impl SemaphoreTaskPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }
}

impl TaskPool for SemaphoreTaskPool {
    fn spawn(&self, task: Pin<Box<dyn Future<Output = ()> + Send>>) {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            task.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn spawned_tasks_all_run() {
        let pool = SemaphoreTaskPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let counter = counter.clone();
            pool.spawn(Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }
}
