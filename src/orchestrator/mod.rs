//! Batched, bounded-concurrency scheduling for per-address operations.
//!
//! Every probing stage is just a different operation fed to the same
//! scheduling primitive: [`run_batched`](Orchestrator::run_batched) for the
//! precise-probe and bandwidth stages, [`run_pooled`](Orchestrator::run_pooled)
//! for region resolution.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout_at, Duration, Instant};

use crate::config::{BATCH_DEADLINE, BATCH_PAUSE, COMPLETION_PAUSE};
use crate::error_handling::{ErrorType, ProbeError, ProcessingStats};

/// Runs per-item async operations across a bounded worker pool.
///
/// Batches are sequential; items within a batch run concurrently up to
/// `max_workers`. Results always come back in input order, completed items
/// only: an item whose operation errors is logged and counted, an item still
/// pending at the batch deadline is abandoned (its task keeps running
/// detached, its result is dropped) and counted separately, and neither ever
/// aborts the batch or the run.
pub struct Orchestrator {
    max_workers: usize,
    batch_size: usize,
    batch_deadline: Duration,
    stats: Arc<ProcessingStats>,
}

impl Orchestrator {
    pub fn new(max_workers: usize, batch_size: usize, stats: Arc<ProcessingStats>) -> Self {
        Orchestrator {
            max_workers,
            batch_size,
            batch_deadline: BATCH_DEADLINE,
            stats,
        }
    }

    #[cfg(test)]
    fn with_deadline(mut self, deadline: Duration) -> Self {
        self.batch_deadline = deadline;
        self
    }

    /// Number of batches `item_count` items split into.
    pub fn batch_count(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.batch_size)
    }

    /// Runs `operation` over `items` in fixed-size batches.
    pub async fn run_batched<T, R, F, Fut>(&self, items: Vec<T>, operation: F) -> Vec<(T, R)>
    where
        T: Clone + Display + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ProbeError>> + Send + 'static,
    {
        let total_batches = self.batch_count(items.len());
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut results = Vec::with_capacity(items.len());

        for (batch_index, batch) in items.chunks(self.batch_size).enumerate() {
            log::info!(
                "Processing batch {}/{} ({} addresses)",
                batch_index + 1,
                total_batches,
                batch.len()
            );

            let handles = self.dispatch(batch, &operation, &semaphore);
            let deadline = Instant::now() + self.batch_deadline;

            for (item, handle) in handles {
                match timeout_at(deadline, handle).await {
                    Ok(Ok(Ok(result))) => results.push((item, result)),
                    Ok(Ok(Err(err))) => {
                        self.stats.increment(err.error_type());
                        log::warn!("{}: {}", item, err);
                    }
                    Ok(Err(join_err)) => {
                        self.stats.increment(ErrorType::TaskPanic);
                        log::warn!("Worker task for {} panicked: {}", item, join_err);
                    }
                    Err(_) => {
                        self.stats.increment(ErrorType::OrchestratorDeadline);
                        log::warn!(
                            "{}: still pending at the {}s batch deadline, result abandoned",
                            item,
                            self.batch_deadline.as_secs()
                        );
                    }
                }
                sleep(COMPLETION_PAUSE).await;
            }

            if batch_index + 1 < total_batches {
                sleep(BATCH_PAUSE).await;
            }
        }

        results
    }

    /// Runs `operation` over all `items` at once under the worker pool,
    /// without batching or a deadline. Used for cheap, cached-first
    /// operations such as region resolution, where input-ordered results
    /// matter for logging.
    pub async fn run_pooled<T, R, F, Fut>(&self, items: Vec<T>, operation: F) -> Vec<(T, R)>
    where
        T: Clone + Display + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ProbeError>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let handles = self.dispatch(&items, &operation, &semaphore);

        let mut results = Vec::with_capacity(items.len());
        for (item, handle) in handles {
            match handle.await {
                Ok(Ok(result)) => results.push((item, result)),
                Ok(Err(err)) => {
                    self.stats.increment(err.error_type());
                    log::warn!("{}: {}", item, err);
                }
                Err(join_err) => {
                    self.stats.increment(ErrorType::TaskPanic);
                    log::warn!("Worker task for {} panicked: {}", item, join_err);
                }
            }
        }
        results
    }

    fn dispatch<T, R, F, Fut>(
        &self,
        items: &[T],
        operation: &F,
        semaphore: &Arc<Semaphore>,
    ) -> Vec<(T, tokio::task::JoinHandle<Result<R, ProbeError>>)>
    where
        T: Clone + Display + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ProbeError>> + Send + 'static,
    {
        items
            .iter()
            .map(|item| {
                let item = item.clone();
                let task_item = item.clone();
                let operation = operation.clone();
                let semaphore = Arc::clone(semaphore);
                let handle = tokio::spawn(async move {
                    // The semaphore is never closed while tasks hold an Arc
                    // to it; a failed acquire just runs the operation
                    // unthrottled.
                    let _permit = semaphore.acquire_owned().await.ok();
                    operation(task_item).await
                });
                (item, handle)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn orchestrator(max_workers: usize, batch_size: usize) -> (Orchestrator, Arc<ProcessingStats>) {
        let stats = Arc::new(ProcessingStats::new());
        (
            Orchestrator::new(max_workers, batch_size, Arc::clone(&stats)),
            stats,
        )
    }

    #[tokio::test]
    async fn test_five_items_with_batch_size_two_make_three_batches() {
        let (orchestrator, _stats) = orchestrator(4, 2);
        assert_eq!(orchestrator.batch_count(5), 3);

        let items: Vec<String> = (1..=5).map(|i| format!("10.0.0.{i}")).collect();
        let results = orchestrator
            .run_batched(items.clone(), |item: String| async move {
                Ok::<_, ProbeError>(item.len())
            })
            .await;

        assert_eq!(results.len(), 5);
        let returned: Vec<String> = results.into_iter().map(|(item, _)| item).collect();
        assert_eq!(returned, items);
    }

    #[tokio::test]
    async fn test_results_keep_input_order_despite_completion_order() {
        let (orchestrator, _stats) = orchestrator(4, 4);
        let items = vec!["slow".to_string(), "fast".to_string()];

        let results = orchestrator
            .run_batched(items, |item: String| async move {
                if item == "slow" {
                    sleep(Duration::from_millis(80)).await;
                }
                Ok::<_, ProbeError>(item)
            })
            .await;

        let order: Vec<&str> = results.iter().map(|(item, _)| item.as_str()).collect();
        assert_eq!(order, vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_operation_errors_are_excluded_not_propagated() {
        let (orchestrator, stats) = orchestrator(4, 10);
        let items: Vec<String> = vec!["good".into(), "bad".into(), "also-good".into()];

        let results = orchestrator
            .run_batched(items, |item: String| async move {
                if item == "bad" {
                    Err(ProbeError::ConnectTimeout)
                } else {
                    Ok(item.clone())
                }
            })
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(item, _)| item != "bad"));
        assert_eq!(stats.count(ErrorType::ConnectTimeout), 1);
    }

    #[tokio::test]
    async fn test_deadline_abandons_pending_items_and_counts_them() {
        let (orchestrator, stats) = orchestrator(4, 10);
        let orchestrator = orchestrator.with_deadline(Duration::from_millis(100));
        let items: Vec<String> = vec!["quick".into(), "stuck".into()];

        let results = orchestrator
            .run_batched(items, |item: String| async move {
                if item == "stuck" {
                    sleep(Duration::from_secs(30)).await;
                }
                Ok::<_, ProbeError>(item)
            })
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "quick");
        assert_eq!(stats.count(ErrorType::OrchestratorDeadline), 1);
    }

    #[tokio::test]
    async fn test_pool_bound_is_respected() {
        let (orchestrator, _stats) = orchestrator(2, 16);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let running_outer = Arc::clone(&running);
        let peak_outer = Arc::clone(&peak);
        let items: Vec<String> = (0..8).map(|i| format!("item-{i}")).collect();
        orchestrator
            .run_batched(items, move |_item: String| {
                let running = Arc::clone(&running_outer);
                let peak = Arc::clone(&peak_outer);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, ProbeError>(())
                }
            })
            .await;

        assert!(
            peak.load(Ordering::SeqCst) <= 2,
            "worker pool exceeded its bound: {}",
            peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_run_pooled_returns_all_in_input_order() {
        let (orchestrator, _stats) = orchestrator(3, 1);
        let items: Vec<String> = (0..6).map(|i| format!("198.51.100.{i}")).collect();

        let results = orchestrator
            .run_pooled(items.clone(), |item: String| async move {
                Ok::<_, ProbeError>(item)
            })
            .await;

        let returned: Vec<String> = results.into_iter().map(|(item, _)| item).collect();
        assert_eq!(returned, items);
    }
}
