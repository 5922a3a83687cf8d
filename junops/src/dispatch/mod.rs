//! Concurrent fan-out of device tasks.
//!
//! Concurrency is bounded by a semaphore; results come back in input order
//! whatever order the tasks finish in.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, Instrument};

use crate::errors::OpsError;
use crate::session::Connector;
use crate::tasks::{self, DeviceTask, TaskInput, TaskResult};
use crate::utils::default_concurrency;

/// Dispatcher options
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Maximum number of tasks in flight
    pub concurrency: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Run `f` over `items` with at most `concurrency` calls in flight.
///
/// `concurrency` is clamped to `1..=Semaphore::MAX_PERMITS`.
/// `results[i]` belongs to `items[i]`. A call that panics yields an error
/// in its own slot and leaves every other slot alone.
pub async fn map_concurrently<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    f: F,
) -> Vec<Result<R, OpsError>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS)));
    let f = Arc::new(f);
    let mut handles = Vec::with_capacity(items.len());

    for item in items {
        let sem = Arc::clone(&semaphore);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(
            async move {
                let _permit = sem.acquire().await;
                f(item).await
            }
            .in_current_span(),
        ));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (i, handle) in handles.into_iter().enumerate() {
        results.push(handle.await.map_err(|e| {
            debug!("Worker {} did not complete: {}", i, e);
            OpsError::Internal(format!("worker failed: {}", e))
        }));
    }
    results
}

/// Run `task` against every input. One result per input, same order.
pub async fn dispatch(
    task: Arc<dyn DeviceTask>,
    connector: Arc<dyn Connector>,
    inputs: Vec<TaskInput>,
    options: &DispatchOptions,
) -> Vec<TaskResult> {
    let targets: Vec<_> = inputs.iter().map(|input| input.target.clone()).collect();
    debug!(
        "Dispatching {} {} tasks, concurrency {}",
        inputs.len(),
        task.name(),
        options.concurrency
    );

    let results = map_concurrently(inputs, options.concurrency, move |input| {
        let task = Arc::clone(&task);
        let connector = Arc::clone(&connector);
        async move { tasks::execute(task.as_ref(), connector.as_ref(), input).await }
    })
    .await;

    results
        .into_iter()
        .zip(targets)
        .map(|(result, target)| result.unwrap_or_else(|e| TaskResult::failure(&target, e)))
        .collect()
}
