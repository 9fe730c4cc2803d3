//! Bounded-concurrency execution of independent tasks.
//!
//! Every task is attempted regardless of how its siblings fare. Results come
//! back as a list with one slot per input task, in input order, whatever the
//! order of completion. A panicking task is captured in its slot instead of
//! tearing down the batch.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Why a scheduled task produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure<E> {
    /// The task ran and returned an error.
    Failed(E),
    /// The task panicked; the payload message is kept.
    Panicked(String),
    /// The task was cancelled by the runtime before reporting.
    Aborted,
}

/// Outcome of one scheduled task.
pub type TaskResult<T, E> = Result<T, TaskFailure<E>>;

/// Runs batches of tasks with at most `max_concurrency` in flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskScheduler {
    max_concurrency: Option<usize>,
}

impl TaskScheduler {
    /// A scheduler with no concurrency bound.
    pub fn unbounded() -> Self {
        Self {
            max_concurrency: None,
        }
    }

    /// A scheduler running at most `limit` tasks at once (minimum 1).
    pub fn bounded(limit: usize) -> Self {
        Self {
            max_concurrency: Some(limit.max(1)),
        }
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    /// Run every task and return one result slot per task, in input order.
    ///
    /// Tasks are dispatched in input order: a task only starts once a
    /// concurrency permit is free, and permits are handed out in order.
    pub async fn run<T, E, Fut>(&self, tasks: Vec<Fut>) -> Vec<TaskResult<T, E>>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let total = tasks.len();
        let semaphore = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let mut join_set = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let permit = match &semaphore {
                // The semaphore is never closed.
                Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
                None => None,
            };

            join_set.spawn(async move {
                let outcome = AssertUnwindSafe(task).catch_unwind().await;
                drop(permit);
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<TaskResult<T, E>>> = (0..total).map(|_| None).collect();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(result))) => {
                    slots[index] = Some(result.map_err(TaskFailure::Failed));
                }
                Ok((index, Err(payload))) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(task = index, panic = %message, "scheduled task panicked");
                    slots[index] = Some(Err(TaskFailure::Panicked(message)));
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduled task did not complete");
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(TaskFailure::Aborted)))
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn failing_slot_does_not_abort_siblings() {
        let scheduler = TaskScheduler::bounded(2);
        let tasks: Vec<_> = (0..5)
            .map(|i| async move {
                if i == 3 {
                    Err(format!("task {i} failed"))
                } else {
                    Ok(i * 10)
                }
            })
            .collect();

        let results = scheduler.run(tasks).await;
        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            if i == 3 {
                assert_eq!(
                    result,
                    &Err(TaskFailure::Failed("task 3 failed".to_string()))
                );
            } else {
                assert_eq!(result, &Ok(i * 10));
            }
        }
    }

    #[tokio::test]
    async fn results_follow_input_order_not_completion_order() {
        let scheduler = TaskScheduler::unbounded();
        let tasks: Vec<_> = [40u64, 5, 20, 0]
            .into_iter()
            .enumerate()
            .map(|(i, delay)| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, ()>(i)
            })
            .collect();

        let results = scheduler.run(tasks).await;
        assert_eq!(results, vec![Ok(0), Ok(1), Ok(2), Ok(3)]);
    }

    #[tokio::test]
    async fn concurrency_limit_is_respected() {
        let scheduler = TaskScheduler::bounded(3);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, ()>(())
                }
            })
            .collect();

        let results = scheduler.run(tasks).await;
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn panic_is_captured_in_its_slot() {
        let scheduler = TaskScheduler::bounded(2);
        let tasks: Vec<_> = (0..3)
            .map(|i| async move {
                if i == 1 {
                    panic!("gateway exploded");
                }
                Ok::<_, String>(i)
            })
            .collect();

        let results = scheduler.run(tasks).await;
        assert_eq!(results[0], Ok(0));
        assert_eq!(
            results[1],
            Err(TaskFailure::Panicked("gateway exploded".to_string()))
        );
        assert_eq!(results[2], Ok(2));
    }

    #[tokio::test]
    async fn empty_batch_returns_empty_list() {
        let scheduler = TaskScheduler::bounded(4);
        let tasks: Vec<std::future::Ready<Result<(), ()>>> = Vec::new();
        assert!(scheduler.run(tasks).await.is_empty());
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(TaskScheduler::bounded(0).max_concurrency(), Some(1));
        assert_eq!(TaskScheduler::unbounded().max_concurrency(), None);
    }
}
