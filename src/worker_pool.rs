//! Launches the tasks of one phase and waits for every one of them.
//!
//! With no worker bound each task gets its own blocking thread. With a bound of
//! `n`, the tasks are queued on an spmc channel drained by `n` workers. Either
//! way `run_phase` returns only after every launched task has finished.

use crate::coordinator_node::Phase;
use crate::error::{MrError, Result};
use crate::worker_node::Worker;
use crate::Task;
use std::sync::Arc;
use tokio::task::{self, JoinError, JoinHandle};
use tracing::{debug, info};

/// What one phase launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRun {
    pub tasks: usize,
    /// Blocking threads spawned to execute the tasks
    pub workers: usize,
}

/// Run `tasks` on `worker` and block until all of them finished.
pub async fn run_phase(
    phase: Phase,
    worker: Arc<Worker>,
    tasks: Vec<Task>,
    max_workers: Option<usize>,
) -> Result<PhaseRun> {
    let total_tasks = tasks.len();

    let handles = match max_workers {
        None => {
            info!("{:?}: launching one worker per task ({} tasks)", phase, total_tasks);
            spawn_per_task(worker, tasks)
        }
        Some(0) => return Err(MrError::invalid("max_workers must be greater than 0 when set")),
        Some(limit) => {
            let n_workers = limit.min(total_tasks);
            info!(
                "{:?}: {} tasks queued for {} workers",
                phase, total_tasks, n_workers
            );
            spawn_bounded(phase, worker, tasks, n_workers)?
        }
    };

    let workers = handles.len();
    wait_all(phase, handles).await?;
    debug!("{:?}: all {} tasks completed", phase, total_tasks);
    Ok(PhaseRun {
        tasks: total_tasks,
        workers,
    })
}

fn spawn_per_task(worker: Arc<Worker>, tasks: Vec<Task>) -> Vec<JoinHandle<Result<()>>> {
    tasks
        .into_iter()
        .map(|task| {
            let worker = worker.clone();
            task::spawn_blocking(move || worker.start_executor(task))
        })
        .collect()
}

fn spawn_bounded(
    phase: Phase,
    worker: Arc<Worker>,
    tasks: Vec<Task>,
    n_workers: usize,
) -> Result<Vec<JoinHandle<Result<()>>>> {
    let (mut pending_task_tx, pending_task_rx) = spmc::channel();

    // queue everything up front so workers stop once the queue is drained
    for task in tasks {
        pending_task_tx
            .send(task)
            .map_err(|_| MrError::WorkerTaskFailure {
                phase,
                reason: "task queue closed before all tasks were queued".to_string(),
            })?;
    }
    drop(pending_task_tx);

    let handles = (0..n_workers)
        .map(|_| {
            let worker = worker.clone();
            let pending_task_rx = pending_task_rx.clone();
            task::spawn_blocking(move || {
                while let Ok(task) = pending_task_rx.recv() {
                    worker.start_executor(task)?;
                }
                Ok(())
            })
        })
        .collect();

    Ok(handles)
}

/// Barrier: await every handle, even after a failure, and report the first error.
async fn wait_all(phase: Phase, handles: Vec<JoinHandle<Result<()>>>) -> Result<()> {
    let mut first_error = None;

    for handle in handles {
        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(join_failure(phase, join_error)),
        };
        if let Err(e) = outcome {
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn join_failure(phase: Phase, join_error: JoinError) -> MrError {
    if join_error.is_cancelled() {
        return MrError::InterruptedWait { phase };
    }

    let reason = match join_error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "task panicked".to_string()),
        Err(join_error) => join_error.to_string(),
    };
    MrError::WorkerTaskFailure { phase, reason }
}
