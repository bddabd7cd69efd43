//! Asynchronous analysis task queue.
//!
//! Owns every [`AnalysisTask`] for the process lifetime: a map of id → task
//! plus a FIFO list of pending ids, both behind one mutex. Nothing here is
//! persisted — task history dies with the process, and callers are expected
//! to know that.
//!
//! Scheduling is deliberately simple: a single worker wakes on a fixed
//! interval and drains at most one task per tick, so analysis runs never
//! overlap. [`AnalysisQueue::tick`] is the drain step on its own, which is
//! what unit tests drive directly; [`start_worker`] wraps it in a stoppable
//! interval loop. `submit` and `get_status` only touch the task table and
//! are safe to call from any number of concurrent callers.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{AnalysisTask, DocumentRef, TaskStatus};
use crate::pipeline;

struct QueueState {
    tasks: HashMap<String, AnalysisTask>,
    pending: VecDeque<String>,
    /// True while a task is between claim and terminal transition. Guards
    /// against overlapping runs when `tick` is invoked concurrently.
    processing: bool,
}

/// The analysis task queue. Construct once at process start and share via
/// [`Arc`].
pub struct AnalysisQueue {
    config: Config,
    state: Mutex<QueueState>,
}

impl AnalysisQueue {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: Mutex::new(QueueState {
                tasks: HashMap::new(),
                pending: VecDeque::new(),
                processing: false,
            }),
        }
    }

    /// Enqueue a batch for analysis and return the new task id.
    ///
    /// Non-blocking: no parsing happens here, only bookkeeping. An empty
    /// batch is rejected — there is nothing a worker could do with it.
    pub fn submit(&self, inputs: Vec<DocumentRef>) -> Result<String> {
        if inputs.is_empty() {
            anyhow::bail!("cannot submit an empty batch");
        }

        let id = Uuid::new_v4().to_string();
        let task = AnalysisTask {
            id: id.clone(),
            inputs,
            status: TaskStatus::Pending,
            result: None,
            error: None,
        };

        let mut state = self.state.lock().unwrap();
        state.pending.push_back(id.clone());
        state.tasks.insert(id.clone(), task);
        info!(task = %id, queued = state.pending.len(), "task submitted");

        Ok(id)
    }

    /// Snapshot of a task by id. `None` means the id was never submitted —
    /// distinct from every task state.
    pub fn get_status(&self, id: &str) -> Option<AnalysisTask> {
        self.state.lock().unwrap().tasks.get(id).cloned()
    }

    /// One scheduler drain step: claim the oldest pending task, run the
    /// pipeline to completion, and record the terminal state. At most one
    /// task is processed per call; returns whether one was.
    ///
    /// A tick that finds no pending task — or another run in flight — is a
    /// no-op. A pipeline error (or panic) becomes the task's `Failed` state
    /// and never propagates to the caller, so the worker loop survives any
    /// single task.
    pub async fn tick(&self) -> bool {
        let claimed = {
            let mut state = self.state.lock().unwrap();
            if state.processing {
                None
            } else {
                match state.pending.pop_front() {
                    Some(id) => {
                        state.processing = true;
                        let inputs = match state.tasks.get_mut(&id) {
                            Some(task) => {
                                task.status = TaskStatus::Processing;
                                task.inputs.clone()
                            }
                            None => Vec::new(),
                        };
                        Some((id, inputs))
                    }
                    None => None,
                }
            }
        };

        let Some((id, inputs)) = claimed else {
            return false;
        };

        info!(task = %id, "task processing");
        let config = self.config.clone();
        let outcome =
            tokio::task::spawn_blocking(move || pipeline::run_analysis(&inputs, &config)).await;

        let mut state = self.state.lock().unwrap();
        state.processing = false;
        if let Some(task) = state.tasks.get_mut(&id) {
            match outcome {
                Ok(Ok(result)) => {
                    task.status = TaskStatus::Completed;
                    task.result = Some(result);
                    info!(task = %id, "task completed");
                }
                Ok(Err(err)) => {
                    task.status = TaskStatus::Failed;
                    task.error = Some(err.to_string());
                    error!(task = %id, error = %err, "task failed");
                }
                Err(join_err) => {
                    task.status = TaskStatus::Failed;
                    task.error = Some(format!("analysis aborted: {}", join_err));
                    error!(task = %id, error = %join_err, "task panicked");
                }
            }
        }
        true
    }
}

/// Handle to a running background worker. Dropping it closes the shutdown
/// channel, which also stops the worker; [`WorkerHandle::stop`] additionally
/// waits for the loop to wind down.
pub struct WorkerHandle {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the worker to stop and wait for it to wind down. An in-flight
    /// task finishes its tick first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

/// Start the background worker: one [`AnalysisQueue::tick`] per interval.
pub fn start_worker(queue: Arc<AnalysisQueue>, tick_interval: Duration) -> WorkerHandle {
    let (shutdown, mut shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    queue.tick().await;
                }
            }
        }
    });
    WorkerHandle { shutdown, handle }
}
