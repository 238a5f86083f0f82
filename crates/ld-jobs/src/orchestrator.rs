//! Comparison-job fan-out across the selected nodes.
//!
//! One orchestration run spawns an independent task per applicable node.
//! Tasks never mutate shared state: each submits its job, polls it, and
//! reports events over a channel to a single driver task that owns every
//! `ActionState` mutation. That keeps the `completed` counter free of
//! lost-update races no matter how node tasks interleave.
//!
//! Cancellation is cooperative. An in-flight job keeps running until its
//! task's next poll boundary notices the cancel flag, issues a cancel to the
//! job service, and reports a cancelled outcome.

use crate::action::{ActionMode, ActionState, SkipReason};
use crate::api::{ActionParams, ActionResult, ActionTarget, ActionType, DiffJobApi, JobId, JobStatus};
use ld_core::NodeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Event reported by a node task to the driver.
#[derive(Debug)]
enum ActionEvent {
    Started { node: NodeId, job_id: JobId },
    Progress { node: NodeId, fraction: f64 },
    Finished { node: NodeId, outcome: NodeOutcome },
}

/// Terminal outcome computed by a node task.
#[derive(Debug)]
enum NodeOutcome {
    Success(ActionResult),
    Error(String),
    Cancelled,
}

/// Everything one node task needs, bundled so the spawn stays readable.
struct NodeTask {
    api: Arc<dyn DiffJobApi>,
    action_type: ActionType,
    node: NodeId,
    params: ActionParams,
    cancel: Arc<AtomicBool>,
    events: mpsc::Sender<ActionEvent>,
    poll_interval: Duration,
}

impl NodeTask {
    async fn run(self) {
        let outcome = self.execute().await;
        let _ = self
            .events
            .send(ActionEvent::Finished {
                node: self.node.clone(),
                outcome,
            })
            .await;
    }

    async fn execute(&self) -> NodeOutcome {
        // Cancelled before submission: the job never reaches the service.
        if self.cancel.load(Ordering::SeqCst) {
            return NodeOutcome::Cancelled;
        }

        let job_id = match self
            .api
            .submit(self.action_type, &self.node, &self.params)
            .await
        {
            Ok(id) => id,
            Err(e) => return NodeOutcome::Error(e.to_string()),
        };

        let _ = self
            .events
            .send(ActionEvent::Started {
                node: self.node.clone(),
                job_id: job_id.clone(),
            })
            .await;

        loop {
            tokio::time::sleep(self.poll_interval).await;

            if self.cancel.load(Ordering::SeqCst) {
                if let Err(e) = self.api.cancel(&job_id).await {
                    log::warn!("cancel of job {} failed: {}", job_id, e);
                }
                return NodeOutcome::Cancelled;
            }

            let poll = match self.api.poll(&job_id).await {
                Ok(poll) => poll,
                Err(e) => return NodeOutcome::Error(e.to_string()),
            };

            match poll.status {
                JobStatus::Running => {
                    if let Some(fraction) = poll.progress {
                        let _ = self
                            .events
                            .send(ActionEvent::Progress {
                                node: self.node.clone(),
                                fraction,
                            })
                            .await;
                    }
                }
                JobStatus::Completed => {
                    // A completed job without an inline result is fetched
                    // later through the job service.
                    let result = poll
                        .result
                        .unwrap_or(ActionResult::Reference { job_id: job_id.clone() });
                    return NodeOutcome::Success(result);
                }
                JobStatus::Failed => {
                    let message = poll
                        .error
                        .unwrap_or_else(|| "job failed without a message".to_string());
                    return NodeOutcome::Error(message);
                }
                JobStatus::Cancelled => return NodeOutcome::Cancelled,
            }
        }
    }
}

/// Handle to a running (or finished) orchestration run.
///
/// Consumers read immutable snapshots; rendering never locks the live state
/// for longer than a clone.
pub struct OrchestratorHandle {
    state: Arc<Mutex<ActionState>>,
    cancel: Arc<AtomicBool>,
    driver: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl OrchestratorHandle {
    /// Start an orchestration run over `targets`.
    ///
    /// Applicability is decided up front: non-applicable nodes are recorded
    /// as skipped before any job is submitted and count toward `completed`
    /// immediately. Must be called from within a tokio runtime.
    pub fn start(
        api: Arc<dyn DiffJobApi>,
        action_type: ActionType,
        mode: ActionMode,
        targets: Vec<ActionTarget>,
        params: ActionParams,
        poll_interval: Duration,
    ) -> Self {
        let mut initial = ActionState::new(action_type, mode, targets.iter().map(|t| t.id.clone()));

        let mut applicable = Vec::new();
        for target in targets {
            match action_type.applicable_to(&target) {
                Ok(()) => applicable.push(target),
                Err(reason) => {
                    log::debug!("skipping {}: {}", target.id, reason);
                    initial.mark_skipped(&target.id, SkipReason::NotApplicable { reason });
                }
            }
        }

        let state = Arc::new(Mutex::new(initial));
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::channel::<ActionEvent>(64);

        for target in applicable {
            let task = NodeTask {
                api: Arc::clone(&api),
                action_type,
                node: target.id,
                params: params.clone(),
                cancel: Arc::clone(&cancel),
                events: tx.clone(),
                poll_interval,
            };
            tokio::spawn(task.run());
        }
        // Driver exits once every node task has dropped its sender
        drop(tx);

        let driver_state = Arc::clone(&state);
        let driver_cancel = Arc::clone(&cancel);
        let driver = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let mut state = lock_state(&driver_state);
                match event {
                    ActionEvent::Started { node, job_id } => state.mark_started(&node, job_id),
                    ActionEvent::Progress { node, fraction } => {
                        state.update_progress(&node, fraction)
                    }
                    ActionEvent::Finished { node, outcome } => match outcome {
                        NodeOutcome::Success(result) => state.mark_success(&node, result),
                        NodeOutcome::Error(message) => state.mark_error(&node, message),
                        NodeOutcome::Cancelled => state.mark_skipped(&node, SkipReason::Cancelled),
                    },
                }
            }
            if driver_cancel.load(Ordering::SeqCst) {
                lock_state(&driver_state).mark_run_cancelled();
            }
        });

        Self {
            state,
            cancel,
            driver: tokio::sync::Mutex::new(Some(driver)),
        }
    }

    /// Clone the current run state.
    pub fn snapshot(&self) -> ActionState {
        lock_state(&self.state).clone()
    }

    /// Request cooperative cancellation of the run.
    ///
    /// Nodes not yet submitted are skipped immediately; in-flight jobs are
    /// cancelled through the job service at their next poll boundary.
    /// Already-terminal nodes keep their recorded outcomes.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        lock_state(&self.state).mark_run_cancelled();
    }

    /// Wait for every node task and the driver to finish.
    pub async fn wait(&self) {
        let handle = self.driver.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::warn!("orchestration driver join error: {}", e);
            }
        }
    }
}

fn lock_state(state: &Arc<Mutex<ActionState>>) -> std::sync::MutexGuard<'_, ActionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
