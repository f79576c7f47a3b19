// Run lifecycle - ties the trigger guard, relay, worker thread and poller together
//
// A run is launched from the UI thread, ticked from the UI thread, and releases the
// trigger guard from the UI thread once its terminal notification is displayed.

use crate::models::{RunId, RunState, RunStatus};
use crate::services::poller::{PollOutcome, Poller};
use crate::services::relay;
use crate::services::worker::{DirectoryLister, WorkPlan, spawn_worker};
use crate::state::{RunError, StateManager};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Starts runs against a fixed lister and work plan.
#[derive(Clone)]
pub struct RunLauncher {
    lister: Arc<dyn DirectoryLister>,
    plan: WorkPlan,
}

impl RunLauncher {
    pub fn new(lister: Arc<dyn DirectoryLister>, plan: WorkPlan) -> Self {
        Self { lister, plan }
    }

    pub fn plan(&self) -> &WorkPlan {
        &self.plan
    }

    /// Claim the trigger, create a fresh relay and start the worker thread.
    ///
    /// # Errors
    /// - [`RunError::AlreadyActive`] if another run has not finished yet
    /// - [`RunError::Spawn`] if the worker thread could not be created
    pub fn launch(&self, state: &StateManager) -> Result<ActiveRun, RunError> {
        let run_id = state.begin_run()?;
        let (sender, receiver) = relay::channel();

        let worker = match spawn_worker(sender, Arc::clone(&self.lister), self.plan) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Failed to spawn worker for run {}: {}", run_id, e);
                state.abandon_run(run_id);
                return Err(RunError::Spawn(e.to_string()));
            }
        };

        tracing::info!("Run {} launched", run_id);

        Ok(ActiveRun {
            run_id,
            poller: Poller::new(receiver),
            worker: Some(worker),
            finished: None,
        })
    }
}

/// A launched run awaiting its notifications.
pub struct ActiveRun {
    run_id: RunId,
    poller: Poller,
    worker: Option<JoinHandle<RunState>>,
    finished: Option<RunStatus>,
}

impl ActiveRun {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Apply at most one notification to the shared display.
    ///
    /// When the terminal notification lands the trigger guard is released.
    pub fn tick(&mut self, state: &StateManager) -> PollOutcome {
        if let Some(status) = self.finished {
            return PollOutcome::Finished(status);
        }

        let mut outcome = PollOutcome::Idle;
        state.update(|s| outcome = self.poller.tick(&mut s.display));

        if let PollOutcome::Finished(status) = outcome {
            self.release(state, status);
        }

        outcome
    }

    fn release(&mut self, state: &StateManager, status: RunStatus) {
        self.finished = Some(status);
        if let Err(e) = state.finish_run(self.run_id, status) {
            tracing::warn!("Could not release run {}: {}", self.run_id, e);
        }

        // The worker exits right after its terminal push; only reap it if it already has
        match self.worker.take() {
            Some(handle) if handle.is_finished() => {
                if handle.join().is_err() {
                    tracing::warn!("Worker thread for run {} ended abnormally", self.run_id);
                }
            }
            _ => {}
        }

        tracing::info!(
            "Run {} finished: {:?} after {} ticks ({} idle, {} notifications)",
            self.run_id,
            status,
            self.poller.ticks(),
            self.poller.idle_ticks(),
            self.poller.delivered()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::worker::MockDirectoryLister;
    use std::time::{Duration, Instant};

    fn launcher(listing: &'static str) -> RunLauncher {
        let mut lister = MockDirectoryLister::new();
        lister.expect_list().returning(move || Ok(listing.to_string()));
        RunLauncher::new(
            Arc::new(lister),
            WorkPlan {
                steps: 2,
                step_delay: Duration::ZERO,
            },
        )
    }

    fn drive(run: &mut ActiveRun, state: &StateManager) -> RunStatus {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let PollOutcome::Finished(status) = run.tick(state) {
                return status;
            }
            assert!(Instant::now() < deadline, "run did not finish");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_launch_and_drive_to_completion() {
        let state = StateManager::new();
        let mut run = launcher("root\n").launch(&state).unwrap();

        assert_eq!(drive(&mut run, &state), RunStatus::Completed);

        let snapshot = state.snapshot();
        assert_eq!(
            snapshot.display.log(),
            "Process is starting.\nRunning process... 0\nRunning process... 1\nroot\nProcess Completed.\n"
        );
        assert!(snapshot.display.trigger_enabled());
        assert!(!snapshot.is_running());
    }

    #[test]
    fn test_relaunch_rejected_while_active() {
        let state = StateManager::new();
        let launcher = launcher("");
        let mut run = launcher.launch(&state).unwrap();

        assert!(matches!(launcher.launch(&state), Err(RunError::AlreadyActive(1))));

        drive(&mut run, &state);
        let second = launcher.launch(&state).unwrap();
        assert_eq!(second.run_id(), 2);
    }

    #[test]
    fn test_tick_after_finish_is_inert() {
        let state = StateManager::new();
        let mut run = launcher("x\n").launch(&state).unwrap();
        drive(&mut run, &state);

        let before = state.snapshot().display;
        assert_eq!(run.tick(&state), PollOutcome::Finished(RunStatus::Completed));
        assert_eq!(state.snapshot().display, before);
    }
}
