// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for interested listeners.

use crate::models::{AppState, RunId, RunStatus};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

/// Change events emitted when state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A run claimed the trigger
    RunStarted { run_id: RunId },

    /// A run delivered its terminal notification
    RunFinished { run_id: RunId, status: RunStatus },

    /// The status label changed
    StatusChanged { status: RunStatus },

    /// Text was appended to the transcript
    LogAppended { appended: String },

    /// The trigger button was enabled or disabled
    TriggerAvailabilityChanged { enabled: bool },
}

/// Errors raised by the run guard
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RunError {
    #[error("Run {0} is still active")]
    AlreadyActive(RunId),

    #[error("Run {0} is not the active run")]
    NotActive(RunId),

    #[error("Failed to start worker thread: {0}")]
    Spawn(String),
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Guards the trigger so that only one run is active at a time
///
/// # Usage
///
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
/// - [`begin_run()`](Self::begin_run) / [`finish_run()`](Self::finish_run) for the run guard
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let running = state_manager.read(|state| state.is_running());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        match (old.active_run, new.active_run) {
            (None, Some(run_id)) => changes.push(StateChange::RunStarted { run_id }),
            (Some(run_id), None) => changes.push(StateChange::RunFinished {
                run_id,
                status: new.display.status(),
            }),
            _ => {}
        }

        if old.display.status() != new.display.status() {
            changes.push(StateChange::StatusChanged {
                status: new.display.status(),
            });
        }

        let (old_log, new_log) = (old.display.log(), new.display.log());
        if new_log.len() > old_log.len() && new_log.starts_with(old_log) {
            changes.push(StateChange::LogAppended {
                appended: new_log[old_log.len()..].to_string(),
            });
        }

        if old.display.trigger_enabled() != new.display.trigger_enabled() {
            changes.push(StateChange::TriggerAvailabilityChanged {
                enabled: new.display.trigger_enabled(),
            });
        }

        changes
    }

    /// Claim the trigger for a new run.
    ///
    /// Fails with [`RunError::AlreadyActive`] while another run is still relaying.
    /// On success the trigger is disabled until [`finish_run`](Self::finish_run).
    pub fn begin_run(&self) -> Result<RunId, RunError> {
        let mut claim: Result<RunId, RunId> = Ok(0);
        self.update(|state| {
            claim = match state.active_run {
                Some(active) => Err(active),
                None => {
                    state.runs_started += 1;
                    state.active_run = Some(state.runs_started);
                    state.display.set_trigger_enabled(false);
                    Ok(state.runs_started)
                }
            };
        });
        claim.map_err(RunError::AlreadyActive)
    }

    /// Release the trigger after `run_id` delivered its terminal notification.
    pub fn finish_run(&self, run_id: RunId, status: RunStatus) -> Result<Vec<StateChange>, RunError> {
        if self.read(|s| s.active_run) != Some(run_id) {
            return Err(RunError::NotActive(run_id));
        }

        Ok(self.update(|state| {
            state.active_run = None;
            state.display.set_trigger_enabled(true);
            match status {
                RunStatus::Failed => state.runs_failed += 1,
                _ => state.runs_completed += 1,
            }
        }))
    }

    /// Release the trigger for a run whose worker never started.
    pub fn abandon_run(&self, run_id: RunId) -> Vec<StateChange> {
        self.update(|state| {
            if state.active_run == Some(run_id) {
                state.active_run = None;
                state.display.set_trigger_enabled(true);
            }
        })
    }

    pub fn is_running(&self) -> bool {
        self.read(|s| s.is_running())
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
