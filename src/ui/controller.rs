// GUI Controller - Bridges the Slint window with the run lifecycle
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - StateManager (display state and run guard)
// - RunLauncher (worker threads)
//
// It handles:
// - The trigger callback → launching a run
// - The timer-driven poll loop → one notification per tick
// - Mirroring display state into window properties
// - Feeding metrics from state change events

use crate::metrics::Metrics;
use crate::models::RelaySettings;
use crate::services::poller::PollOutcome;
use crate::services::run::{ActiveRun, RunLauncher};
use crate::state::{RunError, StateChange, StateManager};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;

// Include the generated Slint code
slint::include_modules!();

/// Everything a scheduled poll tick needs, moved from one timer callback to the next.
struct PollContext {
    ui_weak: slint::Weak<MainWindow>,
    state: Arc<StateManager>,
    metrics: Arc<Metrics>,
    interval: Duration,
    started: Instant,
}

/// GUI Controller that wires up the Slint UI with application state and logic
///
/// # Example
/// ```ignore
/// let state_manager = Arc::new(StateManager::new());
/// let metrics = Arc::new(Metrics::new());
/// let launcher = RunLauncher::new(Arc::new(lister), settings.work_plan());
///
/// let controller = GuiController::new(state_manager, metrics, launcher, &settings)?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Shared state manager
    _state_manager: Arc<StateManager>,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `state_manager` - Shared display state and run guard
    /// * `metrics` - Counters fed by the poll loop and state events
    /// * `launcher` - Starts worker threads when the trigger is pressed
    /// * `settings` - Window title and poll interval
    pub fn new(
        state_manager: Arc<StateManager>,
        metrics: Arc<Metrics>,
        launcher: RunLauncher,
        settings: &RelaySettings,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        ui.set_window_title(settings.window_title.clone().into());

        Self::sync_ui_with_state(&ui, &state_manager);
        Self::setup_callbacks(
            &ui,
            &state_manager,
            &metrics,
            launcher,
            settings.poll_interval(),
        );
        Self::setup_state_subscription(&state_manager, &metrics);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _state_manager: state_manager,
        })
    }

    /// Run the GUI (blocks until window is closed)
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Copy status, transcript and trigger availability into the window.
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        state_manager.read(|state| {
            let display = &state.display;
            ui.set_status_text(display.status_text().into());
            if ui.get_log_text().len() != display.log().len() {
                ui.set_log_text(display.log().into());
            }
            ui.set_trigger_enabled(display.trigger_enabled());
        });
    }

    /// Set up Slint UI callbacks
    fn setup_callbacks(
        ui: &MainWindow,
        state_manager: &Arc<StateManager>,
        metrics: &Arc<Metrics>,
        launcher: RunLauncher,
        poll_interval: Duration,
    ) {
        let ui_weak = ui.as_weak();
        let state = Arc::clone(state_manager);
        let metrics = Arc::clone(metrics);

        ui.on_trigger_run(move || {
            tracing::info!("Trigger button clicked");

            match launcher.launch(&state) {
                Ok(run) => {
                    if let Some(ui) = ui_weak.upgrade() {
                        Self::sync_ui_with_state(&ui, &state);
                    }

                    let ctx = PollContext {
                        ui_weak: ui_weak.clone(),
                        state: Arc::clone(&state),
                        metrics: Arc::clone(&metrics),
                        interval: poll_interval,
                        started: Instant::now(),
                    };
                    Self::schedule_poll(Duration::ZERO, run, ctx);
                }
                Err(RunError::AlreadyActive(active)) => {
                    // The button is disabled while a run is active; this only fires on a race
                    metrics.record_trigger_rejected();
                    tracing::warn!("Trigger ignored - run {} is still active", active);
                }
                Err(e) => {
                    tracing::error!("Failed to start background process: {}", e);
                    state.update(|s| {
                        s.display
                            .append(&format!("Could not start background process: {}\n", e))
                    });
                    if let Some(ui) = ui_weak.upgrade() {
                        Self::sync_ui_with_state(&ui, &state);
                    }
                }
            }
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Schedule one poll tick on the Slint event loop.
    ///
    /// Each tick resubmits itself with the poll interval until the run reports a
    /// terminal notification or the window is gone.
    fn schedule_poll(delay: Duration, mut run: ActiveRun, ctx: PollContext) {
        slint::Timer::single_shot(delay, move || {
            let outcome = run.tick(&ctx.state);
            ctx.metrics
                .record_tick(!matches!(outcome, PollOutcome::Idle));

            let Some(ui) = ctx.ui_weak.upgrade() else {
                tracing::debug!("Window dropped - stopping poll loop for run {}", run.run_id());
                return;
            };
            Self::sync_ui_with_state(&ui, &ctx.state);

            if outcome.should_reschedule() {
                let interval = ctx.interval;
                Self::schedule_poll(interval, run, ctx);
            } else {
                ctx.metrics.record_run_time(ctx.started.elapsed());
            }
        });
    }

    /// Subscribe to state changes for metrics and lifecycle logging
    ///
    /// This spawns a background thread that listens for state change events.
    /// It never touches the UI.
    fn setup_state_subscription(state_manager: &StateManager, metrics: &Arc<Metrics>) {
        let mut rx = state_manager.subscribe();
        let metrics = Arc::clone(metrics);

        let spawned = std::thread::Builder::new()
            .name("taskrelay-state".to_string())
            .spawn(move || {
                tracing::debug!("State subscription thread started");

                loop {
                    match rx.blocking_recv() {
                        Ok(change) => Self::record_state_change(&metrics, change),
                        Err(RecvError::Closed) => {
                            tracing::info!(
                                "State broadcast channel closed - shutting down subscription thread"
                            );
                            break;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                "State subscription lagged - {} events were skipped",
                                skipped
                            );
                        }
                    }
                }

                tracing::debug!("State subscription thread terminated gracefully");
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to start state subscription thread: {}", e);
        }
    }

    fn record_state_change(metrics: &Metrics, change: StateChange) {
        match change {
            StateChange::RunStarted { run_id } => {
                tracing::info!("Run {} started", run_id);
                metrics.record_run_started();
            }
            StateChange::RunFinished { run_id, status } => {
                tracing::info!("Run {} finished: {}", run_id, status.label());
                if status == crate::models::RunStatus::Failed {
                    metrics.record_run_failed();
                } else {
                    metrics.record_run_completed();
                }
            }
            StateChange::StatusChanged { status } => {
                tracing::debug!("Status: {}", status.label());
            }
            StateChange::LogAppended { appended } => {
                tracing::trace!("Transcript +{} bytes", appended.len());
            }
            StateChange::TriggerAvailabilityChanged { enabled } => {
                tracing::debug!("Trigger enabled: {}", enabled);
            }
        }
    }
}
