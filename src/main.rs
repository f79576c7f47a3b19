//! TaskRelay - Background task template with a polling GUI
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + console output)
//! - Tokio runtime (drives the worker's directory-listing subprocess)
//! - State management ([`StateManager`])
//! - GUI controller ([`GuiController`] - trigger button, poll loop, window sync)
//!
//! The application uses two threads of control per run:
//! - **Main thread**: Runs the Slint event loop and the poll timer; never blocks on the worker
//! - **Worker thread**: Sleeps through its progress steps and runs the listing command,
//!   reporting only through the relay queue
//!
//! # Configuration Files
//!
//! Expected in `TaskRelay Data/` directory:
//! - `TaskRelay Config.yaml`: Step count and pacing, poll interval, listing root, window title

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use taskrelay::services::{RunLauncher, ShellLister};
use taskrelay::ui::GuiController;
use taskrelay::{APP_NAME, ConfigManager, Metrics, StateManager, VERSION};

fn main() -> Result<()> {
    // Configuration first: it decides the log level
    let config_manager = ConfigManager::new("TaskRelay Data")?;
    let config = config_manager.load_config()?;
    let settings = config.settings;

    let _log_guard =
        taskrelay::logging::setup_logging("logs", "taskrelay", settings.debug_mode, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!(
        "Settings from {}: {} steps x {}ms, poll every {}ms, listing {}",
        config_manager.config_path(),
        settings.step_count,
        settings.step_delay_ms,
        settings.poll_interval_ms,
        settings.listing_root()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("taskrelay-runtime")
        .build()?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 2);

    let state_manager = Arc::new(StateManager::new());
    let metrics = Arc::new(Metrics::new());

    let lister = ShellLister::new(
        settings.listing_root(),
        settings.listing_timeout(),
        runtime.handle().clone(),
    );
    let launcher = RunLauncher::new(Arc::new(lister), settings.work_plan());

    let gui_controller =
        GuiController::new(state_manager.clone(), metrics.clone(), launcher, &settings)?;

    tracing::info!("GUI controller initialized, launching window");

    // Blocks until the window is closed
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    if state_manager.is_running() {
        // No cancellation: the detached worker ends with the process
        tracing::warn!("Window closed during an active run - abandoning worker");
    }

    metrics.log_summary();

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
