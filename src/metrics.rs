// Performance metrics module
//
// Provides lightweight counters for monitoring runs and the poll loop

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Application metrics
///
/// Uses atomic operations for thread-safe tracking without locks. Run counters are fed
/// by the state subscription thread; poll counters by the UI thread.
#[derive(Debug)]
pub struct Metrics {
    /// Runs that claimed the trigger
    pub runs_started: AtomicU64,

    /// Runs that ended with DONE
    pub runs_completed: AtomicU64,

    /// Runs that ended with FAILED
    pub runs_failed: AtomicU64,

    /// Trigger presses rejected because a run was active
    pub triggers_rejected: AtomicU64,

    /// Notifications applied to the display
    pub notifications_delivered: AtomicU64,

    /// Poll ticks executed
    pub poll_ticks: AtomicU64,

    /// Poll ticks that found the queue empty
    pub idle_ticks: AtomicU64,

    /// Total wall time of finished runs in milliseconds
    pub total_run_time_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            triggers_rejected: AtomicU64::new(0),
            notifications_delivered: AtomicU64::new(0),
            poll_ticks: AtomicU64::new(0),
            idle_ticks: AtomicU64::new(0),
            total_run_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trigger_rejected(&self) {
        self.triggers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one poll tick and whether it delivered a notification
    pub fn record_tick(&self, delivered: bool) {
        self.poll_ticks.fetch_add(1, Ordering::Relaxed);
        if delivered {
            self.notifications_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.idle_ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_run_time(&self, duration: Duration) {
        self.total_run_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average wall time per finished run in milliseconds
    pub fn avg_run_time_ms(&self) -> f64 {
        let total = self.total_run_time_ms.load(Ordering::Relaxed);
        let count = self.runs_completed.load(Ordering::Relaxed) + self.runs_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Runs: {} started, {} completed, {} failed, {} triggers rejected",
            self.runs_started.load(Ordering::Relaxed),
            self.runs_completed.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed),
            self.triggers_rejected.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Poll ticks: {} ({} idle), notifications delivered: {}, avg run {:.0}ms",
            self.poll_ticks.load(Ordering::Relaxed),
            self.idle_ticks.load(Ordering::Relaxed),
            self.notifications_delivered.load(Ordering::Relaxed),
            self.avg_run_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
