use crate::models::display::DisplayState;

/// Identifier of one run, unique for the lifetime of the process.
pub type RunId = u64;

/// Single source of truth for application state.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Never access it directly - always use [`StateManager`](crate::state::StateManager) methods:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with automatic change events
///
/// # Related Types
///
/// - [`DisplayState`]: What the window renders
/// - [`crate::state::StateChange`]: Event types for state mutations
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Status label, transcript and trigger availability
    pub display: DisplayState,

    /// The run currently relaying into the display, if any
    pub active_run: Option<RunId>,

    // Lifetime counters
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
}

impl AppState {
    pub fn is_running(&self) -> bool {
        self.active_run.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        let state = AppState::default();
        assert!(!state.is_running());
        assert!(state.display.trigger_enabled());
        assert_eq!(state.runs_started, 0);
    }
}
