/// Coarse run status shown in the window's status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Text rendered in the status label.
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Idle => "Ready to run.",
            RunStatus::Running => "Background Process is Running",
            RunStatus::Completed => "Background Process Completed",
            RunStatus::Failed => "Background Process Failed",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Passive state behind the window: status label, transcript and trigger availability.
///
/// Only the UI thread mutates this, through the poller and the run guard.
/// The transcript is append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    status: RunStatus,
    log: String,
    trigger_enabled: bool,
}

impl DisplayState {
    pub fn new() -> Self {
        Self {
            status: RunStatus::Idle,
            log: String::new(),
            trigger_enabled: true,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn status_text(&self) -> &'static str {
        self.status.label()
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled
    }

    pub fn set_status(&mut self, status: RunStatus) {
        self.status = status;
    }

    pub fn append(&mut self, text: &str) {
        self.log.push_str(text);
    }

    pub fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = enabled;
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}
