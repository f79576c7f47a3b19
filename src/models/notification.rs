use std::fmt;

/// Message emitted when a worker begins a run.
pub const READY_MESSAGE: &str = "Process is starting.\n";

/// Message emitted when a worker finishes its run successfully.
pub const COMPLETED_MESSAGE: &str = "Process Completed.\n";

/// Lifecycle tag carried by every [`Notification`].
///
/// A run always produces exactly one `Ready`, any number of `Running`, and
/// exactly one terminal tag (`Done` or `Failed`) as its last notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Ready,
    Running,
    Done,
    Failed,
}

impl RunState {
    /// Whether this state ends a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Ready => "READY",
            RunState::Running => "RUNNING",
            RunState::Done => "DONE",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// A tagged progress message sent from the worker to the UI.
///
/// Fields are private so a notification cannot be altered after it has been
/// pushed onto the relay queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    state: RunState,
    message: Option<String>,
}

impl Notification {
    pub fn new(state: RunState, message: Option<String>) -> Self {
        Self { state, message }
    }

    pub fn ready(message: impl Into<String>) -> Self {
        Self::new(RunState::Ready, Some(message.into()))
    }

    pub fn running(message: impl Into<String>) -> Self {
        Self::new(RunState::Running, Some(message.into()))
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self::new(RunState::Done, Some(message.into()))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(RunState::Failed, Some(message.into()))
    }

    /// Progress line for the zero-based step `index`.
    pub fn step(index: u32) -> Self {
        Self::running(format!("Running process... {}\n", index))
    }

    /// Terminal failure carrying the error text.
    pub fn failure(error: impl fmt::Display) -> Self {
        Self::failed(format!("Process Failed: {}\n", error))
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Message text, or an empty string when the notification carries none.
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RunState::Ready.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Failed.is_terminal());
    }

    #[test]
    fn test_step_message_format() {
        let n = Notification::step(3);
        assert_eq!(n.state(), RunState::Running);
        assert_eq!(n.text(), "Running process... 3\n");
    }

    #[test]
    fn test_failure_message_format() {
        let n = Notification::failure("ls exited with status 2");
        assert_eq!(n.state(), RunState::Failed);
        assert_eq!(n.text(), "Process Failed: ls exited with status 2\n");
    }

    #[test]
    fn test_missing_message_reads_as_empty() {
        let n = Notification::new(RunState::Running, None);
        assert_eq!(n.message(), None);
        assert_eq!(n.text(), "");
    }
}
