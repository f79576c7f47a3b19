use crate::models::{DisplayState, Notification, RunState, RunStatus};
use crate::services::relay::{Pop, RelayReceiver};

/// Transcript line used when a worker vanishes without a terminal notification.
pub const LOST_WORKER_MESSAGE: &str = "worker exited without reporting a result";

/// What one poll tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Queue was empty; nothing changed
    Idle,
    /// A non-terminal notification was applied
    Delivered(RunState),
    /// The run is over; the poller must not be rescheduled
    Finished(RunStatus),
}

impl PollOutcome {
    pub fn should_reschedule(&self) -> bool {
        !matches!(self, PollOutcome::Finished(_))
    }
}

/// Consumes one run's relay queue on the UI thread, one notification per tick.
#[derive(Debug)]
pub struct Poller {
    receiver: RelayReceiver,
    last_state: Option<RunState>,
    finished: Option<RunStatus>,
    ticks: u64,
    idle_ticks: u64,
    delivered: u64,
}

impl Poller {
    pub fn new(receiver: RelayReceiver) -> Self {
        Self {
            receiver,
            last_state: None,
            finished: None,
            ticks: 0,
            idle_ticks: 0,
            delivered: 0,
        }
    }

    /// Apply at most one pending notification to `display`.
    ///
    /// Never waits: an empty queue returns [`PollOutcome::Idle`] immediately.
    /// Once a terminal notification has been applied every later tick returns the
    /// same [`PollOutcome::Finished`] without touching the display.
    pub fn tick(&mut self, display: &mut DisplayState) -> PollOutcome {
        if let Some(status) = self.finished {
            return PollOutcome::Finished(status);
        }

        self.ticks += 1;

        match self.receiver.try_pop() {
            Pop::Empty => {
                self.idle_ticks += 1;
                PollOutcome::Idle
            }
            Pop::Item(notification) => {
                self.delivered += 1;
                self.apply(notification, display)
            }
            Pop::Disconnected => {
                tracing::error!("Relay closed before a terminal notification - marking run failed");
                self.apply(Notification::failure(LOST_WORKER_MESSAGE), display)
            }
        }
    }

    fn apply(&mut self, notification: Notification, display: &mut DisplayState) -> PollOutcome {
        let state = notification.state();
        self.check_order(state);
        self.last_state = Some(state);

        display.append(notification.text());

        match state {
            RunState::Ready | RunState::Running => {
                display.set_status(RunStatus::Running);
                PollOutcome::Delivered(state)
            }
            RunState::Done | RunState::Failed => {
                let status = if state == RunState::Done {
                    RunStatus::Completed
                } else {
                    RunStatus::Failed
                };
                display.set_status(status);
                self.finished = Some(status);
                tracing::debug!(
                    "Poller finished after {} ticks ({} idle, {} delivered)",
                    self.ticks,
                    self.idle_ticks,
                    self.delivered
                );
                PollOutcome::Finished(status)
            }
        }
    }

    fn check_order(&self, next: RunState) {
        match (self.last_state, next) {
            (None, RunState::Ready) => {}
            (None, other) => tracing::warn!("Run began with {} instead of READY", other),
            (Some(_), RunState::Ready) => tracing::warn!("Duplicate READY notification"),
            _ => {}
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::relay;
    use proptest::prelude::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_sample_sequence_builds_transcript() {
        let (tx, rx) = relay::channel();
        tx.push(Notification::ready("start"));
        tx.push(Notification::running("a"));
        tx.push(Notification::running("b"));
        tx.push(Notification::done("end"));

        let mut poller = Poller::new(rx);
        let mut display = DisplayState::new();

        assert_eq!(poller.tick(&mut display), PollOutcome::Delivered(RunState::Ready));
        assert_eq!(display.status(), RunStatus::Running);
        assert_eq!(poller.tick(&mut display), PollOutcome::Delivered(RunState::Running));
        assert_eq!(poller.tick(&mut display), PollOutcome::Delivered(RunState::Running));
        let last = poller.tick(&mut display);
        assert_eq!(last, PollOutcome::Finished(RunStatus::Completed));
        assert!(!last.should_reschedule());

        assert_eq!(display.log(), "startabend");
        assert_eq!(display.status_text(), "Background Process Completed");
    }

    #[test]
    fn test_one_notification_per_tick() {
        let (tx, rx) = relay::channel();
        tx.push(Notification::ready("start"));
        tx.push(Notification::running("a"));

        let mut poller = Poller::new(rx);
        let mut display = DisplayState::new();
        poller.tick(&mut display);

        assert_eq!(display.log(), "start");
        assert_eq!(poller.delivered(), 1);
    }

    #[test]
    fn test_failed_terminal_sets_failed_status() {
        let (tx, rx) = relay::channel();
        tx.push(Notification::ready("start"));
        tx.push(Notification::failure("boom"));

        let mut poller = Poller::new(rx);
        let mut display = DisplayState::new();
        poller.tick(&mut display);

        assert_eq!(poller.tick(&mut display), PollOutcome::Finished(RunStatus::Failed));
        assert_eq!(display.status_text(), "Background Process Failed");
        assert!(display.log().ends_with("Process Failed: boom\n"));
    }

    #[test]
    fn test_nothing_applied_after_terminal() {
        let (tx, rx) = relay::channel();
        tx.push(Notification::ready("start"));
        tx.push(Notification::done("end"));
        tx.push(Notification::running("late"));

        let mut poller = Poller::new(rx);
        let mut display = DisplayState::new();
        poller.tick(&mut display);
        poller.tick(&mut display);

        assert_eq!(poller.tick(&mut display), PollOutcome::Finished(RunStatus::Completed));
        assert_eq!(display.log(), "startend");
        assert_eq!(poller.ticks(), 2);
    }

    #[test]
    fn test_empty_tick_is_idle_and_immediate() {
        let (_tx, rx) = relay::channel();
        let mut poller = Poller::new(rx);
        let mut display = DisplayState::new();

        let start = Instant::now();
        let outcome = poller.tick(&mut display);
        assert!(start.elapsed() < Duration::from_millis(50));

        assert_eq!(outcome, PollOutcome::Idle);
        assert!(outcome.should_reschedule());
        assert_eq!(poller.idle_ticks(), 1);
        assert_eq!(display, DisplayState::new());
    }

    #[test]
    fn test_lost_worker_terminates_polling() {
        let (tx, rx) = relay::channel();
        tx.push(Notification::ready("start"));
        drop(tx);

        let mut poller = Poller::new(rx);
        let mut display = DisplayState::new();
        poller.tick(&mut display);

        assert_eq!(poller.tick(&mut display), PollOutcome::Finished(RunStatus::Failed));
        assert!(display.log().contains(LOST_WORKER_MESSAGE));
        assert!(poller.is_finished());
    }

    #[test]
    fn test_empty_message_appends_nothing() {
        let (tx, rx) = relay::channel();
        tx.push(Notification::ready("start"));
        tx.push(Notification::new(RunState::Running, None));

        let mut poller = Poller::new(rx);
        let mut display = DisplayState::new();
        poller.tick(&mut display);
        poller.tick(&mut display);

        assert_eq!(display.log(), "start");
        assert_eq!(display.status(), RunStatus::Running);
    }

    proptest! {
        #[test]
        fn prop_transcript_preserves_push_order(
            lines in proptest::collection::vec("[a-z]{0,8}\n", 0..20),
            fail in any::<bool>(),
        ) {
            let (tx, rx) = relay::channel();
            tx.push(Notification::ready("start\n"));
            for line in &lines {
                tx.push(Notification::running(line.clone()));
            }
            if fail {
                tx.push(Notification::failed("end\n"));
            } else {
                tx.push(Notification::done("end\n"));
            }

            let mut poller = Poller::new(rx);
            let mut display = DisplayState::new();
            let mut ticks = 0;
            while poller.tick(&mut display).should_reschedule() {
                ticks += 1;
                prop_assert_eq!(poller.delivered(), ticks);
            }

            let expected = format!("start\n{}end\n", lines.concat());
            prop_assert_eq!(display.log(), expected.as_str());
            prop_assert_eq!(poller.delivered(), lines.len() as u64 + 2);
            let status = if fail { RunStatus::Failed } else { RunStatus::Completed };
            prop_assert_eq!(display.status(), status);
        }
    }
}
