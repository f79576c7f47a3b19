//! Services module - the background task relay, free of any GUI code.
//!
//! # Components
//!
//! - [`relay`]: Unbounded FIFO carrying [`Notification`](crate::models::Notification)s from
//!   one worker thread to the UI thread. One fresh pair per run.
//! - [`worker`]: The unit of work. Pushes READY, a fixed number of RUNNING steps, the output of
//!   a platform directory listing, then exactly one DONE or FAILED.
//! - [`poller`]: Drains at most one notification per tick into a
//!   [`DisplayState`](crate::models::DisplayState) and reports when to stop rescheduling.
//! - [`run`]: Launches a run behind the single-run trigger guard and ticks it to completion.
//!
//! # Threading
//!
//! The worker runs on its own OS thread and may sleep or block freely. Everything else in
//! this module is called from the UI thread and never waits on the worker.
//!
//! # Usage Example
//!
//! ```ignore
//! use taskrelay::services::{RunLauncher, ShellLister, WorkPlan};
//!
//! let lister = ShellLister::new("/", Duration::from_secs(30), runtime.handle().clone());
//! let launcher = RunLauncher::new(Arc::new(lister), WorkPlan::default());
//!
//! let mut run = launcher.launch(&state_manager)?;
//! while run.tick(&state_manager).should_reschedule() {
//!     // the GUI does this from a timer instead
//! }
//! ```

pub mod poller;
pub mod relay;
pub mod run;
pub mod worker;

pub use poller::{PollOutcome, Poller};
pub use relay::{Pop, RelayReceiver, RelaySender};
pub use run::{ActiveRun, RunLauncher};
pub use worker::{DirectoryLister, ShellLister, WorkPlan, WorkerError, run_worker, spawn_worker};
