use crate::models::notification::{COMPLETED_MESSAGE, READY_MESSAGE};
use crate::models::{Notification, RunState};
use crate::services::relay::RelaySender;
use camino::{Utf8Path, Utf8PathBuf};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::process::Stdio;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Name given to every worker thread.
pub const WORKER_THREAD_NAME: &str = "taskrelay-worker";

/// Fixed unit of work performed by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPlan {
    /// Number of progress steps before the directory listing
    pub steps: u32,
    /// Simulated work per step
    pub step_delay: Duration,
}

impl Default for WorkPlan {
    fn default() -> Self {
        Self {
            steps: 5,
            step_delay: Duration::from_secs(1),
        }
    }
}

/// Errors that can occur inside a worker
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Process error: {0}")]
    Process(#[from] std::io::Error),
}

/// The one external call a worker makes after its progress steps.
#[cfg_attr(test, mockall::automock)]
pub trait DirectoryLister: Send + Sync {
    /// Produce the listing text forwarded verbatim to the transcript.
    fn list(&self) -> Result<String, WorkerError>;
}

/// Lists a directory with the platform shell (`dir` on Windows, `ls` elsewhere).
///
/// The subprocess is driven by tokio so it can be bounded by a timeout; the worker
/// thread blocks on it through the runtime handle.
pub struct ShellLister {
    root: Utf8PathBuf,
    timeout: Duration,
    runtime: tokio::runtime::Handle,
}

impl ShellLister {
    pub fn new(root: impl Into<Utf8PathBuf>, timeout: Duration, runtime: tokio::runtime::Handle) -> Self {
        Self {
            root: root.into(),
            timeout,
            runtime,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Build the listing command for the current platform.
    pub fn listing_command(root: &Utf8Path) -> (String, Command) {
        if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "dir", root.as_str()]);
            ("dir".to_string(), c)
        } else {
            let mut c = Command::new("ls");
            c.arg(root.as_str());
            ("ls".to_string(), c)
        }
    }

    async fn list_async(&self) -> Result<String, WorkerError> {
        let (program, mut cmd) = Self::listing_command(&self.root);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::info!("Executing: {} {}", program, self.root);
        let start = Instant::now();

        let child = cmd.spawn().map_err(|source| WorkerError::Spawn {
            program: program.clone(),
            source,
        })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::warn!("{} timed out after {:?}", program, self.timeout);
                WorkerError::Timeout {
                    program: program.clone(),
                    timeout: self.timeout,
                }
            })??;

        tracing::info!(
            "{} completed in {:.2}s with {}",
            program,
            start.elapsed().as_secs_f32(),
            output.status
        );

        if !output.status.success() {
            return Err(WorkerError::ExitStatus {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DirectoryLister for ShellLister {
    fn list(&self) -> Result<String, WorkerError> {
        self.runtime.block_on(self.list_async())
    }
}

/// Execute one run on the calling thread, reporting through `queue`.
///
/// Always finishes with exactly one terminal notification: `Done` on success,
/// `Failed` if the listing errors or anything in the run panics.
///
/// # Returns
/// The terminal state that was pushed
pub fn run_worker(queue: &RelaySender, lister: &dyn DirectoryLister, plan: &WorkPlan) -> RunState {
    tracing::info!(
        "Worker started: {} steps, {:?} per step",
        plan.steps,
        plan.step_delay
    );

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| perform_steps(queue, lister, plan)));

    let terminal = match outcome {
        Ok(Ok(())) => Notification::done(COMPLETED_MESSAGE),
        Ok(Err(e)) => {
            tracing::error!("Worker failed: {}", e);
            Notification::failure(&e)
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::error!("Worker panicked: {}", reason);
            Notification::failure(format!("worker panicked: {}", reason))
        }
    };

    let state = terminal.state();
    queue.push(terminal);
    tracing::info!("Worker finished with {}", state);
    state
}

fn perform_steps(
    queue: &RelaySender,
    lister: &dyn DirectoryLister,
    plan: &WorkPlan,
) -> Result<(), WorkerError> {
    queue.push(Notification::ready(READY_MESSAGE));

    for i in 0..plan.steps {
        queue.push(Notification::step(i));
        thread::sleep(plan.step_delay);
    }

    let listing = lister.list()?;
    queue.push(Notification::running(listing));
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run [`run_worker`] on a dedicated OS thread.
pub fn spawn_worker(
    queue: RelaySender,
    lister: Arc<dyn DirectoryLister>,
    plan: WorkPlan,
) -> std::io::Result<JoinHandle<RunState>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run_worker(&queue, lister.as_ref(), &plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::relay::{self, Pop, RelayReceiver};

    fn drain(rx: &mut RelayReceiver) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Pop::Item(n) = rx.try_pop() {
            out.push(n);
        }
        out
    }

    fn quick_plan(steps: u32) -> WorkPlan {
        WorkPlan {
            steps,
            step_delay: Duration::ZERO,
        }
    }

    struct PanickingLister;

    impl DirectoryLister for PanickingLister {
        fn list(&self) -> Result<String, WorkerError> {
            panic!("listing exploded");
        }
    }

    #[test]
    fn test_successful_run_sequence() {
        let (tx, mut rx) = relay::channel();
        let mut lister = MockDirectoryLister::new();
        lister
            .expect_list()
            .times(1)
            .returning(|| Ok("bin\netc\nusr\n".to_string()));

        let terminal = run_worker(&tx, &lister, &quick_plan(5));
        assert_eq!(terminal, RunState::Done);

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[0], Notification::ready("Process is starting.\n"));
        for (i, n) in messages[1..6].iter().enumerate() {
            assert_eq!(n.text(), format!("Running process... {}\n", i));
        }
        assert_eq!(messages[6], Notification::running("bin\netc\nusr\n"));
        assert_eq!(messages[7], Notification::done("Process Completed.\n"));
    }

    #[test]
    fn test_listing_error_becomes_failed() {
        let (tx, mut rx) = relay::channel();
        let mut lister = MockDirectoryLister::new();
        lister.expect_list().times(1).returning(|| {
            Err(WorkerError::ExitStatus {
                program: "ls".to_string(),
                status: "exit status: 2".to_string(),
                stderr: "No such file or directory".to_string(),
            })
        });

        let terminal = run_worker(&tx, &lister, &quick_plan(1));
        assert_eq!(terminal, RunState::Failed);

        let messages = drain(&mut rx);
        let last = messages.last().unwrap();
        assert_eq!(last.state(), RunState::Failed);
        assert!(last.text().starts_with("Process Failed: ls exited with"));
        assert!(last.text().contains("No such file or directory"));
        assert_eq!(
            messages.iter().filter(|n| n.is_terminal()).count(),
            1,
            "exactly one terminal notification"
        );
    }

    #[test]
    fn test_panic_is_caught_at_thread_boundary() {
        let (tx, mut rx) = relay::channel();
        let handle = spawn_worker(tx, Arc::new(PanickingLister), quick_plan(0)).unwrap();

        // The thread itself must not die with the panic
        assert_eq!(handle.join().unwrap(), RunState::Failed);

        let messages = drain(&mut rx);
        assert_eq!(messages.first().unwrap().state(), RunState::Ready);
        let last = messages.last().unwrap();
        assert_eq!(last.state(), RunState::Failed);
        assert!(last.text().contains("listing exploded"));
    }

    #[test]
    fn test_worker_thread_is_named() {
        let (tx, _rx) = relay::channel();
        let mut lister = MockDirectoryLister::new();
        lister.expect_list().returning(|| Ok(String::new()));

        let handle = spawn_worker(tx, Arc::new(lister), quick_plan(0)).unwrap();
        assert_eq!(handle.thread().name(), Some(WORKER_THREAD_NAME));
        handle.join().unwrap();
    }

    #[test]
    fn test_zero_steps_still_lists_and_finishes() {
        let (tx, mut rx) = relay::channel();
        let mut lister = MockDirectoryLister::new();
        lister.expect_list().times(1).returning(|| Ok(String::new()));

        run_worker(&tx, &lister, &quick_plan(0));

        let states: Vec<RunState> = drain(&mut rx).iter().map(|n| n.state()).collect();
        assert_eq!(states, vec![RunState::Ready, RunState::Running, RunState::Done]);
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_lister_lists_directory() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let lister = ShellLister::new(root, Duration::from_secs(10), rt.handle().clone());
        let listing = lister.list().unwrap();
        assert!(listing.contains("marker.txt"));

        rt.shutdown_timeout(Duration::from_secs(1));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_lister_reports_missing_directory() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let lister = ShellLister::new(
            "/definitely/not/a/real/dir",
            Duration::from_secs(10),
            rt.handle().clone(),
        );

        let err = lister.list().unwrap_err();
        assert!(matches!(err, WorkerError::ExitStatus { .. }), "got {:?}", err);

        rt.shutdown_timeout(Duration::from_secs(1));
    }
}
