//! Starting the user program inside the target
//!
//! The launch collaborator runs on its own thread once the bootstrap stub has
//! been reached. Its [`LaunchResult`] is handed back over a channel, which
//! orders the write before the dispatch loop's read at shutdown.

use std::thread::{self, JoinHandle};

use eyre::WrapErr;
use protocol::ThreadId;

use crate::types::LaunchResult;

pub trait Launcher {
    /// Start the user program on the tracked thread.
    fn start(&mut self, thread: ThreadId) -> eyre::Result<()>;

    /// Wait for and return the launch outcome. `None` when the launcher was
    /// never started or stopped without reporting.
    fn outcome(&mut self) -> Option<LaunchResult>;
}

/// [`Launcher`] that runs a job on a dedicated background thread.
pub struct ThreadedLauncher<F> {
    job: Option<F>,
    result_rx: Option<crossbeam_channel::Receiver<LaunchResult>>,
    handle: Option<JoinHandle<()>>,
}

impl<F> ThreadedLauncher<F>
where
    F: FnOnce(ThreadId) -> LaunchResult + Send + 'static,
{
    pub fn new(job: F) -> Self {
        Self {
            job: Some(job),
            result_rx: None,
            handle: None,
        }
    }
}

impl<F> Launcher for ThreadedLauncher<F>
where
    F: FnOnce(ThreadId) -> LaunchResult + Send + 'static,
{
    #[tracing::instrument(skip(self))]
    fn start(&mut self, thread: ThreadId) -> eyre::Result<()> {
        let job = self
            .job
            .take()
            .ok_or_else(|| eyre::eyre!("launcher already started"))?;

        let (tx, rx) = crossbeam_channel::bounded(1);
        let handle = thread::Builder::new()
            .name("launcher".to_string())
            .spawn(move || {
                let result = job(thread);
                tracing::debug!(success = result.success, "launch finished");
                let _ = tx.send(result);
            })
            .wrap_err("spawning launcher thread")?;

        self.result_rx = Some(rx);
        self.handle = Some(handle);
        Ok(())
    }

    fn outcome(&mut self) -> Option<LaunchResult> {
        let rx = self.result_rx.take()?;
        let result = match rx.recv() {
            Ok(result) => Some(result),
            Err(_) => {
                tracing::warn!("launcher stopped without reporting a result");
                None
            }
        };

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("launcher thread panicked");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LaunchFailure;

    #[test]
    fn never_started_has_no_outcome() {
        let mut launcher = ThreadedLauncher::new(|_| LaunchResult::succeeded());
        assert_eq!(launcher.outcome(), None);
    }

    #[test]
    fn publishes_the_job_result() {
        let mut launcher = ThreadedLauncher::new(|thread: ThreadId| {
            assert_eq!(thread, ThreadId(3));
            LaunchResult::failed(LaunchFailure::new("boom").at(2, 5))
        });

        launcher.start(ThreadId(3)).unwrap();
        let outcome = launcher.outcome().unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.failure().unwrap().line, Some(2));
    }

    #[test]
    fn starts_only_once() {
        let mut launcher = ThreadedLauncher::new(|_| LaunchResult::succeeded());
        launcher.start(ThreadId(1)).unwrap();
        assert!(launcher.start(ThreadId(1)).is_err());
        assert_eq!(launcher.outcome(), Some(LaunchResult::succeeded()));
    }

    #[test]
    fn panicking_job_reports_nothing() {
        let mut launcher = ThreadedLauncher::new(|_| -> LaunchResult { panic!("launch crashed") });
        launcher.start(ThreadId(1)).unwrap();
        assert_eq!(launcher.outcome(), None);
    }
}
