//! Lifecycle control for the directory monitor.
//!
//! A [`WatchController`] owns one monitor run: `Idle -> Running ->
//! StopRequested -> Stopped`, one way. The cancellation token cannot be
//! reset, so a stopped controller is never restarted; build a new one for a
//! new run or a different directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::integrate::Integrator;

use super::error::WatchError;
use super::monitor::DirectoryMonitor;

/// Lifecycle states of a [`WatchController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Running,
    StopRequested,
    Stopped,
}

/// Starts and stops a [`DirectoryMonitor`] from any calling context.
///
/// `stop` is idempotent and safe to call concurrently with an in-flight
/// event: it raises the cancellation signal, then waits for the monitor task
/// to finish, so once it returns no further events will be dispatched. Any
/// number of contexts may wait for teardown; the completion latch serves
/// them all.
pub struct WatchController {
    watch_dir: PathBuf,
    integrator: Arc<Integrator>,
    /// Stop signal; the monitor loop selects on this with priority.
    cancel: CancellationToken,
    /// Completion latch, fired by the monitor task as its last act.
    done: CancellationToken,
    state: Mutex<WatchState>,
}

impl WatchController {
    pub fn new(watch_dir: PathBuf, integrator: Arc<Integrator>) -> Self {
        Self {
            watch_dir,
            integrator,
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
            state: Mutex::new(WatchState::Idle),
        }
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    pub fn state(&self) -> WatchState {
        *self.state.lock().unwrap()
    }

    /// Create the watch directory if needed, then begin dispatching events
    /// on a background task, concurrently with the caller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), WatchError> {
        let mut state = self.state.lock().unwrap();
        if *state != WatchState::Idle {
            return Err(WatchError::AlreadyStarted);
        }

        fs::create_dir_all(&self.watch_dir).map_err(|e| WatchError::InitFailed {
            reason: format!("cannot create {}: {e}", self.watch_dir.display()),
        })?;

        let monitor = DirectoryMonitor::new(self.watch_dir.clone(), self.integrator.clone())?;
        let cancel = self.cancel.clone();
        let done = self.done.clone();
        tokio::spawn(async move {
            monitor.run(cancel).await;
            done.cancel();
        });

        *state = WatchState::Running;
        Ok(())
    }

    /// Start watching and suspend the caller until [`stop`](Self::stop) is
    /// called.
    ///
    /// Waits on the cancellation signal, not a polling loop, so a stop from
    /// another context is observed immediately.
    pub async fn run_until_stopped(&self) -> Result<(), WatchError> {
        self.start()?;
        self.cancel.cancelled().await;
        self.done.cancelled().await;
        Ok(())
    }

    /// Signal the monitor to stop and block until teardown completes.
    ///
    /// Safe to call from any context; calling twice is harmless.
    pub async fn stop(&self) {
        let started = {
            let mut state = self.state.lock().unwrap();
            match *state {
                WatchState::Running => {
                    *state = WatchState::StopRequested;
                    true
                }
                // Stopping a controller that never ran still retires it. The
                // latch is fired here because no monitor task will fire it,
                // and a later stop() must not wait on it.
                WatchState::Idle => {
                    *state = WatchState::Stopped;
                    self.done.cancel();
                    false
                }
                WatchState::StopRequested | WatchState::Stopped => true,
            }
        };

        self.cancel.cancel();
        if started {
            self.done.cancelled().await;
            *self.state.lock().unwrap() = WatchState::Stopped;
        }
    }
}
