//! Supervision of a watcher running on a background task.
//!
//! Stand-in for whatever owns the watcher's execution context (a settings
//! UI, a daemon main loop): composition of a controller handle with a
//! bounded-wait-then-force-terminate shutdown policy. Stopping the watcher
//! must never hang the supervising context, so every wait here has a bound.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::controller::WatchController;

/// How long shutdown waits before forcing termination.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the background task driving a [`WatchController`].
pub struct WatcherSupervisor {
    controller: Arc<WatchController>,
    task: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl WatcherSupervisor {
    /// Spawn `run_until_stopped` on a background task.
    pub fn spawn(controller: Arc<WatchController>) -> Self {
        let runner = controller.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = runner.run_until_stopped().await {
                tracing::error!("[watcher] {e}");
            }
        });

        Self {
            controller,
            task: Some(task),
            stop_timeout: STOP_TIMEOUT,
        }
    }

    /// Override the shutdown bound.
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn controller(&self) -> &Arc<WatchController> {
        &self.controller
    }

    /// Stop the watcher and wait for the background task within the bound,
    /// forcibly terminating it if the bound is exceeded.
    pub async fn shutdown(mut self) {
        if timeout(self.stop_timeout, self.controller.stop())
            .await
            .is_err()
        {
            tracing::warn!(
                "[watcher] stop did not complete within {:?}",
                self.stop_timeout
            );
        }

        if let Some(mut task) = self.task.take() {
            if timeout(self.stop_timeout, &mut task).await.is_err() {
                tracing::warn!(
                    "[watcher] task did not exit within {:?}; aborting",
                    self.stop_timeout
                );
                task.abort();
                let _ = task.await;
            }
        }
    }
}
