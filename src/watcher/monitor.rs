//! Directory monitor: one non-recursive directory, events in, actions out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::integrate::Integrator;

use super::error::WatchError;
use super::events::{self, BundleAction};

/// Watches a single directory and feeds bundle events to the integrator.
///
/// The binding is fixed for the monitor's lifetime; watching a different
/// directory means constructing a new monitor. Actions execute serially in
/// event-arrival order, so rapid events on the same filename can never race
/// on one descriptor file.
pub struct DirectoryMonitor {
    watch_dir: PathBuf,
    integrator: Arc<Integrator>,
    /// Channel receiver for file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher (kept alive by storing it).
    watcher: notify::RecommendedWatcher,
}

impl DirectoryMonitor {
    /// Create a monitor and subscribe to `watch_dir` immediately.
    ///
    /// Events begin queueing as soon as this returns; nothing is processed
    /// until [`run`](Self::run).
    pub fn new(watch_dir: PathBuf, integrator: Arc<Integrator>) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(100);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: watch_dir.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            watch_dir,
            integrator,
            event_rx: rx,
            watcher,
        })
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    /// Process queued and incoming events until `cancel` fires.
    ///
    /// Once the token is cancelled, the subscription is torn down before
    /// this returns; no event is dispatched afterwards.
    pub async fn run(mut self, cancel: CancellationToken) {
        crate::log_event!("watcher", "watching", "{}", self.watch_dir.display());

        loop {
            tokio::select! {
                // Cancellation beats a ready event: an in-flight action
                // finishes, anything still queued is dropped.
                biased;

                _ = cancel.cancelled() => break,

                maybe = self.event_rx.recv() => {
                    match maybe {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => {
                            tracing::error!("[watcher] file watch error: {e}");
                        }
                        // Backend thread went away; nothing more will come.
                        None => break,
                    }
                }
            }
        }

        let _ = self.watcher.unwatch(&self.watch_dir);
        crate::log_event!("watcher", "stopped", "{}", self.watch_dir.display());
    }

    async fn handle_event(&self, event: Event) {
        let Some(bundle_event) = events::translate(&event) else {
            return;
        };
        crate::debug_event!("watcher", "event", "{bundle_event:?}");
        for action in events::actions_for(bundle_event) {
            self.apply(action).await;
        }
    }

    /// Execute one action. A failure is logged and never stops the monitor.
    async fn apply(&self, action: BundleAction) {
        match action {
            BundleAction::Integrate(path) => {
                crate::log_event!("watcher", "new bundle", "{}", path.display());
                match self.integrator.integrate(&path).await {
                    Ok(entry) => {
                        crate::log_event!("watcher", "integrated", "{}", entry.display_name);
                    }
                    Err(e) => {
                        tracing::error!(
                            "[watcher] integration failed for {}: {e}",
                            path.display()
                        );
                    }
                }
            }
            BundleAction::Remove(path) => {
                crate::log_event!("watcher", "bundle removed", "{}", path.display());
                match self.integrator.remove(&path) {
                    Ok(true) => {
                        crate::log_event!(
                            "watcher",
                            "removed entry",
                            "{}",
                            crate::integrate::display_name(&path)
                        );
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!("[watcher] removal failed for {}: {e}", path.display());
                    }
                }
            }
        }
    }
}
