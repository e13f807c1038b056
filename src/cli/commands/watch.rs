//! Headless watcher daemon.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Settings;
use crate::integrate::Integrator;
use crate::watcher::WatchController;

/// Run the directory monitor until interrupted.
///
/// `dir` comes from `--watch DIR`; when omitted the configured watch
/// directory is used.
pub async fn run(dir: Option<PathBuf>) -> Result<()> {
    let watch_dir = dir.unwrap_or_else(|| Settings::load().watch_dir);
    let integrator = Arc::new(Integrator::user());
    let controller = Arc::new(WatchController::new(watch_dir, integrator));

    let stopper = controller.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop().await;
        }
    });

    println!(
        "Watching: {}  (Ctrl-C to stop)",
        controller.watch_dir().display()
    );
    controller.run_until_stopped().await?;
    Ok(())
}
