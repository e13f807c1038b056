//! AppImage menu integration for XDG desktops.
//!
//! appshelf watches a directory for AppImage bundles and keeps the desktop
//! application menu in sync: a new bundle is made executable, gets an icon
//! extracted best-effort, and receives a `.desktop` entry; a removed bundle
//! loses its entry again. The descriptor directory itself is the registry:
//! state is always re-derived by scanning it, never cached.

pub mod cli;
pub mod config;
pub mod icon;
pub mod integrate;
pub mod logging;
pub mod registry;
pub mod watcher;

pub use config::Settings;
pub use icon::IconExtractor;
pub use integrate::{IntegrateError, IntegrationSummary, Integrator};
pub use registry::{MARKER_KEY, ManagedEntry, RegistryStore};
pub use watcher::{WatchController, WatchError, WatchState, WatcherSupervisor};
