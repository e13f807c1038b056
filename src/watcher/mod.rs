//! Background watch-and-integrate pipeline.
//!
//! Filesystem events from one non-recursive directory are converted into
//! idempotent integrate/remove actions, processed serially on a background
//! task, with deterministic startup and shutdown.
//!
//! # Architecture
//!
//! ```text
//! WatcherSupervisor           bounded-wait shutdown policy
//!   └─ WatchController        Idle -> Running -> StopRequested -> Stopped
//!        └─ DirectoryMonitor  notify events -> BundleEvent -> actions
//!             └─ Integrator   integrate / remove, one at a time
//! ```
//!
//! The controller's cancellation token is the only cross-context
//! synchronization; the on-disk registry needs none because actions for a
//! single monitor run strictly in event-arrival order.

mod controller;
mod error;
pub mod events;
mod monitor;
mod supervisor;

pub use controller::{WatchController, WatchState};
pub use error::WatchError;
pub use events::{BundleAction, BundleEvent, actions_for};
pub use monitor::DirectoryMonitor;
pub use supervisor::WatcherSupervisor;
