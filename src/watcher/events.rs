//! Event vocabulary for the directory monitor.
//!
//! Raw notify events are translated into a closed set of [`BundleEvent`]
//! variants, then reduced to the two primitive actions the integrator
//! understands. Moves decompose into a synthetic deletion plus creation so
//! that a rename crossing the extension filter comes out as create-only or
//! delete-only.

use std::path::PathBuf;

use notify::Event;
use notify::event::{EventKind, ModifyKind, RenameMode};

use crate::integrate::is_bundle;

/// A filesystem change in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleEvent {
    Created(PathBuf),
    Deleted(PathBuf),
    Moved { from: PathBuf, to: PathBuf },
}

/// The two primitive actions every event reduces to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleAction {
    Integrate(PathBuf),
    Remove(PathBuf),
}

/// Translate a raw notify event. Events outside the create/delete/rename
/// family are ignored.
pub(super) fn translate(event: &Event) -> Option<BundleEvent> {
    match event.kind {
        EventKind::Create(_) => first_path(event).map(BundleEvent::Created),
        EventKind::Remove(_) => first_path(event).map(BundleEvent::Deleted),
        // Paired rename: inotify reports both sides in one event when the
        // cookie could be matched.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => Some(BundleEvent::Moved {
                from: from.clone(),
                to: to.clone(),
            }),
            _ => None,
        },
        // Unpaired rename halves: the file left or entered the directory.
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            first_path(event).map(BundleEvent::Deleted)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            first_path(event).map(BundleEvent::Created)
        }
        _ => None,
    }
}

fn first_path(event: &Event) -> Option<PathBuf> {
    event.paths.first().cloned()
}

/// Reduce an event to its primitive actions, applying the extension filter
/// to each path independently.
pub fn actions_for(event: BundleEvent) -> Vec<BundleAction> {
    match event {
        BundleEvent::Created(path) => {
            if is_bundle(&path) && !path.is_dir() {
                vec![BundleAction::Integrate(path)]
            } else {
                Vec::new()
            }
        }
        // A deleted path cannot be stat'ed anymore; the extension filter is
        // the only gate, and removal is idempotent anyway.
        BundleEvent::Deleted(path) => {
            if is_bundle(&path) {
                vec![BundleAction::Remove(path)]
            } else {
                Vec::new()
            }
        }
        BundleEvent::Moved { from, to } => {
            let mut actions = actions_for(BundleEvent::Deleted(from));
            actions.extend(actions_for(BundleEvent::Created(to)));
            actions
        }
    }
}
