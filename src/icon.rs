//! Best-effort icon extraction from an AppImage's embedded squashfs image.
//!
//! Extraction can never fail an integration: a missing `unsquashfs` binary,
//! a malformed bundle, a timeout, or an empty image all yield `None` and the
//! caller falls back to a generic icon identifier. The unpack scratch
//! directory is a [`tempfile::TempDir`] so it is removed on every exit path,
//! including timeout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use walkdir::WalkDir;

/// Wall-clock bound on the unsquashfs subprocess.
const UNPACK_TIMEOUT: Duration = Duration::from_secs(15);

/// How a candidate icon is recognized inside the unpacked tree.
#[derive(Debug, Clone, Copy)]
enum Candidate {
    Extension(&'static str),
    FileName(&'static str),
}

/// Search priority: raster, vector, then the conventional top-level icon
/// file AppImages ship. First match by sorted path wins.
const CANDIDATES: [Candidate; 3] = [
    Candidate::Extension("png"),
    Candidate::Extension("svg"),
    Candidate::FileName(".DirIcon"),
];

/// Extracts icons into a dedicated icons directory.
pub struct IconExtractor {
    icons_dir: PathBuf,
    unpack_timeout: Duration,
}

impl IconExtractor {
    /// Extractor writing into `icons_dir` with the default unpack timeout.
    pub fn new(icons_dir: PathBuf) -> Self {
        Self {
            icons_dir,
            unpack_timeout: UNPACK_TIMEOUT,
        }
    }

    /// Override the unpack timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.unpack_timeout = timeout;
        self
    }

    /// Extract an icon for `app_name` from `bundle`.
    ///
    /// Returns the installed icon path (`<icons_dir>/<app_name><ext>`), or
    /// `None` on any failure.
    pub async fn extract(&self, bundle: &Path, app_name: &str) -> Option<PathBuf> {
        let scratch = match tempfile::TempDir::with_prefix("appshelf_") {
            Ok(dir) => dir,
            Err(e) => {
                crate::debug_event!("icon", "no scratch dir", "{e}");
                return None;
            }
        };
        let squash_root = scratch.path().join("squash");

        // kill_on_drop means an elapsed timeout also reaps the child.
        let mut unpack = Command::new("unsquashfs");
        unpack
            .args(["-n", "-i", "-d"])
            .arg(&squash_root)
            .arg(bundle)
            .args(["*.png", "*.svg", "*.DirIcon"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.unpack_timeout, unpack.output()).await {
            // Exit status is ignored: unsquashfs reports nonzero for partial
            // extractions that still contain a usable icon.
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                crate::debug_event!("icon", "unsquashfs not found, skipping extraction");
                return None;
            }
            Ok(Err(e)) => {
                crate::debug_event!("icon", "unsquashfs failed", "{}: {e}", bundle.display());
                return None;
            }
            Err(_) => {
                crate::debug_event!("icon", "unsquashfs timed out", "{}", bundle.display());
                return None;
            }
        }

        let src = pick_candidate(&squash_root)?;
        self.install(&src, app_name)
    }

    /// Copy `src` into the icons directory as `<app_name><original-ext>`.
    fn install(&self, src: &Path, app_name: &str) -> Option<PathBuf> {
        let suffix = src
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let dest = self.icons_dir.join(format!("{app_name}{suffix}"));

        if let Err(e) = fs::create_dir_all(&self.icons_dir).and_then(|_| fs::copy(src, &dest)) {
            crate::debug_event!("icon", "install failed", "{}: {e}", dest.display());
            return None;
        }
        crate::log_event!("icon", "extracted", "{}", dest.display());
        Some(dest)
    }
}

/// Walk the unpacked tree for the best icon candidate.
fn pick_candidate(root: &Path) -> Option<PathBuf> {
    for candidate in CANDIDATES {
        let mut matches: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| matches_candidate(path, candidate))
            .collect();
        matches.sort();
        if let Some(first) = matches.into_iter().next() {
            return Some(first);
        }
    }
    None
}

fn matches_candidate(path: &Path, candidate: Candidate) -> bool {
    match candidate {
        Candidate::Extension(ext) => path.extension().is_some_and(|e| e == ext),
        Candidate::FileName(name) => path.file_name().is_some_and(|n| n == name),
    }
}
