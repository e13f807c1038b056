//! Core integration and removal of AppImage bundles.
//!
//! Integration makes a bundle executable, extracts an icon best-effort, and
//! writes a menu-entry descriptor through the [`RegistryStore`]. The whole
//! sequence is idempotent: integrating the same bundle twice overwrites the
//! prior descriptor. Removal only derives the display name from the path, so
//! it works after the bundle file is already gone.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::icon::IconExtractor;
use crate::registry::{ManagedEntry, RegistryStore};

/// Errors from integration operations.
#[derive(Error, Debug)]
pub enum IntegrateError {
    /// The bundle file does not exist at integration time. The only error
    /// `integrate` raises on purpose; everything downstream degrades.
    #[error("bundle not found: {path}")]
    BundleNotFound { path: PathBuf },

    /// Filesystem failure while writing or removing managed state.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Outcome of a bulk integration pass. Per-item failures are logged and
/// counted, never propagated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationSummary {
    pub integrated: usize,
    pub failed: usize,
}

/// Derive the display name for a bundle path.
///
/// Strips a trailing literal `.AppImage` or `.appimage`; any other spelling
/// keeps the filename unchanged.
pub fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in [".AppImage", ".appimage"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    name
}

/// Whether a path carries the bundle extension, case-insensitively.
pub fn is_bundle(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("appimage"))
}

/// Performs integration and removal against one registry.
pub struct Integrator {
    registry: RegistryStore,
    icons: IconExtractor,
}

impl Integrator {
    pub fn new(registry: RegistryStore, icons: IconExtractor) -> Self {
        Self { registry, icons }
    }

    /// Integrator over the user's XDG directories.
    pub fn user() -> Self {
        let registry = RegistryStore::user();
        let icons = IconExtractor::new(registry.icons_dir().to_path_buf());
        Self::new(registry, icons)
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    /// Make `bundle` executable and register it in the application menu.
    ///
    /// Fails with [`IntegrateError::BundleNotFound`] only when the file is
    /// missing; a chmod or icon-extraction failure degrades gracefully.
    pub async fn integrate(&self, bundle: &Path) -> Result<ManagedEntry, IntegrateError> {
        self.registry.ensure_dirs()?;

        let path = match fs::canonicalize(bundle) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IntegrateError::BundleNotFound {
                    path: bundle.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        make_executable(&path);

        let name = display_name(&path);
        let icon_path = self.icons.extract(&path, &name).await;

        let entry = ManagedEntry {
            descriptor_path: self.registry.descriptor_path(&name),
            display_name: name,
            source_path: path,
            icon_path,
        };
        self.registry.write(&entry)?;
        crate::log_event!("integrator", "integrated", "{}", entry.display_name);
        Ok(entry)
    }

    /// Remove the menu entry for `bundle`. The bundle file itself is never
    /// deleted, and it need not exist anymore.
    ///
    /// Returns whether a descriptor was removed; absence is not an error.
    pub fn remove(&self, bundle: &Path) -> Result<bool, IntegrateError> {
        let name = display_name(bundle);
        let removed = self.registry.delete(&name)?;
        if !removed {
            crate::debug_event!("integrator", "no descriptor for", "{name}");
        }
        Ok(removed)
    }

    /// Integrate every bundle in `dir`, counting successes and failures.
    pub async fn integrate_all(&self, dir: &Path) -> IntegrationSummary {
        let mut summary = IntegrationSummary::default();

        let mut bundles: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| is_bundle(p) && !p.is_dir())
                .collect(),
            Err(e) => {
                tracing::warn!("[integrator] cannot read {}: {e}", dir.display());
                return summary;
            }
        };
        bundles.sort();

        for bundle in bundles {
            match self.integrate(&bundle).await {
                Ok(_) => summary.integrated += 1,
                Err(e) => {
                    tracing::warn!("[integrator] failed to integrate {}: {e}", bundle.display());
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// Set the owner/group/other execute bits, preserving everything else.
///
/// Failure is logged and swallowed: a read-only mount still gets a usable
/// menu entry.
fn make_executable(path: &Path) {
    let result = fs::metadata(path).and_then(|meta| {
        let mut perms = meta.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(path, perms)
    });
    match result {
        Ok(()) => crate::debug_event!("integrator", "made executable", "{}", path.display()),
        Err(e) => tracing::warn!("[integrator] chmod failed for {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn integrator(tmp: &TempDir) -> Integrator {
        let registry = RegistryStore::new(tmp.path().join("applications"), tmp.path().join("icons"));
        let icons = IconExtractor::new(tmp.path().join("icons"));
        Integrator::new(registry, icons)
    }

    fn make_bundle(tmp: &TempDir, name: &str) -> PathBuf {
        let path = tmp.path().join(name);
        fs::write(&path, "dummy appimage payload").unwrap();
        path
    }

    #[test]
    fn display_name_strips_known_suffixes_only() {
        assert_eq!(display_name(Path::new("/x/Foo.AppImage")), "Foo");
        assert_eq!(display_name(Path::new("/x/foo.appimage")), "foo");
        assert_eq!(display_name(Path::new("/x/NoSuffix")), "NoSuffix");
        // Mixed-case spellings are not stripped, matching descriptor naming.
        assert_eq!(display_name(Path::new("/x/Odd.APPIMAGE")), "Odd.APPIMAGE");
    }

    #[test]
    fn bundle_filter_is_case_insensitive() {
        assert!(is_bundle(Path::new("a.AppImage")));
        assert!(is_bundle(Path::new("a.appimage")));
        assert!(is_bundle(Path::new("a.APPIMAGE")));
        assert!(!is_bundle(Path::new("a.tar.gz")));
        assert!(!is_bundle(Path::new("appimage")));
    }

    #[tokio::test]
    async fn integrate_writes_descriptor_and_sets_exec_bit() {
        let tmp = TempDir::new().unwrap();
        let integrator = integrator(&tmp);
        let bundle = make_bundle(&tmp, "MyTestApp.AppImage");

        let entry = integrator.integrate(&bundle).await.unwrap();
        assert_eq!(entry.display_name, "MyTestApp");

        let content = fs::read_to_string(&entry.descriptor_path).unwrap();
        assert!(content.contains("Name=MyTestApp"));
        let canonical = fs::canonicalize(&bundle).unwrap();
        assert!(content.contains(&format!("X-AppShelf-Source={}", canonical.display())));

        let mode = fs::metadata(&bundle).unwrap().permissions().mode();
        assert_eq!(mode & 0o100, 0o100, "owner execute bit set");
    }

    #[tokio::test]
    async fn integrate_missing_bundle_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let integrator = integrator(&tmp);

        let err = integrator
            .integrate(&tmp.path().join("ghost.AppImage"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrateError::BundleNotFound { .. }));
        assert!(integrator.registry().list().is_empty());
    }

    #[tokio::test]
    async fn integrate_twice_overwrites_single_entry() {
        let tmp = TempDir::new().unwrap();
        let integrator = integrator(&tmp);
        let bundle = make_bundle(&tmp, "Dup.AppImage");

        integrator.integrate(&bundle).await.unwrap();
        integrator.integrate(&bundle).await.unwrap();
        assert_eq!(integrator.registry().list().len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let integrator = integrator(&tmp);
        let bundle = make_bundle(&tmp, "Gone.AppImage");

        integrator.integrate(&bundle).await.unwrap();
        assert!(integrator.remove(&bundle).unwrap());
        assert!(integrator.registry().list().is_empty());
        assert!(!integrator.remove(&bundle).unwrap());
    }

    #[tokio::test]
    async fn remove_works_without_the_bundle_file() {
        let tmp = TempDir::new().unwrap();
        let integrator = integrator(&tmp);
        let bundle = make_bundle(&tmp, "Fleeting.AppImage");

        integrator.integrate(&bundle).await.unwrap();
        fs::remove_file(&bundle).unwrap();
        assert!(integrator.remove(&bundle).unwrap());
    }

    #[tokio::test]
    async fn integrate_all_counts_successes_and_failures() {
        let tmp = TempDir::new().unwrap();
        let integrator = integrator(&tmp);
        let dir = tmp.path().join("bundles");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("One.AppImage"), "x").unwrap();
        fs::write(dir.join("Two.appimage"), "x").unwrap();
        fs::write(dir.join("readme.txt"), "x").unwrap();
        // Dangling symlink: listed by the scan, gone at canonicalize time.
        std::os::unix::fs::symlink(dir.join("absent"), dir.join("Broken.AppImage")).unwrap();

        let summary = integrator.integrate_all(&dir).await;
        assert_eq!(summary.integrated, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(integrator.registry().list().len(), 2);
    }
}
