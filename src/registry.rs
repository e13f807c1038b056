//! Registry of managed menu entries.
//!
//! The registry is the `.desktop` directory itself: there is no database or
//! in-memory index, every query re-scans the filesystem. A descriptor belongs
//! to appshelf iff it carries the [`MARKER_KEY`] line; entries written by
//! other tools are never read, modified, or deleted.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Descriptor key marking an entry as appshelf-owned. Its value is the
/// absolute path of the source bundle at integration time.
pub const MARKER_KEY: &str = "X-AppShelf-Source";

/// Icon identifier used when extraction yields nothing.
pub const FALLBACK_ICON: &str = "application-x-executable";

/// Extensions probed when deleting an entry's icon, in preference order.
/// The empty suffix matches a bare `.DirIcon`-derived file.
const ICON_SUFFIXES: [&str; 3] = [".png", ".svg", ""];

/// One integrated bundle, as recorded by its descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedEntry {
    /// Bundle filename with its AppImage suffix stripped. Doubles as the
    /// descriptor's identity key and its visible label.
    pub display_name: String,
    /// Absolute path of the bundle at integration time (the marker value).
    pub source_path: PathBuf,
    /// `<applications_dir>/<display_name>.desktop`.
    pub descriptor_path: PathBuf,
    /// Extracted icon, if extraction succeeded.
    pub icon_path: Option<PathBuf>,
}

/// Reads and writes descriptor files in one applications directory.
///
/// Directories are explicit constructor arguments so tests can point the
/// store at temporary locations; [`RegistryStore::user`] derives the XDG
/// defaults.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    applications_dir: PathBuf,
    icons_dir: PathBuf,
}

impl RegistryStore {
    /// Create a store over explicit directories.
    pub fn new(applications_dir: PathBuf, icons_dir: PathBuf) -> Self {
        Self {
            applications_dir,
            icons_dir,
        }
    }

    /// Store over the user's XDG data directories:
    /// `~/.local/share/applications` and `~/.local/share/icons/appshelf`.
    pub fn user() -> Self {
        let data = dirs::data_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
        Self::new(data.join("applications"), data.join("icons/appshelf"))
    }

    pub fn applications_dir(&self) -> &Path {
        &self.applications_dir
    }

    pub fn icons_dir(&self) -> &Path {
        &self.icons_dir
    }

    /// Create the applications and icons directories if needed.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.applications_dir)?;
        fs::create_dir_all(&self.icons_dir)
    }

    /// Descriptor path for a display name. Pure function of the name; this
    /// is what makes repeated integration last-write-wins.
    pub fn descriptor_path(&self, display_name: &str) -> PathBuf {
        self.applications_dir.join(format!("{display_name}.desktop"))
    }

    /// List all appshelf-owned entries, sorted by descriptor filename.
    ///
    /// Descriptors without the marker key and files that cannot be read are
    /// skipped, never fatal.
    pub fn list(&self) -> Vec<ManagedEntry> {
        let Ok(entries) = fs::read_dir(&self.applications_dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "desktop"))
            .collect();
        paths.sort();

        paths
            .into_iter()
            .filter_map(|path| self.parse_descriptor(&path))
            .collect()
    }

    /// Atomically write the descriptor for `entry`, replacing any previous
    /// file at the same path.
    pub fn write(&self, entry: &ManagedEntry) -> io::Result<()> {
        let icon_value = match &entry.icon_path {
            Some(path) => path.display().to_string(),
            None => FALLBACK_ICON.to_string(),
        };

        // Fixed key order; the desktop environment does not care, but it
        // keeps descriptors diffable across re-integrations.
        let content = format!(
            "[Desktop Entry]\n\
             Name={}\n\
             Exec={}\n\
             Icon={}\n\
             Type=Application\n\
             Categories=Utility;\n\
             Terminal=false\n\
             StartupNotify=true\n\
             Comment=AppImage managed by AppShelf\n\
             {MARKER_KEY}={}\n",
            entry.display_name,
            entry.source_path.display(),
            icon_value,
            entry.source_path.display(),
        );

        let mut tmp = NamedTempFile::new_in(&self.applications_dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&entry.descriptor_path)?;
        Ok(())
    }

    /// Remove the descriptor for `display_name` and its icon, if we own one.
    ///
    /// Returns whether a descriptor was removed. Foreign descriptors (no
    /// marker key) are left untouched even on a filename collision.
    pub fn delete(&self, display_name: &str) -> io::Result<bool> {
        let path = self.descriptor_path(display_name);
        if self.parse_descriptor(&path).is_none() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        crate::log_event!("registry", "removed", "{}", path.display());

        for suffix in ICON_SUFFIXES {
            let icon = self.icons_dir.join(format!("{display_name}{suffix}"));
            if icon.exists() {
                fs::remove_file(&icon)?;
                crate::debug_event!("registry", "removed icon", "{}", icon.display());
                break;
            }
        }
        Ok(true)
    }

    /// Parse one descriptor file into a [`ManagedEntry`].
    ///
    /// Returns `None` for unreadable files and for descriptors we don't own.
    fn parse_descriptor(&self, path: &Path) -> Option<ManagedEntry> {
        let content = fs::read_to_string(path).ok()?;

        let mut source_path = None;
        let mut icon_path = None;
        for line in content.lines() {
            if let Some(value) = line.strip_prefix(MARKER_KEY).and_then(|v| v.strip_prefix('=')) {
                source_path = Some(PathBuf::from(value));
            } else if let Some(value) = line.strip_prefix("Icon=") {
                // The fallback identifier is not a path; only absolute paths
                // count as an extracted icon.
                if value.starts_with('/') {
                    icon_path = Some(PathBuf::from(value));
                }
            }
        }

        Some(ManagedEntry {
            display_name: path.file_stem()?.to_string_lossy().into_owned(),
            source_path: source_path?,
            descriptor_path: path.to_path_buf(),
            icon_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> RegistryStore {
        let store = RegistryStore::new(tmp.path().join("applications"), tmp.path().join("icons"));
        store.ensure_dirs().unwrap();
        store
    }

    fn entry(store: &RegistryStore, name: &str) -> ManagedEntry {
        ManagedEntry {
            display_name: name.to_string(),
            source_path: PathBuf::from(format!("/bundles/{name}.AppImage")),
            descriptor_path: store.descriptor_path(name),
            icon_path: None,
        }
    }

    #[test]
    fn write_serializes_keys_in_fixed_order() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.write(&entry(&store, "Krita")).unwrap();

        let content = fs::read_to_string(store.descriptor_path("Krita")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "[Desktop Entry]");
        assert_eq!(lines[1], "Name=Krita");
        assert_eq!(lines[2], "Exec=/bundles/Krita.AppImage");
        assert_eq!(lines[3], "Icon=application-x-executable");
        assert_eq!(lines[4], "Type=Application");
        assert_eq!(lines[5], "Categories=Utility;");
        assert_eq!(lines[6], "Terminal=false");
        assert_eq!(lines[7], "StartupNotify=true");
        assert_eq!(lines[8], "Comment=AppImage managed by AppShelf");
        assert_eq!(lines[9], "X-AppShelf-Source=/bundles/Krita.AppImage");
    }

    #[test]
    fn list_returns_entries_sorted_by_filename() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.write(&entry(&store, "Zed")).unwrap();
        store.write(&entry(&store, "Arduino")).unwrap();

        let names: Vec<String> = store.list().into_iter().map(|e| e.display_name).collect();
        assert_eq!(names, vec!["Arduino", "Zed"]);
    }

    #[test]
    fn list_skips_foreign_and_malformed_descriptors() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.write(&entry(&store, "Mine")).unwrap();
        fs::write(
            store.applications_dir().join("firefox.desktop"),
            "[Desktop Entry]\nName=Firefox\nExec=/usr/bin/firefox\n",
        )
        .unwrap();
        fs::write(store.applications_dir().join("broken.desktop"), [0xffu8, 0xfe]).unwrap();

        let names: Vec<String> = store.list().into_iter().map(|e| e.display_name).collect();
        assert_eq!(names, vec!["Mine"]);
    }

    #[test]
    fn delete_removes_descriptor_and_reports() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.write(&entry(&store, "App")).unwrap();

        assert!(store.delete("App").unwrap());
        assert!(!store.descriptor_path("App").exists());
        assert!(!store.delete("App").unwrap());
    }

    #[test]
    fn delete_leaves_foreign_descriptor_alone() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let foreign = store.applications_dir().join("gimp.desktop");
        fs::write(&foreign, "[Desktop Entry]\nName=GIMP\n").unwrap();

        assert!(!store.delete("gimp").unwrap());
        assert!(foreign.exists());
    }

    #[test]
    fn delete_removes_first_matching_icon_only() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.write(&entry(&store, "App")).unwrap();
        let png = store.icons_dir().join("App.png");
        let svg = store.icons_dir().join("App.svg");
        fs::write(&png, "png").unwrap();
        fs::write(&svg, "svg").unwrap();

        assert!(store.delete("App").unwrap());
        assert!(!png.exists());
        assert!(svg.exists(), "preference order stops at the first match");
    }

    #[test]
    fn icon_path_round_trips_through_list() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let mut with_icon = entry(&store, "Painted");
        with_icon.icon_path = Some(PathBuf::from("/icons/Painted.png"));
        store.write(&with_icon).unwrap();

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].icon_path.as_deref(), Some(Path::new("/icons/Painted.png")));
        assert_eq!(listed[0].source_path, with_icon.source_path);
    }
}
