//! Persistent user configuration stored at `~/.config/appshelf/config.ini`.
//!
//! Stores:
//! - `watch_dir`  : directory to monitor for new AppImages (default: `~/AppImages`)
//! - `theme`      : name of the active stylesheet theme without extension
//!   (default: `catppuccin_mocha`)
//! - `themes_dir` : directory scanned for `.qss` theme files
//!   (default: `~/.local/share/appshelf/themes`)
//!
//! The file is a single-section INI (`[appshelf]`). Missing or malformed
//! files fall back to defaults; unknown keys are ignored so older and newer
//! builds can share one config.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SECTION: &str = "appshelf";

/// User configuration for the watcher and the settings surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory monitored for new AppImages.
    pub watch_dir: PathBuf,
    /// Active theme name (stylesheet file stem).
    pub theme: String,
    /// Directory scanned for `.qss` theme files.
    pub themes_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watch_dir: home_dir().join("AppImages"),
            theme: "catppuccin_mocha".to_string(),
            themes_dir: data_dir().join("appshelf/themes"),
        }
    }
}

impl Settings {
    /// Default location of the config file: `<config_dir>/appshelf/config.ini`.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| home_dir().join(".config"))
            .join("appshelf/config.ini")
    }

    /// Load settings from the default config path.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from an explicit path.
    ///
    /// Lines that don't parse are skipped; keys outside the `[appshelf]`
    /// section are ignored.
    pub fn load_from(path: &Path) -> Self {
        let mut settings = Self::default();
        let Ok(content) = fs::read_to_string(path) else {
            return settings;
        };

        let mut in_section = false;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = name.trim() == SECTION;
                continue;
            }
            if !in_section {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "watch_dir" => settings.watch_dir = PathBuf::from(value),
                "theme" => settings.theme = value.to_string(),
                "themes_dir" => settings.themes_dir = PathBuf::from(value),
                _ => {}
            }
        }
        settings
    }

    /// Save settings to the default config path, creating parent directories.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save settings to an explicit path.
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = format!(
            "[{SECTION}]\nwatch_dir = {}\ntheme = {}\nthemes_dir = {}\n",
            self.watch_dir.display(),
            self.theme,
            self.themes_dir.display(),
        );
        fs::write(path, content)
    }
}

/// Return a sorted list of theme names (file stems) found in `themes_dir`.
pub fn list_themes(themes_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(themes_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "qss"))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

/// Read and return the stylesheet content for `theme_name`.
///
/// Looks in `themes_dir` first, then in the configured themes directory.
/// Returns an empty string if no matching file is found.
pub fn load_theme_stylesheet(theme_name: &str, themes_dir: Option<&Path>) -> String {
    let configured = Settings::load().themes_dir;
    let mut dirs: Vec<&Path> = Vec::new();
    if let Some(d) = themes_dir {
        dirs.push(d);
    }
    dirs.push(&configured);

    for dir in dirs {
        let qss_file = dir.join(format!("{theme_name}.qss"));
        if let Ok(content) = fs::read_to_string(&qss_file) {
            return content;
        }
    }
    String::new()
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| home_dir().join(".local/share"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.ini");

        let settings = Settings {
            watch_dir: PathBuf::from("/tmp/bundles"),
            theme: "nord".to_string(),
            themes_dir: PathBuf::from("/tmp/themes"),
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let loaded = Settings::load_from(&tmp.path().join("nope.ini"));
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.ini");
        fs::write(
            &path,
            "[appshelf]\ngarbage line without equals\ntheme = dracula\n",
        )
        .unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.theme, "dracula");
        assert_eq!(loaded.watch_dir, Settings::default().watch_dir);
    }

    #[test]
    fn keys_outside_section_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.ini");
        fs::write(&path, "[other]\ntheme = wrong\n[appshelf]\ntheme = right\n").unwrap();

        assert_eq!(Settings::load_from(&path).theme, "right");
    }

    #[test]
    fn list_themes_sorted_stems() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("zeta.qss"), "").unwrap();
        fs::write(tmp.path().join("alpha.qss"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();

        assert_eq!(list_themes(tmp.path()), vec!["alpha", "zeta"]);
    }

    #[test]
    fn list_themes_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(list_themes(&tmp.path().join("absent")).is_empty());
    }

    #[test]
    fn stylesheet_lookup_prefers_explicit_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mocha.qss"), "QWidget {}").unwrap();

        let content = load_theme_stylesheet("mocha", Some(tmp.path()));
        assert_eq!(content, "QWidget {}");
        assert_eq!(load_theme_stylesheet("absent", Some(tmp.path())), "");
    }
}
