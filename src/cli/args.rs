//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// AppImage menu integration: watch, integrate, and manage AppImages.
///
/// The modes are mutually exclusive; only verbosity combines with them.
#[derive(Parser, Debug)]
#[command(name = "appshelf", version)]
#[command(about = "Watch a directory for AppImages and keep the application menu in sync")]
#[command(group(clap::ArgGroup::new("mode").multiple(false)))]
pub struct Cli {
    /// Run as a headless watcher daemon (omit DIR to use the configured
    /// watch directory)
    #[arg(long, value_name = "DIR", group = "mode")]
    pub watch: Option<Option<PathBuf>>,

    /// Integrate a single AppImage and exit
    #[arg(long, value_name = "PATH", group = "mode")]
    pub integrate: Option<PathBuf>,

    /// Remove the desktop entry for an AppImage and exit
    #[arg(long, value_name = "PATH", group = "mode")]
    pub remove: Option<PathBuf>,

    /// List all integrated applications and exit
    #[arg(long, group = "mode")]
    pub list: bool,

    /// Enable debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_dir_is_optional() {
        let cli = Cli::parse_from(["appshelf", "--watch"]);
        assert_eq!(cli.watch, Some(None));

        let cli = Cli::parse_from(["appshelf", "--watch", "/tmp/bundles"]);
        assert_eq!(cli.watch, Some(Some(PathBuf::from("/tmp/bundles"))));

        let cli = Cli::parse_from(["appshelf", "--list"]);
        assert_eq!(cli.watch, None);
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["appshelf", "--list", "--integrate", "x"]).is_err());
        assert!(Cli::try_parse_from(["appshelf", "--list", "--verbose"]).is_ok());
    }
}
