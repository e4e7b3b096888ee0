//! Finders supply the directories that are searched for process and descriptor definitions

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::settings::{FinderKind, Settings};

pub trait Finder {
    fn find_processes(&self) -> Vec<PathBuf>;
    fn find_descriptors(&self) -> Vec<PathBuf>;
}

/// Directories listed explicitly in the settings
pub struct FileSystemFinder {
    processes_dirs: Vec<PathBuf>,
    descriptors_dirs: Vec<PathBuf>,
}

impl FileSystemFinder {
    pub fn new(settings: &Settings) -> FileSystemFinder {
        FileSystemFinder {
            processes_dirs: settings.processes_dirs.clone(),
            descriptors_dirs: settings.descriptors_dirs.clone(),
        }
    }
}

impl Finder for FileSystemFinder {
    fn find_processes(&self) -> Vec<PathBuf> {
        self.processes_dirs.clone()
    }

    fn find_descriptors(&self) -> Vec<PathBuf> {
        self.descriptors_dirs.clone()
    }
}

/// `processes/` and `descriptors/` directories of each app under the configured app roots
pub struct AppDirectoriesFinder {
    app_dirs: Vec<PathBuf>,
}

impl AppDirectoriesFinder {
    pub fn new(settings: &Settings) -> AppDirectoriesFinder {
        AppDirectoriesFinder { app_dirs: settings.app_dirs.clone() }
    }

    fn find(&self, subdir: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for root in &self.app_dirs {
            for app in list_dirs(root) {
                let candidate = app.join(subdir);
                if candidate.is_dir() {
                    debug!("Found app directory {}", candidate.display());
                    found.push(candidate);
                }
            }
        }
        found
    }
}

impl Finder for AppDirectoriesFinder {
    fn find_processes(&self) -> Vec<PathBuf> {
        self.find("processes")
    }

    fn find_descriptors(&self) -> Vec<PathBuf> {
        self.find("descriptors")
    }
}

/// Immediate subdirectories of `root`, sorted. An unreadable root has none.
fn list_dirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        debug!("Skipping unreadable app root {}", root.display());
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// Build the finders named in the settings, in order
pub fn get_finders(settings: &Settings) -> Vec<Box<dyn Finder>> {
    settings
        .finders
        .iter()
        .map(|kind| -> Box<dyn Finder> {
            match kind {
                FinderKind::FileSystem => Box::new(FileSystemFinder::new(settings)),
                FinderKind::AppDirectories => Box::new(AppDirectoriesFinder::new(settings)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn app_directories_finder_only_returns_existing_dirs() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("bio").join("processes")).unwrap();
        fs::create_dir_all(root.path().join("bio").join("descriptors")).unwrap();
        fs::create_dir_all(root.path().join("core").join("processes")).unwrap();
        fs::write(root.path().join("README"), "not an app").unwrap();

        let settings = Settings { app_dirs: vec![root.path().to_path_buf()], ..Settings::default() };
        let finder = AppDirectoriesFinder::new(&settings);

        assert_eq!(
            finder.find_processes(),
            vec![root.path().join("bio/processes"), root.path().join("core/processes")]
        );
        assert_eq!(finder.find_descriptors(), vec![root.path().join("bio/descriptors")]);
    }

    #[test]
    fn finders_follow_settings() {
        let settings = Settings {
            processes_dirs: vec![PathBuf::from("/defs/processes")],
            finders: vec![FinderKind::FileSystem],
            ..Settings::default()
        };
        let finders = get_finders(&settings);
        assert_eq!(finders.len(), 1);
        assert_eq!(finders[0].find_processes(), vec![PathBuf::from("/defs/processes")]);
        assert!(finders[0].find_descriptors().is_empty());
    }
}
