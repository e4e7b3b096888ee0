//! Optional YAML settings: where to look for definitions and which execution engines are enabled

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use thiserror::Error;

/// Settings file looked up in the working directory when `--settings` isn't given
pub const SETTINGS_FILE_NAME: &str = "flowreg.yml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("can't read settings file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("can't parse settings file {path}: {source}")]
    Parse { path: PathBuf, source: serde_yaml::Error },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinderKind {
    FileSystem,
    AppDirectories,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directories searched by the file system finder for process definitions
    pub processes_dirs: Vec<PathBuf>,
    /// Directories searched by the file system finder for descriptor schemas
    pub descriptors_dirs: Vec<PathBuf>,
    /// Roots whose subdirectories may contain `processes/` and `descriptors/`
    pub app_dirs: Vec<PathBuf>,
    pub finders: Vec<FinderKind>,
    /// Languages a process `run` block may use
    pub execution_engines: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            processes_dirs: Vec::new(),
            descriptors_dirs: Vec::new(),
            app_dirs: Vec::new(),
            finders: vec![FinderKind::FileSystem, FinderKind::AppDirectories],
            execution_engines: vec!["bash".to_string(), "workflow".to_string()],
        }
    }
}

impl Settings {
    /// Read settings from an explicit path, or from the working directory if a settings file
    /// is there. Defaults are used when neither exists.
    pub fn load(explicit: Option<&Path>, work_dir: &Path) -> Result<Settings, SettingsError> {
        match explicit {
            Some(path) => Settings::read(path),
            None => {
                let path = work_dir.join(SETTINGS_FILE_NAME);
                if path.is_file() {
                    Settings::read(&path)
                } else {
                    info!("No settings file found, using defaults");
                    Ok(Settings::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Settings, SettingsError> {
        info!("Reading settings from {}", path.display());
        let text = fs::read_to_string(path)
            .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;
        let settings: Settings = serde_yaml::from_str(&text)
            .map_err(|source| SettingsError::Parse { path: path.to_path_buf(), source })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(settings.relative_to(base))
    }

    fn relative_to(mut self, base: &Path) -> Settings {
        let resolve = |dirs: &mut Vec<PathBuf>| {
            for dir in dirs.iter_mut() {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        };
        resolve(&mut self.processes_dirs);
        resolve(&mut self.descriptors_dirs);
        resolve(&mut self.app_dirs);
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(None, dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn relative_dirs_resolve_against_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            "processes_dirs: [procs]\napp_dirs: [/srv/apps]\nfinders: [file_system]\nexecution_engines: [bash, python]\n",
        )
        .unwrap();

        let settings = Settings::load(None, dir.path()).unwrap();
        assert_eq!(settings.processes_dirs, vec![dir.path().join("procs")]);
        assert_eq!(settings.app_dirs, vec![PathBuf::from("/srv/apps")]);
        assert_eq!(settings.finders, vec![FinderKind::FileSystem]);
        assert_eq!(settings.execution_engines, vec!["bash", "python"]);
        assert!(settings.descriptors_dirs.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "process_dirs: [typo]\n").unwrap();
        assert!(matches!(Settings::load(Some(path.as_path()), dir.path()), Err(SettingsError::Parse { .. })));
    }
}
