// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Settings store management.
//!
//! All configuration of starvault lives in a single TOML file called the
//! __settings store__. The default location is
//! `$XDG_CONFIG_HOME/starvault/settings.toml`, but the store can be placed
//! anywhere on the user's file system.
//!
//! A missing settings file is not an error. It simply means that every field
//! is still at its default value. The file, and any missing parent
//! directories, are created on the first save.
//!
//! Every mutation is persisted through [`SettingsStore::save`] right away.
//! Saves are not transactional, so two processes writing the same store
//! concurrently race, and the last writer wins.

use crate::config::{ConfigError, Settings};

use mkdirp::mkdirp;
use std::{
    fs::{read_to_string, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// File-backed settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Open settings store at target path.
    ///
    /// Does not touch the file system.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to settings file.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Load settings, merged over defaults.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Read`] if settings file exists but cannot be
    ///   read.
    /// - Return [`StoreError::Config`] if settings file cannot be parsed.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self) -> Result<Settings> {
        match read_to_string(&self.path) {
            Ok(content) => Ok(content.parse()?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no settings at {:?}, using defaults", self.path.display());
                Ok(Settings::default())
            }
            Err(err) => Err(StoreError::Read {
                source: err,
                path: self.path.clone(),
            }),
        }
    }

    /// Persist settings.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Write`] if settings file or its parent
    ///   directories cannot be written.
    /// - Return [`StoreError::Config`] if settings cannot be serialized.
    #[instrument(skip(self, settings), level = "debug")]
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let content = toml::ser::to_string_pretty(settings).map_err(ConfigError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            mkdirp(parent).map_err(|err| StoreError::Write {
                source: err,
                path: parent.to_path_buf(),
            })?;
        }

        write(&self.path, content).map_err(|err| StoreError::Write {
            source: err,
            path: self.path.clone(),
        })?;
        debug!("saved settings to {:?}", self.path.display());

        Ok(())
    }

    /// Load settings, apply edit, and persist the result.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError`] if loading, editing, or saving fails.
    pub fn edit<E>(&self, editor: E) -> Result<Settings>
    where
        E: FnOnce(&mut Settings) -> Result<(), ConfigError>,
    {
        let mut settings = self.load()?;
        editor(&mut settings)?;
        self.save(&settings)?;

        Ok(settings)
    }
}

/// All possible error types for settings store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Settings file cannot be read from.
    #[error("failed to read settings at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Settings file cannot be written to.
    #[error("failed to write settings at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Settings cannot be parsed or serialized.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn load_missing_file_yields_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SettingsStore::open(dir.path().join("settings.toml"));
        assert_eq!(store.load()?, Settings::default());

        Ok(())
    }

    #[test]
    fn save_creates_parent_directories() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SettingsStore::open(dir.path().join("nested/deeper/settings.toml"));

        let settings = store.edit(|settings| settings.set("username", "alice"))?;
        assert_eq!(settings.username, "alice");
        assert_eq!(store.load()?, settings);

        Ok(())
    }

    #[test]
    fn edit_failure_does_not_persist() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SettingsStore::open(dir.path().join("settings.toml"));

        let result = store.edit(|settings| settings.set("nope", "value"));
        assert!(matches!(
            result,
            Err(StoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(!store.path().exists());

        Ok(())
    }
}
