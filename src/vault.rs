// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Note storage.
//!
//! A vault is just a directory of Markdown files. Every path handed to a
//! [`NoteStorage`] is relative to the vault root, so the materializer never
//! has to know where the vault actually lives.

use mkdirp::mkdirp;
use std::{
    fs::{read_to_string, write, OpenOptions},
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::{debug, instrument};

/// Layer of indirection for hierarchical note storage.
pub trait NoteStorage {
    /// Check if file exists at vault-relative path.
    fn exists(&self, path: &Path) -> bool;

    /// Read file at vault-relative path.
    fn read(&self, path: &Path) -> Result<String>;

    /// Create new file at vault-relative path.
    ///
    /// Fails if a file already exists at that path.
    fn create(&self, path: &Path, contents: &str) -> Result<()>;

    /// Overwrite existing file at vault-relative path.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Create directory at vault-relative path, along with any missing
    /// intermediate directories.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// Vault living on the local file system.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Construct new vault rooted at target directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of vault.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        // INVARIANT: Never escape the vault root.
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(VaultError::OutsideVault(path.to_path_buf()));
        }

        Ok(self.root.join(path))
    }
}

impl NoteStorage for FsVault {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_ok_and(|full| full.is_file())
    }

    fn read(&self, path: &Path) -> Result<String> {
        let full = self.resolve(path)?;
        read_to_string(&full).map_err(|err| VaultError::Read {
            source: err,
            path: full,
        })
    }

    #[instrument(skip(self, contents), level = "debug")]
    fn create(&self, path: &Path, contents: &str) -> Result<()> {
        let full = self.resolve(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|err| VaultError::Write {
                source: err,
                path: full.clone(),
            })?;
        file.write_all(contents.as_bytes())
            .map_err(|err| VaultError::Write {
                source: err,
                path: full.clone(),
            })?;
        debug!("created {:?}", full.display());

        Ok(())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let full = self.resolve(path)?;
        write(&full, contents).map_err(|err| VaultError::Write {
            source: err,
            path: full,
        })
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path)?;
        mkdirp(&full).map_err(|err| VaultError::CreateDir {
            source: err,
            path: full,
        })?;

        Ok(())
    }
}

/// All possible error types for vault interaction.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Path resolves outside of vault root.
    #[error("path {:?} leaves the vault", .0.display())]
    OutsideVault(PathBuf),

    /// File cannot be read from.
    #[error("failed to read note at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be written to.
    #[error("failed to write note at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory cannot be created.
    #[error("failed to create directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = VaultError> = std::result::Result<T, E>;
