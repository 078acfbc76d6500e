// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for the settings file, and normalize
//! the vault-relative directories that notes get written into.

use std::path::PathBuf;

/// Determine default absolute path to settings file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/starvault/settings.toml` as
/// the default absolute path. Does not check if the path returned actually
/// exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory path cannot be
///   determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_settings_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("starvault").join("settings.toml"))
        .ok_or(NoWayHome)
}

/// Normalize vault-relative directory path.
///
/// Backslashes become forward slashes, empty and `.` segments are dropped,
/// and surrounding whitespace is trimmed from each segment. The result never
/// starts or ends with a slash. An empty result means the vault root itself.
pub fn normalize_dir(dir: impl AsRef<str>) -> String {
    dir.as_ref()
        .replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Check if vault-relative path climbs out of the vault through a `..`
/// segment.
pub fn escapes_vault(path: impl AsRef<str>) -> bool {
    path.as_ref()
        .replace('\\', "/")
        .split('/')
        .any(|segment| segment.trim() == "..")
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
