// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the settings file that starvault uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! [`SettingsStore`](crate::store::SettingsStore).
//!
//! # General Layout
//!
//! Settings are a flat record of top-level fields, plus one table per entity
//! type that gets synchronized into the vault: `[stars]` and `[pulls]`. Any
//! field missing from the file is filled in from [`Settings::default`] at
//! parse time, so the rest of the crate never has to care about defaulting.
//!
//! ```toml
//! username = "alice"
//! token = "ghp_xxx"
//! vault = "~/notes"
//!
//! [stars]
//! directory = "GitHub/Stars"
//! last_sync = "2025-10-16T12:00:00Z"
//!
//! [pulls]
//! directory = "GitHub/Pull Requests"
//! custom_template = true
//! template_path = "Templates/pull-request.md"
//! ```

use crate::path::{escapes_vault, normalize_dir};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Settings layout.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// GitHub user whose stars and pull requests get synchronized.
    pub username: String,

    /// Personal access token used as bearer credential.
    pub token: Option<String>,

    /// Root directory of the vault.
    pub vault: VaultPath,

    /// Base URL of the GitHub REST API.
    pub api_url: String,

    /// Run incremental sync of every entity type through `starvault sync`.
    pub sync_on_start: bool,

    /// Starred repository synchronization.
    pub stars: EntitySettings,

    /// Authored pull request synchronization.
    pub pulls: EntitySettings,
}

impl Settings {
    /// Settings of target entity type.
    pub fn entity(&self, kind: EntityKind) -> &EntitySettings {
        match kind {
            EntityKind::Stars => &self.stars,
            EntityKind::PullRequests => &self.pulls,
        }
    }

    /// Mutable settings of target entity type.
    pub fn entity_mut(&mut self, kind: EntityKind) -> &mut EntitySettings {
        match kind {
            EntityKind::Stars => &mut self.stars,
            EntityKind::PullRequests => &mut self.pulls,
        }
    }

    /// Non-empty token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Replace token with new answer, keeping current token if answer is
    /// blank.
    pub fn keep_or_replace_token(&mut self, answer: impl AsRef<str>) {
        let answer = answer.as_ref().trim();
        if !answer.is_empty() {
            self.token = Some(answer.into());
        }
    }

    /// Validate settings needed to sync target entity type.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::MissingUsername`] if no username is set.
    /// - Return [`ConfigError::MissingVault`] if no vault is set.
    /// - Return [`ConfigError::MissingDirectory`] if target directory is
    ///   empty after normalization.
    /// - Return [`ConfigError::OutsideVault`] if target directory or template
    ///   path leaves the vault.
    /// - Return [`ConfigError::MissingTemplatePath`] if a custom template is
    ///   selected without a template path.
    pub fn validate(&self, kind: EntityKind) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingUsername);
        }

        if self.vault.as_path().as_os_str().is_empty() {
            return Err(ConfigError::MissingVault);
        }

        let entity = self.entity(kind);
        let directory = entity.directory();
        if directory.is_empty() {
            return Err(ConfigError::MissingDirectory(kind));
        }

        if escapes_vault(&directory) {
            return Err(ConfigError::OutsideVault { kind, path: directory });
        }

        match entity.template() {
            Some(Template::File(path)) if escapes_vault(path.to_string_lossy()) => {
                Err(ConfigError::OutsideVault {
                    kind,
                    path: path.to_string_lossy().into_owned(),
                })
            }
            Some(_) => Ok(()),
            None => Err(ConfigError::MissingTemplatePath(kind)),
        }
    }

    /// Set a field by its dotted key name.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnknownKey`] if key does not name a field.
    /// - Return [`ConfigError::InvalidValue`] if value cannot be parsed for
    ///   the field.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let (entity, field) = match key.split_once('.') {
            Some(("stars", field)) => (Some(EntityKind::Stars), field),
            Some(("pulls", field)) => (Some(EntityKind::PullRequests), field),
            Some(_) => return Err(ConfigError::UnknownKey(key.into())),
            None => (None, key),
        };

        match (entity, field) {
            (None, "username") => self.username = value.trim().into(),
            (None, "token") => {
                self.token = Some(value.trim().to_string()).filter(|token| !token.is_empty())
            }
            (None, "vault") => self.vault = VaultPath::expand(value)?,
            (None, "api_url") => self.api_url = value.trim().trim_end_matches('/').into(),
            (None, "sync_on_start") => self.sync_on_start = parse_bool(key, &value)?,
            (Some(kind), "directory") => self.entity_mut(kind).directory = normalize_dir(value),
            (Some(kind), "custom_template") => {
                self.entity_mut(kind).custom_template = parse_bool(key, &value)?
            }
            (Some(kind), "template_path") => {
                self.entity_mut(kind).template_path =
                    Some(value.trim().to_string()).filter(|path| !path.is_empty())
            }
            _ => return Err(ConfigError::UnknownKey(key.into())),
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            token: None,
            vault: VaultPath::default(),
            api_url: DEFAULT_API_URL.into(),
            sync_on_start: true,
            stars: EntitySettings::new("GitHub/Stars"),
            pulls: EntitySettings::new("GitHub/Pull Requests"),
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on vault field.
        settings.vault = VaultPath::expand(settings.vault.to_string())?;

        // INVARIANT: Target directories are always stored normalized.
        settings.stars.directory = normalize_dir(&settings.stars.directory);
        settings.pulls.directory = normalize_dir(&settings.pulls.directory);

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Per entity type settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EntitySettings {
    /// Vault-relative directory notes get written into.
    pub directory: String,

    /// Render new notes from user template instead of built-in one.
    pub custom_template: bool,

    /// Vault-relative path to user template.
    pub template_path: Option<String>,

    /// Watermark of last completed sync. Empty means never synced.
    pub last_sync: Option<DateTime<Utc>>,
}

impl EntitySettings {
    /// Construct new entity settings targeting given directory.
    pub fn new(directory: impl AsRef<str>) -> Self {
        Self {
            directory: normalize_dir(directory),
            ..Default::default()
        }
    }

    /// Normalized target directory.
    pub fn directory(&self) -> String {
        normalize_dir(&self.directory)
    }

    /// Selected template.
    ///
    /// Returns nothing if custom template is toggled on without a template
    /// path.
    pub fn template(&self) -> Option<Template> {
        if !self.custom_template {
            return Some(Template::Builtin);
        }

        self.template_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(|path| Template::File(PathBuf::from(path)))
    }
}

/// Template selection for new notes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Template {
    /// Built-in minimal template. Frontmatter is managed by starvault.
    Builtin,

    /// Vault-relative user template. Frontmatter is left to template output.
    File(PathBuf),
}

/// Entity types that get synchronized into the vault.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum EntityKind {
    Stars,
    PullRequests,
}

impl Display for EntityKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Stars => fmt.write_str("stars"),
            Self::PullRequests => fmt.write_str("pull requests"),
        }
    }
}

/// Path acting as the vault root.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct VaultPath(PathBuf);

impl VaultPath {
    /// Construct new vault path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Construct new vault path with shell expansion performed.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if a referenced variable is
    ///   not set.
    pub fn expand(path: impl AsRef<str>) -> Result<Self> {
        let expanded = shellexpand::full(path.as_ref().trim())?;
        Ok(Self::new(expanded.into_owned()))
    }

    /// Treat vault path as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }
}

impl Display for VaultPath {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
        }),
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// No GitHub username configured.
    #[error("GitHub username is not configured")]
    MissingUsername,

    /// No vault configured.
    #[error("vault path is not configured")]
    MissingVault,

    /// No target directory configured.
    #[error("target directory for {0} is not configured")]
    MissingDirectory(EntityKind),

    /// Target directory or template path leaves the vault.
    #[error("{path:?} configured for {kind} leaves the vault")]
    OutsideVault { kind: EntityKind, path: String },

    /// Custom template toggled on without a path.
    #[error("custom template for {0} is enabled but no template path is set")]
    MissingTemplatePath(EntityKind),

    /// Key does not name a settings field.
    #[error("unknown settings key {0:?}")]
    UnknownKey(String),

    /// Value cannot be parsed for settings field.
    #[error("invalid value {value:?} for settings key {key:?}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
