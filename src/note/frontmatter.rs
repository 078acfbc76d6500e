// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Frontmatter handling.
//!
//! Frontmatter is a YAML mapping placed at the very top of a note, fenced by
//! lines holding nothing but `---`. Everything after the closing fence is the
//! note body. Editing frontmatter never touches a single byte of the body.

use crate::vault::NoteStorage;

use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Split note text into frontmatter source and body.
///
/// Returns no frontmatter if text does not open with a fence, or if the
/// opening fence is never closed.
pub fn split(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, text)
}

/// Parse frontmatter source into a mapping.
///
/// Empty source yields an empty mapping.
///
/// # Errors
///
/// - Return [`FrontmatterError::Yaml`] if source is not valid YAML.
/// - Return [`FrontmatterError::NotMapping`] if source is not a mapping.
pub fn parse(source: &str) -> Result<Mapping> {
    if source.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(source)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(FrontmatterError::NotMapping),
    }
}

/// Render frontmatter mapping in front of body.
///
/// # Errors
///
/// - Return [`FrontmatterError::Yaml`] if mapping cannot be serialized.
pub fn render(mapping: &Mapping, body: &str) -> Result<String> {
    if mapping.is_empty() {
        return Ok(format!("---\n---\n{body}"));
    }

    let yaml = serde_yaml::to_string(mapping)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

/// Edit frontmatter of note text.
///
/// Reads the current mapping into the editor, and rewrites the header only
/// if the editor changed something. The body is carried over as is.
///
/// # Errors
///
/// - Return [`FrontmatterError`] if existing frontmatter cannot be parsed,
///   or edited frontmatter cannot be rendered.
pub fn edit_text<E>(text: &str, editor: E) -> Result<String>
where
    E: FnOnce(&mut Mapping),
{
    let (source, body) = split(text);
    let original = parse(source.unwrap_or_default())?;
    let mut mapping = original.clone();
    editor(&mut mapping);

    if source.is_some() && mapping == original {
        return Ok(text.to_string());
    }

    render(&mapping, body)
}

/// Edit frontmatter of note stored at vault-relative path.
///
/// # Errors
///
/// - Return [`FrontmatterError::Vault`] if note cannot be read or written.
/// - Return [`FrontmatterError`] if frontmatter cannot be edited.
pub fn edit<S, E>(storage: &S, path: &Path, editor: E) -> Result<()>
where
    S: NoteStorage,
    E: FnOnce(&mut Mapping),
{
    let text = storage.read(path)?;
    let edited = edit_text(&text, editor)?;
    if edited != text {
        storage.write(path, &edited)?;
    }

    Ok(())
}

/// Frontmatter error types.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    /// Frontmatter is not valid YAML.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Frontmatter is valid YAML, but not a mapping.
    #[error("frontmatter is not a mapping")]
    NotMapping,

    /// Note cannot be read or written.
    #[error(transparent)]
    Vault(#[from] crate::vault::VaultError),
}

/// Friendly result alias :3
pub type Result<T, E = FrontmatterError> = std::result::Result<T, E>;
