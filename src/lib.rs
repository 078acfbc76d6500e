// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Synchronize GitHub stars and pull requests into a Markdown vault.
//!
//! Starvault pages through the repositories a user starred, and the pull
//! requests a user authored, and materializes every record as a note with
//! YAML frontmatter. The first sync of an entity type backfills its entire
//! history. Later syncs stop at the first record that already has a note.
//!
//! # Layout
//!
//! - [`config`] and [`store`]: settings layout and persistence.
//! - [`github`]: paginated remote listings.
//! - [`note`] and [`vault`]: note materialization and storage.
//! - [`sync`]: the synchronization driver tying it all together.

pub mod config;
pub mod github;
pub mod note;
pub mod path;
pub mod store;
pub mod sync;
pub mod vault;
