// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Synchronization driver.
//!
//! Decide, for each entity type independently, how many pages of a remote
//! listing to fetch and when to stop. A full historical backfill happens once,
//! and every later run only costs as much as the number of new records.
//!
//! # Watermarks
//!
//! Every entity type keeps a __watermark__, the wall-clock time of its last
//! completed sync. An empty watermark means the entity type was never synced.
//!
//! - __First fetch__: the watermark is empty. Every page gets processed until
//!   the remote returns a short page, no matter what materialization reports.
//! - __Incremental fetch__: the watermark is set. Processing stops at the
//!   first record whose note already existed, without requesting any more
//!   pages. Listings come in descending creation order, so everything after
//!   a known record is known as well.
//!
//! The watermark only advances when a run completes. A run that fails midway
//! leaves it untouched, so the next run examines the same range again.
//!
//! # Pitfalls
//!
//! The incremental stop relies entirely on the remote ordering. If the remote
//! reorders results, or notes get created behind starvault's back, an
//! incremental run under-fetches without noticing. A forced run clears the
//! watermark and performs a full backfill, which recovers from both.
//!
//! A record that fails to materialize is logged and skipped. It counts as not
//! existing, so it never triggers the incremental stop.

use crate::{
    config::{ConfigError, EntityKind, Settings, Template},
    github::{GithubError, RemoteSource, PAGE_SIZE},
    note::{Materializer, NoteEntity},
    store::{SettingsStore, StoreError},
    vault::NoteStorage,
};

use chrono::Utc;
use indicatif::ProgressBar;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    future::Future,
};
use tracing::{debug, info, instrument, warn};

/// How a sync run treats the existing watermark.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Honor watermark.
    #[default]
    Normal,

    /// Clear watermark first, forcing a full backfill.
    Force,
}

/// Outcome of a completed sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub kind: EntityKind,
    pub first_fetch: bool,
    pub pages: u32,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub stopped_early: bool,
}

impl SyncReport {
    fn new(kind: EntityKind, first_fetch: bool) -> Self {
        Self {
            kind,
            first_fetch,
            pages: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            stopped_early: false,
        }
    }
}

impl Display for SyncReport {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "{}: {} created, {} updated, {} skipped across {} page(s)",
            self.kind, self.created, self.updated, self.skipped, self.pages
        )
    }
}

/// Drive synchronization of remote listings into a vault.
pub struct Syncer<'a, R, S>
where
    R: RemoteSource,
    S: NoteStorage,
{
    remote: &'a R,
    storage: &'a S,
    store: &'a SettingsStore,
    bar: ProgressBar,
}

impl<'a, R, S> Syncer<'a, R, S>
where
    R: RemoteSource,
    S: NoteStorage,
{
    /// Construct new syncer.
    ///
    /// Progress is not displayed unless a progress bar is attached through
    /// [`Syncer::with_progress`].
    pub fn new(remote: &'a R, storage: &'a S, store: &'a SettingsStore) -> Self {
        Self {
            remote,
            storage,
            store,
            bar: ProgressBar::hidden(),
        }
    }

    /// Display progress through target progress bar.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.bar = bar;
        self
    }

    /// Synchronize one entity type.
    ///
    /// Validates settings before any network call. On completion the
    /// watermark of the entity type is set to the current time, and settings
    /// are persisted.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Config`] if settings are incomplete.
    /// - Return [`SyncError::Remote`] if a page cannot be fetched.
    /// - Return [`SyncError::Store`] if settings cannot be persisted.
    #[instrument(skip(self, settings), level = "debug")]
    pub async fn sync(
        &self,
        kind: EntityKind,
        mode: SyncMode,
        settings: &mut Settings,
    ) -> Result<SyncReport> {
        settings.validate(kind)?;

        if mode == SyncMode::Force {
            info!("forcing full sync of {kind}");
            settings.entity_mut(kind).last_sync = None;
            self.store.save(settings)?;
        }

        let entity = settings.entity(kind);
        let first_fetch = entity.last_sync.is_none();
        let directory = entity.directory();
        let template = entity
            .template()
            .ok_or(ConfigError::MissingTemplatePath(kind))?;
        let username = settings.username.trim();

        let report = match kind {
            EntityKind::Stars => {
                self.drive(kind, first_fetch, &directory, &template, move |page| {
                    self.remote.starred_page(username, page)
                })
                .await?
            }
            EntityKind::PullRequests => {
                self.drive(kind, first_fetch, &directory, &template, move |page| {
                    self.remote.pull_requests_page(username, page)
                })
                .await?
            }
        };

        settings.entity_mut(kind).last_sync = Some(Utc::now());
        self.store.save(settings)?;
        info!("{report}");

        Ok(report)
    }

    /// Incrementally synchronize every entity type, if sync on start is
    /// enabled.
    ///
    /// Stars are synchronized before pull requests. Each entity type runs
    /// independently, so one failing does not keep the other from running.
    /// Returns the outcome of every entity type that ran, in order. Nothing
    /// runs when sync on start is disabled.
    pub async fn sync_on_start(
        &self,
        settings: &mut Settings,
    ) -> Vec<(EntityKind, Result<SyncReport>)> {
        if !settings.sync_on_start {
            info!("sync on start is disabled, nothing to do");
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for kind in [EntityKind::Stars, EntityKind::PullRequests] {
            let outcome = self.sync(kind, SyncMode::Normal, settings).await;
            if let Err(error) = &outcome {
                warn!("failed to sync {kind}: {error}");
            }
            outcomes.push((kind, outcome));
        }

        outcomes
    }

    async fn drive<E, F, Fut>(
        &self,
        kind: EntityKind,
        first_fetch: bool,
        directory: &str,
        template: &Template,
        mut fetch: F,
    ) -> Result<SyncReport>
    where
        E: NoteEntity,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Vec<E>, GithubError>>,
    {
        let materializer = Materializer::new(self.storage);
        let mut report = SyncReport::new(kind, first_fetch);
        let mut page = 1;

        if first_fetch {
            info!("first fetch of {kind}, syncing full history");
        } else {
            debug!("incremental fetch of {kind}");
        }

        loop {
            self.bar.set_message(format!("{kind}: page {page}"));
            let items = fetch(page).await?;
            report.pages = page;
            debug!("page {page} of {kind} holds {} record(s)", items.len());

            for item in &items {
                self.bar.inc(1);
                match materializer.materialize(item, directory, template) {
                    Ok(true) => report.created += 1,
                    Ok(false) => {
                        report.updated += 1;
                        // INVARIANT: Incremental fetch stops at first known record.
                        if !first_fetch {
                            debug!("{} already synced, stopping", item.identity());
                            report.stopped_early = true;
                            return Ok(report);
                        }
                    }
                    Err(error) => {
                        warn!("skipping {}: {error}", item.identity());
                        report.skipped += 1;
                    }
                }
            }

            // INVARIANT: A short page is the only end-of-listing signal.
            if items.len() < PAGE_SIZE {
                return Ok(report);
            }
            page += 1;
        }
    }
}

/// Synchronization error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Settings are incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Remote listing cannot be fetched.
    #[error(transparent)]
    Remote(#[from] GithubError),

    /// Settings cannot be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Friendly result alias :3
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
