// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use starvault::{
    config::Settings,
    github::{GithubError, Owner, PullRequest, PullRequestRef, RemoteSource, StarredRepo},
    store::SettingsStore,
    vault::FsVault,
};
use std::sync::Mutex;
use tempfile::TempDir;

/// Remote serving a fixed listing in pages of 100.
#[derive(Default)]
pub(crate) struct GithubFixture {
    stars: Mutex<Vec<StarredRepo>>,
    pulls: Mutex<Vec<PullRequest>>,
    requested: Mutex<Vec<(&'static str, u32)>>,
}

impl GithubFixture {
    pub(crate) fn new(stars: Vec<StarredRepo>, pulls: Vec<PullRequest>) -> Self {
        Self {
            stars: Mutex::new(stars),
            pulls: Mutex::new(pulls),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_pulls(&self, pulls: Vec<PullRequest>) {
        *self.pulls.lock().unwrap() = pulls;
    }

    /// Drain record of requested pages.
    pub(crate) fn take_requested(&self) -> Vec<(&'static str, u32)> {
        std::mem::take(&mut *self.requested.lock().unwrap())
    }
}

fn page_of<T: Clone>(items: &[T], page: u32) -> Vec<T> {
    items
        .chunks(starvault::github::PAGE_SIZE)
        .nth(page as usize - 1)
        .map(<[T]>::to_vec)
        .unwrap_or_default()
}

impl RemoteSource for GithubFixture {
    async fn starred_page(
        &self,
        _username: &str,
        page: u32,
    ) -> Result<Vec<StarredRepo>, GithubError> {
        self.requested.lock().unwrap().push(("stars", page));
        Ok(page_of(&self.stars.lock().unwrap(), page))
    }

    async fn pull_requests_page(
        &self,
        _username: &str,
        page: u32,
    ) -> Result<Vec<PullRequest>, GithubError> {
        self.requested.lock().unwrap().push(("pulls", page));
        Ok(page_of(&self.pulls.lock().unwrap(), page))
    }
}

/// Throwaway vault with settings store next to it.
pub(crate) struct VaultFixture {
    _dir: TempDir,
    pub(crate) vault: FsVault,
    pub(crate) store: SettingsStore,
}

impl VaultFixture {
    pub(crate) fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let vault = FsVault::new(dir.path().join("vault"));
        let store = SettingsStore::open(dir.path().join("config/settings.toml"));
        store.edit(|settings| {
            settings.set("username", "alice")?;
            settings.set("vault", dir.path().join("vault").to_string_lossy())
        })?;

        Ok(Self {
            _dir: dir,
            vault,
            store,
        })
    }

    pub(crate) fn settings(&self) -> Result<Settings> {
        Ok(self.store.load()?)
    }

    /// Count Markdown files below vault root.
    pub(crate) fn count_notes(&self) -> usize {
        fn walk(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|entry| {
                            let path = entry.path();
                            if path.is_dir() {
                                walk(&path)
                            } else {
                                usize::from(path.extension().is_some_and(|ext| ext == "md"))
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }

        walk(self.vault.root())
    }
}

pub(crate) fn star(owner: &str, name: &str) -> StarredRepo {
    StarredRepo {
        name: name.into(),
        full_name: format!("{owner}/{name}"),
        description: Some(format!("The {name} project")),
        html_url: format!("https://github.com/{owner}/{name}"),
        owner: Owner {
            login: owner.into(),
            html_url: format!("https://github.com/{owner}"),
        },
        language: Some("Rust".into()),
        topics: vec!["cli".into()],
        stargazers_count: 100,
        created_at: Some("2024-01-01T00:00:00Z".into()),
        updated_at: Some("2025-01-01T00:00:00Z".into()),
    }
}

pub(crate) fn pull(owner: &str, repo: &str, number: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.into(),
        html_url: format!("https://github.com/{owner}/{repo}/pull/{number}"),
        state: "open".into(),
        draft: false,
        user: Some(Owner {
            login: "alice".into(),
            html_url: "https://github.com/alice".into(),
        }),
        labels: Vec::new(),
        repository_url: format!("https://api.github.com/repos/{owner}/{repo}"),
        created_at: Some("2025-03-01T00:00:00Z".into()),
        closed_at: None,
        pull_request: Some(PullRequestRef {
            html_url: Some(format!("https://github.com/{owner}/{repo}/pull/{number}")),
            merged_at: None,
        }),
        body: None,
    }
}
