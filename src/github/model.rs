// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GitHub records consumed by starvault.
//!
//! Only the attributes that end up in a note are modeled. Everything else the
//! REST API returns is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Repository starred by a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StarredRepo {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub owner: Owner,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Account owning a repository, or authoring a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Owner {
    pub login: String,
    pub html_url: String,
}

/// Pull request authored by a user, as returned by issue search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    pub user: Option<Owner>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub repository_url: String,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub pull_request: Option<PullRequestRef>,
    pub body: Option<String>,
}

impl PullRequest {
    /// Owner and name of repository the pull request was opened against.
    ///
    /// Parsed from the trailing `repos/<owner>/<repo>` segments of the
    /// repository API URL.
    pub fn repository(&self) -> Option<RepoName> {
        let mut segments = self
            .repository_url
            .trim_end_matches('/')
            .rsplit('/')
            .filter(|segment| !segment.is_empty());
        let repo = segments.next()?;
        let owner = segments.next()?;

        Some(RepoName {
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// Timestamp the pull request got merged at, if it did.
    pub fn merged_at(&self) -> Option<&str> {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.merged_at.as_deref())
    }

    /// Label names.
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|label| label.name.as_str())
    }
}

/// Pull request specific part of an issue search result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullRequestRef {
    pub html_url: Option<String>,
    pub merged_at: Option<String>,
}

/// Issue label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Label {
    pub name: String,
}

/// Owner and name pair of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoName {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}/{}", self.owner, self.repo)
    }
}

/// Issue search response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResults<T> {
    pub(crate) items: Vec<T>,
}
