// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Note materialization.
//!
//! __Materialization__ turns one GitHub record into one note of the vault.
//! Every record maps to a deterministic vault-relative path derived from its
//! identity, so the same record always lands in the same note no matter how
//! many times it gets synchronized.
//!
//! # Note Layout
//!
//! - Starred repository: `<dir>/<owner>/<repo>.md`.
//! - Pull request: `<dir>/<owner>/<repo>/<number> <title>.md`.
//!
//! # Body and Frontmatter
//!
//! A note is made of a free text body and a YAML frontmatter header. The body
//! is rendered exactly once, when the note gets created, from either the
//! built-in template or a user template. After that the body belongs to the
//! user, and is never touched again.
//!
//! When the built-in template is selected, starvault owns a fixed set of
//! frontmatter fields and sets them on every sync, whether the note was just
//! created or already existed. Fields outside that set are left alone. When a
//! user template is selected, the frontmatter is whatever the template
//! rendered.
//!
//! # See Also
//!
//! 1. [`frontmatter`]
//! 2. [`template`]

pub mod frontmatter;
pub mod template;

use crate::{
    config::Template,
    github::{PullRequest, StarredRepo},
    vault::NoteStorage,
};

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Longest pull request title kept in a file name, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Longest file name most file systems accept, in bytes.
pub const MAX_FILE_NAME_LEN: usize = 255;

const STAR_TEMPLATE: &str = "\
# {{full_name}}

{{description}}

[View on GitHub]({{html_url}})
";

const PULL_REQUEST_TEMPLATE: &str = "\
# {{title}}

Pull request #{{number}} in [{{repository}}]({{repository_html_url}}).

[View on GitHub]({{html_url}})
";

/// Record that can be materialized into a note.
pub trait NoteEntity {
    /// Human readable identity, used for logging.
    fn identity(&self) -> String;

    /// Vault-relative path of note inside target directory.
    fn note_path(&self, directory: &str) -> PathBuf;

    /// Built-in body template.
    fn builtin_template(&self) -> &'static str;

    /// Template context of record.
    fn template_context(&self) -> serde_json::Value;

    /// Frontmatter fields managed by the built-in template.
    fn frontmatter(&self) -> Mapping;
}

impl NoteEntity for StarredRepo {
    fn identity(&self) -> String {
        self.full_name.clone()
    }

    fn note_path(&self, directory: &str) -> PathBuf {
        let (owner, repo) = self
            .full_name
            .split_once('/')
            .unwrap_or((self.owner.login.as_str(), self.name.as_str()));

        Path::new(directory)
            .join(sanitize_segment(owner))
            .join(format!("{}.md", sanitize_segment(repo)))
    }

    fn builtin_template(&self) -> &'static str {
        STAR_TEMPLATE
    }

    fn template_context(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn frontmatter(&self) -> Mapping {
        let mut tags = vec!["github/star".to_string()];
        if let Some(language) = &self.language {
            tags.push(format!("language/{language}"));
        }
        tags.extend(self.topics.iter().map(|topic| format!("topic/{topic}")));

        let mut mapping = Mapping::new();
        mapping.insert("tags".into(), tags_value(tags));
        mapping.insert("description".into(), optional(&self.description));
        mapping.insert("url".into(), self.html_url.as_str().into());
        mapping.insert("owner".into(), self.owner.login.as_str().into());
        mapping.insert("owner_url".into(), self.owner.html_url.as_str().into());
        mapping.insert("language".into(), optional(&self.language));
        mapping.insert("stars".into(), self.stargazers_count.into());
        mapping.insert("created".into(), optional(&self.created_at));
        mapping.insert("updated".into(), optional(&self.updated_at));
        mapping
    }
}

impl NoteEntity for PullRequest {
    fn identity(&self) -> String {
        match self.repository() {
            Some(repo) => format!("{repo}#{}", self.number),
            None => format!("{}#{}", self.repository_url, self.number),
        }
    }

    fn note_path(&self, directory: &str) -> PathBuf {
        let mut path = PathBuf::from(directory);
        if let Some(repo) = self.repository() {
            path.push(sanitize_segment(&repo.owner));
            path.push(sanitize_segment(&repo.repo));
        }

        // INVARIANT: File name fits in MAX_FILE_NAME_LEN bytes.
        let prefix = format!("{} ", self.number);
        let budget = MAX_FILE_NAME_LEN.saturating_sub(prefix.len() + ".md".len());
        let title = truncate(&sanitize_segment(&self.title), MAX_TITLE_LEN, budget);
        let file = if title.is_empty() {
            format!("{}.md", self.number)
        } else {
            format!("{prefix}{title}.md")
        };
        path.join(file)
    }

    fn builtin_template(&self) -> &'static str {
        PULL_REQUEST_TEMPLATE
    }

    fn template_context(&self) -> serde_json::Value {
        let mut context = serde_json::to_value(self).unwrap_or_default();
        if let (Some(map), Some(repo)) = (context.as_object_mut(), self.repository()) {
            map.insert("repository".into(), repo.to_string().into());
            map.insert("repository_html_url".into(), repo_html_url(self).into());
            map.insert("owner".into(), repo.owner.into());
            map.insert("repo".into(), repo.repo.into());
        }
        if let Some(map) = context.as_object_mut() {
            map.insert("merged_at".into(), self.merged_at().into());
        }
        context
    }

    fn frontmatter(&self) -> Mapping {
        let mut tags = vec![
            "github/pull-request".to_string(),
            format!("state/{}", self.state),
        ];
        if self.draft {
            tags.push("draft".into());
        }
        if self.merged_at().is_some() {
            tags.push("merged".into());
        }
        tags.extend(self.label_names().map(|label| format!("label/{label}")));

        let repository = self.repository();
        let mut mapping = Mapping::new();
        mapping.insert("tags".into(), tags_value(tags));
        mapping.insert("title".into(), self.title.as_str().into());
        mapping.insert("url".into(), self.html_url.as_str().into());
        mapping.insert(
            "repository".into(),
            optional(&repository.as_ref().map(ToString::to_string)),
        );
        mapping.insert(
            "repository_url".into(),
            match repository {
                Some(_) => repo_html_url(self).into(),
                None => Value::Null,
            },
        );
        mapping.insert("number".into(), self.number.into());
        mapping.insert("state".into(), self.state.as_str().into());
        mapping.insert("draft".into(), self.draft.into());
        mapping.insert(
            "author".into(),
            optional(&self.user.as_ref().map(|user| user.login.clone())),
        );
        mapping.insert("created".into(), optional(&self.created_at));
        mapping.insert("closed".into(), optional(&self.closed_at));
        mapping.insert("merged".into(), optional(&self.merged_at().map(String::from)));
        mapping
    }
}

/// Materialize records into notes of a vault.
#[derive(Debug)]
pub struct Materializer<'a, S>
where
    S: NoteStorage,
{
    storage: &'a S,
}

impl<'a, S> Materializer<'a, S>
where
    S: NoteStorage,
{
    /// Construct new materializer writing into target storage.
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Materialize record into note inside target directory.
    ///
    /// Creates the note from selected template if it does not exist yet.
    /// Existing notes keep their body. With the built-in template selected,
    /// managed frontmatter fields are set either way.
    ///
    /// Returns true if the note was newly created.
    ///
    /// # Errors
    ///
    /// - Return [`NoteError::Vault`] if note or template cannot be read or
    ///   written.
    /// - Return [`NoteError::Frontmatter`] if existing frontmatter cannot be
    ///   parsed.
    #[instrument(
        skip(self, entity, template),
        fields(entity = %entity.identity()),
        level = "debug"
    )]
    pub fn materialize<E>(&self, entity: &E, directory: &str, template: &Template) -> Result<bool>
    where
        E: NoteEntity,
    {
        let path = entity.note_path(directory);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.storage.create_dir_all(parent)?;
        }

        let created = if self.storage.exists(&path) {
            debug!("note {:?} exists, keeping body", path.display());
            false
        } else {
            let body = match template {
                Template::Builtin => {
                    template::render(entity.builtin_template(), &entity.template_context())
                }
                Template::File(template_path) => {
                    let source = self.storage.read(template_path)?;
                    template::render(&source, &entity.template_context())
                }
            };
            self.storage.create(&path, &body)?;
            info!("created note {:?}", path.display());
            true
        };

        if matches!(template, Template::Builtin) {
            let fields = entity.frontmatter();
            frontmatter::edit(self.storage, &path, |mapping| {
                for (key, value) in fields {
                    mapping.insert(key, value);
                }
            })?;
        }

        Ok(created)
    }
}

/// Normalize tag to characters allowed in vault tags.
///
/// Lowercases the tag, turns whitespace and any character outside letters,
/// digits, `_`, `-`, and `/` into `-`, collapses runs of `-`, and trims
/// separators from both ends.
pub fn normalize_tag(tag: impl AsRef<str>) -> String {
    let mut out = String::new();
    for ch in tag.as_ref().trim().to_lowercase().chars() {
        let ch = if ch.is_alphanumeric() || matches!(ch, '_' | '/') {
            ch
        } else {
            '-'
        };

        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }

    out.trim_matches(|ch| ch == '-' || ch == '/').to_string()
}

/// Replace characters that are unsafe in file names.
///
/// Path separators, characters the vault treats specially in links, and
/// control characters become `-`. Runs of whitespace collapse to a single
/// space. Lone dot segments are neutralized, and a leading dot becomes `-`
/// so the note is not hidden.
pub fn sanitize_segment(segment: impl AsRef<str>) -> String {
    let replaced = segment
        .as_ref()
        .chars()
        .map(|ch| match ch {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '#' | '^' | '[' | ']' => '-',
            ch if ch.is_control() => '-',
            ch => ch,
        })
        .collect::<String>();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.as_str() {
        "." | ".." => collapsed.replace('.', "-"),
        _ => match collapsed.strip_prefix('.') {
            Some(rest) => format!("-{rest}"),
            None => collapsed,
        },
    }
}

/// Cut text down to at most `max_chars` characters and `max_bytes` bytes,
/// never splitting a character.
fn truncate(text: &str, max_chars: usize, max_bytes: usize) -> String {
    let mut end = 0;
    for (idx, ch) in text.char_indices().take(max_chars) {
        if idx + ch.len_utf8() > max_bytes {
            break;
        }
        end = idx + ch.len_utf8();
    }

    text[..end].trim_end().to_string()
}

fn tags_value(tags: Vec<String>) -> Value {
    let mut seen = Vec::new();
    for tag in tags.iter().map(normalize_tag) {
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }

    Value::Sequence(seen.into_iter().map(Value::String).collect())
}

fn optional(value: &Option<String>) -> Value {
    value
        .as_deref()
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn repo_html_url(pr: &PullRequest) -> String {
    let suffix = format!("/pull/{}", pr.number);
    match pr.html_url.strip_suffix(&suffix) {
        Some(base) => base.to_string(),
        None => pr
            .repository()
            .map(|repo| format!("https://github.com/{repo}"))
            .unwrap_or_default(),
    }
}

/// Materialization error types.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// Note or template cannot be read or written.
    #[error(transparent)]
    Vault(#[from] crate::vault::VaultError),

    /// Frontmatter cannot be edited.
    #[error(transparent)]
    Frontmatter(#[from] frontmatter::FrontmatterError),
}

/// Friendly result alias :3
pub type Result<T, E = NoteError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        github::{Label, Owner, PullRequestRef},
        vault::FsVault,
    };
    use indoc::indoc;
    use simple_test_case::test_case;

    fn star() -> StarredRepo {
        StarredRepo {
            name: "oxidot".into(),
            full_name: "awkless/oxidot".into(),
            description: Some("Dotfile manager".into()),
            html_url: "https://github.com/awkless/oxidot".into(),
            owner: Owner {
                login: "awkless".into(),
                html_url: "https://github.com/awkless".into(),
            },
            language: Some("Rust".into()),
            topics: vec!["dotfiles".into(), "Command Line".into()],
            stargazers_count: 12,
            created_at: Some("2024-05-01T10:00:00Z".into()),
            updated_at: Some("2025-02-01T10:00:00Z".into()),
        }
    }

    fn pull_request() -> PullRequest {
        PullRequest {
            number: 42,
            title: "Fix: handle a/b paths?".into(),
            html_url: "https://github.com/rust-lang/cargo/pull/42".into(),
            state: "closed".into(),
            draft: false,
            user: Some(Owner {
                login: "alice".into(),
                html_url: "https://github.com/alice".into(),
            }),
            labels: vec![Label { name: "A bug".into() }],
            repository_url: "https://api.github.com/repos/rust-lang/cargo".into(),
            created_at: Some("2025-01-01T00:00:00Z".into()),
            closed_at: Some("2025-01-03T00:00:00Z".into()),
            pull_request: Some(PullRequestRef {
                html_url: None,
                merged_at: Some("2025-01-03T00:00:00Z".into()),
            }),
            body: None,
        }
    }

    #[test_case("Rust", "rust"; "lowercase")]
    #[test_case("topic/Command Line", "topic/command-line"; "whitespace")]
    #[test_case("language/C++", "language/c"; "symbols trimmed")]
    #[test_case("label/good first issue!", "label/good-first-issue"; "trailing symbol")]
    #[test_case("a -- b", "a-b"; "collapsed dashes")]
    #[test_case("язык", "язык"; "unicode letters kept")]
    #[test]
    fn normalize_tag_cases(input: &str, expect: &str) {
        assert_eq!(normalize_tag(input), expect);
    }

    #[test_case("a/b: c", "a-b- c"; "unsafe characters")]
    #[test_case("  two   spaces ", "two spaces"; "collapsed whitespace")]
    #[test_case("..", "--"; "parent segment")]
    #[test_case(".github", "-github"; "leading dot")]
    #[test_case("v1.0", "v1.0"; "inner dot kept")]
    #[test]
    fn sanitize_segment_cases(input: &str, expect: &str) {
        assert_eq!(sanitize_segment(input), expect);
    }

    #[test]
    fn dot_repository_note_is_not_hidden() {
        let mut repo = star();
        repo.name = ".github".into();
        repo.full_name = "awkless/.github".into();
        assert_eq!(
            repo.note_path("GitHub/Stars"),
            PathBuf::from("GitHub/Stars/awkless/-github.md")
        );
    }

    #[test]
    fn star_note_path() {
        assert_eq!(
            star().note_path("GitHub/Stars"),
            PathBuf::from("GitHub/Stars/awkless/oxidot.md")
        );
    }

    #[test]
    fn pull_request_note_path_sanitizes_title() {
        assert_eq!(
            pull_request().note_path("PRs"),
            PathBuf::from("PRs/rust-lang/cargo/42 Fix- handle a-b paths-.md")
        );
    }

    #[test]
    fn pull_request_title_is_capped() {
        let mut pr = pull_request();
        pr.title = "x".repeat(300);
        let path = pr.note_path("PRs");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("42 {}.md", "x".repeat(MAX_TITLE_LEN)));
    }

    #[test]
    fn multibyte_title_fits_file_name_limit() -> anyhow::Result<()> {
        let mut pr = pull_request();
        pr.title = "修复".repeat(60);
        let path = pr.note_path("PRs");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.len() <= MAX_FILE_NAME_LEN);
        let title = "修复".repeat(60).chars().take(83).collect::<String>();
        assert_eq!(name, format!("42 {title}.md"));

        let dir = tempfile::tempdir()?;
        let vault = FsVault::new(dir.path());
        let materializer = Materializer::new(&vault);
        assert!(materializer.materialize(&pr, "PRs", &Template::Builtin)?);
        assert!(vault.exists(&path));

        Ok(())
    }

    #[test]
    fn pull_request_tags() {
        let mut pr = pull_request();
        pr.draft = true;
        let mapping = pr.frontmatter();
        let expect: Value = serde_yaml::from_str(
            "[github/pull-request, state/closed, draft, merged, label/a-bug]",
        )
        .unwrap();
        assert_eq!(mapping.get("tags"), Some(&expect));
        assert_eq!(
            mapping.get("repository_url"),
            Some(&Value::from("https://github.com/rust-lang/cargo"))
        );
    }

    #[test]
    fn create_note_from_builtin_template() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let vault = FsVault::new(dir.path());
        let materializer = Materializer::new(&vault);

        assert!(materializer.materialize(&star(), "GitHub/Stars", &Template::Builtin)?);

        let text = vault.read(Path::new("GitHub/Stars/awkless/oxidot.md"))?;
        let (source, body) = frontmatter::split(&text);
        let expect = indoc! {"
            # awkless/oxidot

            Dotfile manager

            [View on GitHub](https://github.com/awkless/oxidot)
        "};
        assert_eq!(body, expect);

        let mapping = frontmatter::parse(source.unwrap_or_default())?;
        let tags: Value = serde_yaml::from_str(
            "[github/star, language/rust, topic/dotfiles, topic/command-line]",
        )?;
        assert_eq!(mapping.get("tags"), Some(&tags));
        assert_eq!(mapping.get("stars"), Some(&Value::from(12)));
        assert_eq!(mapping.get("owner"), Some(&Value::from("awkless")));
        assert_eq!(
            mapping.get("owner_url"),
            Some(&Value::from("https://github.com/awkless"))
        );

        Ok(())
    }

    #[test]
    fn existing_note_keeps_body_and_gets_fields() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let vault = FsVault::new(dir.path());
        let path = Path::new("GitHub/Stars/awkless/oxidot.md");
        vault.create_dir_all(Path::new("GitHub/Stars/awkless"))?;
        let body = "My own notes.\n\n- keep me\n";
        vault.create(path, &format!("---\nstars: 1\nrating: 5\n---\n{body}"))?;

        let materializer = Materializer::new(&vault);
        assert!(!materializer.materialize(&star(), "GitHub/Stars", &Template::Builtin)?);

        let text = vault.read(path)?;
        let (source, result_body) = frontmatter::split(&text);
        let mapping = frontmatter::parse(source.unwrap_or_default())?;
        assert_eq!(result_body, body);
        assert_eq!(mapping.get("stars"), Some(&Value::from(12)));
        assert_eq!(mapping.get("rating"), Some(&Value::from(5)));

        Ok(())
    }

    #[test]
    fn custom_template_owns_frontmatter() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let vault = FsVault::new(dir.path());
        vault.create_dir_all(Path::new("Templates"))?;
        vault.create(
            Path::new("Templates/pr.md"),
            "---\nrepo: {{repository}}\n---\n{{title}} by {{user.login}}\n",
        )?;

        let materializer = Materializer::new(&vault);
        let template = Template::File("Templates/pr.md".into());
        assert!(materializer.materialize(&pull_request(), "PRs", &template)?);

        let path = pull_request().note_path("PRs");
        let expect = "---\nrepo: rust-lang/cargo\n---\nFix: handle a/b paths? by alice\n";
        assert_eq!(vault.read(&path)?, expect);

        // Existing notes are left alone entirely.
        vault.write(&path, "edited")?;
        assert!(!materializer.materialize(&pull_request(), "PRs", &template)?);
        assert_eq!(vault.read(&path)?, "edited");

        Ok(())
    }

    #[test]
    fn missing_user_template_fails() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let vault = FsVault::new(dir.path());
        let materializer = Materializer::new(&vault);
        let template = Template::File("Templates/missing.md".into());

        let result = materializer.materialize(&star(), "GitHub/Stars", &template);
        assert!(matches!(result, Err(NoteError::Vault(_))));

        Ok(())
    }
}
