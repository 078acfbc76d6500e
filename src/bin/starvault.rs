// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use starvault::{
    config::EntityKind,
    github::GithubClient,
    path::default_settings_path,
    store::SettingsStore,
    sync::{SyncMode, Syncer},
    vault::FsVault,
};

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Password, Text};
use std::{path::PathBuf, process::exit, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "starvault [options] <starvault-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to settings file.
    #[arg(short, long, global = true, value_name = "path")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let store = match self.settings {
            Some(path) => SettingsStore::open(path),
            None => SettingsStore::open(default_settings_path()?),
        };

        match self.command {
            Command::Stars(opts) => run_fetch(&store, EntityKind::Stars, opts).await,
            Command::Pulls(opts) => run_fetch(&store, EntityKind::PullRequests, opts).await,
            Command::Sync => run_sync(&store).await,
            Command::Config(opts) => run_config(&store, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Fetch starred repositories into the vault.
    #[command(override_usage = "starvault stars [options]")]
    Stars(FetchOptions),

    /// Fetch authored pull requests into the vault.
    #[command(override_usage = "starvault pulls [options]")]
    Pulls(FetchOptions),

    /// Incrementally sync every entity type if sync on start is enabled.
    #[command(override_usage = "starvault sync")]
    Sync,

    /// Inspect or change settings.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Clone, Debug)]
struct FetchOptions {
    /// Clear last sync time first, and backfill the entire history.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Interactively fill in essential settings.
    #[command(override_usage = "starvault config init")]
    Init,

    /// Show current settings with the token redacted.
    #[command(override_usage = "starvault config show")]
    Show,

    /// Set a single settings field.
    #[command(override_usage = "starvault config set <key> <value>")]
    Set(SetOptions),
}

#[derive(Args, Clone, Debug)]
struct SetOptions {
    /// Settings key, e.g., "username" or "stars.directory".
    #[arg(value_name = "key")]
    pub key: String,

    /// New value of settings field.
    #[arg(value_name = "value")]
    pub value: String,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

async fn run_fetch(store: &SettingsStore, kind: EntityKind, opts: FetchOptions) -> Result<()> {
    let mut settings = store.load()?;
    let mode = if opts.force {
        SyncMode::Force
    } else {
        SyncMode::Normal
    };

    let client = GithubClient::new(&settings.api_url, settings.token())?;
    let vault = FsVault::new(settings.vault.as_path());
    let bar = spinner()?;

    let syncer = Syncer::new(&client, &vault, store).with_progress(bar.clone());
    match syncer.sync(kind, mode, &mut settings).await {
        Ok(report) => {
            bar.finish_and_clear();
            println!("{report}");
            Ok(())
        }
        Err(err) => {
            bar.abandon_with_message(format!("failed to sync {kind}: {err}"));
            warn!("last sync time of {kind} left untouched");
            Err(err.into())
        }
    }
}

async fn run_sync(store: &SettingsStore) -> Result<()> {
    let mut settings = store.load()?;
    let client = GithubClient::new(&settings.api_url, settings.token())?;
    let vault = FsVault::new(settings.vault.as_path());
    let bar = spinner()?;

    let syncer = Syncer::new(&client, &vault, store).with_progress(bar.clone());
    let outcomes = syncer.sync_on_start(&mut settings).await;
    bar.finish_and_clear();

    let mut failed = Vec::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(report) => println!("{report}"),
            Err(error) => {
                error!("{:?}", anyhow::Error::from(error));
                failed.push(kind.to_string());
            }
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!("failed to sync {}", failed.join(" and ")));
    }

    Ok(())
}

fn spinner() -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} {msg} [{pos} record(s)]",
    )?);
    bar.enable_steady_tick(Duration::from_millis(100));

    Ok(bar)
}

fn run_config(store: &SettingsStore, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => run_config_init(store),
        ConfigCommand::Show => run_config_show(store),
        ConfigCommand::Set(opts) => {
            store.edit(|settings| settings.set(&opts.key, opts.value))?;
            info!("set {} in {:?}", opts.key, store.path().display());
            Ok(())
        }
    }
}

fn run_config_init(store: &SettingsStore) -> Result<()> {
    let mut settings = store.load()?;

    let username = Text::new("GitHub username")
        .with_initial_value(&settings.username)
        .prompt()?;
    settings.set("username", username)?;

    let token = Password::new("GitHub token (leave empty to keep current)")
        .without_confirmation()
        .prompt()?;
    settings.keep_or_replace_token(token);

    let vault = settings.vault.to_string();
    let vault = Text::new("Vault directory")
        .with_initial_value(&vault)
        .prompt()?;
    settings.set("vault", vault)?;

    let stars = Text::new("Directory for starred repositories")
        .with_initial_value(&settings.stars.directory)
        .prompt()?;
    settings.set("stars.directory", stars)?;

    let pulls = Text::new("Directory for pull requests")
        .with_initial_value(&settings.pulls.directory)
        .prompt()?;
    settings.set("pulls.directory", pulls)?;

    settings.sync_on_start = Confirm::new("Sync on start")
        .with_default(settings.sync_on_start)
        .prompt()?;

    store.save(&settings)?;
    info!("saved settings to {:?}", store.path().display());

    Ok(())
}

fn run_config_show(store: &SettingsStore) -> Result<()> {
    let mut settings = store.load()?;
    if settings.token.is_some() {
        settings.token = Some("<redacted>".into());
    }
    print!("{settings}");

    Ok(())
}
