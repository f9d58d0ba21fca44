//! spindle - クロールを SQLite のタスクキューで実行する CLI
//!
//! ```text
//! spindle --site site.json --root http://example.test/ run
//! spindle status
//! ```
//!
//! 途中で止めても、次の `run` は保存された Pending から再開する。

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spindle_core::app::{AppBuilder, BuildError, RetryPolicy};
use spindle_core::config::{ConfigError, SpindleConfig};
use spindle_core::crawl::{self, CrawlDeps, Discovery};
use spindle_core::domain::{StoreError, WorkerError};
use spindle_core::impls::{SqliteTaskStore, StaticSite};
use spindle_core::ports::TaskStore;
use spindle_core::typed::RegistryError;

#[derive(Debug, Parser)]
#[command(name = "spindle", version, about = "Durable crawl task queue")]
struct Cli {
    /// JSON config file; flags override its values
    #[arg(long, short = 'c', env = "SPINDLE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database holding the task store
    #[arg(long, env = "SPINDLE_DB")]
    db: Option<PathBuf>,

    /// JSON map of locator to page body served as the crawled site
    #[arg(long)]
    site: Option<PathBuf>,

    /// Discovery root used to seed an empty store
    #[arg(long)]
    root: Option<String>,

    /// Failed executions before a task is given up (0 retries forever)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Seed the store if it is empty, then work until nothing is Pending
    Run,
    /// Print task counts by status
    Status,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to load site {path}: {source}")]
    Site {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("--site is required for `run`")]
    MissingSite,

    #[error("the store is empty and no --root was given to seed it")]
    MissingRoot,

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl Cli {
    /// Config file (or defaults) with flags applied on top.
    fn resolve_config(&self) -> Result<SpindleConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SpindleConfig::from_json_file(path)?,
            None => SpindleConfig::default(),
        };
        if let Some(db) = &self.db {
            config.database = db.clone();
        }
        if let Some(root) = &self.root {
            config.root = Some(root.clone());
        }
        if let Some(max) = self.max_attempts {
            config.retry = match max {
                0 => RetryPolicy::unbounded(),
                n => RetryPolicy::bounded(n),
            };
        }
        if self.json_logs {
            config.log.json = true;
        }
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "spindle failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.resolve_config()?;
    init_tracing(config.log.json);

    let store = SqliteTaskStore::open(&config.database).await?;
    let result = match cli.command {
        Command::Run => crawl_to_idle(&cli, &config, store.clone()).await,
        Command::Status => print_status(&store).await,
    };
    store.close().await;
    result
}

async fn crawl_to_idle(cli: &Cli, config: &SpindleConfig, store: SqliteTaskStore) -> Result<(), CliError> {
    let site_path = cli.site.as_ref().ok_or(CliError::MissingSite)?;
    let site = StaticSite::from_json_file(site_path).map_err(|source| CliError::Site {
        path: site_path.clone(),
        source,
    })?;
    tracing::info!(pages = site.len(), path = %site_path.display(), "site loaded");

    let deps = CrawlDeps::line_format(Arc::new(site));
    let app = crawl::install(AppBuilder::new(Arc::new(store)), &deps)?
        .expect_tasks(&crawl::KINDS)
        .worker_config(config.worker_config())
        .build()?;

    match &config.root {
        Some(root) => {
            app.seed_if_empty(&Discovery::new(root.as_str())).await?;
        }
        None if app.store().is_empty().await? => return Err(CliError::MissingRoot),
        None => tracing::info!("resuming pending tasks"),
    }

    let report = app.worker().run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn print_status(store: &SqliteTaskStore) -> Result<(), CliError> {
    let counts = store.counts().await?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}
