//! Purger CLI
//!
//! Local execution entry point. For AWS Lambda, use `purger-lambda`.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use purger::{
    config::{config_path, load_config},
    error::{AppError, Result},
    models::{Config, PaperPurgeRequest, StorageChangeEvent, TAXONOMY, TargetKind},
    pipeline::{self, PurgeSummary},
    purge::{Invalidator, fastly_transport},
    services::{AnnouncementKeyBuilder, StorageKeyMapper, paper_keys},
    storage::{AnnouncementStore, LocalStorage},
    utils::log,
};

/// Paper repository CDN purger
#[derive(Parser, Debug)]
#[command(
    name = "purger",
    version,
    about = "Purge CDN cache keys for announcements and storage changes"
)]
struct Cli {
    /// Directory holding `mailings/` and `metadata.json`
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Configuration file (default: $PURGE_CONFIG or config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log keys instead of purging them
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Purge the pages changed by a mailing, then `announce`
    Announce {
        /// Mailing date (default: the latest mailing, US Eastern)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Purge the pages backed by a changed storage object
    Object {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },

    /// Purge every page of one paper
    Paper {
        /// Paper id, e.g. 2405.01234 or cs/0005003
        #[arg(long)]
        id: String,

        /// Categories before a reclassification
        #[arg(long)]
        old_categories: Option<String>,
    },

    /// Print derived keys without purging
    Keys {
        #[command(subcommand)]
        source: KeySource,
    },

    /// Validate configuration
    Validate,
}

#[derive(Subcommand, Debug)]
enum KeySource {
    /// Keys for a mailing
    Announce {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Keys for a changed storage object
    Object {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },

    /// Keys for one paper
    Paper {
        #[arg(long)]
        id: String,
        #[arg(long)]
        old_categories: Option<String>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    log::init(level);
}

fn today() -> NaiveDate {
    pipeline::mailing_date(Utc::now())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.config.clone().unwrap_or_else(config_path);
    let mut config = load_config(&path)?;
    if cli.dry_run {
        config.purge.dry_run = true;
    }
    ::log::debug!("Loaded configuration from {}", path.display());

    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command {
        Command::Announce { date } => {
            let date = date.unwrap_or_else(today);
            log::header(&format!("Announcement purge for {date}"));
            let papers = invalidator(&config, TargetKind::Paper)?;
            let announce = invalidator(&config, TargetKind::Announce)?;
            let summary =
                pipeline::run_announcement_purge(&storage, date, &papers, &announce).await?;
            report(&summary)?;
        }

        Command::Object { bucket, key } => {
            log::header(&format!("Object purge for {bucket}/{key}"));
            let mapper = StorageKeyMapper::new(&config.objects);
            let event = StorageChangeEvent::new(bucket, key);
            let papers = invalidator(&config, TargetKind::Paper)?;
            let summary = pipeline::run_object_purge(&event, &mapper, &papers).await;
            report(&summary)?;
        }

        Command::Paper { id, old_categories } => {
            log::header(&format!("Paper purge for {id}"));
            let request = PaperPurgeRequest {
                paper_id: id,
                old_categories,
            };
            let papers = invalidator(&config, TargetKind::Paper)?;
            let summary = pipeline::run_paper_purge(&storage, &request, &papers).await?;
            report(&summary)?;
        }

        Command::Keys { source } => {
            for key in derive_keys(&config, &storage, source).await? {
                println!("{key}");
            }
        }

        Command::Validate => {
            log::header("Validating configuration");
            if let Err(e) = config.validate() {
                log::error(&format!("Config validation failed: {}", e));
                return Err(e);
            }
            log::success(&format!(
                "✓ Config OK (environment: {}, dry run: {})",
                config.purge.environment.as_str(),
                config.is_dry_run()
            ));
            for kind in [TargetKind::Paper, TargetKind::Announce] {
                for target in config.targets(kind)? {
                    log::sub_item(&format!("{:?} target: {}", kind, target.domain));
                }
            }
        }
    }

    Ok(())
}

fn invalidator(config: &Config, kind: TargetKind) -> Result<Invalidator> {
    config.validate()?;
    Invalidator::from_config(config, kind, fastly_transport(config)?)
}

/// Print the run report; fail the process if any target failed.
fn report(summary: &PurgeSummary) -> Result<()> {
    log::purge_summary(summary);
    if summary.is_success() {
        Ok(())
    } else {
        Err(AppError::purge(
            summary.operation.clone(),
            None,
            format!("{} target(s) failed", summary.failed_targets()),
        ))
    }
}

async fn derive_keys(
    config: &Config,
    storage: &dyn AnnouncementStore,
    source: KeySource,
) -> Result<Vec<String>> {
    match source {
        KeySource::Announce { date } => {
            let records = storage.load_announcements(date.unwrap_or_else(today)).await?;
            Ok(AnnouncementKeyBuilder::new(&TAXONOMY).build(&records).to_vec())
        }
        KeySource::Object { bucket, key } => {
            Ok(StorageKeyMapper::new(&config.objects).keys_for_change(&bucket, &key))
        }
        KeySource::Paper { id, old_categories } => {
            let request = PaperPurgeRequest {
                paper_id: id,
                old_categories,
            };
            let metadata = storage
                .load_metadata(&request.paper_id)
                .await?
                .ok_or_else(|| {
                    AppError::validation(format!("No metadata for paper {}", request.paper_id))
                })?;
            Ok(paper_keys(&TAXONOMY, &metadata, request.old_categories())?.to_vec())
        }
    }
}
