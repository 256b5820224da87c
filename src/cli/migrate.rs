//! `spoke migrate`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::output::Output;
use crate::hosting::HostingClient;
use crate::storage::{Config, PostStore};
use crate::workflow::{MigrateSettings, Migrator, RunLog, MIGRATION_LOG_TITLE};

#[derive(Args)]
pub struct MigrateArgs {
    /// Root of the Jekyll site checkout
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Parse and transform only; create, clone and push nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Migrate only the first few posts (see `migrate.test_limit`)
    #[arg(long)]
    pub test: bool,

    /// Migrate at most N posts
    #[arg(long, conflicts_with = "test")]
    pub limit: Option<usize>,

    /// Where to save the run log
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Directory for per-post checkouts
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

pub fn run(
    args: MigrateArgs,
    config: &Config,
    client: &dyn HostingClient,
    output: &Output,
) -> Result<()> {
    let mut migrate_config = config.project.migrate.clone();
    if let Some(source) = args.source {
        migrate_config.source = source;
    }
    if let Some(work_dir) = args.work_dir {
        migrate_config.work_dir = work_dir;
    }
    let log_file = args.log_file.unwrap_or_else(|| migrate_config.log_file.clone());

    let mut settings = MigrateSettings::from_config(&migrate_config, &config.project.topic);
    settings.dry_run = args.dry_run;
    settings.limit = if args.test {
        Some(migrate_config.test_limit)
    } else {
        args.limit
    };

    let mut log = RunLog::new(MIGRATION_LOG_TITLE);
    log.info("Starting Jekyll to Hub & Spoke migration");
    if settings.dry_run {
        log.info("DRY RUN MODE - No changes will be made");
    }
    if let Some(limit) = settings.limit {
        log.info(format!("TEST MODE - Migrating first {} posts only", limit));
    }

    let store = PostStore::for_site(&migrate_config.source, &migrate_config.posts_dir);
    output.verbose_ctx("migrate", &format!("Reading posts from {}", store.dir().display()));

    let summary = Migrator::new(client, settings).run(&store, &mut log)?;
    summary.write_to(&mut log);
    log.save(&log_file)?;
    log.info(format!("Log saved to: {}", log_file.display()));

    if output.is_json() {
        return output.document(&summary);
    }

    for record in summary
        .success
        .iter()
        .chain(&summary.failed)
        .chain(&summary.conflicts)
    {
        let status = record.status().to_string();
        output.record(
            &status,
            &[
                &record.repo_name,
                &record.filename,
                record.reason().unwrap_or_default(),
            ],
        );
    }
    output.blank();
    output.total("Successful", summary.success.len());
    output.total("Failed", summary.failed.len());
    output.total("Conflicts", summary.conflicts.len());
    output.total("Log saved to", log_file.display());

    Ok(())
}
