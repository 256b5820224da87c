//! `spoke fix-titles`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::output::Output;
use crate::hosting::HostingClient;
use crate::storage::Config;
use crate::workflow::{TitleFix, TitleFixRecord, TitleFixer};

#[derive(Args)]
pub struct FixTitlesArgs {
    /// Title to set, as NAME=TITLE (repeatable; defaults to `[[title_fixes]]`)
    #[arg(long = "set", value_name = "NAME=TITLE")]
    pub fixes: Vec<TitleFix>,

    /// Render the new READMEs without pushing
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for temporary checkouts
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

pub fn run(
    args: FixTitlesArgs,
    config: &Config,
    client: &dyn HostingClient,
    output: &Output,
) -> Result<()> {
    let fixes = if args.fixes.is_empty() {
        config.project.title_fixes.clone()
    } else {
        args.fixes
    };

    if fixes.is_empty() {
        output.message("No title fixes configured");
        return Ok(());
    }

    let work_dir = args
        .work_dir
        .unwrap_or_else(|| config.project.migrate.work_dir.clone());
    output.verbose_ctx("fix-titles", &format!("Using work directory {}", work_dir.display()));

    let records = TitleFixer::new(client, work_dir, args.dry_run).run(&fixes);

    if output.is_json() {
        return output.document(&records);
    }

    for record in &records {
        match record {
            TitleFixRecord::Fixed { name, title } => output.record("fixed", &[name, title]),
            TitleFixRecord::Failed { name, reason } => output.record("failed", &[name, reason]),
        }
    }
    output.blank();
    output.total(
        "Fixed",
        format!(
            "{} of {}",
            records.iter().filter(|r| r.is_fixed()).count(),
            records.len()
        ),
    );

    Ok(())
}
