//! `spoke verify`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::output::Output;
use crate::hosting::HostingClient;
use crate::storage::Config;
use crate::workflow::{write_results, VerificationRecord, VerifySettings, Verifier};

#[derive(Args)]
pub struct VerifyArgs {
    /// Topic that marks published posts
    #[arg(long)]
    pub topic: Option<String>,

    /// Compute descriptions without editing repositories
    #[arg(long)]
    pub dry_run: bool,

    /// Where to write the JSON results
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Maximum description length
    #[arg(long)]
    pub max_length: Option<usize>,
}

pub fn run(
    args: VerifyArgs,
    config: &Config,
    client: &dyn HostingClient,
    output: &Output,
) -> Result<()> {
    let verify_config = &config.project.verify;
    let settings = VerifySettings {
        topic: args.topic.unwrap_or_else(|| config.project.topic.clone()),
        exclude: verify_config.exclude.clone(),
        max_length: args.max_length.unwrap_or(verify_config.max_length),
        dry_run: args.dry_run,
    };
    let results_path = args
        .results
        .unwrap_or_else(|| verify_config.results_file.clone());

    output.verbose_ctx("verify", &format!("Listing repositories tagged {}", settings.topic));
    let records = Verifier::new(client, settings)
        .run()
        .context("Failed to list repositories")?;

    write_results(&results_path, &records)?;

    if output.is_json() {
        return output.document(&records);
    }

    for record in &records {
        match record {
            VerificationRecord::Updated {
                name,
                new_description,
                ..
            } => output.record("updated", &[name, new_description]),
            VerificationRecord::Unchanged { name, .. } => output.record("unchanged", &[name]),
            VerificationRecord::Failed { name, reason } => output.record("failed", &[name, reason]),
        }
    }
    output.blank();

    let count = |f: fn(&VerificationRecord) -> bool| records.iter().filter(|r| f(r)).count();
    output.total("Total repositories", records.len());
    output.total("Updated", count(VerificationRecord::is_updated));
    output.total("Unchanged", count(VerificationRecord::is_unchanged));
    output.total("Failed", count(VerificationRecord::is_failed));
    output.total("Results saved to", results_path.display());

    Ok(())
}
