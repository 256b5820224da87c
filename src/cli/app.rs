//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{fix_titles, inspect, migrate, verify};
use crate::hosting::GhClient;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "spoke")]
#[command(author, version, about = "Move Jekyll posts into one repository per post")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project config file (defaults to ./spoke.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Account that owns the repositories
    #[arg(long, global = true, env = "SPOKE_OWNER")]
    pub owner: Option<String>,

    /// `gh` executable to use
    #[arg(long, global = true)]
    pub gh: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish each source post as its own repository
    Migrate(migrate::MigrateArgs),

    /// Regenerate repository descriptions from published READMEs
    Verify(verify::VerifyArgs),

    /// Write missing titles into published READMEs
    FixTitles(fix_titles::FixTitlesArgs),

    /// Show what migration would derive from a single post
    Inspect(inspect::InspectArgs),
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output::new(cli.format, cli.verbose);
    let config = Config::load(cli.config.as_deref())?;
    output.verbose_ctx(
        "config",
        &match &config.path {
            Some(path) => format!("Loaded {}", path.display()),
            None => "Using built-in defaults".to_string(),
        },
    );

    match cli.command {
        Commands::Migrate(args) => {
            let client = gh_client(&cli.owner, &cli.gh, &config)?;
            migrate::run(args, &config, &client, &output)?
        }
        Commands::Verify(args) => {
            let client = gh_client(&cli.owner, &cli.gh, &config)?;
            verify::run(args, &config, &client, &output)?
        }
        Commands::FixTitles(args) => {
            let client = gh_client(&cli.owner, &cli.gh, &config)?;
            fix_titles::run(args, &config, &client, &output)?
        }
        Commands::Inspect(args) => inspect::run(args, &config, &output)?,
    }

    Ok(())
}

/// Routes `log` records to stderr; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .try_init();
}

fn gh_client(owner: &Option<String>, gh: &Option<String>, config: &Config) -> Result<GhClient> {
    let owner = config.owner(owner.as_deref())?;
    let settings = &config.project.migrate;

    Ok(GhClient::new(owner)
        .with_program(config.gh_program(gh.as_deref()))
        .with_visibility(settings.visibility.clone())
        .with_branch(settings.branch.clone())
        .with_list_limit(config.project.verify.list_limit))
}
