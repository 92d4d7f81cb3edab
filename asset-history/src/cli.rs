//! # asset-history CLI
//!
//! Argument parsing and the [`run`] entrypoint. Everything past flag handling lives in
//! `asset-history-core`: this module only turns flags into a
//! [`PipelineConfig`](asset_history_core::config::PipelineConfig), picks the credential source and
//! reports the outcome.
//!
//! For programmatic/integration use, build a [`Cli`] (e.g. with `Cli::try_parse_from`) and call
//! [`run`].

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use asset_history_core::auth::{CookieFile, CredentialProvider, EnvCookie};
use asset_history_core::config::{Endpoints, LoginPolicy, PipelineConfig, TransformCommand};
use asset_history_core::download::RemoteClient;
use asset_history_core::recorder::git_available;
use asset_history_core::synchronise::{synchronise, SyncReport};

use crate::load_config::load_config;

const LONG_ABOUT: &str = "\
Downloads versions of Roblox assets to a Git repository.

Any unprocessed arguments are interpreted as a command with arguments, which can
be used to transform files. This command runs with --output as the working
directory, and runs after each version is downloaded. If the command fails, then
that version is skipped. If --git is enabled, then the file is committed after
the command succeeds.

The --filename format may contain variables of the form %VARIABLE that expand
based on data from the version currently being processed. %% emits a literal %
character, and unknown variables emit empty strings. Variables are
case-insensitive.

  Variable              Alias  Description
  ------------------------------------------------------------------
  Id                    vid    Asset version ID.
  AssetId               aid    Asset ID.
  VersionNumber         v      Current version number.
  ParentAssetVersionId  pid    ID of the parent or previous version.
  CreatorTargetId       cid    ID of the asset creator.
  CreatorType           ct     Number indicating the creator type.
  CreatingUniverseId    uid    Universe ID, if present.
  Created               t      When the version was created.
  Updated               u      When the version was last updated.

When --git is disabled, the format must produce names that are unique per
version. If not, \"_v%VersionNumber\" is appended to the filename, before the file
extension. Using any of the Id, VersionNumber, Created, or Updated variables
will produce unique names.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoginArg {
    /// Log in only if the listing is denied without a session.
    Lazy,
    /// Log in before the first request.
    Eager,
}

impl From<LoginArg> for LoginPolicy {
    fn from(arg: LoginArg) -> Self {
        match arg {
            LoginArg::Lazy => LoginPolicy::Lazy,
            LoginArg::Eager => LoginPolicy::Eager,
        }
    }
}

/// Download every version of an asset into a folder or a git repository.
#[derive(Debug, Parser)]
#[clap(
    name = "asset-history",
    version,
    about = "Downloads versions of Roblox assets to a Git repository.",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    /// ID of asset to retrieve versions of.
    #[clap(short = 'i', long = "id", value_name = "INTEGER", value_parser = clap::value_parser!(i64).range(1..))]
    pub asset_id: i64,

    /// Path to a file containing authentication (.ROBLOSECURITY) cookies, formatted as a number
    /// of 'Set-Cookie' HTTP headers. Falls back to the ROBLOSECURITY environment variable.
    #[clap(short, long, value_name = "PATH")]
    pub auth: Option<PathBuf>,

    /// The directory to which files will be written. Defaults to the working directory.
    #[clap(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Format the name of written version files.
    #[clap(short, long, value_name = "FORMAT", default_value = "asset.rbxl")]
    pub filename: String,

    /// Compile version files into a git repository. Set --git=false to disable.
    #[clap(
        long,
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub git: bool,

    /// Tag each commit with the version number.
    #[clap(long)]
    pub tag: bool,

    /// Pipe version files into transform command instead of writing.
    #[clap(long)]
    pub pipe: bool,

    /// Verbose logging.
    #[clap(short, long)]
    pub verbose: bool,

    /// When to log in.
    #[clap(long, value_enum, default_value_t = LoginArg::Lazy)]
    pub login: LoginArg,

    /// YAML file overriding the remote endpoints.
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Transform command and its arguments.
    #[clap(value_name = "TRANSFORM", trailing_var_arg = true, allow_hyphen_values = true)]
    pub transform: Vec<String>,
}

impl Cli {
    /// Resolves flags into the immutable run configuration.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let output_dir = match &self.output {
            Some(dir) if !dir.as_os_str().is_empty() && dir.as_os_str() != "." => dir.clone(),
            _ => std::env::current_dir().context("get working directory")?,
        };
        Ok(PipelineConfig {
            asset_id: self.asset_id,
            output_dir,
            filename: self.filename.clone(),
            git: self.git,
            tag: self.tag,
            pipe: self.pipe,
            transform: TransformCommand::from_argv(&self.transform),
            login: self.login.into(),
        })
    }

    fn credentials(&self) -> Box<dyn CredentialProvider> {
        match &self.auth {
            Some(path) => Box::new(CookieFile::new(path)),
            None => Box::new(EnvCookie),
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let endpoints = match &cli.config {
        Some(path) => load_config(path)?.endpoints,
        None => Endpoints::default(),
    };
    let config = cli.pipeline_config()?;
    if config.git && !git_available() {
        bail!("git not installed");
    }
    config.trace_loaded();

    let client = RemoteClient::new(endpoints, cli.credentials())?;
    match synchronise(&config, &client).await {
        Ok(report) => {
            tracing::info!(?report, "Synchronisation complete");
            println!("{}", summary(&report));
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Synchronisation failed");
            Err(anyhow::Error::new(e).context(format!("asset {}", config.asset_id)))
        }
    }
}

fn summary(report: &SyncReport) -> String {
    let mut line = format!(
        "Synchronised asset {}: {} versions listed, {} recorded, {} skipped",
        report.asset_id,
        report.listed,
        report.recorded.len(),
        report.skipped.len()
    );
    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report.skipped.iter().map(|n| n.to_string()).collect();
        line.push_str(&format!(" (skipped versions: {})", skipped.join(", ")));
    }
    line
}
