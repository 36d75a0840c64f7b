//! Command line interface definition

use clap::Parser;
use migsweep_types::{ColorChoice, RepoId};
use std::path::PathBuf;

/// migsweep - remove deprecated Alembic migrations through pull requests
#[derive(Parser)]
#[command(name = "migsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Remove deprecated Alembic migrations from GitHub repositories")]
#[command(
    long_about = "Checks candidate repositories for a deprecated Alembic setup, stages the \
    cleanup on a branch of your fork, and opens a pull request back to each source repository."
)]
pub struct Cli {
    /// GitHub access token (falls back to GH_TOKEN, then MIGSWEEP_TOKEN)
    pub token: Option<String>,

    /// Process this repository (repeatable; overrides configured candidates)
    #[arg(long = "repo", value_name = "OWNER/NAME")]
    pub repos: Vec<RepoId>,

    /// Process every repository of this organization
    #[arg(long, value_name = "ORG")]
    pub org: Option<String>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments
#[derive(clap::Args)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
