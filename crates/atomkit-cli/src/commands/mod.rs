mod check;
mod run;

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Execute a plan as one transaction against a JSON store
    Run(RunArgs),
    /// Validate a plan and list its operations without running it
    Check(CheckArgs),
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Plan file (JSON, or YAML with a .yaml/.yml extension)
    pub(crate) plan: PathBuf,

    /// JSON store file; created on save if missing
    #[arg(long, short = 's')]
    pub(crate) store: PathBuf,

    /// Print the run result as JSON
    #[arg(long)]
    pub(crate) json: bool,

    /// Run against the store without writing it back
    #[arg(long)]
    pub(crate) dry_run: bool,
}

#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Plan file (JSON, or YAML with a .yaml/.yml extension)
    pub(crate) plan: PathBuf,
}

impl Commands {
    pub(crate) async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        match self {
            Self::Run(args) => run::run(args, config_path).await,
            Self::Check(args) => check::run(&args),
        }
    }
}
