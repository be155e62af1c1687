mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use compkit_lib::context::Target;

use crate::output::OutputFormat;

/// compkit - build components for web, weex and miniapp targets
#[derive(Parser)]
#[command(name = "compkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Where the project lives and what to build it for.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
  /// Project root (default: current directory)
  #[arg(short, long, default_value = ".")]
  pub project: PathBuf,

  /// Target to build; repeat for several (overrides the config file)
  #[arg(short, long = "target", value_name = "TARGET")]
  pub targets: Vec<Target>,

  /// Output directory relative to the project root (overrides the config file)
  #[arg(short, long)]
  pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the component
  Build {
    #[command(flatten)]
    project: ProjectArgs,
  },

  /// Show the stages a build would run, without touching the disk
  Plan {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Remove the output directory
  Clean {
    #[command(flatten)]
    project: ProjectArgs,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build { project } => cmd::cmd_build(&project),
    Commands::Plan { project, format } => cmd::cmd_plan(&project, format),
    Commands::Clean { project } => cmd::cmd_clean(&project),
  }
}
