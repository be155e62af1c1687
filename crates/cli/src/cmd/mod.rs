mod build;
mod clean;
mod plan;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use plan::cmd_plan;

use anyhow::{Context, Result};

use compkit_lib::config::ProjectConfig;
use compkit_lib::context::BuildContext;

use crate::ProjectArgs;

/// Load the project config and apply command-line overrides.
fn load_project(args: &ProjectArgs) -> Result<(ProjectConfig, BuildContext)> {
  if !args.project.is_dir() {
    anyhow::bail!("Project directory not found: {}", args.project.display());
  }

  let config = ProjectConfig::load(&args.project)
    .context("Failed to load project config")?
    .with_targets(args.targets.clone())
    .with_output_dir(args.output_dir.clone());
  let context = BuildContext::resolve(&args.project, &config);
  context.validate().context("Invalid project layout")?;

  Ok((config, context))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
