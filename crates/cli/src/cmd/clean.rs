use anyhow::{Context, Result};

use compkit_lib::util::fs::remove_dir_if_exists;

use crate::ProjectArgs;
use crate::output::{print_info, print_success};

use super::{load_project, runtime};

pub fn cmd_clean(args: &ProjectArgs) -> Result<()> {
  let (_, context) = load_project(args)?;
  let output = &context.output_root;

  if !output.exists() {
    print_info(&format!("Nothing to clean at {}", output.display()));
    return Ok(());
  }

  runtime()?
    .block_on(remove_dir_if_exists(output))
    .with_context(|| format!("Failed to remove {}", output.display()))?;
  print_success(&format!("Removed {}", output.display()));

  Ok(())
}
