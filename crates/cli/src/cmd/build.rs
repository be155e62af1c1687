//! Implementation of the `compkit build` command.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use compkit_lib::execute::{BuildOutcome, Orchestrator};
use compkit_lib::util::hash::hash_tree;

use crate::ProjectArgs;
use crate::output::{format_duration, print_error, print_stat, print_step, print_success};

use super::{load_project, runtime};

/// Execute the build command.
///
/// Runs every stage the project needs, then prints one line per step and a
/// fingerprint of the output directory. A miniapp compiler failure is
/// reported after the step lines and turns into a non-zero exit.
pub fn cmd_build(args: &ProjectArgs) -> Result<()> {
  let start = Instant::now();
  let (config, context) = load_project(args)?;
  debug!(?context, "resolved build context");

  let orchestrator = Orchestrator::from_config(&config);
  let report = runtime()?
    .block_on(orchestrator.run(&context))
    .context("Build failed")?;

  println!();
  for step in &report.steps {
    print_step(step);
  }

  if let BuildOutcome::CollaboratorFailed(e) = &report.outcome {
    print_error(&format!("Miniapp compiler failed: {}", e));
  }
  report.into_result().context("Build failed")?;

  let hash = hash_tree(&context.output_root).context("Failed to hash output directory")?;

  println!();
  print_success("Build complete!");
  print_stat("Output", &context.output_root.display().to_string());
  print_stat("Hash", hash.short());
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
