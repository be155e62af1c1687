//! Implementation of the `compkit plan` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use compkit_lib::context::Target;
use compkit_lib::plan::{Plan, TargetPlan, build_plan};

use crate::ProjectArgs;
use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

use super::load_project;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
  project: PathBuf,
  output_dir: PathBuf,
  has_typed_sources: bool,
  targets: Vec<Target>,
  plan: TargetPlan,
}

pub fn cmd_plan(args: &ProjectArgs, format: OutputFormat) -> Result<()> {
  let (_, context) = load_project(args)?;
  let plan = build_plan(context.has_typed_sources, context.wants_miniapp());

  if format.is_json() {
    return print_json(&PlanOutput {
      project: context.project_root.clone(),
      output_dir: context.output_root.clone(),
      has_typed_sources: context.has_typed_sources,
      targets: context.requested_targets.iter().copied().collect(),
      plan,
    });
  }

  let targets: Vec<_> = context.requested_targets.iter().map(Target::as_str).collect();
  print_info(&format!("Plan for {}", context.project_root.display()));
  print_stat("Targets", &targets.join(", "));
  print_stat("Typed sources", if context.has_typed_sources { "yes" } else { "no" });
  println!();

  print_plan("Primary", &context.output_root, &plan.primary);
  if let Some(secondary) = &plan.secondary {
    print_plan("Secondary", &context.intermediate_root(), secondary);
  }

  Ok(())
}

fn print_plan(label: &str, root: &std::path::Path, plan: &Plan) {
  println!("{} {}", label, root.display());
  for stage in &plan.stages {
    println!("  {} {}", symbols::ARROW, stage);
  }
}
