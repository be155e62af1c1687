//! Build orchestration.
//!
//! This module drives a [`TargetPlan`] to completion:
//! - stages run in order, each one a barrier for the next
//! - steps of a parallel stage run concurrently on the tokio runtime
//! - the first step failure aborts the remaining stages
//! - the miniapp compiler runs after the plans, and the intermediate tree is
//!   removed whatever it reports

pub mod types;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ProjectConfig;
use crate::context::BuildContext;
use crate::miniapp::{CollaboratorError, CommandMiniappCompiler, MiniappCompiler};
use crate::plan::{Destination, Plan, Stage, build_plan};
use crate::task::{Step, StepCause, StepError, StepName, StepReport, TaskRegistry, Toolchain};
use crate::util::fs::remove_dir_if_exists;

pub use types::{BuildError, BuildOutcome, BuildReport, RunPhase};

/// Runs the build for one context at a time.
///
/// Two runs against the same output root must not overlap; nothing here
/// locks the directory.
#[derive(Clone)]
pub struct Orchestrator {
  registry: TaskRegistry,
  miniapp: Option<Arc<dyn MiniappCompiler>>,
}

impl Orchestrator {
  pub fn new(registry: TaskRegistry) -> Self {
    Self {
      registry,
      miniapp: None,
    }
  }

  pub fn with_miniapp_compiler(mut self, compiler: Arc<dyn MiniappCompiler>) -> Self {
    self.miniapp = Some(compiler);
    self
  }

  /// Standard steps and process-backed collaborators from a project config.
  pub fn from_config(config: &ProjectConfig) -> Self {
    let orchestrator = Self::new(TaskRegistry::standard(&Toolchain::from_config(config)));

    match &config.miniapp {
      Some(miniapp) => orchestrator.with_miniapp_compiler(Arc::new(
        CommandMiniappCompiler::new(miniapp.command.clone())
          .with_entry(miniapp.entry.clone())
          .with_dist(miniapp.dist.clone()),
      )),
      None => orchestrator,
    }
  }

  /// Run the build for `context`.
  ///
  /// Step and stage failures abort the run and are returned as errors. A
  /// miniapp compiler failure is returned as
  /// [`BuildOutcome::CollaboratorFailed`] after the intermediate tree has
  /// been removed.
  pub async fn run(&self, context: &BuildContext) -> Result<BuildReport, BuildError> {
    context.validate()?;
    let wants_miniapp = context.wants_miniapp();
    let compiler = match (&self.miniapp, wants_miniapp) {
      (Some(compiler), true) => Some(compiler.clone()),
      (None, true) => return Err(BuildError::MissingMiniappCompiler),
      (_, false) => None,
    };

    let plan = build_plan(context.has_typed_sources, wants_miniapp);
    let mut report = BuildReport::default();

    info!(
      source = %context.source_root.display(),
      output = %context.output_root.display(),
      typed = context.has_typed_sources,
      miniapp = wants_miniapp,
      "build start"
    );

    // A crashed run may have left its intermediate tree behind.
    let intermediate = context.intermediate_root();
    remove_dir_if_exists(&intermediate)
      .await
      .map_err(|source| BuildError::Cleanup {
        path: intermediate.clone(),
        source,
      })?;

    report.enter(RunPhase::RunningPrimary);
    self.execute_plan(&plan.primary, context, &mut report).await?;
    report.enter(RunPhase::PrimaryDone);

    let Some(compiler) = compiler else {
      report.enter(RunPhase::Done);
      report.enter(RunPhase::Terminal);
      info!(steps = report.steps.len(), "build complete");
      return Ok(report);
    };

    info!("starting miniapp build");
    let collaborator = match &plan.secondary {
      None => {
        report.enter(RunPhase::RunningExternalCompiler);
        let result = compiler.build(context, None).await;
        report.enter(RunPhase::Done);
        result
      }
      Some(secondary) => {
        self
          .run_secondary(secondary, compiler.as_ref(), context, &intermediate, &mut report)
          .await?
      }
    };

    report.enter(RunPhase::Terminal);
    report.outcome = match collaborator {
      None => {
        info!(steps = report.steps.len(), "build complete");
        BuildOutcome::Completed
      }
      Some(e) => {
        error!(error = %e, "miniapp compiler failed");
        BuildOutcome::CollaboratorFailed(e)
      }
    };

    Ok(report)
  }

  /// Secondary plan, miniapp compiler, then unconditional removal of the
  /// intermediate tree.
  async fn run_secondary(
    &self,
    plan: &Plan,
    compiler: &dyn MiniappCompiler,
    context: &BuildContext,
    intermediate: &Path,
    report: &mut BuildReport,
  ) -> Result<Option<CollaboratorError>, BuildError> {
    report.enter(RunPhase::RunningSecondary);
    let result = match self.execute_plan(plan, context, report).await {
      Ok(()) => {
        report.enter(RunPhase::RunningExternalCompiler);
        let entry = context.intermediate_entry();
        let collaborator = compiler.build(context, Some(&entry)).await;
        report.enter(RunPhase::Done);
        Ok(collaborator)
      }
      Err(e) => Err(e),
    };

    report.enter(RunPhase::CleaningIntermediate);
    info!(dir = %intermediate.display(), "removing intermediate directory");
    let cleanup = remove_dir_if_exists(intermediate).await;

    match (result, cleanup) {
      (result, Ok(())) => result,
      (Ok(None), Err(source)) => Err(BuildError::Cleanup {
        path: intermediate.to_path_buf(),
        source,
      }),
      (result, Err(e)) => {
        warn!(dir = %intermediate.display(), error = %e, "failed to remove intermediate directory");
        result
      }
    }
  }

  /// Execute `plan` stage by stage against the root its destination names.
  async fn execute_plan(&self, plan: &Plan, context: &BuildContext, report: &mut BuildReport) -> Result<(), BuildError> {
    let output_root = match plan.destination {
      Destination::Primary => context.output_root.clone(),
      Destination::Intermediate => context.intermediate_root(),
    };

    // Resolve every step first so a missing one fails before anything runs.
    let stages = plan
      .stages
      .iter()
      .map(|stage| -> Result<_, BuildError> {
        let steps = stage
          .steps()
          .iter()
          .map(|name| self.registry.get(*name))
          .collect::<Result<Vec<_>, _>>()?;
        Ok((stage, steps))
      })
      .collect::<Result<Vec<_>, BuildError>>()?;

    for (index, (stage, steps)) in stages.into_iter().enumerate() {
      debug!(stage = index, steps = %stage, "executing stage");

      match stage {
        Stage::Sequential(_) => {
          for step in steps {
            let step_report = step
              .run(&context.source_root, &output_root)
              .await
              .map_err(BuildError::Step)?;
            log_report(&step_report);
            report.steps.push(step_report);
          }
        }
        Stage::Parallel(_) => {
          let reports = execute_parallel(index, steps, &context.source_root, &output_root).await?;
          report.steps.extend(reports);
        }
      }
    }

    Ok(())
  }
}

fn log_report(report: &StepReport) {
  info!(step = %report.step, files = report.files, "{}", report.message);
}

/// Run `steps` concurrently and wait for all of them.
///
/// The first failure observed becomes the stage's error. Steps still in
/// flight are allowed to finish; their results are logged and dropped.
async fn execute_parallel(
  index: usize,
  steps: Vec<Arc<dyn Step>>,
  source_root: &Path,
  output_root: &Path,
) -> Result<Vec<StepReport>, BuildError> {
  let mut join_set = JoinSet::new();
  let mut pending: BTreeSet<StepName> = BTreeSet::new();

  for step in steps {
    let name = step.name();
    pending.insert(name);
    let source_root: PathBuf = source_root.to_path_buf();
    let output_root: PathBuf = output_root.to_path_buf();

    join_set.spawn(async move {
      // Inner task so a panicking step is still attributed to its name.
      let handle = tokio::spawn(async move { step.run(&source_root, &output_root).await });
      let result = match handle.await {
        Ok(result) => result,
        Err(e) => Err(StepError::new(name, StepCause::Panicked(e.to_string()))),
      };
      (name, result)
    });
  }

  let mut reports = Vec::new();
  let mut first_error: Option<StepError> = None;

  while let Some(joined) = join_set.join_next().await {
    let (name, result) = match joined {
      Ok(done) => done,
      Err(e) => {
        error!(stage = index, error = %e, "stage task failed");
        continue;
      }
    };
    pending.remove(&name);

    match result {
      Ok(step_report) => {
        log_report(&step_report);
        reports.push(step_report);
      }
      Err(e) if first_error.is_none() => {
        error!(stage = index, step = %name, error = %e, "step failed");
        first_error = Some(e);
      }
      Err(e) => {
        error!(stage = index, step = %name, error = %e, "step failed, discarding");
      }
    }
  }

  // Only reachable if a wrapper task itself died.
  if first_error.is_none()
    && let Some(name) = pending.into_iter().next()
  {
    first_error = Some(StepError::new(
      name,
      StepCause::Panicked("task ended without reporting".to_string()),
    ));
  }

  match first_error {
    Some(source) => Err(BuildError::Stage { index, source }),
    None => Ok(reports),
  }
}
