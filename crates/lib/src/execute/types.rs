//! Error, outcome and report types for an orchestration run.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::miniapp::CollaboratorError;
use crate::task::{StepError, StepName, StepReport};

/// Errors that end an orchestration run.
#[derive(Debug, Error)]
pub enum BuildError {
  /// A sequential stage's step failed.
  #[error("{0}")]
  Step(StepError),

  /// A parallel stage had at least one failing step. Only the first failure
  /// observed is kept.
  #[error("stage {index} failed: {source}")]
  Stage {
    index: usize,
    #[source]
    source: StepError,
  },

  /// The miniapp compiler reported an error.
  #[error("miniapp compiler failed: {0}")]
  Collaborator(CollaboratorError),

  #[error("no step registered for {0}{hint}", hint = missing_step_hint(.0))]
  MissingStep(StepName),

  #[error("miniapp target requested but no miniapp compiler is configured")]
  MissingMiniappCompiler,

  #[error("failed to remove {path}: {source}")]
  Cleanup {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Config(#[from] ConfigError),
}

impl BuildError {
  /// The failing step, for step and stage failures.
  pub fn step(&self) -> Option<StepName> {
    match self {
      BuildError::Step(e) | BuildError::Stage { source: e, .. } => Some(e.step),
      _ => None,
    }
  }
}

fn missing_step_hint(step: &StepName) -> &'static str {
  match step {
    StepName::CompileTyped | StepName::CompileTypedIntermediate => {
      " (tsconfig.json found; add a \"typed\" block to compkit.json to compile typed sources)"
    }
    _ => "",
  }
}

/// How a run that got past its plans ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuildOutcome {
  #[default]
  Completed,
  /// Every plan succeeded but the miniapp compiler reported an error.
  CollaboratorFailed(CollaboratorError),
}

/// Phases an orchestration run moves through, in the order visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunPhase {
  RunningPrimary,
  PrimaryDone,
  RunningSecondary,
  RunningExternalCompiler,
  Done,
  CleaningIntermediate,
  Terminal,
}

/// Result of a run that was not aborted by a step or stage failure.
#[derive(Debug, Default)]
pub struct BuildReport {
  /// Reports of every step that ran, in completion order.
  pub steps: Vec<StepReport>,
  pub phases: Vec<RunPhase>,
  pub outcome: BuildOutcome,
}

impl BuildReport {
  pub(crate) fn enter(&mut self, phase: RunPhase) {
    self.phases.push(phase);
  }

  pub fn is_success(&self) -> bool {
    self.outcome == BuildOutcome::Completed
  }

  pub fn ran(&self, step: StepName) -> bool {
    self.steps.iter().any(|r| r.step == step)
  }

  /// Collapse the tagged outcome into a single error channel.
  pub fn into_result(self) -> Result<Vec<StepReport>, BuildError> {
    match self.outcome {
      BuildOutcome::Completed => Ok(self.steps),
      BuildOutcome::CollaboratorFailed(e) => Err(BuildError::Collaborator(e)),
    }
  }
}
