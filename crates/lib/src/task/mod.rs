//! Build steps and the registry that resolves them by name.
//!
//! A step does exactly one thing to its destination root: remove it, write
//! transformed sources into it, or copy sources into it. Steps carry no state
//! between runs and never write under the source root.

pub mod registry;
pub mod steps;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transform::TransformError;

pub use registry::{TaskRegistry, Toolchain};
pub use steps::{CleanStep, CompileScriptStep, CompileTypedStep, CopyOthersStep};

/// Names of the steps a plan can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepName {
  Clean,
  CompileScript,
  CompileTyped,
  CopyOthers,
  CleanIntermediate,
  CompileTypedIntermediate,
  CopyOthersIntermediate,
}

impl StepName {
  pub const ALL: [StepName; 7] = [
    StepName::Clean,
    StepName::CompileScript,
    StepName::CompileTyped,
    StepName::CopyOthers,
    StepName::CleanIntermediate,
    StepName::CompileTypedIntermediate,
    StepName::CopyOthersIntermediate,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      StepName::Clean => "clean",
      StepName::CompileScript => "compileScript",
      StepName::CompileTyped => "compileTyped",
      StepName::CopyOthers => "copyOthers",
      StepName::CleanIntermediate => "cleanIntermediate",
      StepName::CompileTypedIntermediate => "compileTypedIntermediate",
      StepName::CopyOthersIntermediate => "copyOthersIntermediate",
    }
  }
}

impl std::fmt::Display for StepName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What a finished step reports back to whoever runs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
  pub step: StepName,
  /// Files written or removed entries, depending on the step.
  pub files: usize,
  pub message: String,
}

impl StepReport {
  pub fn new(step: StepName, files: usize, message: impl Into<String>) -> Self {
    Self {
      step,
      files,
      message: message.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum StepCause {
  #[error("io error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to walk source tree: {0}")]
  Walk(#[from] walkdir::Error),

  #[error(transparent)]
  Transform(#[from] TransformError),

  #[error("step task did not complete: {0}")]
  Panicked(String),
}

/// A single step's failure, tagged with the step that failed.
#[derive(Debug, Error)]
#[error("step {step} failed: {cause}")]
pub struct StepError {
  pub step: StepName,
  #[source]
  pub cause: StepCause,
}

impl StepError {
  pub fn new(step: StepName, cause: impl Into<StepCause>) -> Self {
    Self {
      step,
      cause: cause.into(),
    }
  }

  pub fn io(step: StepName, path: &Path, source: std::io::Error) -> Self {
    Self {
      step,
      cause: StepCause::Io {
        path: path.to_path_buf(),
        source,
      },
    }
  }
}

#[async_trait]
pub trait Step: Send + Sync {
  fn name(&self) -> StepName;

  /// Run against `source_root`, writing only under `output_root`.
  async fn run(&self, source_root: &Path, output_root: &Path) -> Result<StepReport, StepError>;
}
