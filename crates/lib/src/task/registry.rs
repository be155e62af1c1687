//! Lookup of steps by name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ProjectConfig;
use crate::execute::BuildError;
use crate::transform::{CommandTransform, CommandTypedCompiler, PassthroughTransform, ScriptTransform, TypedCompiler};

use super::{CleanStep, CompileScriptStep, CompileTypedStep, CopyOthersStep, Step, StepName};

/// The transforms the standard steps are built from.
#[derive(Clone)]
pub struct Toolchain {
  pub script: Arc<dyn ScriptTransform>,
  /// Absent for projects without a typed compiler configured.
  pub typed: Option<Arc<dyn TypedCompiler>>,
}

impl Default for Toolchain {
  fn default() -> Self {
    Self {
      script: Arc::new(PassthroughTransform),
      typed: None,
    }
  }
}

impl Toolchain {
  pub fn from_config(config: &ProjectConfig) -> Self {
    let script: Arc<dyn ScriptTransform> = match &config.script {
      Some(spec) => Arc::new(CommandTransform::new(spec.clone())),
      None => Arc::new(PassthroughTransform),
    };
    let typed = config.typed.as_ref().map(|typed| {
      Arc::new(CommandTypedCompiler::new(typed.emit.clone(), typed.declaration.clone())) as Arc<dyn TypedCompiler>
    });

    Self { script, typed }
  }
}

/// Steps available to the orchestrator, keyed by name.
#[derive(Clone, Default)]
pub struct TaskRegistry {
  steps: HashMap<StepName, Arc<dyn Step>>,
}

impl TaskRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register the seven standard steps.
  ///
  /// The typed steps are left out when the toolchain has no typed compiler,
  /// so a typed plan fails with `MissingStep` before anything runs.
  pub fn standard(toolchain: &Toolchain) -> Self {
    let mut registry = Self::new();

    registry.register(Arc::new(CleanStep::new(StepName::Clean)));
    registry.register(Arc::new(CompileScriptStep::new(
      StepName::CompileScript,
      toolchain.script.clone(),
    )));
    registry.register(Arc::new(CopyOthersStep::new(StepName::CopyOthers)));
    registry.register(Arc::new(CleanStep::new(StepName::CleanIntermediate)));
    registry.register(Arc::new(CopyOthersStep::new(StepName::CopyOthersIntermediate)));

    if let Some(typed) = &toolchain.typed {
      registry.register(Arc::new(CompileTypedStep::new(
        StepName::CompileTyped,
        typed.clone(),
        Some(toolchain.script.clone()),
      )));
      // The miniapp compiler consumes raw typed output; no script transform.
      registry.register(Arc::new(CompileTypedStep::new(
        StepName::CompileTypedIntermediate,
        typed.clone(),
        None,
      )));
    }

    registry
  }

  /// Register `step` under its own name, returning any step it replaced.
  pub fn register(&mut self, step: Arc<dyn Step>) -> Option<Arc<dyn Step>> {
    self.steps.insert(step.name(), step)
  }

  pub fn get(&self, name: StepName) -> Result<Arc<dyn Step>, BuildError> {
    self.steps.get(&name).cloned().ok_or(BuildError::MissingStep(name))
  }

  pub fn contains(&self, name: StepName) -> bool {
    self.steps.contains_key(&name)
  }

  /// Registered names in declaration order.
  pub fn names(&self) -> Vec<StepName> {
    StepName::ALL.into_iter().filter(|n| self.contains(*n)).collect()
  }
}
