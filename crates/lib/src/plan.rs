//! Target plans.
//!
//! A plan is an ordered list of stages. A sequential stage runs one step; a
//! parallel stage starts all of its steps together and completes only when
//! every one of them has finished. Plans are plain values: building one does
//! no I/O and cannot fail.

use serde::Serialize;

use crate::task::StepName;

/// Which root a plan writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
  /// The configured output directory.
  Primary,
  /// The transient miniapp tree under the output directory.
  Intermediate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "steps", rename_all = "camelCase")]
pub enum Stage {
  Sequential(StepName),
  Parallel(Vec<StepName>),
}

impl Stage {
  pub fn steps(&self) -> &[StepName] {
    match self {
      Stage::Sequential(step) => std::slice::from_ref(step),
      Stage::Parallel(steps) => steps.as_slice(),
    }
  }
}

impl std::fmt::Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Stage::Sequential(step) => write!(f, "{}", step),
      Stage::Parallel(steps) => {
        let names: Vec<_> = steps.iter().map(StepName::as_str).collect();
        write!(f, "parallel{{{}}}", names.join(", "))
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
  pub destination: Destination,
  pub stages: Vec<Stage>,
}

impl Plan {
  /// Every step of the plan in stage order.
  pub fn steps(&self) -> impl Iterator<Item = StepName> + '_ {
    self.stages.iter().flat_map(|s| s.steps().iter().copied())
  }
}

impl std::fmt::Display for Plan {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let stages: Vec<_> = self.stages.iter().map(ToString::to_string).collect();
    write!(f, "{}", stages.join("; "))
  }
}

/// The primary plan, plus the secondary plan for the typed miniapp build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPlan {
  pub primary: Plan,
  pub secondary: Option<Plan>,
}

/// Decide what to run for a project.
///
/// Without typed sources the miniapp compiler reads the primary output
/// directly, so no secondary plan exists even when miniapp is requested.
pub fn build_plan(has_typed_sources: bool, wants_miniapp: bool) -> TargetPlan {
  let compile = if has_typed_sources {
    vec![StepName::CompileScript, StepName::CompileTyped, StepName::CopyOthers]
  } else {
    vec![StepName::CompileScript, StepName::CopyOthers]
  };

  let primary = Plan {
    destination: Destination::Primary,
    stages: vec![Stage::Sequential(StepName::Clean), Stage::Parallel(compile)],
  };

  let secondary = (has_typed_sources && wants_miniapp).then(|| Plan {
    destination: Destination::Intermediate,
    stages: vec![
      Stage::Sequential(StepName::CleanIntermediate),
      Stage::Parallel(vec![
        StepName::CompileTypedIntermediate,
        StepName::CopyOthersIntermediate,
      ]),
    ],
  });

  TargetPlan { primary, secondary }
}
