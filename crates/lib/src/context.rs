//! Build targets and the per-invocation build context.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ProjectConfig};
use crate::consts::{ENTRY_STEM, INTERMEDIATE_DIR_NAME, TYPED_PROJECT_MARKER};

/// A named build destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
  Web,
  Weex,
  Miniapp,
}

impl Target {
  pub fn as_str(&self) -> &'static str {
    match self {
      Target::Web => "web",
      Target::Weex => "weex",
      Target::Miniapp => "miniapp",
    }
  }
}

impl std::fmt::Display for Target {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Target {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "web" => Ok(Target::Web),
      "weex" => Ok(Target::Weex),
      "miniapp" => Ok(Target::Miniapp),
      _ => Err(ConfigError::UnknownTarget(s.to_string())),
    }
  }
}

/// Everything one build invocation needs to know about the project.
///
/// Created once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
  /// Project root; the miniapp compiler runs here.
  pub project_root: PathBuf,
  /// Directory holding the component sources.
  pub source_root: PathBuf,
  /// Primary output directory.
  pub output_root: PathBuf,
  pub has_typed_sources: bool,
  pub requested_targets: BTreeSet<Target>,
}

impl BuildContext {
  /// Resolve a context for `project_root` from its configuration.
  ///
  /// Typed sources are detected by the presence of `tsconfig.json` in the
  /// project root.
  pub fn resolve(project_root: &Path, config: &ProjectConfig) -> Self {
    let project_root = dunce::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
    let has_typed_sources = project_root.join(TYPED_PROJECT_MARKER).is_file();

    Self {
      source_root: project_root.join(&config.source_dir),
      output_root: project_root.join(&config.output_dir),
      has_typed_sources,
      requested_targets: config.targets.iter().copied().collect(),
      project_root,
    }
  }

  /// Reject layouts where cleaning the output would touch the sources.
  ///
  /// The output and source directories must not be equal and neither may
  /// contain the other.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let source = normalize(&self.source_root);
    let output = normalize(&self.output_root);
    if source.starts_with(&output) || output.starts_with(&source) {
      return Err(ConfigError::OverlappingDirs {
        source_dir: self.source_root.clone(),
        output_dir: self.output_root.clone(),
      });
    }
    Ok(())
  }

  pub fn wants_miniapp(&self) -> bool {
    self.requested_targets.contains(&Target::Miniapp)
  }

  /// The transient tree used to stage typed sources for the miniapp compiler.
  pub fn intermediate_root(&self) -> PathBuf {
    self.output_root.join(INTERMEDIATE_DIR_NAME)
  }

  /// Entry handed to the miniapp compiler when an intermediate tree exists,
  /// relative to the project root when possible.
  pub fn intermediate_entry(&self) -> PathBuf {
    let entry = self.intermediate_root().join(ENTRY_STEM);
    entry
      .strip_prefix(&self.project_root)
      .map(Path::to_path_buf)
      .unwrap_or(entry)
  }
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !out.pop() {
          out.push(component);
        }
      }
      other => out.push(other),
    }
  }
  out
}
