//! Project configuration.
//!
//! Read from `compkit.json` in the project root, or from the file named by
//! `COMPKIT_CONFIG`. Every field is optional; a project without a config file
//! builds with the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_ENV_VAR, CONFIG_FILENAME, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_DIR};
use crate::context::Target;
use crate::transform::CommandSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("unknown target: {0} (expected web, weex or miniapp)")]
  UnknownTarget(String),

  #[error("output directory {output_dir} overlaps source directory {source_dir}")]
  OverlappingDirs { source_dir: PathBuf, output_dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ProjectConfig {
  /// Output directory, relative to the project root.
  pub output_dir: PathBuf,
  /// Source directory, relative to the project root.
  pub source_dir: PathBuf,
  pub targets: Vec<Target>,
  /// Script transform. Files are copied through unchanged when absent.
  pub script: Option<CommandSpec>,
  pub typed: Option<TypedConfig>,
  pub miniapp: Option<MiniappConfig>,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
      source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
      targets: vec![Target::Web],
      script: None,
      typed: None,
      miniapp: None,
    }
  }
}

/// Commands driving the typed compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypedConfig {
  /// Emits script code for one typed file on stdout.
  pub emit: CommandSpec,
  /// Emits the declaration file for one typed file on stdout.
  #[serde(default)]
  pub declaration: Option<CommandSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MiniappConfig {
  pub command: CommandSpec,
  /// Entry used when the compiler reads the primary output.
  #[serde(default)]
  pub entry: Option<PathBuf>,
  #[serde(default)]
  pub dist: Option<PathBuf>,
}

impl ProjectConfig {
  /// Load the configuration for `project_root`.
  ///
  /// A missing `compkit.json` yields the defaults. A path given through
  /// `COMPKIT_CONFIG` must exist.
  pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
    let (path, required) = match std::env::var_os(CONFIG_ENV_VAR) {
      Some(p) => (PathBuf::from(p), true),
      None => (project_root.join(CONFIG_FILENAME), false),
    };

    if !required && !path.exists() {
      debug!(path = %path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
      path: path.clone(),
      source,
    })?;
    Self::from_json(&content).map_err(|source| ConfigError::Parse { path, source })
  }

  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  /// Replace the configured targets, e.g. from command-line flags.
  pub fn with_targets(mut self, targets: Vec<Target>) -> Self {
    if !targets.is_empty() {
      self.targets = targets;
    }
    self
  }

  pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
    if let Some(dir) = output_dir {
      self.output_dir = dir;
    }
    self
  }
}
