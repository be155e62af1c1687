//! The miniapp compiler collaborator.
//!
//! The compiler turns a built component tree into mini-program artifacts
//! (JSON descriptor, script entry, template markup). It runs after the
//! primary build and reports failure as a value, not as a hard error: the
//! orchestrator decides how that value is surfaced.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{ENTRY_STEM, MINIAPP_DIST_DIR};
use crate::context::BuildContext;
use crate::transform::{CommandSpec, run_command};

/// Failure reported by the miniapp compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
  pub message: String,
  /// Exit code when the compiler ran as a process.
  pub code: Option<i32>,
}

impl CollaboratorError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      code: None,
    }
  }
}

#[async_trait]
pub trait MiniappCompiler: Send + Sync {
  /// Compile the component for the miniapp target.
  ///
  /// `entry_override` is `None` when the compiler should read the primary
  /// output, and the intermediate entry otherwise. Returns `None` on success.
  async fn build(&self, context: &BuildContext, entry_override: Option<&Path>) -> Option<CollaboratorError>;
}

/// Miniapp compiler run as an external process in the project root.
///
/// The argument template may use `{entry}` and `{dist}`.
#[derive(Debug, Clone)]
pub struct CommandMiniappCompiler {
  command: CommandSpec,
  entry: Option<PathBuf>,
  dist: Option<PathBuf>,
}

impl CommandMiniappCompiler {
  pub fn new(command: CommandSpec) -> Self {
    Self {
      command,
      entry: None,
      dist: None,
    }
  }

  pub fn with_entry(mut self, entry: Option<PathBuf>) -> Self {
    self.entry = entry;
    self
  }

  pub fn with_dist(mut self, dist: Option<PathBuf>) -> Self {
    self.dist = dist;
    self
  }

  /// Entry read when no override is given: `<output_dir>/index`.
  pub fn default_entry(&self, context: &BuildContext) -> PathBuf {
    self
      .entry
      .clone()
      .unwrap_or_else(|| relative_to_project(context, &context.output_root.join(ENTRY_STEM)))
  }

  pub fn dist(&self, context: &BuildContext) -> PathBuf {
    self
      .dist
      .clone()
      .unwrap_or_else(|| relative_to_project(context, &context.output_root.join(MINIAPP_DIST_DIR)))
  }
}

fn relative_to_project(context: &BuildContext, path: &Path) -> PathBuf {
  path
    .strip_prefix(&context.project_root)
    .map(Path::to_path_buf)
    .unwrap_or_else(|_| path.to_path_buf())
}

#[async_trait]
impl MiniappCompiler for CommandMiniappCompiler {
  async fn build(&self, context: &BuildContext, entry_override: Option<&Path>) -> Option<CollaboratorError> {
    let entry = entry_override
      .map(Path::to_path_buf)
      .unwrap_or_else(|| self.default_entry(context));
    let dist = self.dist(context);
    info!(entry = %entry.display(), dist = %dist.display(), "running miniapp compiler");

    let entry_arg = entry.to_string_lossy();
    let dist_arg = dist.to_string_lossy();
    let vars = [("entry", entry_arg.as_ref()), ("dist", dist_arg.as_ref())];

    let output = match run_command(&self.command, &vars, Some(&context.project_root), None).await {
      Ok(output) => output,
      Err(e) => {
        return Some(CollaboratorError::new(format!(
          "failed to spawn {}: {}",
          self.command.program, e
        )));
      }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "miniapp compiler output");
    }

    if output.status.success() {
      return None;
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Some(CollaboratorError {
      message: if stderr.is_empty() {
        format!("{} exited with code {:?}", self.command.program, output.status.code())
      } else {
        stderr
      },
      code: output.status.code(),
    })
  }
}
