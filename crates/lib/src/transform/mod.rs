//! Source transform collaborators.
//!
//! The build never compiles anything itself. Script files go through a
//! [`ScriptTransform`], typed files through a [`TypedCompiler`]. Both are
//! traits so the toolchain can be an external process, an in-process
//! library, or a test double.

mod command;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use command::{CommandSpec, CommandTransform, CommandTypedCompiler, run_command};

#[derive(Debug, Error)]
pub enum TransformError {
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{program} exited with code {code:?} on {file}: {stderr}")]
  Failed {
    program: String,
    file: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("{program} produced non-UTF-8 output for {file}")]
  InvalidOutput { program: String, file: String },

  /// Raised by in-process transforms.
  #[error("{file}: {message}")]
  Rejected { file: String, message: String },
}

/// Transforms one script file into one script file.
#[async_trait]
pub trait ScriptTransform: Send + Sync {
  /// `path` is relative to the source root.
  async fn transform(&self, path: &Path, source: String) -> Result<String, TransformError>;
}

/// Options the typed compiler is invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedCompileOptions {
  /// Emit a declaration file next to the code.
  pub declaration: bool,
  /// Root the compiled tree is written to.
  pub out_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedOutput {
  pub code: String,
  pub declaration: Option<String>,
}

/// Strips types from one typed file.
#[async_trait]
pub trait TypedCompiler: Send + Sync {
  async fn compile(
    &self,
    path: &Path,
    source: String,
    options: &TypedCompileOptions,
  ) -> Result<TypedOutput, TransformError>;
}

/// Script transform that returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTransform;

#[async_trait]
impl ScriptTransform for PassthroughTransform {
  async fn transform(&self, _path: &Path, source: String) -> Result<String, TransformError> {
    Ok(source)
  }
}
