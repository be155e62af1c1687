//! The concrete build steps.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::files::{self, FileSet};
use crate::transform::{ScriptTransform, TypedCompileOptions, TypedCompiler};
use crate::util::fs::{copy_creating_parents, remove_dir_if_exists, write_creating_parents};

use super::{Step, StepError, StepName, StepReport};

/// Removes the destination root recursively.
pub struct CleanStep {
  name: StepName,
}

impl CleanStep {
  pub fn new(name: StepName) -> Self {
    Self { name }
  }
}

#[async_trait]
impl Step for CleanStep {
  fn name(&self) -> StepName {
    self.name
  }

  async fn run(&self, _source_root: &Path, output_root: &Path) -> Result<StepReport, StepError> {
    info!(step = %self.name, dir = %output_root.display(), "cleaning build directory");
    let existed = output_root.exists();
    remove_dir_if_exists(output_root)
      .await
      .map_err(|e| StepError::io(self.name, output_root, e))?;

    Ok(StepReport::new(
      self.name,
      usize::from(existed),
      format!("Build directory {} has been cleaned", output_root.display()),
    ))
  }
}

/// Runs every script file through the script transform.
pub struct CompileScriptStep {
  name: StepName,
  transform: Arc<dyn ScriptTransform>,
}

impl CompileScriptStep {
  pub fn new(name: StepName, transform: Arc<dyn ScriptTransform>) -> Self {
    Self { name, transform }
  }
}

#[async_trait]
impl Step for CompileScriptStep {
  fn name(&self) -> StepName {
    self.name
  }

  async fn run(&self, source_root: &Path, output_root: &Path) -> Result<StepReport, StepError> {
    info!(step = %self.name, "compiling script files");
    let sources = files::collect(source_root, FileSet::Script).map_err(|e| StepError::new(self.name, e))?;

    for rel in &sources {
      let src = source_root.join(rel);
      let code = tokio::fs::read_to_string(&src)
        .await
        .map_err(|e| StepError::io(self.name, &src, e))?;
      let out = self
        .transform
        .transform(rel, code)
        .await
        .map_err(|e| StepError::new(self.name, e))?;

      let dest = output_root.join(files::script_output_path(rel));
      write_creating_parents(&dest, out)
        .await
        .map_err(|e| StepError::io(self.name, &dest, e))?;
      debug!(step = %self.name, file = %rel.display(), "compiled");
    }

    Ok(StepReport::new(
      self.name,
      sources.len(),
      "Script files have been compiled",
    ))
  }
}

/// Runs every typed file through the typed compiler and writes code plus
/// declarations.
///
/// With a post transform, emitted code goes through it before being written,
/// the same way plain script files do. Declarations never do.
pub struct CompileTypedStep {
  name: StepName,
  compiler: Arc<dyn TypedCompiler>,
  post: Option<Arc<dyn ScriptTransform>>,
}

impl CompileTypedStep {
  pub fn new(name: StepName, compiler: Arc<dyn TypedCompiler>, post: Option<Arc<dyn ScriptTransform>>) -> Self {
    Self { name, compiler, post }
  }
}

#[async_trait]
impl Step for CompileTypedStep {
  fn name(&self) -> StepName {
    self.name
  }

  async fn run(&self, source_root: &Path, output_root: &Path) -> Result<StepReport, StepError> {
    info!(step = %self.name, "compiling typed files");
    let sources = files::collect(source_root, FileSet::Typed).map_err(|e| StepError::new(self.name, e))?;
    let options = TypedCompileOptions {
      declaration: true,
      out_dir: output_root.to_path_buf(),
    };
    let mut written = 0;

    for rel in &sources {
      let src = source_root.join(rel);
      let source = tokio::fs::read_to_string(&src)
        .await
        .map_err(|e| StepError::io(self.name, &src, e))?;
      let compiled = self
        .compiler
        .compile(rel, source, &options)
        .await
        .map_err(|e| StepError::new(self.name, e))?;

      let code_rel = files::script_output_path(rel);
      let code = match &self.post {
        Some(post) => post
          .transform(&code_rel, compiled.code)
          .await
          .map_err(|e| StepError::new(self.name, e))?,
        None => compiled.code,
      };

      let dest = output_root.join(&code_rel);
      write_creating_parents(&dest, code)
        .await
        .map_err(|e| StepError::io(self.name, &dest, e))?;
      written += 1;

      if let Some(declaration) = compiled.declaration {
        let dest = output_root.join(files::declaration_output_path(rel));
        write_creating_parents(&dest, declaration)
          .await
          .map_err(|e| StepError::io(self.name, &dest, e))?;
        written += 1;
      }
      debug!(step = %self.name, file = %rel.display(), "compiled");
    }

    Ok(StepReport::new(self.name, written, "Typed files have been compiled"))
  }
}

/// Copies every file outside the script and typed sets unchanged.
pub struct CopyOthersStep {
  name: StepName,
}

impl CopyOthersStep {
  pub fn new(name: StepName) -> Self {
    Self { name }
  }
}

#[async_trait]
impl Step for CopyOthersStep {
  fn name(&self) -> StepName {
    self.name
  }

  async fn run(&self, source_root: &Path, output_root: &Path) -> Result<StepReport, StepError> {
    info!(step = %self.name, "copying other files");
    let sources = files::collect(source_root, FileSet::Others).map_err(|e| StepError::new(self.name, e))?;

    for rel in &sources {
      let dest = output_root.join(rel);
      copy_creating_parents(&source_root.join(rel), &dest)
        .await
        .map_err(|e| StepError::io(self.name, &dest, e))?;
    }

    Ok(StepReport::new(self.name, sources.len(), "Other files have been copied"))
  }
}
