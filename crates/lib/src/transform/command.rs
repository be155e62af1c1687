//! Process-backed transforms.
//!
//! A command receives the source on stdin and writes the result to stdout.
//! Arguments may contain `{placeholder}` tokens that are substituted before
//! the process is spawned.

use std::path::Path;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{ScriptTransform, TransformError, TypedCompileOptions, TypedCompiler, TypedOutput};

/// An external program and its argument template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
  pub program: String,
  #[serde(default)]
  pub args: Vec<String>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
    Self {
      program: program.into(),
      args: args.iter().map(|a| a.to_string()).collect(),
    }
  }

  /// Arguments with every `{key}` replaced by its value.
  pub fn expand_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
    self
      .args
      .iter()
      .map(|arg| {
        vars
          .iter()
          .fold(arg.clone(), |acc, (key, value)| acc.replace(&format!("{{{}}}", key), value))
      })
      .collect()
  }
}

/// Run `spec`, feeding `stdin` to the process when given.
///
/// The process inherits the caller's environment, plus a fixed
/// `SOURCE_DATE_EPOCH` so tools that stamp timestamps stay reproducible.
pub async fn run_command(
  spec: &CommandSpec,
  vars: &[(&str, &str)],
  cwd: Option<&Path>,
  stdin: Option<String>,
) -> std::io::Result<Output> {
  let args = spec.expand_args(vars);
  debug!(program = %spec.program, args = ?args, "spawning process");

  let mut command = Command::new(&spec.program);
  command
    .args(&args)
    .env("SOURCE_DATE_EPOCH", "315532800")
    .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);
  if let Some(dir) = cwd {
    command.current_dir(dir);
  }

  let mut child = command.spawn()?;

  // Feed stdin from a separate task so a chatty child cannot deadlock on a
  // full stdout pipe while we are still writing.
  let writer = match (stdin, child.stdin.take()) {
    (Some(input), Some(mut pipe)) => Some(tokio::spawn(async move {
      let result = pipe.write_all(input.as_bytes()).await;
      drop(pipe);
      match result {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
      }
    })),
    _ => None,
  };

  let output = child.wait_with_output().await?;

  if let Some(writer) = writer {
    writer.await.map_err(std::io::Error::other)??;
  }

  Ok(output)
}

fn into_stdout(spec: &CommandSpec, file: &Path, output: Output) -> Result<String, TransformError> {
  if !output.status.success() {
    return Err(TransformError::Failed {
      program: spec.program.clone(),
      file: file.display().to_string(),
      code: output.status.code(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }
  String::from_utf8(output.stdout).map_err(|_| TransformError::InvalidOutput {
    program: spec.program.clone(),
    file: file.display().to_string(),
  })
}

async fn transform_with(
  spec: &CommandSpec,
  file: &Path,
  source: String,
  out_dir: Option<&Path>,
) -> Result<String, TransformError> {
  let file_arg = file.to_string_lossy();
  let out_arg = out_dir.map(|d| d.to_string_lossy()).unwrap_or_default();
  let vars = [("file", file_arg.as_ref()), ("out_dir", out_arg.as_ref())];

  let output = run_command(spec, &vars, None, Some(source))
    .await
    .map_err(|source| TransformError::Spawn {
      program: spec.program.clone(),
      source,
    })?;
  into_stdout(spec, file, output)
}

/// Script transform backed by an external program, e.g. a babel wrapper.
#[derive(Debug, Clone)]
pub struct CommandTransform {
  spec: CommandSpec,
}

impl CommandTransform {
  pub fn new(spec: CommandSpec) -> Self {
    Self { spec }
  }
}

#[async_trait]
impl ScriptTransform for CommandTransform {
  async fn transform(&self, path: &Path, source: String) -> Result<String, TransformError> {
    transform_with(&self.spec, path, source, None).await
  }
}

/// Typed compiler backed by one command emitting code and an optional second
/// command emitting the declaration file.
#[derive(Debug, Clone)]
pub struct CommandTypedCompiler {
  emit: CommandSpec,
  declaration: Option<CommandSpec>,
}

impl CommandTypedCompiler {
  pub fn new(emit: CommandSpec, declaration: Option<CommandSpec>) -> Self {
    Self { emit, declaration }
  }
}

#[async_trait]
impl TypedCompiler for CommandTypedCompiler {
  async fn compile(
    &self,
    path: &Path,
    source: String,
    options: &TypedCompileOptions,
  ) -> Result<TypedOutput, TransformError> {
    let declaration = match (&self.declaration, options.declaration) {
      (Some(spec), true) => Some(transform_with(spec, path, source.clone(), Some(&options.out_dir)).await?),
      _ => None,
    };
    let code = transform_with(&self.emit, path, source, Some(&options.out_dir)).await?;

    Ok(TypedOutput { code, declaration })
  }
}
