//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated component project.
///
/// Each test gets its own temporary project root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A plain script component with a stylesheet and a test file.
  pub fn script_project() -> Self {
    let env = Self::empty();
    env.write_file("src/index.jsx", "export default function Index() { return null; }\n");
    env.write_file("src/index.css", ".container { display: flex; }\n");
    env.write_file("src/assets/logo.svg", "<svg/>\n");
    env.write_file("src/__tests__/index.test.jsx", "it('renders', () => {});\n");
    env
  }

  /// Create an empty test environment.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  pub fn read(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// Get a Command for the compkit binary, pointed at this project.
  ///
  /// `COMPKIT_CONFIG` is cleared so only the project's own `compkit.json`
  /// is read.
  pub fn compkit_cmd(&self, subcommand: &str) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("compkit");
    cmd.env_remove("COMPKIT_CONFIG");
    cmd.arg(subcommand).arg("--project").arg(self.root());
    cmd
  }
}
