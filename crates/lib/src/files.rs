//! Source file selection.
//!
//! Every source file falls into at most one of three sets: script files,
//! typed files, or everything else with an extension. Files under a
//! `__tests__` directory and hidden files or directories are never selected.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::consts::{DECLARATION_PATTERN, SCRIPT_EXTENSIONS, TEST_DIR_PATTERN, TYPED_EXTENSIONS};

static TEST_DIRS: LazyLock<Pattern> = LazyLock::new(|| compile(TEST_DIR_PATTERN));
static DECLARATIONS: LazyLock<Pattern> = LazyLock::new(|| compile(DECLARATION_PATTERN));

fn compile(pattern: &str) -> Pattern {
  Pattern::new(pattern).expect("built-in glob pattern is valid")
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSet {
  /// `*.js`, `*.jsx`
  Script,
  /// `*.ts`, `*.tsx` except declaration files
  Typed,
  /// Any non-empty extension outside the script and typed sets.
  Others,
}

impl FileSet {
  /// Whether `rel_path` (relative to the source root) belongs to this set.
  pub fn matches(&self, rel_path: &Path) -> bool {
    if is_test_path(rel_path) || is_hidden(rel_path) {
      return false;
    }

    let Some(ext) = rel_path.extension().and_then(|e| e.to_str()) else {
      return false;
    };
    match self {
      FileSet::Script => SCRIPT_EXTENSIONS.contains(&ext),
      FileSet::Typed => TYPED_EXTENSIONS.contains(&ext) && !is_declaration(rel_path),
      FileSet::Others => !SCRIPT_EXTENSIONS.contains(&ext) && !TYPED_EXTENSIONS.contains(&ext),
    }
  }
}

pub fn is_test_path(rel_path: &Path) -> bool {
  TEST_DIRS.matches_path_with(rel_path, MATCH_OPTIONS)
}

/// Whether any component of `rel_path` starts with a dot.
pub fn is_hidden(rel_path: &Path) -> bool {
  rel_path
    .components()
    .any(|c| c.as_os_str().to_str().is_some_and(|name| name.starts_with('.')))
}

pub fn is_declaration(rel_path: &Path) -> bool {
  DECLARATIONS.matches_path_with(rel_path, MATCH_OPTIONS)
}

/// Collect the files of `set` under `root`, as paths relative to `root`.
///
/// The result is sorted so repeated builds process files in the same order.
pub fn collect(root: &Path, set: FileSet) -> Result<Vec<PathBuf>, walkdir::Error> {
  let mut files = Vec::new();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
    if set.matches(rel) {
      files.push(rel.to_path_buf());
    }
  }

  files.sort();
  Ok(files)
}

/// Output path of a compiled script or typed file: same location, `.js`.
pub fn script_output_path(rel_path: &Path) -> PathBuf {
  rel_path.with_extension("js")
}

/// Output path of the declaration emitted for a typed file.
pub fn declaration_output_path(rel_path: &Path) -> PathBuf {
  rel_path.with_extension("d.ts")
}
