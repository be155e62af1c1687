//! Content hashing of build output trees.
//!
//! Used to report a stable fingerprint of an output directory after a build,
//! so two runs over the same sources can be compared byte for byte.

use std::fs;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA256 hash of some content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
  /// First twelve characters, for terminal output.
  pub fn short(&self) -> &str {
    let len = self.0.len().min(12);
    &self.0[..len]
  }
}

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum TreeHashError {
  #[error("failed to walk {path}: {message}")]
  Walk { path: String, message: String },

  #[error("failed to read file {path}: {source}")]
  ReadFile {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// Hash a directory tree deterministically.
///
/// Only relative paths and file contents participate; timestamps and
/// permissions do not. A missing root hashes like an empty directory.
pub fn hash_tree(root: &Path) -> Result<ContentHash, TreeHashError> {
  let mut hasher = Sha256::new();

  if !root.exists() {
    return Ok(ContentHash(hex::encode(hasher.finalize())));
  }

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(|e| TreeHashError::Walk {
      path: root.display().to_string(),
      message: e.to_string(),
    })?;
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
    if rel.as_os_str().is_empty() {
      continue;
    }
    // Forward slashes keep the hash identical across platforms.
    let rel = rel.to_string_lossy().replace('\\', "/");

    if entry.file_type().is_dir() {
      hasher.update(format!("D:{}\n", rel).as_bytes());
    } else if entry.file_type().is_file() {
      let file_hash = hash_file(entry.path())?;
      hasher.update(format!("F:{}:{}\n", rel, file_hash.0).as_bytes());
    }
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash a single file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, TreeHashError> {
  let read_err = |source| TreeHashError::ReadFile {
    path: path.display().to_string(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];
  loop {
    let n = file.read(&mut buffer).map_err(|source| TreeHashError::ReadFile {
      path: path.display().to_string(),
      source,
    })?;
    if n == 0 {
      break;
    }
    hasher.update(&buffer[..n]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}
