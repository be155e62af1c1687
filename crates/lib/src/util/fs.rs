//! Async filesystem helpers shared by steps and the orchestrator.

use std::io;
use std::path::Path;

use tokio::fs;
use tracing::debug;

/// Remove a directory tree. A directory that does not exist is not an error.
pub async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
  match fs::remove_dir_all(path).await {
    Ok(()) => {
      debug!(path = %path.display(), "removed directory");
      Ok(())
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}

/// Write `contents` to `path`, creating parent directories as needed.
pub async fn write_creating_parents(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).await?;
  }
  fs::write(path, contents).await
}

/// Copy a file, creating parent directories of `to` as needed.
pub async fn copy_creating_parents(from: &Path, to: &Path) -> io::Result<()> {
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent).await?;
  }
  fs::copy(from, to).await.map(|_| ())
}
