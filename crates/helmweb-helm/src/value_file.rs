//! Temporary values files
//!
//! Inline value content is written to the upload directory for the one
//! invocation that reads it and removed when the handle is dropped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use helmweb_core::DeployError;

use crate::error::Result;

/// A values file owned by a single install or upgrade call
#[derive(Debug)]
pub struct TemporaryValueFile {
    path: PathBuf,
}

impl TemporaryValueFile {
    /// Write `content` to `path`, creating the upload directory if needed
    pub async fn write(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let value_file_error = |e: std::io::Error| DeployError::ValueFile {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(value_file_error)?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(value_file_error)?;

        debug!(path = %path.display(), "wrote values file");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TemporaryValueFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed values file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove values file, leaving it behind"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_written_then_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("upload").join("1700000000000-0000beef.yaml");

        let file = TemporaryValueFile::write(&path, "replicas: 3\n")
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "replicas: 3\n");

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_already_removed_is_fine() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("values.yaml");

        let file = TemporaryValueFile::write(&path, "a: 1").await.unwrap();
        std::fs::remove_file(&path).unwrap();
        drop(file);
    }

    #[tokio::test]
    async fn test_write_failure_is_value_file_error() {
        let temp = TempDir::new().unwrap();
        // A regular file where the upload directory should be
        let blocker = temp.path().join("upload");
        std::fs::write(&blocker, "").unwrap();

        let err = TemporaryValueFile::write(blocker.join("values.yaml"), "a: 1")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::ValueFile { .. }));
    }
}
