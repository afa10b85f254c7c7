//! Runtime configuration

use std::path::PathBuf;
use std::time::Duration;

use helmweb_core::DEFAULT_REPO_ALIAS;

use crate::error::ConfigError;
use crate::repository::{Repository, RepositoryConfig};

pub const DEFAULT_BINARY: &str = "helm";
pub const DEFAULT_PASE_REPO: &str = "http://localhost:8879";
pub const DEFAULT_UPLOAD_HOME: &str = "upload";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Settings shared by every operation
#[derive(Debug, Clone)]
pub struct HelmConfig {
    /// Helm binary, resolved through PATH when relative
    pub binary: PathBuf,
    /// Where uploaded charts and temporary values files go
    pub upload_dir: PathBuf,
    /// URL of this service's own chart repository
    pub pase_repo: String,
    /// Deadline of a single helm invocation
    pub timeout: Duration,
    /// Extra repositories registered at startup
    pub repositories: Vec<Repository>,
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_HOME),
            pase_repo: DEFAULT_PASE_REPO.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            repositories: Vec::new(),
        }
    }
}

impl HelmConfig {
    /// Add the repositories listed in a repositories file
    pub fn with_repositories_file(mut self, path: &std::path::Path) -> Result<Self, ConfigError> {
        let config = RepositoryConfig::load_from(path)?;
        self.repositories.extend(config.repositories);
        Ok(self)
    }

    /// Repositories to register at startup, `pase` first.
    ///
    /// A file entry named `pase` is ignored in favour of the configured URL.
    pub fn startup_repositories(&self) -> Result<Vec<Repository>, ConfigError> {
        let mut repositories = vec![Repository::new(DEFAULT_REPO_ALIAS, &self.pase_repo)?];
        repositories.extend(
            self.repositories
                .iter()
                .filter(|repo| repo.name != DEFAULT_REPO_ALIAS)
                .cloned(),
        );
        Ok(repositories)
    }
}
