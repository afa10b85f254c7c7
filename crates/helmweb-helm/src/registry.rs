//! Repository registry
//!
//! Helm keeps its own list of repositories; this table only remembers what
//! this process already registered so repeated installs against the same
//! private repository do not re-run `repo add`. Registration on the helm
//! side is not locked across requests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use helmweb_core::{HelmCommand, ToolOutput};

use crate::error::Result;
use crate::repository::Repository;
use crate::runner::HelmRunner;

/// Process-wide view of the repositories registered with helm
pub struct RepositoryRegistry {
    runner: Arc<dyn HelmRunner>,
    /// alias -> url
    known: RwLock<HashMap<String, String>>,
}

impl RepositoryRegistry {
    pub fn new(runner: Arc<dyn HelmRunner>) -> Self {
        Self {
            runner,
            known: RwLock::new(HashMap::new()),
        }
    }

    /// Make `alias` resolve to `url`, running `repo add` unless this
    /// process already registered the same pair
    pub async fn ensure_registered(&self, alias: &str, url: &str) -> Result<()> {
        if self.registered(alias).as_deref() == Some(url) {
            debug!(alias, url, "repository already registered");
            return Ok(());
        }

        info!(alias, url, "registering repository");
        self.runner
            .run(&HelmCommand::repo_add(alias, url))
            .await?
            .into_output()?;

        self.known
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(alias.to_string(), url.to_string());
        Ok(())
    }

    /// Fetch the index of every repository helm knows
    pub async fn refresh(&self) -> Result<ToolOutput> {
        debug!("refreshing repository indexes");
        self.runner
            .run(&HelmCommand::repo_update())
            .await?
            .into_output()
    }

    /// Helm's own repository listing
    pub async fn list(&self) -> Result<ToolOutput> {
        self.runner.run(&HelmCommand::repo_list()).await?.into_output()
    }

    /// URL this process registered under `alias`, if any
    pub fn registered(&self, alias: &str) -> Option<String> {
        self.known
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(alias)
            .cloned()
    }

    /// Register the startup repositories.
    ///
    /// A repository that cannot be registered is logged and skipped; the
    /// service still starts.
    pub async fn bootstrap(&self, repositories: &[Repository]) {
        for repo in repositories {
            if let Err(e) = self.ensure_registered(&repo.name, &repo.url).await {
                warn!(alias = %repo.name, url = %repo.url, error = %e, "failed to register repository");
            }
        }
        if !repositories.is_empty()
            && let Err(e) = self.refresh().await
        {
            warn!(error = %e, "failed to refresh repository indexes");
        }
    }
}
