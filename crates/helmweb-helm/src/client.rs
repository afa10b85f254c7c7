//! Deployment orchestration
//!
//! `HelmClient` drives one request through its plan: setup steps in
//! order, best-effort side calls, the main invocation, then
//! interpretation of what helm printed.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use helmweb_core::{
    CommandBuilder, CommandPlan, DeployOptions, DeploymentOutcome, HelmCommand, HelmRequest,
    InstallOutcome, OperationKind, SetupStep, classify_output, parse_install, parse_push,
};

use crate::config::HelmConfig;
use crate::error::{ConfigError, Result};
use crate::registry::RepositoryRegistry;
use crate::runner::{ExecutionResult, HelmRunner, ProcessExecutor};
use crate::value_file::TemporaryValueFile;

/// Runs deployment operations against helm
#[derive(Clone)]
pub struct HelmClient {
    runner: Arc<dyn HelmRunner>,
    registry: Arc<RepositoryRegistry>,
    builder: CommandBuilder,
}

impl HelmClient {
    /// Create a client spawning the configured helm binary
    pub fn new(config: &HelmConfig) -> Self {
        let runner = ProcessExecutor::new(&config.binary, config.timeout);
        Self::with_runner(Arc::new(runner), &config.upload_dir)
    }

    /// Create a client on top of any runner
    pub fn with_runner(runner: Arc<dyn HelmRunner>, upload_dir: &Path) -> Self {
        Self {
            registry: Arc::new(RepositoryRegistry::new(runner.clone())),
            runner,
            builder: CommandBuilder::new(upload_dir),
        }
    }

    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    pub fn upload_dir(&self) -> &Path {
        self.builder.upload_dir()
    }

    /// Register the startup repositories with helm
    pub async fn bootstrap(&self, config: &HelmConfig) -> std::result::Result<(), ConfigError> {
        let repositories = config.startup_repositories()?;
        info!(
            repositories = ?repositories.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "registering startup repositories"
        );
        self.registry.bootstrap(&repositories).await;
        Ok(())
    }

    /// Validate an option bag for `kind` and run it
    pub async fn run_options(
        &self,
        kind: OperationKind,
        options: &DeployOptions,
    ) -> Result<DeploymentOutcome> {
        let request = HelmRequest::from_options(kind, options).inspect_err(|e| {
            debug!(operation = %kind, error = %e, "rejected request");
        })?;
        self.execute(&request).await
    }

    /// Run a validated request
    pub async fn execute(&self, request: &HelmRequest) -> Result<DeploymentOutcome> {
        let operation = request.kind();
        let plan = self.builder.build(request);
        info!(%operation, "running operation");

        let outcome = self.run(request, &plan).await.inspect_err(|e| {
            warn!(%operation, category = ?e.category(), error = %e, "operation failed");
        })?;

        self.fire(&plan.follow_up);
        info!(%operation, "operation succeeded");
        Ok(outcome)
    }

    async fn run(&self, request: &HelmRequest, plan: &CommandPlan) -> Result<DeploymentOutcome> {
        let result = {
            // Held until the main command is done, removed on every path
            let _value_file = self.run_setup(&plan.setup).await?;
            self.fire(&plan.fire_and_forget);
            self.runner.run(&plan.main).await?
        };

        match request {
            HelmRequest::Install(install) if !install.dry_run => {
                interpret_install(result, install.release_name.as_deref())
                    .map(DeploymentOutcome::Installed)
            }
            HelmRequest::Push(push) => {
                let output = result.into_output()?;
                parse_push(&output.stdout, &push.repo_alias).map(DeploymentOutcome::Pushed)
            }
            _ => result.into_output().map(DeploymentOutcome::Output),
        }
    }

    /// Run setup steps in order; the first failure aborts the operation
    async fn run_setup(&self, setup: &[SetupStep]) -> Result<Option<TemporaryValueFile>> {
        let mut value_file = None;
        for step in setup {
            match step {
                SetupStep::RegisterRepo { alias, url } => {
                    self.registry.ensure_registered(alias, url).await?;
                }
                SetupStep::RefreshIndex => {
                    self.registry.refresh().await?;
                }
                SetupStep::WriteValueFile { path, content } => {
                    value_file = Some(TemporaryValueFile::write(path, content).await?);
                }
            }
        }
        Ok(value_file)
    }

    /// Spawn commands nobody waits for; failures are only logged
    fn fire(&self, commands: &[HelmCommand]) {
        for command in commands {
            let runner = self.runner.clone();
            let command = command.clone();
            tokio::spawn(async move {
                match runner.run(&command).await.and_then(ExecutionResult::into_output) {
                    Ok(_) => debug!(command = %command, "best-effort command finished"),
                    Err(e) => warn!(command = %command, error = %e, "best-effort command failed"),
                }
            });
        }
    }
}

/// Any stderr output from an install counts as a failure, even on exit 0
fn interpret_install(result: ExecutionResult, requested_release: Option<&str>) -> Result<InstallOutcome> {
    if !result.succeeded() || !result.stderr.trim().is_empty() {
        return Err(classify_output(&result.stdout, &result.stderr));
    }
    parse_install(&result.stdout, requested_release)
}
