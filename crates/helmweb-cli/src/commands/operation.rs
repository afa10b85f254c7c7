//! One-shot operations - run a single helm operation and print the result

use std::path::PathBuf;

use helmweb_core::{DeployOptions, OperationKind};
use helmweb_helm::{HelmClient, HelmConfig};

use crate::ChartArgs;
use crate::display;
use crate::error::{CliError, Result};

impl ChartArgs {
    /// Build the option bag, reading the values file if one was given
    fn into_options(self) -> Result<DeployOptions> {
        let value_file = match &self.values_file {
            Some(path) => {
                Some(std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?)
            }
            None => None,
        };

        Ok(DeployOptions {
            chart_name: self.chart,
            release_name: self.release,
            namespace: self.namespace,
            version: self.version,
            values: self.set,
            value_file,
            reuse_value: self.reuse_values,
            handle: self.online.then(|| "online".to_string()),
            private_charts_repo: self.private_repo,
            ..DeployOptions::default()
        })
    }
}

/// Validate, run and print one operation
pub async fn execute(
    config: &HelmConfig,
    kind: OperationKind,
    options: &DeployOptions,
    json: bool,
) -> Result<()> {
    let client = HelmClient::new(config);
    let outcome = client.run_options(kind, options).await?;
    display::outcome(kind, &outcome, json)
}

pub async fn install(config: &HelmConfig, chart: ChartArgs, dry_run: bool, json: bool) -> Result<()> {
    let kind = if dry_run {
        OperationKind::SimulateInstall
    } else {
        OperationKind::Install
    };
    execute(config, kind, &chart.into_options()?, json).await
}

pub async fn upgrade(config: &HelmConfig, chart: ChartArgs, json: bool) -> Result<()> {
    execute(config, OperationKind::Upgrade, &chart.into_options()?, json).await
}

pub async fn delete(
    config: &HelmConfig,
    release: Option<String>,
    purge: bool,
    json: bool,
) -> Result<()> {
    let kind = if purge {
        OperationKind::Delete
    } else {
        OperationKind::Offline
    };
    let options = DeployOptions {
        release_name: release,
        ..Default::default()
    };
    execute(config, kind, &options, json).await
}

pub async fn rollback(
    config: &HelmConfig,
    release: Option<String>,
    revision: Option<String>,
    json: bool,
) -> Result<()> {
    let options = DeployOptions {
        release_name: release,
        release_revision: revision,
        ..Default::default()
    };
    execute(config, OperationKind::Rollback, &options, json).await
}

pub async fn history(config: &HelmConfig, release: Option<String>, json: bool) -> Result<()> {
    let options = DeployOptions {
        release_name: release,
        ..Default::default()
    };
    execute(config, OperationKind::History, &options, json).await
}

pub async fn list(config: &HelmConfig, release: Option<String>, json: bool) -> Result<()> {
    let options = DeployOptions {
        release_name: release,
        ..Default::default()
    };
    execute(config, OperationKind::List, &options, json).await
}

pub async fn search(
    config: &HelmConfig,
    repo: Option<String>,
    filter: Option<String>,
    json: bool,
) -> Result<()> {
    let options = DeployOptions {
        repo_name: repo,
        values: filter,
        ..Default::default()
    };
    execute(config, OperationKind::Search, &options, json).await
}

pub async fn inspect(
    config: &HelmConfig,
    chart: Option<String>,
    section: Option<String>,
    version: Option<String>,
    json: bool,
) -> Result<()> {
    let options = DeployOptions {
        chart_name: chart,
        command: section,
        version,
        ..Default::default()
    };
    execute(config, OperationKind::Inspect, &options, json).await
}

pub async fn push(
    config: &HelmConfig,
    chart_file: Option<PathBuf>,
    repo: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(path) = &chart_file
        && !path.is_file()
    {
        return Err(CliError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "chart archive not found"),
        ));
    }

    let options = DeployOptions {
        chart_file: chart_file.map(|path| path.display().to_string()),
        repo_name: repo,
        ..Default::default()
    };
    execute(config, OperationKind::Push, &options, json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_chart_args_fill_option_bag() {
        let mut values = tempfile::NamedTempFile::new().unwrap();
        writeln!(values, "replicas: 3").unwrap();

        let args = ChartArgs {
            chart: Some("stable/nginx".to_string()),
            release: Some("web".to_string()),
            values_file: Some(values.path().to_path_buf()),
            online: true,
            ..Default::default()
        };
        let options = args.into_options().unwrap();

        assert_eq!(options.chart_name.as_deref(), Some("stable/nginx"));
        assert_eq!(options.value_file.as_deref(), Some("replicas: 3\n"));
        assert_eq!(options.handle.as_deref(), Some("online"));
        assert!(!options.reuse_value);
    }

    #[test]
    fn test_missing_values_file_is_io_error() {
        let args = ChartArgs {
            values_file: Some(PathBuf::from("/nonexistent/values.yaml")),
            ..Default::default()
        };
        let err = args.into_options().unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
