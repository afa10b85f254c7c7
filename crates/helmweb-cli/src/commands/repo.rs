//! Repository management commands

use helmweb_core::{DeploymentOutcome, OperationKind};
use helmweb_helm::{HelmClient, HelmConfig};

use crate::display;
use crate::error::Result;

/// List repositories known to helm
pub async fn list(config: &HelmConfig, json: bool) -> Result<()> {
    let client = HelmClient::new(config);
    let output = client.registry().list().await?;
    display::outcome(OperationKind::RepoList, &DeploymentOutcome::Output(output), json)
}

/// Refresh the index of every repository
pub async fn update(config: &HelmConfig, json: bool) -> Result<()> {
    let client = HelmClient::new(config);
    let output = client.registry().refresh().await?;
    display::outcome(OperationKind::RepoUpdate, &DeploymentOutcome::Output(output), json)
}
