//! Serve command - run the HTTP API

use std::sync::Arc;

use console::style;
use tracing::info;

use helmweb_helm::{HelmClient, HelmConfig};

use crate::error::{CliError, Result};
use crate::server::{self, AppState};

/// Register startup repositories, then serve until shutdown
pub async fn run(config: HelmConfig, port: u16) -> Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| CliError::io(&config.upload_dir, e))?;

    let helm = HelmClient::new(&config);
    helm.bootstrap(&config).await?;

    info!(
        helm = %config.binary.display(),
        upload_dir = %config.upload_dir.display(),
        timeout = ?config.timeout,
        "helm client ready"
    );
    println!(
        "{} Serving on port {} (pase repository {})",
        style("→").blue().bold(),
        style(port).cyan(),
        style(&config.pase_repo).yellow()
    );

    let state = Arc::new(AppState::new(helm, config.pase_repo.clone()));
    server::serve(state, port).await?;

    info!("server stopped");
    Ok(())
}
