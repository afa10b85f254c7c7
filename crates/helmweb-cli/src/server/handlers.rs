//! Route handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use helmweb_core::{DeployOptions, DeploymentOutcome, OperationKind};
use helmweb_helm::{AllocatedPort, IngressBinding, IngressRule};

use super::AppState;
use super::error::ApiError;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

type Shared = State<Arc<AppState>>;
type JsonOptions = Result<Json<DeployOptions>, JsonRejection>;
type QueryOptions = Result<Query<DeployOptions>, QueryRejection>;

// ============ Responses ============

/// `{"success": true, ...outcome}`
#[derive(Debug, Serialize)]
pub struct InstallResponse {
    success: bool,
    #[serde(flatten)]
    outcome: DeploymentOutcome,
}

/// `{"success": true, "helm": {"stdout", "stderr"}}`
#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    success: bool,
    helm: DeploymentOutcome,
}

/// `{"success": true, "msg": "", "data": outcome}`
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    success: bool,
    msg: String,
    data: DeploymentOutcome,
}

impl MutationResponse {
    fn new(data: DeploymentOutcome) -> Self {
        Self {
            success: true,
            msg: String::new(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    repository: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRuleResponse {
    status: &'static str,
    #[serde(flatten)]
    binding: IngressBinding,
}

#[derive(Debug, Deserialize)]
pub struct PortQuery {
    lbip: Option<String>,
}

// ============ Helpers ============

async fn run(
    state: &AppState,
    kind: OperationKind,
    options: &DeployOptions,
) -> Result<DeploymentOutcome, ApiError> {
    state
        .helm
        .run_options(kind, options)
        .await
        .map_err(|e| ApiError::deploy(kind, e))
}

fn body(payload: JsonOptions) -> Result<DeployOptions, ApiError> {
    payload
        .map(|Json(options)| options)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn query(params: QueryOptions) -> Result<DeployOptions, ApiError> {
    params
        .map(|Query(options)| options)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

async fn mutation(
    state: &AppState,
    kind: OperationKind,
    payload: JsonOptions,
) -> Result<Json<MutationResponse>, ApiError> {
    let outcome = run(state, kind, &body(payload)?).await?;
    Ok(Json(MutationResponse::new(outcome)))
}

async fn lookup(
    state: &AppState,
    kind: OperationKind,
    params: QueryOptions,
) -> Result<Json<DeploymentOutcome>, ApiError> {
    Ok(Json(run(state, kind, &query(params)?).await?))
}

// ============ Deployments ============

pub async fn install(
    State(state): Shared,
    payload: JsonOptions,
) -> Result<Json<InstallResponse>, ApiError> {
    let outcome = run(&state, OperationKind::Install, &body(payload)?).await?;
    Ok(Json(InstallResponse {
        success: true,
        outcome,
    }))
}

pub async fn simulate_install(
    State(state): Shared,
    payload: JsonOptions,
) -> Result<Json<SimulateResponse>, ApiError> {
    let helm = run(&state, OperationKind::SimulateInstall, &body(payload)?).await?;
    Ok(Json(SimulateResponse {
        success: true,
        helm,
    }))
}

pub async fn upgrade(
    State(state): Shared,
    payload: JsonOptions,
) -> Result<Json<MutationResponse>, ApiError> {
    mutation(&state, OperationKind::Upgrade, payload).await
}

pub async fn delete(
    State(state): Shared,
    payload: JsonOptions,
) -> Result<Json<MutationResponse>, ApiError> {
    mutation(&state, OperationKind::Delete, payload).await
}

pub async fn offline(
    State(state): Shared,
    payload: JsonOptions,
) -> Result<Json<MutationResponse>, ApiError> {
    mutation(&state, OperationKind::Offline, payload).await
}

pub async fn rollback(
    State(state): Shared,
    payload: JsonOptions,
) -> Result<Json<MutationResponse>, ApiError> {
    mutation(&state, OperationKind::Rollback, payload).await
}

// ============ Queries ============

pub async fn list(
    State(state): Shared,
    params: QueryOptions,
) -> Result<Json<DeploymentOutcome>, ApiError> {
    lookup(&state, OperationKind::List, params).await
}

pub async fn history(
    State(state): Shared,
    params: QueryOptions,
) -> Result<Json<DeploymentOutcome>, ApiError> {
    lookup(&state, OperationKind::History, params).await
}

pub async fn search(
    State(state): Shared,
    params: QueryOptions,
) -> Result<Json<DeploymentOutcome>, ApiError> {
    lookup(&state, OperationKind::Search, params).await
}

pub async fn inspect(
    State(state): Shared,
    params: QueryOptions,
) -> Result<Json<DeploymentOutcome>, ApiError> {
    lookup(&state, OperationKind::Inspect, params).await
}

pub async fn repo_list(
    State(state): Shared,
    params: QueryOptions,
) -> Result<Json<DeploymentOutcome>, ApiError> {
    lookup(&state, OperationKind::RepoList, params).await
}

pub async fn repo_update(
    State(state): Shared,
    params: QueryOptions,
) -> Result<Json<DeploymentOutcome>, ApiError> {
    lookup(&state, OperationKind::RepoUpdate, params).await
}

// ============ Charts ============

/// An uploaded chart archive, removed once the push is over
struct UploadedChart {
    path: PathBuf,
}

impl UploadedChart {
    async fn save(upload_dir: &Path, content: &[u8]) -> Result<Self, ApiError> {
        let path = upload_dir.join(format!(
            "{}-{:08x}.tgz",
            Utc::now().timestamp_millis(),
            rand::random::<u32>()
        ));
        let failed = |e: std::io::Error| {
            ApiError::internal(format!("failed to store upload {}: {e}", path.display()))
        };

        tokio::fs::create_dir_all(upload_dir).await.map_err(failed)?;
        tokio::fs::write(&path, content).await.map_err(failed)?;
        debug!(path = %path.display(), bytes = content.len(), "stored uploaded chart");
        Ok(Self { path })
    }
}

impl Drop for UploadedChart {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "failed to remove uploaded chart");
        }
    }
}

/// Multipart upload: `chartPackage` file plus optional `repoName`
pub async fn push(
    State(state): Shared,
    mut multipart: Multipart,
) -> Result<Json<MutationResponse>, ApiError> {
    let malformed = |e: MultipartError| ApiError::bad_request(e.body_text());

    let mut options = DeployOptions::default();
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("chartPackage") => {
                let content = field.bytes().await.map_err(malformed)?;
                upload = Some(UploadedChart::save(state.helm.upload_dir(), &content).await?);
            }
            Some("repoName") => {
                let repo = field.text().await.map_err(malformed)?;
                options.repo_name = Some(repo).filter(|r| !r.trim().is_empty());
            }
            _ => {}
        }
    }

    // Without an archive the option bag fails validation on chartFile
    options.chart_file = upload
        .as_ref()
        .map(|chart: &UploadedChart| chart.path.display().to_string());

    let outcome = run(&state, OperationKind::Push, &options).await?;
    Ok(Json(MutationResponse::new(outcome)))
}

// ============ Health ============

/// Probe the `pase` repository
pub async fn health(State(state): Shared) -> (StatusCode, Json<HealthResponse>) {
    let url = format!("{}/health", state.pase_repo.trim_end_matches('/'));

    match state.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
        Ok(response) if response.status().is_success() => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                repository: "reachable".to_string(),
            }),
        ),
        Ok(response) => {
            warn!(%url, status = %response.status(), "chart repository unhealthy");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    repository: format!("{url} answered {}", response.status()),
                }),
            )
        }
        Err(e) => {
            warn!(%url, error = %e, "chart repository unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    repository: e.to_string(),
                }),
            )
        }
    }
}

// ============ Collaborators ============

pub async fn get_port(
    State(state): Shared,
    Query(params): Query<PortQuery>,
) -> Result<Json<AllocatedPort>, ApiError> {
    let ports = state
        .ports
        .as_ref()
        .ok_or(ApiError::Unavailable("port allocator"))?;
    let lbip = params
        .lbip
        .filter(|ip| !ip.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("lbip is required"))?;

    let port = ports.get_port(&lbip).await?;
    info!(lbip = %lbip, port = port.port, "allocated load balancer port");
    Ok(Json(port))
}

pub async fn set_rule(
    State(state): Shared,
    payload: Result<Json<IngressRule>, JsonRejection>,
) -> Result<Json<SetRuleResponse>, ApiError> {
    let ingress = state
        .ingress
        .as_ref()
        .ok_or(ApiError::Unavailable("ingress rule manager"))?;
    let Json(rule) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let binding = ingress.set_rule(&rule).await?;
    info!(release = %rule.release, ip = %binding.ip, port = binding.port, "ingress rule set");
    Ok(Json(SetRuleResponse {
        status: "success",
        binding,
    }))
}
