//! Typed per-operation requests
//!
//! Each operation carries only the fields it uses. Required fields are
//! checked once, in [`HelmRequest::from_options`], so a request that exists
//! is a request that can be built into a command.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{DeployError, Result};
use crate::options::{DeployOptions, non_blank};

/// Alias of this service's own chart repository
pub const DEFAULT_REPO_ALIAS: &str = "pase";

/// Operation names accepted by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Install,
    SimulateInstall,
    Upgrade,
    Delete,
    Offline,
    Rollback,
    History,
    List,
    RepoList,
    RepoUpdate,
    Search,
    Inspect,
    Push,
}

impl OperationKind {
    pub const ALL: [OperationKind; 13] = [
        Self::Install,
        Self::SimulateInstall,
        Self::Upgrade,
        Self::Delete,
        Self::Offline,
        Self::Rollback,
        Self::History,
        Self::List,
        Self::RepoList,
        Self::RepoUpdate,
        Self::Search,
        Self::Inspect,
        Self::Push,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::SimulateInstall => "simulateInstall",
            Self::Upgrade => "upgrade",
            Self::Delete => "delete",
            Self::Offline => "offline",
            Self::Rollback => "rollback",
            Self::History => "history",
            Self::List => "list",
            Self::RepoList => "repoList",
            Self::RepoUpdate => "repoUpdate",
            Self::Search => "search",
            Self::Inspect => "inspect",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DeployError::InvalidField {
                field: "operation",
                value: s.to_string(),
                expected: "install, simulateInstall, upgrade, delete, offline, rollback, history, list, repoList, repoUpdate, search, inspect, push",
            })
    }
}

/// Section printed by `inspect`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectSection {
    Chart,
    Values,
    Readme,
    All,
}

impl InspectSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Values => "values",
            Self::Readme => "readme",
            Self::All => "all",
        }
    }
}

impl FromStr for InspectSection {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chart" => Ok(Self::Chart),
            "values" => Ok(Self::Values),
            "readme" => Ok(Self::Readme),
            "all" => Ok(Self::All),
            _ => Err(DeployError::InvalidField {
                field: "command",
                value: s.to_string(),
                expected: "chart, values, readme, all",
            }),
        }
    }
}

/// A private repository the chart must be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateRepo {
    pub alias: String,
    pub url: String,
}

/// Flags shared by install and upgrade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSettings {
    pub reuse_values: bool,
    pub version: Option<String>,
    /// `--set` overrides
    pub set_values: Option<String>,
    /// Raw content for a temporary `-f` values file
    pub value_file: Option<String>,
    /// Handle mode `online`: pass `--replace`
    pub replace: bool,
    pub private_repo: Option<PrivateRepo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub chart_name: String,
    pub release_name: Option<String>,
    pub namespace: Option<String>,
    pub dry_run: bool,
    pub settings: ChartSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRequest {
    pub chart_name: String,
    pub release_name: String,
    pub namespace: String,
    pub settings: ChartSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub release_name: String,
    /// Drop the release history too (`delete`), or keep it (`offline`)
    pub purge: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRequest {
    pub release_name: String,
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub repo_name: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectRequest {
    pub chart_name: String,
    pub section: Option<InspectSection>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub chart_file: PathBuf,
    pub repo_alias: String,
}

/// A validated request for exactly one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelmRequest {
    Install(InstallRequest),
    Upgrade(UpgradeRequest),
    Delete(DeleteRequest),
    Rollback(RollbackRequest),
    History { release_name: Option<String> },
    List { release_name: Option<String> },
    RepoList,
    RepoUpdate,
    Search(SearchRequest),
    Inspect(InspectRequest),
    Push(PushRequest),
}

impl HelmRequest {
    /// Validate an option bag against the fields `kind` requires
    pub fn from_options(kind: OperationKind, options: &DeployOptions) -> Result<Self> {
        let request = match kind {
            OperationKind::Install => {
                // An applied install must name a service; dry runs have none
                if options.dry_run {
                    return Err(DeployError::InvalidField {
                        field: "dryRun",
                        value: "true".to_string(),
                        expected: "false; dry runs go through simulateInstall",
                    });
                }
                Self::Install(install_request(options, false)?)
            }
            OperationKind::SimulateInstall => Self::Install(install_request(options, true)?),
            OperationKind::Upgrade => {
                let chart_name = required(&options.chart_name, "chartName")?;
                let release_name = required(&options.release_name, "releaseName")?;
                let namespace = required(&options.namespace, "namespace")?;
                Self::Upgrade(UpgradeRequest {
                    settings: chart_settings(options, &chart_name),
                    chart_name,
                    release_name,
                    namespace,
                })
            }
            OperationKind::Delete | OperationKind::Offline => Self::Delete(DeleteRequest {
                release_name: required(&options.release_name, "releaseName")?,
                purge: kind == OperationKind::Delete,
            }),
            OperationKind::Rollback => Self::Rollback(RollbackRequest {
                release_name: required(&options.release_name, "releaseName")?,
                revision: required(&options.release_revision, "releaseRevision")?,
            }),
            OperationKind::History => Self::History {
                release_name: optional(&options.release_name),
            },
            OperationKind::List => Self::List {
                release_name: optional(&options.release_name),
            },
            OperationKind::RepoList => Self::RepoList,
            OperationKind::RepoUpdate => Self::RepoUpdate,
            OperationKind::Search => Self::Search(SearchRequest {
                repo_name: optional(&options.repo_name),
                filter: optional(&options.values),
            }),
            OperationKind::Inspect => Self::Inspect(InspectRequest {
                chart_name: required(&options.chart_name, "chartName")?,
                section: non_blank(&options.command)
                    .map(str::parse)
                    .transpose()?,
                version: optional(&options.version),
            }),
            OperationKind::Push => Self::Push(PushRequest {
                chart_file: PathBuf::from(required(&options.chart_file, "chartFile")?),
                repo_alias: optional(&options.repo_name)
                    .unwrap_or_else(|| DEFAULT_REPO_ALIAS.to_string()),
            }),
        };
        Ok(request)
    }

    /// Operation this request performs
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Install(req) if req.dry_run => OperationKind::SimulateInstall,
            Self::Install(_) => OperationKind::Install,
            Self::Upgrade(_) => OperationKind::Upgrade,
            Self::Delete(req) if req.purge => OperationKind::Delete,
            Self::Delete(_) => OperationKind::Offline,
            Self::Rollback(_) => OperationKind::Rollback,
            Self::History { .. } => OperationKind::History,
            Self::List { .. } => OperationKind::List,
            Self::RepoList => OperationKind::RepoList,
            Self::RepoUpdate => OperationKind::RepoUpdate,
            Self::Search(_) => OperationKind::Search,
            Self::Inspect(_) => OperationKind::Inspect,
            Self::Push(_) => OperationKind::Push,
        }
    }
}

fn install_request(options: &DeployOptions, dry_run: bool) -> Result<InstallRequest> {
    let chart_name = required(&options.chart_name, "chartName")?;
    Ok(InstallRequest {
        settings: chart_settings(options, &chart_name),
        chart_name,
        release_name: optional(&options.release_name),
        namespace: optional(&options.namespace),
        dry_run,
    })
}

fn chart_settings(options: &DeployOptions, chart_name: &str) -> ChartSettings {
    let private_repo = optional(&options.private_charts_repo).map(|url| PrivateRepo {
        alias: repo_alias_of(chart_name),
        url,
    });

    ChartSettings {
        reuse_values: options.reuse_value,
        version: optional(&options.version),
        set_values: optional(&options.values),
        value_file: optional(&options.value_file),
        replace: non_blank(&options.handle) == Some("online"),
        private_repo,
    }
}

/// Leading path segment of a chart reference, lower-cased
pub fn repo_alias_of(chart_name: &str) -> String {
    chart_name
        .split('/')
        .next()
        .unwrap_or(chart_name)
        .to_lowercase()
}

fn required(value: &Option<String>, field: &'static str) -> Result<String> {
    non_blank(value)
        .map(str::to_string)
        .ok_or(DeployError::MissingField { field })
}

fn optional(value: &Option<String>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_field(result: Result<HelmRequest>) -> &'static str {
        match result {
            Err(DeployError::MissingField { field }) => field,
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_install_requires_chart() {
        let options = DeployOptions::new().release("web");
        assert_eq!(
            missing_field(HelmRequest::from_options(OperationKind::Install, &options)),
            "chartName"
        );
    }

    #[test]
    fn test_upgrade_requires_namespace() {
        let options = DeployOptions::new().chart("stable/nginx").release("web");
        assert_eq!(
            missing_field(HelmRequest::from_options(OperationKind::Upgrade, &options)),
            "namespace"
        );
    }

    #[test]
    fn test_rollback_requires_revision() {
        let options = DeployOptions::new().release("web");
        assert_eq!(
            missing_field(HelmRequest::from_options(OperationKind::Rollback, &options)),
            "releaseRevision"
        );
    }

    #[test]
    fn test_delete_and_offline_need_release() {
        for kind in [OperationKind::Delete, OperationKind::Offline] {
            assert_eq!(
                missing_field(HelmRequest::from_options(kind, &DeployOptions::new())),
                "releaseName"
            );
        }

        let options = DeployOptions::new().release("web");
        let delete = HelmRequest::from_options(OperationKind::Delete, &options).unwrap();
        let offline = HelmRequest::from_options(OperationKind::Offline, &options).unwrap();
        assert_eq!(delete.kind(), OperationKind::Delete);
        assert_eq!(offline.kind(), OperationKind::Offline);
    }

    #[test]
    fn test_push_requires_chart_file_and_defaults_alias() {
        assert_eq!(
            missing_field(HelmRequest::from_options(
                OperationKind::Push,
                &DeployOptions::new()
            )),
            "chartFile"
        );

        let options = DeployOptions {
            chart_file: Some("upload/abc".to_string()),
            ..Default::default()
        };
        match HelmRequest::from_options(OperationKind::Push, &options).unwrap() {
            HelmRequest::Push(push) => {
                assert_eq!(push.repo_alias, DEFAULT_REPO_ALIAS);
                assert_eq!(push.chart_file, PathBuf::from("upload/abc"));
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_history_and_list_accept_no_release() {
        let history = HelmRequest::from_options(OperationKind::History, &DeployOptions::new());
        assert_eq!(history.unwrap(), HelmRequest::History { release_name: None });
        let list = HelmRequest::from_options(OperationKind::List, &DeployOptions::new());
        assert_eq!(list.unwrap(), HelmRequest::List { release_name: None });
    }

    #[test]
    fn test_private_repo_alias_from_chart() {
        let options = DeployOptions {
            private_charts_repo: Some("https://charts.example.com".to_string()),
            ..DeployOptions::new().chart("MyRepo/app")
        };
        match HelmRequest::from_options(OperationKind::Install, &options).unwrap() {
            HelmRequest::Install(install) => {
                let repo = install.settings.private_repo.unwrap();
                assert_eq!(repo.alias, "myrepo");
                assert_eq!(repo.url, "https://charts.example.com");
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_handle_online_sets_replace() {
        let mut options = DeployOptions::new().chart("stable/nginx");
        options.handle = Some("online".to_string());
        let HelmRequest::Install(install) =
            HelmRequest::from_options(OperationKind::Install, &options).unwrap()
        else {
            panic!("expected install");
        };
        assert!(install.settings.replace);

        options.handle = Some("offline".to_string());
        let HelmRequest::Install(install) =
            HelmRequest::from_options(OperationKind::Install, &options).unwrap()
        else {
            panic!("expected install");
        };
        assert!(!install.settings.replace);
    }

    #[test]
    fn test_inspect_section_validation() {
        let mut options = DeployOptions::new().chart("stable/nginx");
        options.command = Some("Values".to_string());
        let HelmRequest::Inspect(inspect) =
            HelmRequest::from_options(OperationKind::Inspect, &options).unwrap()
        else {
            panic!("expected inspect");
        };
        assert_eq!(inspect.section, Some(InspectSection::Values));

        options.command = Some("everything".to_string());
        let err = HelmRequest::from_options(OperationKind::Inspect, &options).unwrap_err();
        assert!(matches!(err, DeployError::InvalidField { field: "command", .. }));
    }

    #[test]
    fn test_install_rejects_dry_run() {
        let mut options = DeployOptions::new().chart("stable/nginx");
        options.dry_run = true;
        let err = HelmRequest::from_options(OperationKind::Install, &options).unwrap_err();
        assert!(matches!(err, DeployError::InvalidField { field: "dryRun", .. }));
        assert!(err.is_validation());

        // The same bag is a valid simulation
        let request = HelmRequest::from_options(OperationKind::SimulateInstall, &options).unwrap();
        assert_eq!(request.kind(), OperationKind::SimulateInstall);
    }

    #[test]
    fn test_simulate_install_forces_dry_run() {
        let options = DeployOptions::new().chart("stable/nginx");
        let request = HelmRequest::from_options(OperationKind::SimulateInstall, &options).unwrap();
        assert_eq!(request.kind(), OperationKind::SimulateInstall);
    }

    #[test]
    fn test_operation_kind_parsing() {
        assert_eq!("repoList".parse::<OperationKind>().unwrap(), OperationKind::RepoList);
        assert_eq!("INSTALL".parse::<OperationKind>().unwrap(), OperationKind::Install);
        assert!("_repoUpdate".parse::<OperationKind>().is_err());
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }
}
